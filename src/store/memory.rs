//! In-memory engine
//!
//! Volatile partition for host builds and tests. Every primitive call is
//! counted so callers can verify which operations actually reached the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::Config;

use super::image::ImageSlot;
use super::{Image, Limits, Namespace, OpenMode, Partition, StoreError, StoreResult};

/// Snapshot of primitive call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub size_queries: u64,
    pub reads: u64,
    pub writes: u64,
    pub erases: u64,
    pub commits: u64,
}

#[derive(Debug, Default)]
struct Counters {
    size_queries: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    erases: AtomicU64,
    commits: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> StoreStats {
        StoreStats {
            size_queries: self.size_queries.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            erases: self.erases.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
struct Shared {
    slot: ImageSlot,
    counters: Counters,
}

/// Volatile partition; clones share the same contents
#[derive(Debug, Clone)]
pub struct MemoryPartition {
    shared: Arc<Shared>,
}

impl MemoryPartition {
    /// Create a partition with default limits
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create a partition with limits taken from `config`
    pub fn with_config(config: &Config) -> Self {
        Self::with_limits(Limits::from_config(config))
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: ImageSlot::new(limits),
                counters: Counters::default(),
            }),
        }
    }

    /// Counters of primitive calls made through any handle
    pub fn stats(&self) -> StoreStats {
        self.shared.counters.snapshot()
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.slot.is_initialized()
    }

    /// Accounted bytes in use
    pub fn used(&self) -> StoreResult<usize> {
        self.shared.slot.read(|image| Ok(image.used()))
    }
}

impl Default for MemoryPartition {
    fn default() -> Self {
        Self::new()
    }
}

impl Partition for MemoryPartition {
    type Handle = MemoryNamespace;

    fn init(&self) -> StoreResult<()> {
        self.shared.slot.init_with(|| Ok(Image::new()))
    }

    fn erase_all(&self) -> StoreResult<()> {
        self.shared.slot.clear();
        tracing::debug!("Memory partition erased");
        Ok(())
    }

    fn open_namespace(&self, name: &str, mode: OpenMode) -> StoreResult<MemoryNamespace> {
        self.shared.slot.open(name, mode)?;
        Ok(MemoryNamespace {
            shared: Arc::clone(&self.shared),
            name: Arc::from(name),
            mode,
        })
    }

    fn close_namespace(&self, handle: MemoryNamespace) {
        tracing::trace!("Closing namespace {}", handle.name);
    }
}

/// Handle to a namespace of a `MemoryPartition`
#[derive(Debug, Clone)]
pub struct MemoryNamespace {
    shared: Arc<Shared>,
    name: Arc<str>,
    mode: OpenMode,
}

impl MemoryNamespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }
}

impl Namespace for MemoryNamespace {
    fn blob_size(&self, key: &str) -> StoreResult<usize> {
        Counters::bump(&self.shared.counters.size_queries);
        self.shared.slot.read(|image| image.blob_size(&self.name, key))
    }

    fn get_blob(&self, key: &str, buf: &mut [u8]) -> StoreResult<usize> {
        Counters::bump(&self.shared.counters.reads);
        self.shared.slot.read(|image| image.get_blob(&self.name, key, buf))
    }

    fn set_blob(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        Counters::bump(&self.shared.counters.writes);
        if self.mode == OpenMode::ReadOnly {
            return Err(StoreError::ReadOnly);
        }
        self.shared
            .slot
            .write(|image, limits| image.set_blob(&self.name, key, data, limits))
    }

    fn erase_key(&self, key: &str) -> StoreResult<()> {
        Counters::bump(&self.shared.counters.erases);
        if self.mode == OpenMode::ReadOnly {
            return Err(StoreError::ReadOnly);
        }
        self.shared.slot.write(|image, _| image.erase_key(&self.name, key))
    }

    fn commit(&self) -> StoreResult<()> {
        Counters::bump(&self.shared.counters.commits);
        self.shared.slot.read(|_| Ok(()))
    }
}
