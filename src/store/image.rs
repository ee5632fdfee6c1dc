//! Partition image
//!
//! In-memory contents of a partition and its on-disk encoding.
//!
//! ## File Format
//! ```text
//! ┌──────────┬────────────┬─────────────┬──────────┬───────────┬──────────┐
//! │Magic (4) │Version (2) │Reserved (2) │ Len (4)  │ CRC32 (4) │ Payload  │
//! └──────────┴────────────┴─────────────┴──────────┴───────────┴──────────┘
//! ```
//! Payload: bincode of `namespace → key → blob`. CRC covers the payload only.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{blob_footprint, Limits, OpenMode, StoreError, StoreResult, ENTRY_SIZE};

/// Magic bytes at the start of every image: "NVSC"
pub const MAGIC: &[u8; 4] = b"NVSC";

/// Current image format version
pub const VERSION: u16 = 1;

/// Magic (4) + version (2) + reserved (2) + payload length (4) + CRC (4)
pub const HEADER_SIZE: usize = 16;

/// Contents of a partition: namespace → key → blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    namespaces: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounted bytes in use
    pub fn used(&self) -> usize {
        self.namespaces
            .values()
            .map(|keys| ENTRY_SIZE + keys.values().map(|blob| blob_footprint(blob.len())).sum::<usize>())
            .sum()
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Namespace names in sorted order
    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces.keys().cloned().collect()
    }

    /// `(key, blob length)` pairs of a namespace in sorted order
    pub fn entries(&self, namespace: &str) -> StoreResult<Vec<(String, usize)>> {
        let keys = self.namespace(namespace)?;
        Ok(keys.iter().map(|(key, blob)| (key.clone(), blob.len())).collect())
    }

    /// Create a namespace if it does not exist yet
    pub fn create_namespace(&mut self, namespace: &str, limits: &Limits) -> StoreResult<()> {
        if self.has_namespace(namespace) {
            return Ok(());
        }
        let used = self.used();
        if used + ENTRY_SIZE > limits.capacity {
            return Err(StoreError::NotEnoughSpace {
                needed: ENTRY_SIZE,
                available: limits.capacity.saturating_sub(used),
            });
        }
        self.namespaces.insert(namespace.to_string(), BTreeMap::new());
        Ok(())
    }

    pub fn blob_size(&self, namespace: &str, key: &str) -> StoreResult<usize> {
        self.namespace(namespace)?
            .get(key)
            .map(Vec::len)
            .ok_or(StoreError::NotFound)
    }

    pub fn get_blob(&self, namespace: &str, key: &str, buf: &mut [u8]) -> StoreResult<usize> {
        let blob = self.namespace(namespace)?.get(key).ok_or(StoreError::NotFound)?;
        if buf.len() < blob.len() {
            return Err(StoreError::InvalidLength {
                stored: blob.len(),
                buffer: buf.len(),
            });
        }
        buf[..blob.len()].copy_from_slice(blob);
        Ok(blob.len())
    }

    pub fn set_blob(&mut self, namespace: &str, key: &str, data: &[u8], limits: &Limits) -> StoreResult<()> {
        limits.check_name(key)?;
        limits.check_blob(data.len())?;

        let used = self.used();
        let keys = self
            .namespaces
            .get_mut(namespace)
            .ok_or(StoreError::InvalidHandle)?;

        // Replacing a blob frees its old entries first
        let freed = keys.get(key).map(|old| blob_footprint(old.len())).unwrap_or(0);
        let needed = blob_footprint(data.len());
        let available = limits.capacity.saturating_sub(used - freed);
        if needed > available {
            return Err(StoreError::NotEnoughSpace { needed, available });
        }

        keys.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    pub fn erase_key(&mut self, namespace: &str, key: &str) -> StoreResult<()> {
        self.namespaces
            .get_mut(namespace)
            .ok_or(StoreError::InvalidHandle)?
            .remove(key)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn namespace(&self, namespace: &str) -> StoreResult<&BTreeMap<String, Vec<u8>>> {
        self.namespaces.get(namespace).ok_or(StoreError::InvalidHandle)
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Serialize to header + payload
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    /// Parse and verify an encoded image
    ///
    /// A foreign version is reported as `NewVersionFound`; every other defect
    /// as `InvalidState`.
    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(StoreError::InvalidState(format!(
                "image too short: {} bytes",
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(StoreError::InvalidState(format!(
                "invalid image magic: expected NVSC, got {:?}",
                &bytes[0..4]
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(StoreError::NewVersionFound {
                found: version,
                expected: VERSION,
            });
        }

        let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        let crc = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        let payload = &bytes[HEADER_SIZE..];

        if payload.len() != len {
            return Err(StoreError::InvalidState(format!(
                "payload length {} does not match header length {}",
                payload.len(),
                len
            )));
        }

        if crc32fast::hash(payload) != crc {
            return Err(StoreError::InvalidState("image checksum mismatch".to_string()));
        }

        bincode::deserialize(payload).map_err(|e| StoreError::InvalidState(e.to_string()))
    }
}

// =============================================================================
// Shared image slot
// =============================================================================

/// An image behind a lock, `None` while the subsystem is not initialized
///
/// Both engines keep their state here and differ only in how an image is
/// loaded and made durable.
#[derive(Debug)]
pub(crate) struct ImageSlot {
    limits: Limits,
    image: RwLock<Option<Image>>,
}

impl ImageSlot {
    pub(crate) fn new(limits: Limits) -> Self {
        Self {
            limits,
            image: RwLock::new(None),
        }
    }

    pub(crate) fn limits(&self) -> &Limits {
        &self.limits
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.image.read().is_some()
    }

    /// Install an image unless one is already loaded
    pub(crate) fn init_with<F>(&self, load: F) -> StoreResult<()>
    where
        F: FnOnce() -> StoreResult<Image>,
    {
        let mut slot = self.image.write();
        if slot.is_some() {
            return Ok(());
        }

        let image = load()?;
        if image.used() > self.limits.capacity {
            return Err(StoreError::NoFreePages);
        }
        *slot = Some(image);
        Ok(())
    }

    /// Drop the loaded image
    pub(crate) fn clear(&self) {
        *self.image.write() = None;
    }

    pub(crate) fn open(&self, name: &str, mode: OpenMode) -> StoreResult<()> {
        self.limits.check_name(name)?;
        self.write(|image, limits| match mode {
            OpenMode::ReadOnly if !image.has_namespace(name) => Err(StoreError::NotFound),
            OpenMode::ReadOnly => Ok(()),
            OpenMode::ReadWrite => image.create_namespace(name, limits),
        })
    }

    pub(crate) fn read<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Image) -> StoreResult<T>,
    {
        let slot = self.image.read();
        let image = slot.as_ref().ok_or(StoreError::NotInitialized)?;
        f(image)
    }

    pub(crate) fn write<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Image, &Limits) -> StoreResult<T>,
    {
        let mut slot = self.image.write();
        let image = slot.as_mut().ok_or(StoreError::NotInitialized)?;
        f(image, &self.limits)
    }
}
