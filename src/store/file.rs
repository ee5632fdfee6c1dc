//! File-backed engine
//!
//! Keeps the partition image in memory and persists it as a single
//! checksummed file on `commit()`.
//!
//! ## Durability
//! - `set_blob()` / `erase_key()` only stage changes in memory
//! - `commit()` writes `<image>.tmp`, fsyncs it and renames it over the image
//! - A crash before `commit()` loses staged changes, never the previous image

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;

use super::image::ImageSlot;
use super::{Image, Limits, Namespace, OpenMode, Partition, StoreError, StoreResult};

#[derive(Debug)]
struct Shared {
    path: PathBuf,
    slot: ImageSlot,
}

impl Shared {
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn load(&self) -> StoreResult<Image> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No image at {}, starting empty", self.path.display());
                return Ok(Image::new());
            }
            Err(e) => return Err(e.into()),
        };

        let image = Image::decode(&bytes)?;
        tracing::debug!(
            "Loaded image {} ({} bytes, {} namespaces)",
            self.path.display(),
            bytes.len(),
            image.namespaces().len()
        );
        Ok(image)
    }

    fn persist(&self) -> StoreResult<()> {
        let bytes = self.slot.read(|image| image.encode())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        tracing::trace!("Committed image {} ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }
}

/// Partition persisted as one image file
#[derive(Debug, Clone)]
pub struct FilePartition {
    shared: Arc<Shared>,
}

impl FilePartition {
    /// Create a partition over `config.image_path`
    ///
    /// Nothing is read until `init()`.
    pub fn open(config: &Config) -> Self {
        Self::with_limits(&config.image_path, Limits::from_config(config))
    }

    pub fn with_limits(path: impl Into<PathBuf>, limits: Limits) -> Self {
        Self {
            shared: Arc::new(Shared {
                path: path.into(),
                slot: ImageSlot::new(limits),
            }),
        }
    }

    /// Path of the image file
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.slot.is_initialized()
    }

    /// Namespace names in sorted order
    pub fn namespaces(&self) -> StoreResult<Vec<String>> {
        self.shared.slot.read(|image| Ok(image.namespaces()))
    }

    /// `(key, blob length)` pairs of a namespace
    pub fn entries(&self, namespace: &str) -> StoreResult<Vec<(String, usize)>> {
        self.shared.slot.read(|image| image.entries(namespace))
    }

    /// Accounted bytes in use
    pub fn used(&self) -> StoreResult<usize> {
        self.shared.slot.read(|image| Ok(image.used()))
    }

    /// Capacity from the configured limits
    pub fn capacity(&self) -> usize {
        self.shared.slot.limits().capacity
    }
}

impl Partition for FilePartition {
    type Handle = FileNamespace;

    fn init(&self) -> StoreResult<()> {
        self.shared.slot.init_with(|| self.shared.load())
    }

    fn erase_all(&self) -> StoreResult<()> {
        self.shared.slot.clear();

        for path in [self.shared.path.clone(), self.shared.tmp_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove {}: {}", path.display(), e);
                    return Err(e.into());
                }
            }
        }

        tracing::debug!("Erased image {}", self.shared.path.display());
        Ok(())
    }

    fn open_namespace(&self, name: &str, mode: OpenMode) -> StoreResult<FileNamespace> {
        self.shared.slot.open(name, mode)?;
        Ok(FileNamespace {
            shared: Arc::clone(&self.shared),
            name: Arc::from(name),
            mode,
        })
    }

    fn close_namespace(&self, handle: FileNamespace) {
        tracing::trace!("Closing namespace {}", handle.name);
    }
}

/// Handle to a namespace of a `FilePartition`
#[derive(Debug, Clone)]
pub struct FileNamespace {
    shared: Arc<Shared>,
    name: Arc<str>,
    mode: OpenMode,
}

impl FileNamespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }
}

impl Namespace for FileNamespace {
    fn blob_size(&self, key: &str) -> StoreResult<usize> {
        self.shared.slot.read(|image| image.blob_size(&self.name, key))
    }

    fn get_blob(&self, key: &str, buf: &mut [u8]) -> StoreResult<usize> {
        self.shared.slot.read(|image| image.get_blob(&self.name, key, buf))
    }

    fn set_blob(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StoreError::ReadOnly);
        }
        self.shared
            .slot
            .write(|image, limits| image.set_blob(&self.name, key, data, limits))
    }

    fn erase_key(&self, key: &str) -> StoreResult<()> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StoreError::ReadOnly);
        }
        self.shared.slot.write(|image, _| image.erase_key(&self.name, key))
    }

    fn commit(&self) -> StoreResult<()> {
        if self.mode == OpenMode::ReadOnly {
            return self.shared.slot.read(|_| Ok(()));
        }
        self.shared.persist()
    }
}
