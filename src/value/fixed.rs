//! Fixed-size value cell

use crate::error::{NvsError, Result};
use crate::log::LogLevel;
use crate::query::{query_size, SizeQuery};
use crate::status::UpdateResult;
use crate::store::{Namespace, StoreError};

use super::Record;

/// A `Record` persisted under one key
///
/// The value is read when the cell is constructed and cached afterwards.
/// `set()` only touches the store when the new value encodes differently
/// from the cached one.
#[derive(Debug)]
pub struct NvsValue<H, T> {
    /// `None` for an unbound cell, which never touches a store
    handle: Option<H>,
    key: String,
    value: T,
    /// Used while the key is absent; never written automatically
    default: T,
    exists: bool,
}

impl<H: Namespace + Clone, T: Record> NvsValue<H, T> {
    /// Bind to `key` with `T::default()` as default, then load
    pub fn new(handle: H, key: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self::with_default(handle, key, T::default())
    }

    /// Bind to `key` with an explicit default, then load
    ///
    /// Load failures are logged and leave the cell in the absent state.
    pub fn with_default(handle: H, key: impl Into<String>, default: T) -> Self {
        let mut cell = Self {
            handle: Some(handle),
            key: key.into(),
            value: default.clone(),
            default,
            exists: false,
        };
        let _ = cell.reload();
        cell
    }

    /// A cell bound to nothing; every store operation reports NotInitialized
    pub fn unbound() -> Self
    where
        T: Default,
    {
        Self {
            handle: None,
            key: String::new(),
            value: T::default(),
            default: T::default(),
            exists: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Cached value (copy)
    pub fn value(&self) -> T {
        self.value.clone()
    }

    /// Cached value (reference)
    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the key currently has a persisted entry
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Inverse of `exists()`
    pub fn is_empty(&self) -> bool {
        !self.exists
    }

    /// Encoded size of `T`, independent of what the store holds
    pub fn size(&self) -> usize {
        T::SIZE
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Re-read the value from the store
    ///
    /// Returns `Ok(true)` if a value was loaded and `Ok(false)` if the key is
    /// absent. On error the cell state is:
    /// - `NotInitialized`, `StoreQuery`: untouched
    /// - `SchemaSizeMismatch`: absent, value reset to default
    /// - `StoreRead`: `exists` set, previous value kept
    pub fn reload(&mut self) -> Result<bool> {
        nvs_log!(LogLevel::Trace, "Reading key {}", self.key);

        let handle = match self.handle.as_ref() {
            Some(handle) => handle,
            None => {
                nvs_log!(LogLevel::Critical, "Invalid NVS instance for key {}", self.key);
                return Err(NvsError::NotInitialized);
            }
        };

        let size = match query_size(handle, &self.key) {
            SizeQuery::Found(size) => size,
            SizeQuery::NotFound => {
                nvs_log!(LogLevel::Debug, "Key {} does not exist", self.key);
                self.exists = false;
                self.value = self.default.clone();
                return Ok(false);
            }
            SizeQuery::Error(e) => {
                nvs_log!(LogLevel::Error, "Failed to get size of NVS key {}: {}", self.key, e);
                return Err(NvsError::StoreQuery {
                    key: self.key.clone(),
                    source: e,
                });
            }
        };

        if size != T::SIZE {
            nvs_log!(
                LogLevel::Warning,
                "Size of value in NVS for key {} ({} bytes) does not match expected size {}",
                self.key,
                size,
                T::SIZE
            );
            self.exists = false;
            self.value = self.default.clone();
            return Err(NvsError::SchemaSizeMismatch {
                key: self.key.clone(),
                expected: T::SIZE,
                actual: size,
            });
        }

        self.exists = true;
        nvs_log!(LogLevel::Trace, "Found that NVS key {} has value size {}", self.key, size);

        let mut buf = vec![0u8; T::SIZE];
        let read = handle.get_blob(&self.key, &mut buf).and_then(|n| {
            if n == T::SIZE {
                Ok(())
            } else {
                Err(StoreError::InvalidLength {
                    stored: n,
                    buffer: T::SIZE,
                })
            }
        });
        if let Err(e) = read {
            // The blob changed between the size query and the read
            nvs_log!(LogLevel::Warning, "Failed to read NVS key {}: {}", self.key, e);
            return Err(NvsError::StoreRead {
                key: self.key.clone(),
                source: e,
            });
        }

        self.value = T::decode(&buf);
        nvs_log!(LogLevel::Debug, "Key {} exists in NVS ({} bytes)", self.key, T::SIZE);
        Ok(true)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Persist `new_value` if it differs from the cached value
    pub fn set(&mut self, new_value: T) -> UpdateResult {
        self.set_ref(Some(&new_value))
    }

    /// Like `set`, reporting `Nullptr` for `None`
    pub fn set_ref(&mut self, new_value: Option<&T>) -> UpdateResult {
        if self.handle.is_none() {
            return UpdateResult::NotInitialized;
        }
        let new_value = match new_value {
            Some(value) => value,
            None => return UpdateResult::Nullptr,
        };

        let bytes = new_value.to_bytes();
        if bytes == self.value.to_bytes() {
            return UpdateResult::Unchanged;
        }

        match self.store(new_value, &bytes) {
            Ok(()) => UpdateResult::Updated,
            Err(ref e) => UpdateResult::from(e),
        }
    }

    /// Remove the key from the store and fall back to the default
    ///
    /// `Unchanged` if the store holds no entry for the key. A blob of the
    /// wrong size still counts as an entry and is removed.
    pub fn erase(&mut self) -> UpdateResult {
        let handle = match self.handle.as_ref() {
            Some(handle) => handle,
            None => return UpdateResult::NotInitialized,
        };
        match handle.erase_key(&self.key) {
            Ok(()) => {}
            Err(StoreError::NotFound) => {
                self.exists = false;
                self.value = self.default.clone();
                return UpdateResult::Unchanged;
            }
            Err(e) => {
                nvs_log!(LogLevel::Critical, "Failed to erase NVS key {}: {}", self.key, e);
                return UpdateResult::Error;
            }
        }

        self.exists = false;
        self.value = self.default.clone();

        match super::commit(handle, &self.key) {
            Ok(()) => UpdateResult::Updated,
            Err(ref e) => UpdateResult::from(e),
        }
    }

    /// Stage-then-commit: the cache changes only once the store accepted the blob
    fn store(&mut self, new_value: &T, bytes: &[u8]) -> Result<()> {
        let handle = self.handle.as_ref().ok_or(NvsError::NotInitialized)?;

        super::write_blob(handle, &self.key, bytes)?;

        self.value = new_value.clone();
        self.exists = true;
        nvs_log!(LogLevel::Trace, "Successfully written NVS key {} ({} bytes)", self.key, bytes.len());

        super::commit(handle, &self.key)
    }
}

impl<H: Namespace + Clone, T: Record + Default> Default for NvsValue<H, T> {
    fn default() -> Self {
        Self::unbound()
    }
}

/// Clones start absent and re-read the store; the source's cache is never copied
impl<H: Namespace + Clone, T: Record> Clone for NvsValue<H, T> {
    fn clone(&self) -> Self {
        let mut cell = Self {
            handle: self.handle.clone(),
            key: self.key.clone(),
            value: self.default.clone(),
            default: self.default.clone(),
            exists: false,
        };
        if cell.is_bound() {
            let _ = cell.reload();
        }
        cell
    }
}
