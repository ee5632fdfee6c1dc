//! Variable-length value cell
//!
//! Holds any byte sequence, text or binary (NUL bytes included).

use std::borrow::Cow;
use std::ffi::CStr;

use crate::error::{NvsError, Result};
use crate::log::LogLevel;
use crate::query::{query_size, SizeQuery};
use crate::status::UpdateResult;
use crate::store::{Namespace, StoreError};

/// A byte string persisted under one key
#[derive(Debug)]
pub struct NvsStringValue<H> {
    handle: Option<H>,
    key: String,
    value: Vec<u8>,
    default: Vec<u8>,
    exists: bool,
}

impl<H: Namespace + Clone> NvsStringValue<H> {
    /// Bind to `key` with an empty default, then load
    pub fn new(handle: H, key: impl Into<String>) -> Self {
        Self::with_default(handle, key, Vec::new())
    }

    /// Bind to `key` with an explicit default, then load
    pub fn with_default(handle: H, key: impl Into<String>, default: impl Into<Vec<u8>>) -> Self {
        let default = default.into();
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

    /// A cell bound to nothing
    pub fn unbound() -> Self {
        Self {
            handle: None,
            key: String::new(),
            value: Vec::new(),
            default: Vec::new(),
            exists: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Cached value as text, if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }

    pub fn default_value(&self) -> &[u8] {
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

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Inverse of `exists()`
    ///
    /// Not `len() == 0`: an absent key with a non-empty default is empty
    /// while `len()` reports the default's length, and an existing empty
    /// string is not empty.
    pub fn is_empty(&self) -> bool {
        !self.exists
    }

    /// Length of the cached value in bytes
    pub fn len(&self) -> usize {
        self.value.len()
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Re-read the value from the store
    ///
    /// Any stored length is accepted. A failed read keeps the previous value.
    pub fn reload(&mut self) -> Result<bool> {
        nvs_log!(LogLevel::Trace, "Reading key {}", self.key);

        let handle = match self.handle.as_ref() {
            Some(handle) => handle,
            None => {
                nvs_log!(LogLevel::Critical, "Invalid NVS instance for key {}", self.key);
                return Err(NvsError::NotInitialized);
            }
        };

        // Step 1: Size probe
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
        self.exists = true;
        nvs_log!(LogLevel::Trace, "Found that NVS key {} has value size {}", self.key, size);

        // Step 2: Read into a buffer of exactly that size
        let mut buf = vec![0u8; size];
        let read = handle.get_blob(&self.key, &mut buf).and_then(|n| {
            if n == size {
                Ok(())
            } else {
                Err(StoreError::InvalidLength {
                    stored: n,
                    buffer: size,
                })
            }
        });
        if let Err(e) = read {
            nvs_log!(LogLevel::Warning, "Failed to read NVS key {}: {}", self.key, e);
            return Err(NvsError::StoreRead {
                key: self.key.clone(),
                source: e,
            });
        }

        self.value = buf;
        nvs_log!(
            LogLevel::Debug,
            "Key {} exists in NVS and has value {}",
            self.key,
            String::from_utf8_lossy(&self.value)
        );
        Ok(true)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Persist text if it differs from the cached value
    pub fn set(&mut self, new_value: &str) -> UpdateResult {
        self.set_bytes(new_value.as_bytes())
    }

    /// Persist raw bytes if they differ from the cached value
    pub fn set_bytes(&mut self, data: &[u8]) -> UpdateResult {
        if self.handle.is_none() {
            return UpdateResult::NotInitialized;
        }
        if self.value == data {
            return UpdateResult::Unchanged;
        }
        self.write(data)
    }

    /// Persist NUL-terminated text; `None` reports `Nullptr`
    ///
    /// The terminator is not stored.
    pub fn set_cstr(&mut self, text: Option<&CStr>) -> UpdateResult {
        if self.handle.is_none() {
            return UpdateResult::NotInitialized;
        }
        let bytes = match text {
            Some(text) => text.to_bytes(),
            None => return UpdateResult::Nullptr,
        };
        if self.value == bytes {
            return UpdateResult::Unchanged;
        }
        self.write(bytes)
    }

    /// Remove the key from the store and fall back to the default
    ///
    /// `Unchanged` if the store holds no entry for the key.
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

    /// Write `data` under the key; the single path every setter ends in
    fn write(&mut self, data: &[u8]) -> UpdateResult {
        match self.store(data) {
            Ok(()) => UpdateResult::Updated,
            Err(ref e) => UpdateResult::from(e),
        }
    }

    fn store(&mut self, data: &[u8]) -> Result<()> {
        let handle = self.handle.as_ref().ok_or(NvsError::NotInitialized)?;

        super::write_blob(handle, &self.key, data)?;

        self.value = data.to_vec();
        self.exists = true;
        nvs_log!(
            LogLevel::Trace,
            "Successfully written NVS key {} to value {} of len {}",
            self.key,
            String::from_utf8_lossy(&self.value),
            data.len()
        );

        super::commit(handle, &self.key)
    }
}

impl<H: Namespace + Clone> Default for NvsStringValue<H> {
    fn default() -> Self {
        Self::unbound()
    }
}

/// Clones start absent and re-read the store; the source's cache is never copied
impl<H: Namespace + Clone> Clone for NvsStringValue<H> {
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
