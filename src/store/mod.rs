//! Store Module
//!
//! The contract a key-value blob engine must fulfil, plus two reference
//! engines implementing it.
//!
//! ## Responsibilities
//! - Define the four primitives cells rely on (size, get, set, commit)
//! - Define subsystem init/erase and namespace open/close for the initializer
//! - Carry the engine's error codes (`StoreError`)
//! - Account entry footprints against partition capacity
//!
//! ## Engines
//! - `MemoryPartition`: volatile, counts every primitive call
//! - `FilePartition`: persists a checksummed image on `commit()`
//!
//! ## Footprint Accounting
//! ```text
//! namespace  = 1 entry
//! blob(len)  = 1 header entry + ceil(len / 32) data entries
//! entry      = 32 bytes
//! ```

mod image;
mod memory;
mod file;

use std::io;

use thiserror::Error;

use crate::config::Config;

pub use image::{Image, HEADER_SIZE, MAGIC, VERSION};
pub use memory::{MemoryNamespace, MemoryPartition, StoreStats};
pub use file::{FileNamespace, FilePartition};

/// Result type for engine primitives
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Size of one accounted storage entry in bytes
pub const ENTRY_SIZE: usize = 32;

/// Error codes reported by a storage engine
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Key not found")]
    NotFound,

    #[error("Storage is not initialized")]
    NotInitialized,

    #[error("Handle refers to a namespace that no longer exists")]
    InvalidHandle,

    // -------------------------------------------------------------------------
    // Conditions recoverable by erase + reinit
    // -------------------------------------------------------------------------
    #[error("No free pages")]
    NoFreePages,

    #[error("Image version {found} found, expected {expected}")]
    NewVersionFound { found: u16, expected: u16 },

    #[error("Invalid persisted state: {0}")]
    InvalidState(String),

    // -------------------------------------------------------------------------
    // Argument / capacity errors
    // -------------------------------------------------------------------------
    #[error("Not enough space: need {needed} bytes, {available} available")]
    NotEnoughSpace { needed: usize, available: usize },

    #[error("Invalid length: stored value has {stored} bytes, buffer holds {buffer}")]
    InvalidLength { stored: usize, buffer: usize },

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Value too long: {len} bytes (max {max})")]
    ValueTooLong { len: usize, max: usize },

    #[error("Handle is read-only")]
    ReadOnly,

    // -------------------------------------------------------------------------
    // Backend errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether erasing the partition and initializing again may clear this error
    pub fn needs_reinit(&self) -> bool {
        matches!(
            self,
            StoreError::NoFreePages | StoreError::NewVersionFound { .. } | StoreError::InvalidState(_)
        )
    }
}

/// Access mode of a namespace handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// An opened namespace: the primitives a value cell uses
///
/// Implementations are handles; cloning one yields another reference to the
/// same namespace, never a copy of its data.
pub trait Namespace {
    /// Size of the blob stored under `key` without transferring it
    ///
    /// Returns `StoreError::NotFound` if the key is absent.
    fn blob_size(&self, key: &str) -> StoreResult<usize>;

    /// Copy the blob under `key` into `buf`, returning the number of bytes
    ///
    /// `buf` must be at least as large as the stored blob.
    fn get_blob(&self, key: &str, buf: &mut [u8]) -> StoreResult<usize>;

    /// Store `data` under `key`, replacing any previous blob
    fn set_blob(&self, key: &str, data: &[u8]) -> StoreResult<()>;

    /// Remove `key`; `StoreError::NotFound` if absent
    fn erase_key(&self, key: &str) -> StoreResult<()>;

    /// Make all previous writes durable
    fn commit(&self) -> StoreResult<()>;
}

/// A storage partition: subsystem lifecycle and namespace management
pub trait Partition {
    type Handle: Namespace + Clone;

    /// Bring the subsystem up (idempotent)
    fn init(&self) -> StoreResult<()>;

    /// Erase every namespace; `init()` must run again afterwards
    fn erase_all(&self) -> StoreResult<()>;

    /// Open (or, for `ReadWrite`, create) a namespace
    fn open_namespace(&self, name: &str, mode: OpenMode) -> StoreResult<Self::Handle>;

    /// Release a handle obtained from `open_namespace`
    fn close_namespace(&self, handle: Self::Handle);
}

// =============================================================================
// Limits
// =============================================================================

/// Engine limits derived from `Config`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub capacity: usize,
    pub max_key_len: usize,
    pub max_blob_len: usize,
}

impl Limits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            capacity: config.capacity,
            max_key_len: config.max_key_len,
            max_blob_len: config.max_blob_len,
        }
    }

    /// Check a key or namespace name
    pub fn check_name(&self, name: &str) -> StoreResult<()> {
        if name.is_empty() || name.len() > self.max_key_len {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// Check a blob length
    pub fn check_blob(&self, len: usize) -> StoreResult<()> {
        if len > self.max_blob_len {
            return Err(StoreError::ValueTooLong {
                len,
                max: self.max_blob_len,
            });
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Accounted size of a blob of `len` bytes
pub fn blob_footprint(len: usize) -> usize {
    ENTRY_SIZE * (1 + (len + ENTRY_SIZE - 1) / ENTRY_SIZE)
}
