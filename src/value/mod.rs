//! Value Module
//!
//! Dirty-checked cells caching one persisted key each.
//!
//! ## Responsibilities
//! - Load the persisted value when a cell is constructed
//! - Serve reads from the in-memory cache
//! - Write only when a new value differs from the cached one
//! - Commit after every accepted write
//!
//! ## Cell Kinds
//! - `NvsValue<H, T>`: fixed-size `Record`; a stored blob of any other length
//!   is treated as absent
//! - `NvsStringValue<H>`: variable-length bytes, binary-safe
//!
//! Both kinds share the `UpdateResult` vocabulary but no code path that
//! would make one a special case of the other.
//!
//! ## Set Sequence (stage-then-commit)
//! ```text
//! unbound? ──► NotInitialized
//! equal?   ──► Unchanged
//! set_blob ──err──► Error        (cache untouched)
//!    │
//!    ▼
//! apply cache + exists
//!    │
//! commit   ──err──► Error        (cache keeps the accepted value)
//!    │
//!    ▼
//! Updated
//! ```

mod record;
mod fixed;
mod string;

pub use record::Record;
pub use fixed::NvsValue;
pub use string::NvsStringValue;

use crate::error::{NvsError, Result};
use crate::log::LogLevel;
use crate::store::Namespace;

/// Write one blob, logging a rejected write at Critical
fn write_blob<H: Namespace>(handle: &H, key: &str, data: &[u8]) -> Result<()> {
    handle.set_blob(key, data).map_err(|e| {
        nvs_log!(LogLevel::Critical, "Failed to write NVS key {}: {}", key, e);
        NvsError::StoreWrite {
            key: key.to_string(),
            source: e,
        }
    })
}

/// Commit after an accepted write or erase
fn commit<H: Namespace>(handle: &H, key: &str) -> Result<()> {
    handle.commit().map_err(|e| {
        nvs_log!(LogLevel::Critical, "Failed to commit NVS key {}: {}", key, e);
        NvsError::StoreWrite {
            key: key.to_string(),
            source: e,
        }
    })
}
