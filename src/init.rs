//! Store Initializer
//!
//! Brings a partition up and opens a namespace on it.
//!
//! ## Recovery Path
//! ```text
//! init() ──ok──────────────────────────────────────► open_namespace()
//!   │
//!   └─ NoFreePages / NewVersionFound / InvalidState (and reinit allowed)
//!         │
//!         ▼
//!     erase_all()  (failure ignored)
//!         │
//!         ▼
//!     init() ──ok──► open_namespace()
//!         │
//!         └─ err ──► Err(Init)   (no further retries)
//! ```

use crate::config::Config;
use crate::error::{NvsError, Result};
use crate::log::LogLevel;
use crate::store::{OpenMode, Partition};

/// Initialize `partition` and open `namespace` read-write
///
/// With `allow_reinit`, a recoverable init failure erases the whole
/// partition and retries exactly once.
pub fn initialize<P: Partition>(partition: &P, namespace: &str, allow_reinit: bool) -> Result<P::Handle> {
    init_partition(partition, allow_reinit)?;

    partition
        .open_namespace(namespace, OpenMode::ReadWrite)
        .map_err(|e| {
            nvs_log!(LogLevel::Error, "Failed to open namespace {}: {}", namespace, e);
            NvsError::OpenNamespace {
                namespace: namespace.to_string(),
                source: e,
            }
        })
}

/// `initialize` with the reinit policy taken from `config`
pub fn initialize_with<P: Partition>(partition: &P, config: &Config, namespace: &str) -> Result<P::Handle> {
    initialize(partition, namespace, config.allow_reinit)
}

/// Initialize `partition` and open an existing `namespace` read-only
///
/// Never erases anything: a corrupted partition is reported, not repaired.
pub fn open_read_only<P: Partition>(partition: &P, namespace: &str) -> Result<P::Handle> {
    init_partition(partition, false)?;

    partition
        .open_namespace(namespace, OpenMode::ReadOnly)
        .map_err(|e| {
            nvs_log!(LogLevel::Error, "Failed to open namespace {} read-only: {}", namespace, e);
            NvsError::OpenNamespace {
                namespace: namespace.to_string(),
                source: e,
            }
        })
}

fn init_partition<P: Partition>(partition: &P, allow_reinit: bool) -> Result<()> {
    let err = match partition.init() {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if !(allow_reinit && err.needs_reinit()) {
        nvs_log!(LogLevel::Error, "Failed to initialize store: {}", err);
        return Err(NvsError::Init { source: err });
    }

    nvs_log!(LogLevel::Warning, "Store needs reinitialization ({}), erasing", err);
    if let Err(e) = partition.erase_all() {
        nvs_log!(LogLevel::Warning, "Failed to erase store: {}", e);
    }

    partition.init().map_err(|e| {
        nvs_log!(LogLevel::Error, "Failed to initialize store after erase: {}", e);
        NvsError::Init { source: e }
    })
}
