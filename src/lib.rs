//! # nvscell
//!
//! Persisted values that read like local variables:
//! - Values are loaded eagerly when a cell is constructed
//! - Reads are served from the in-memory cache
//! - Writes hit the store only when the value actually changed
//! - Every accepted write is followed by a durability commit
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application code                        │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//!        ┌──────────────┐              ┌─────────────────┐
//!        │ NvsValue<T>  │              │ NvsStringValue  │
//!        │ (fixed-size) │              │ (variable-len)  │
//!        └──────┬───────┘              └────────┬────────┘
//!               │        size query / get       │
//!               └──────────────┬────────────────┘
//!                              ▼
//!                    ┌───────────────────┐      ┌─────────────┐
//!                    │ Namespace handle  │◄─────│ Initializer │
//!                    └─────────┬─────────┘      └─────────────┘
//!                              ▼
//!                    ┌───────────────────┐
//!                    │ Partition engine  │
//!                    │ (memory / file)   │
//!                    └───────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

#[macro_use]
pub mod log;

pub mod error;
pub mod config;
pub mod status;

pub mod store;
pub mod query;
pub mod init;
pub mod value;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{NvsError, Result};
pub use config::Config;
pub use status::{QueryResult, UpdateResult};
pub use log::LogLevel;
pub use store::{Namespace, OpenMode, Partition, StoreError};
pub use query::{query_size, SizeQuery};
pub use init::initialize;
pub use value::{NvsStringValue, NvsValue, Record};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of nvscell
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
