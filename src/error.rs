//! Error types for nvscell
//!
//! Provides a unified error type for cell, query and initializer operations.
//! Engine-level failures are carried as [`StoreError`] sources.

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using NvsError
pub type Result<T> = std::result::Result<T, NvsError>;

/// Unified error type for nvscell operations
#[derive(Debug, Error)]
pub enum NvsError {
    // -------------------------------------------------------------------------
    // Cell Errors
    // -------------------------------------------------------------------------
    #[error("Cell is not bound to a namespace handle")]
    NotInitialized,

    #[error("Null value passed as argument")]
    Nullptr,

    #[error("Size of stored value for key {key} ({actual} bytes) does not match expected size {expected}")]
    SchemaSizeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read key {key}: {source}")]
    StoreRead {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to write key {key}: {source}")]
    StoreWrite {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to get size of key {key}: {source}")]
    StoreQuery {
        key: String,
        #[source]
        source: StoreError,
    },

    // -------------------------------------------------------------------------
    // Initialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to initialize store: {source}")]
    Init {
        #[source]
        source: StoreError,
    },

    #[error("Failed to open namespace {namespace}: {source}")]
    OpenNamespace {
        namespace: String,
        #[source]
        source: StoreError,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NvsError {
    /// The store error underneath this failure, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            NvsError::StoreRead { source, .. }
            | NvsError::StoreWrite { source, .. }
            | NvsError::StoreQuery { source, .. }
            | NvsError::Init { source }
            | NvsError::OpenNamespace { source, .. } => Some(source),
            _ => None,
        }
    }
}
