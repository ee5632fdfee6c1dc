//! Size query
//!
//! Probes the length of a stored blob without transferring it, so callers
//! can size a buffer before the real read.

use crate::status::QueryResult;
use crate::store::{Namespace, StoreError};

/// Outcome of a size probe
#[derive(Debug)]
pub enum SizeQuery {
    /// Key exists, blob has this many bytes
    Found(usize),

    /// Key does not exist (not an error)
    NotFound,

    /// The store failed to answer
    Error(StoreError),
}

impl SizeQuery {
    /// The closed three-way status of this outcome
    pub fn status(&self) -> QueryResult {
        match self {
            SizeQuery::Found(_) => QueryResult::Ok,
            SizeQuery::NotFound => QueryResult::NotFound,
            SizeQuery::Error(_) => QueryResult::Error,
        }
    }

    /// Blob size if found
    pub fn size(&self) -> Option<usize> {
        match self {
            SizeQuery::Found(size) => Some(*size),
            _ => None,
        }
    }
}

/// Ask `handle` for the size of the blob under `key`
pub fn query_size<H: Namespace + ?Sized>(handle: &H, key: &str) -> SizeQuery {
    match handle.blob_size(key) {
        Ok(size) => SizeQuery::Found(size),
        Err(StoreError::NotFound) => SizeQuery::NotFound,
        Err(e) => SizeQuery::Error(e),
    }
}
