//! Status codes
//!
//! Numeric result vocabulary shared by both cell kinds. Negative codes are
//! failures, non-negative codes are successes.

use std::fmt;

use crate::error::NvsError;

/// Outcome of a cell mutation (`set`, `erase`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum UpdateResult {
    /// The value changed and was written to the store
    Updated = 0,

    /// The value was already current, nothing was written
    Unchanged = 1,

    /// The cell is not bound to a namespace handle
    NotInitialized = -1,

    /// A null value was passed as argument
    Nullptr = -2,

    /// The store rejected the write
    Error = -3,
}

impl UpdateResult {
    /// Name of the status code
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateResult::Updated => "Updated",
            UpdateResult::Unchanged => "Unchanged",
            UpdateResult::NotInitialized => "NotInitialized",
            UpdateResult::Nullptr => "Nullptr",
            UpdateResult::Error => "Error",
        }
    }

    /// Numeric code of the status
    pub fn code(&self) -> i8 {
        *self as i8
    }

    /// Parse a numeric code
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(UpdateResult::Updated),
            1 => Some(UpdateResult::Unchanged),
            -1 => Some(UpdateResult::NotInitialized),
            -2 => Some(UpdateResult::Nullptr),
            -3 => Some(UpdateResult::Error),
            _ => None,
        }
    }

    /// `Updated` or `Unchanged`
    pub fn is_success(&self) -> bool {
        self.code() >= 0
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for UpdateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UpdateResult> for i8 {
    fn from(result: UpdateResult) -> i8 {
        result.code()
    }
}

impl From<&NvsError> for UpdateResult {
    fn from(error: &NvsError) -> Self {
        match error {
            NvsError::NotInitialized => UpdateResult::NotInitialized,
            NvsError::Nullptr => UpdateResult::Nullptr,
            _ => UpdateResult::Error,
        }
    }
}

/// Closed three-way outcome of a size query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum QueryResult {
    Ok = 0,
    NotFound = 1,
    Error = -1,
}

impl QueryResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryResult::Ok => "OK",
            QueryResult::NotFound => "NotFound",
            QueryResult::Error => "Error",
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
