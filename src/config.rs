//! Configuration for nvscell
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::log::LogLevel;

/// Main configuration for a store partition
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Image file used by the file-backed engine
    pub image_path: PathBuf,

    /// Usable partition size in bytes (footprint accounting)
    pub capacity: usize,

    /// Maximum length of key and namespace names in bytes
    pub max_key_len: usize,

    /// Maximum size of a single blob in bytes
    pub max_blob_len: usize,

    // -------------------------------------------------------------------------
    // Initialization Configuration
    // -------------------------------------------------------------------------
    /// Erase and retry once when init reports a recoverable corruption
    pub allow_reinit: bool,

    // -------------------------------------------------------------------------
    // Logging Configuration
    // -------------------------------------------------------------------------
    /// Threshold applied by `apply_log_level`
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("./nvs.img"),
            capacity: 24 * 1024, // 24 KB
            max_key_len: 15,
            max_blob_len: 4000,
            allow_reinit: true,
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Install `log_level` as the global shim threshold
    pub fn apply_log_level(&self) {
        crate::log::set_log_level(self.log_level);
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the image file path
    pub fn image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.image_path = path.into();
        self
    }

    /// Set the partition capacity (in bytes)
    pub fn capacity(mut self, bytes: usize) -> Self {
        self.config.capacity = bytes;
        self
    }

    /// Set the maximum key/namespace name length
    pub fn max_key_len(mut self, len: usize) -> Self {
        self.config.max_key_len = len;
        self
    }

    /// Set the maximum blob size (in bytes)
    pub fn max_blob_len(mut self, len: usize) -> Self {
        self.config.max_blob_len = len;
        self
    }

    /// Allow or forbid the erase-and-retry recovery path
    pub fn allow_reinit(mut self, allow: bool) -> Self {
        self.config.allow_reinit = allow;
        self
    }

    /// Set the log threshold
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
