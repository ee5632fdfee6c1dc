//! Logging Shim
//!
//! Process-wide severity filter plus a replaceable sink.
//!
//! ## Responsibilities
//! - Hold the current threshold (default: Info)
//! - Drop messages numerically greater than the threshold before formatting
//! - Hand surviving messages to the installed sink (default: stdout)
//!
//! ## Line Format
//! ```text
//! [NVS] [<LevelName>] <message>
//! ```
//!
//! The threshold is a plain atomic. Readers may observe an update late on
//! multi-core targets; nothing depends on stricter ordering.

mod sink;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::NvsError;

pub use sink::{format_line, LogSink, StdoutSink, TracingSink};

/// Emit a message through the logging shim
///
/// The threshold is checked before the message is formatted.
///
/// ```
/// use nvscell::{nvs_log, LogLevel};
///
/// let key = "wifi_ssid";
/// nvs_log!(LogLevel::Debug, "Failed to read key {}", key);
/// ```
#[macro_export]
macro_rules! nvs_log {
    ($level:expr, $($arg:tt)+) => {
        $crate::log::emit($level, format_args!($($arg)+))
    };
}

/// Severity of a log message (lower = more severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    Critical = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Critical,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Critical => "Critical",
            LogLevel::Error => "Error",
            LogLevel::Warning => "Warning",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert a raw threshold byte, saturating at Trace
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Critical,
            1 => LogLevel::Error,
            2 => LogLevel::Warning,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = NvsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .or(match s.to_ascii_lowercase().as_str() {
                "warn" => Some(LogLevel::Warning),
                "crit" => Some(LogLevel::Critical),
                _ => None,
            })
            .ok_or_else(|| NvsError::Config(format!("Unknown log level: {}", s)))
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> tracing::Level {
        match level {
            LogLevel::Critical | LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// =============================================================================
// Global State
// =============================================================================

static THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Installed sink; `None` means the stdout default
static SINK: RwLock<Option<Arc<dyn LogSink>>> = parking_lot::const_rwlock(None);

/// Set the global threshold. Levels greater than `level` are ignored.
pub fn set_log_level(level: LogLevel) {
    THRESHOLD.store(level as u8, Ordering::Relaxed);
}

/// Current global threshold
pub fn log_level() -> LogLevel {
    LogLevel::from_u8(THRESHOLD.load(Ordering::Relaxed))
}

/// Whether a message at `level` passes the threshold
pub fn enabled(level: LogLevel) -> bool {
    level <= log_level()
}

/// Replace the sink every subsequent message is handed to
pub fn set_sink(sink: Arc<dyn LogSink>) {
    *SINK.write() = Some(sink);
}

/// Install a closure as the sink
pub fn set_sink_fn<F>(f: F)
where
    F: Fn(LogLevel, fmt::Arguments<'_>) + Send + Sync + 'static,
{
    set_sink(Arc::new(f));
}

/// Restore the stdout sink
pub fn reset_sink() {
    *SINK.write() = None;
}

/// Filter and emit one message
///
/// Never fails: sinks swallow their own I/O errors.
pub fn emit(level: LogLevel, args: fmt::Arguments<'_>) {
    if !enabled(level) {
        return;
    }

    // Clone out of the lock so a sink may itself call set_sink()
    let sink = SINK.read().clone();
    match sink {
        Some(sink) => sink.log(level, args),
        None => StdoutSink.log(level, args),
    }
}
