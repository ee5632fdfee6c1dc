//! Log sinks
//!
//! Where filtered messages end up.

use std::fmt;
use std::io::{self, Write};

use super::LogLevel;

/// Tag prefixed to every line
pub const TAG: &str = "NVS";

/// Destination for log messages that passed the threshold
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>);
}

impl<F> LogSink for F
where
    F: Fn(LogLevel, fmt::Arguments<'_>) + Send + Sync,
{
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        self(level, args)
    }
}

/// Render the canonical line, newline included
pub fn format_line(level: LogLevel, args: fmt::Arguments<'_>) -> String {
    format!("[{}] [{}] {}\n", TAG, level.as_str(), args)
}

/// Default sink: one line per message on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "[{}] [{}] {}", TAG, level.as_str(), args);
    }
}

/// Forwards messages to `tracing` under the `nvscell` target
///
/// The shim threshold still applies first; the subscriber filters again.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        match level {
            LogLevel::Critical => tracing::error!(target: "nvscell", critical = true, "{}", args),
            LogLevel::Error => tracing::error!(target: "nvscell", "{}", args),
            LogLevel::Warning => tracing::warn!(target: "nvscell", "{}", args),
            LogLevel::Info => tracing::info!(target: "nvscell", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "nvscell", "{}", args),
            LogLevel::Trace => tracing::trace!(target: "nvscell", "{}", args),
        }
    }
}
