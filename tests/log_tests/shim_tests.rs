//! Tests for the logging shim
//!
//! Threshold and sink are process-wide, so every test holds `LOCK` and
//! restores the defaults through `Capture`'s drop.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::setup_memory;
use nvscell::log::{self, format_line, LogLevel};
use nvscell::store::{MemoryNamespace, Namespace};
use nvscell::{NvsStringValue, NvsValue};
use parking_lot::{Mutex, MutexGuard};

static LOCK: Mutex<()> = parking_lot::const_mutex(());

// =============================================================================
// Helper Functions
// =============================================================================

/// Routes shim output into a vector for the duration of a test
struct Capture {
    lines: Arc<Mutex<Vec<(LogLevel, String)>>>,
    _guard: MutexGuard<'static, ()>,
}

impl Capture {
    fn install(level: LogLevel) -> Self {
        let guard = LOCK.lock();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        log::set_sink_fn(move |level, args| {
            sink_lines.lock().push((level, args.to_string()));
        });
        log::set_log_level(level);
        Self { lines, _guard: guard }
    }

    fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    fn levels(&self) -> Vec<LogLevel> {
        self.lines().into_iter().map(|(level, _)| level).collect()
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        log::reset_sink();
        log::set_log_level(LogLevel::Info);
    }
}

// =============================================================================
// Threshold Tests
// =============================================================================

#[test]
fn test_default_threshold_is_info() {
    let _guard = LOCK.lock();

    assert_eq!(log::log_level(), LogLevel::Info);
    assert!(log::enabled(LogLevel::Info));
    assert!(log::enabled(LogLevel::Critical));
    assert!(!log::enabled(LogLevel::Debug));
}

#[test]
fn test_threshold_filters_messages() {
    let capture = Capture::install(LogLevel::Warning);

    log::emit(LogLevel::Critical, format_args!("crit"));
    log::emit(LogLevel::Error, format_args!("err"));
    log::emit(LogLevel::Warning, format_args!("warn"));
    log::emit(LogLevel::Info, format_args!("info"));
    log::emit(LogLevel::Trace, format_args!("trace"));

    assert_eq!(
        capture.levels(),
        vec![LogLevel::Critical, LogLevel::Error, LogLevel::Warning]
    );
}

#[test]
fn test_trace_threshold_passes_everything() {
    let capture = Capture::install(LogLevel::Trace);

    for level in LogLevel::ALL {
        log::emit(level, format_args!("{}", level));
    }

    assert_eq!(capture.levels(), LogLevel::ALL.to_vec());
}

#[test]
fn test_threshold_change_applies_immediately() {
    let capture = Capture::install(LogLevel::Critical);

    log::emit(LogLevel::Error, format_args!("dropped"));
    log::set_log_level(LogLevel::Error);
    log::emit(LogLevel::Error, format_args!("kept"));

    assert_eq!(capture.lines(), vec![(LogLevel::Error, "kept".to_string())]);
}

#[test]
fn test_config_applies_level() {
    let capture = Capture::install(LogLevel::Info);
    let config = nvscell::Config::builder().log_level(LogLevel::Debug).build();

    config.apply_log_level();

    assert_eq!(log::log_level(), LogLevel::Debug);
    drop(capture);
    assert_eq!(log::log_level(), LogLevel::Info);
}

// =============================================================================
// Sink Tests
// =============================================================================

#[test]
fn test_reset_sink_stops_capture() {
    let capture = Capture::install(LogLevel::Info);

    log::emit(LogLevel::Info, format_args!("first"));
    log::reset_sink();
    log::emit(LogLevel::Info, format_args!("second"));

    assert_eq!(capture.lines(), vec![(LogLevel::Info, "first".to_string())]);
}

#[test]
fn test_exported_macro_filters_and_formats() {
    let capture = Capture::install(LogLevel::Warning);

    nvscell::nvs_log!(LogLevel::Warning, "hello {}", 42);
    nvscell::nvs_log!(LogLevel::Debug, "dropped {}", 1);

    assert_eq!(capture.lines(), vec![(LogLevel::Warning, "hello 42".to_string())]);
}

#[test]
fn test_format_line() {
    assert_eq!(
        format_line(LogLevel::Warning, format_args!("hello {}", 42)),
        "[NVS] [Warning] hello 42\n"
    );
    assert_eq!(
        format_line(LogLevel::Critical, format_args!("boom")),
        "[NVS] [Critical] boom\n"
    );
}

// =============================================================================
// Level Tests
// =============================================================================

#[test]
fn test_level_ordering() {
    assert!(LogLevel::Critical < LogLevel::Error);
    assert!(LogLevel::Error < LogLevel::Warning);
    assert!(LogLevel::Warning < LogLevel::Info);
    assert!(LogLevel::Info < LogLevel::Debug);
    assert!(LogLevel::Debug < LogLevel::Trace);
}

#[test]
fn test_level_parsing() {
    assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
    assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
    assert_eq!("Debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
    assert_eq!("crit".parse::<LogLevel>().unwrap(), LogLevel::Critical);
    assert!("verbose".parse::<LogLevel>().is_err());
}

#[test]
fn test_tracing_level_mapping() {
    assert_eq!(tracing::Level::from(LogLevel::Critical), tracing::Level::ERROR);
    assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    assert_eq!(tracing::Level::from(LogLevel::Warning), tracing::Level::WARN);
    assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
}

// =============================================================================
// Cell Logging Tests
// =============================================================================

#[test]
fn test_unbound_reload_logs_critical() {
    let capture = Capture::install(LogLevel::Info);
    let mut cell: NvsValue<MemoryNamespace, u32> = NvsValue::unbound();

    let _ = cell.reload();

    assert_eq!(capture.levels(), vec![LogLevel::Critical]);
}

#[test]
fn test_size_mismatch_logs_warning() {
    let capture = Capture::install(LogLevel::Info);
    let (_partition, handle) = setup_memory("test");
    handle.set_blob("counter", &7u32.to_le_bytes()).unwrap();

    let cell: NvsValue<_, u16> = NvsValue::new(handle, "counter");

    assert!(!cell.exists());
    let lines = capture.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].0, LogLevel::Warning);
    assert!(lines[0].1.contains("counter"));
}

#[test]
fn test_quiet_below_threshold() {
    let capture = Capture::install(LogLevel::Warning);
    let (_partition, handle) = setup_memory("test");

    let mut cell = NvsStringValue::new(handle, "wifi_ssid");
    cell.set("home");
    cell.set("home");

    assert!(capture.lines().is_empty());
}
