//! Integration tests for the engine logging system
//!
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use std::sync::{Arc, Mutex};

use gek_engine::gek::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use gek_engine::gek::video::texture_loader::load_texture_file;
use gek_engine::gek::video::TextureLoadFlags;
use gek_engine::gek::{Engine, Error};
use serial_test::serial;

struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    Engine::log(LogSeverity::Info, "test::module", "info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "warning message".to_string());
    Engine::log_detailed(LogSeverity::Error, "test::module", "error message".to_string(), "device.rs", 7);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[1].message, "warning message");
    assert_eq!(entries[2].location(), Some("device.rs:7".to_string()));
    drop(entries);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_errors_are_logged_at_origin() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.dds");
    let result = load_texture_file(&missing, TextureLoadFlags::empty());
    assert!(matches!(result, Err(Error::FileSystem(_))));

    let entries = entries.lock().unwrap();
    let error = entries
        .iter()
        .find(|entry| entry.severity == LogSeverity::Error)
        .expect("file error was not logged");
    assert!(error.message.contains("missing.dds"));
    assert!(error.file.is_some());
    drop(entries);

    Engine::reset_logger();
}

#[test]
fn test_integration_default_logger_format() {
    let entry = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: std::time::SystemTime::now(),
        source: "gek::video::d3d11".to_string(),
        message: "display mode not found".to_string(),
        file: None,
        line: None,
    };
    let line = DefaultLogger::format_plain(&entry);
    assert!(line.contains("[WARN ]"));
    assert!(line.contains("[gek::video::d3d11] display mode not found"));

    let logger = DefaultLogger::new(LogSeverity::Warn);
    assert!(logger.accepts(LogSeverity::Error));
    assert!(!logger.accepts(LogSeverity::Info));
}
