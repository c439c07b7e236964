//! Unit tests for error.rs
//!
//! Covers Display/Debug/Clone and the logging error macros.

use crate::error::{Error, Result};
use crate::gek::Engine;
use crate::log::{LogEntry, LogSeverity, Logger};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("glCreateBuffer failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("glCreateBuffer failed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("zero width".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("zero width"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("unable to create rendering device".to_string());
    assert!(format!("{}", err).starts_with("Initialization failed"));
}

#[test]
fn test_compilation_failed_display() {
    let err = Error::CompilationFailed("error X3000: syntax error".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Compilation failed"));
    assert!(display.contains("X3000"));
}

#[test]
fn test_file_system_display() {
    let err = Error::FileSystem("data/missing.dds".to_string());
    assert!(format!("{}", err).contains("data/missing.dds"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_preserves_message() {
    let err = Error::CompilationFailed("log".to_string());
    let cloned = err.clone();
    assert_eq!(format!("{}", err), format!("{}", cloned));
}

#[test]
fn test_result_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidResource("inner".to_string()))
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert!(matches!(outer(), Err(Error::InvalidResource(_))));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        // Other tests log concurrently; keep only ours
        if entry.source == "gek::test" {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

#[test]
#[serial]
fn test_engine_err_logs_with_location() {
    let entries = capture();

    let err = crate::engine_err!("gek::test", "native call failed: {}", 42);
    assert!(matches!(&err, Error::BackendError(msg) if msg == "native call failed: 42"));

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].source, "gek::test");
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let entries = capture();

    fn failing() -> Result<()> {
        crate::engine_bail!("gek::test", "bail");
    }

    assert!(matches!(failing(), Err(Error::BackendError(_))));
    assert_eq!(entries.lock().unwrap().len(), 1);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_warn_logs_warning() {
    let entries = capture();

    fn failing() -> Result<()> {
        crate::engine_bail_warn!("gek::test", "soft failure");
    }

    assert!(failing().is_err());
    let entries = entries.lock().unwrap();
    assert_eq!(entries[0].severity, LogSeverity::Warn);
    assert!(entries[0].file.is_none());
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_invalid_returns_invalid_resource() {
    let entries = capture();

    fn failing() -> Result<()> {
        crate::engine_bail_invalid!("gek::test", "width must be non-zero");
    }

    assert!(matches!(failing(), Err(Error::InvalidResource(msg)) if msg.contains("width")));
    assert_eq!(entries.lock().unwrap()[0].severity, LogSeverity::Error);
    Engine::reset_logger();
}
