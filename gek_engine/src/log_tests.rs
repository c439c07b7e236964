//! Unit tests for log.rs

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "gek::test".to_string(),
        message: "swap chain resized".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_labels_are_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Error.label(), "ERROR");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_location() {
    assert_eq!(
        entry(LogSeverity::Error, Some("device.rs"), Some(12)).location(),
        Some("device.rs:12".to_string())
    );
    assert_eq!(entry(LogSeverity::Info, None, None).location(), None);
    assert_eq!(entry(LogSeverity::Info, Some("device.rs"), None).location(), None);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_filter() {
    let logger = DefaultLogger::new(LogSeverity::Warn);
    assert_eq!(logger.min_severity(), LogSeverity::Warn);
    assert!(!logger.accepts(LogSeverity::Info));
    assert!(logger.accepts(LogSeverity::Warn));
    assert!(logger.accepts(LogSeverity::Error));
}

#[test]
fn test_default_logger_default_severity() {
    let logger = DefaultLogger::default();
    if cfg!(debug_assertions) {
        assert_eq!(logger.min_severity(), LogSeverity::Debug);
    } else {
        assert_eq!(logger.min_severity(), LogSeverity::Info);
    }
}

#[test]
fn test_format_plain_without_location() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(text.contains("[INFO ]"));
    assert!(text.contains("[gek::test]"));
    assert!(text.ends_with("swap chain resized"));
}

#[test]
fn test_format_plain_with_location() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("gl_device.rs"), Some(88)));
    assert!(text.contains("[ERROR]"));
    assert!(text.ends_with("(gl_device.rs:88)"));
}

#[test]
fn test_default_logger_log_does_not_panic() {
    let logger = DefaultLogger::new(LogSeverity::Trace);
    logger.log(&entry(LogSeverity::Trace, None, None));
    logger.log(&entry(LogSeverity::Error, Some("file.rs"), Some(1)));
}
