//! Internal logging system for the GEK engine
//!
//! - Swappable logger through the `Logger` trait (`Engine::set_logger`)
//! - Five severities, ordered from `Trace` to `Error`
//! - Colored console output with a minimum-severity filter by default
//! - ERROR entries carry the file and line they were raised from

use chrono::{DateTime, Local};
use colored::*;
use std::time::SystemTime;

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use gek_engine::gek::log::{Logger, LogEntry};
///
/// struct FileLogger;
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source tag (e.g., "gek::Engine", "gek::video::d3d11")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

impl LogEntry {
    /// `file:line` when the entry carries a location
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Very verbose information (per-draw, per-bind)
    Trace,

    /// Development information
    Debug,

    /// Important events (device created, swap chain resized)
    Info,

    /// Recoverable problems (shader fallback, unsupported state)
    Warn,

    /// Failures, reported with file:line
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by console output
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Default logger: colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
///
/// Entries below `min_severity` are dropped. Debug builds default to
/// `Debug`, release builds to `Info`.
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    /// Create a console logger that drops entries below `min_severity`
    pub fn new(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// Minimum severity that reaches the console
    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Whether an entry of this severity would be printed
    pub fn accepts(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }

    /// Render an entry without colors (used for tests and non-tty sinks)
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        match entry.location() {
            Some(location) => format!(
                "[{}] [{}] [{}] {} ({})",
                timestamp,
                entry.severity.label(),
                entry.source,
                entry.message,
                location
            ),
            None => format!(
                "[{}] [{}] [{}] {}",
                timestamp,
                entry.severity.label(),
                entry.source,
                entry.message
            ),
        }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::new(LogSeverity::Debug)
        } else {
            Self::new(LogSeverity::Info)
        }
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.accepts(entry.severity) {
            return;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity = match entry.severity {
            LogSeverity::Trace => entry.severity.label().bright_black(),
            LogSeverity::Debug => entry.severity.label().cyan(),
            LogSeverity::Info => entry.severity.label().green(),
            LogSeverity::Warn => entry.severity.label().yellow(),
            LogSeverity::Error => entry.severity.label().red().bold(),
        };
        let source = entry.source.bright_blue();

        // Errors and warnings go to stderr, the rest to stdout
        match (entry.severity >= LogSeverity::Warn, entry.location()) {
            (true, Some(location)) => eprintln!(
                "[{}] [{}] [{}] {} ({})",
                timestamp, severity, source, entry.message, location
            ),
            (true, None) => eprintln!("[{}] [{}] [{}] {}", timestamp, severity, source, entry.message),
            (false, _) => println!("[{}] [{}] [{}] {}", timestamp, severity, source, entry.message),
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```no_run
/// # use gek_engine::engine_trace;
/// engine_trace!("gek::video::opengl", "bind vertex buffer slot {}", 0);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::gek::Engine::log(
            $crate::gek::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::gek::Engine::log(
            $crate::gek::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::gek::Engine::log(
            $crate::gek::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::gek::Engine::log(
            $crate::gek::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::gek::Engine::log_detailed(
            $crate::gek::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
