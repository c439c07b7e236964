//! Error types for the GEK engine
//!
//! One error enum covers the whole video layer. Errors are normally built
//! through the `engine_err!` family of macros so that every failure is
//! logged at the place it happens, with file and line.

use std::fmt;

/// Result type for GEK engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// GEK engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A native graphics API call failed (D3D11, OpenGL, DXGI, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or description (zero size, unknown format, stale back buffer, ...)
    InvalidResource(String),

    /// Initialization failed (engine, device, swap chain)
    InitializationFailed(String),

    /// Program compilation failed; carries the compiler's error text
    CompilationFailed(String),

    /// A file could not be read or decoded
    FileSystem(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::CompilationFailed(msg) => write!(f, "Compilation failed: {}", msg),
            Error::FileSystem(msg) => write!(f, "File system error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build an `Error::BackendError` with the same message
///
/// ```no_run
/// # use gek_engine::engine_err;
/// let err = engine_err!("gek::video::opengl", "glCreateBuffer failed: {}", "oops");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::gek::Engine::log_detailed(
            $crate::gek::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::gek::Error::BackendError(message)
    }};
}

/// Log an ERROR and return `Err(Error::BackendError)` from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a WARN and build an `Error::BackendError` with the same message
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::gek::Engine::log(
            $crate::gek::log::LogSeverity::Warn,
            $source,
            message.clone()
        );
        $crate::gek::Error::BackendError(message)
    }};
}

/// Log a WARN and return `Err(Error::BackendError)` from the enclosing function
#[macro_export]
macro_rules! engine_bail_warn {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

/// Log an ERROR and return `Err(Error::InvalidResource)`
///
/// Used by description validation, where the failure is the caller's input
/// and not the native API.
#[macro_export]
macro_rules! engine_bail_invalid {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::gek::Engine::log_detailed(
            $crate::gek::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        return Err($crate::gek::Error::InvalidResource(message));
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
