/// GL error checks and the debug-context message callback
///
/// With `DeviceConfig::debug_layer` the context is created with the debug
/// flag and driver messages are routed into the engine logger.

use std::sync::atomic::{AtomicU32, Ordering};

use glow::HasContext;

use gek_engine::gek::log::LogSeverity;
use gek_engine::gek::{Engine, Error, Result};
use gek_engine::{engine_err, engine_error};

const SOURCE: &str = "gek::video::opengl";
const DRIVER_SOURCE: &str = "gek::video::opengl::driver";

/// Driver messages received at error severity since start-up
static DRIVER_ERRORS: AtomicU32 = AtomicU32::new(0);

/// Number of high-severity driver messages seen so far
pub fn driver_error_count() -> u32 {
    DRIVER_ERRORS.load(Ordering::Relaxed)
}

/// Engine severity of a `GL_DEBUG_SEVERITY_*` value
pub fn message_severity(severity: u32) -> LogSeverity {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => LogSeverity::Error,
        glow::DEBUG_SEVERITY_MEDIUM => LogSeverity::Warn,
        glow::DEBUG_SEVERITY_LOW => LogSeverity::Info,
        _ => LogSeverity::Trace,
    }
}

/// Name of a `glGetError` code
pub fn error_name(code: u32) -> &'static str {
    match code {
        glow::NO_ERROR => "GL_NO_ERROR",
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

/// Route driver debug messages to the engine logger
pub fn install_debug_callback(gl: &mut glow::Context) {
    unsafe {
        gl.enable(glow::DEBUG_OUTPUT);
        gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
        gl.debug_message_callback(|_source, _kind, id, severity, message| {
            let severity = message_severity(severity);
            if severity == LogSeverity::Error {
                DRIVER_ERRORS.fetch_add(1, Ordering::Relaxed);
            }
            Engine::log(severity, DRIVER_SOURCE, format!("[{}] {}", id, message));
        });
    }
}

/// Fail when the last GL calls raised an error
///
/// `GL_OUT_OF_MEMORY` becomes `Error::OutOfMemory`, anything else a
/// `BackendError` naming `what`.
pub fn check_error(gl: &glow::Context, what: &str) -> Result<()> {
    let code = unsafe { gl.get_error() };
    match code {
        glow::NO_ERROR => Ok(()),
        glow::OUT_OF_MEMORY => {
            engine_error!(SOURCE, "{}: {}", what, error_name(code));
            Err(Error::OutOfMemory)
        }
        _ => Err(engine_err!(SOURCE, "{}: {} ({:#06x})", what, error_name(code), code)),
    }
}

#[cfg(test)]
#[path = "opengl_debug_tests.rs"]
mod tests;
