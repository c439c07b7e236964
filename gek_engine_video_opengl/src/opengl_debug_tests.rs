use gek_engine::gek::log::LogSeverity;

use crate::opengl_debug::{error_name, message_severity};

#[test]
fn test_message_severity() {
    assert_eq!(message_severity(glow::DEBUG_SEVERITY_HIGH), LogSeverity::Error);
    assert_eq!(message_severity(glow::DEBUG_SEVERITY_MEDIUM), LogSeverity::Warn);
    assert_eq!(message_severity(glow::DEBUG_SEVERITY_LOW), LogSeverity::Info);
    assert_eq!(message_severity(glow::DEBUG_SEVERITY_NOTIFICATION), LogSeverity::Trace);
}

#[test]
fn test_error_names() {
    assert_eq!(error_name(glow::INVALID_OPERATION), "GL_INVALID_OPERATION");
    assert_eq!(error_name(glow::OUT_OF_MEMORY), "GL_OUT_OF_MEMORY");
    assert_eq!(error_name(0xFFFF), "unknown GL error");
}
