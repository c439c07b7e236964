use gek_engine::gek::video::{BufferDescription, BufferFlags, Format};
use gek_engine::gek::Error;

use crate::opengl_buffer::{buffer_usage, check_supported};

#[test]
fn test_buffer_usage_hints() {
    assert_eq!(buffer_usage(&BufferDescription::vertex("vertices", 32, 8)), glow::STATIC_DRAW);
    assert_eq!(buffer_usage(&BufferDescription::constant("camera", 64)), glow::DYNAMIC_DRAW);

    let staging = BufferDescription {
        flags: BufferFlags::STAGING,
        ..BufferDescription::index("readback", Format::R32_UINT, 16)
    };
    assert_eq!(buffer_usage(&staging), glow::STREAM_READ);

    let particles = BufferDescription {
        flags: BufferFlags::RESOURCE | BufferFlags::UNORDERED_ACCESS,
        ..BufferDescription::structured("particles", 16, 256)
    };
    assert_eq!(buffer_usage(&particles), glow::DYNAMIC_COPY);
}

#[test]
fn test_counters_are_rejected() {
    let plain = BufferDescription {
        flags: BufferFlags::RESOURCE | BufferFlags::UNORDERED_ACCESS,
        ..BufferDescription::structured("particles", 16, 256)
    };
    assert!(check_supported(&plain).is_ok());

    let append = BufferDescription {
        flags: plain.flags | BufferFlags::COUNTER,
        ..BufferDescription::structured("emitted", 16, 256)
    };
    let result = check_supported(&append);
    assert!(matches!(&result, Err(Error::InvalidResource(message)) if message.contains("emitted")));
}
