//! Unit tests for the OpenGL format table
//!
//! Pure table lookups, no GL context required.

use gek_engine::gek::video::Format;

use crate::opengl_format::{gl_format, image_format, index_type, vertex_attribute, GL_FORMAT_TABLE};

// ============================================================================
// TABLE COMPLETENESS
// ============================================================================

#[test]
fn test_every_known_format_has_an_entry() {
    for format in Format::ALL {
        let entry = gl_format(format);
        if format == Format::Unknown {
            assert_eq!(entry.internal_format, 0);
            continue;
        }
        assert_ne!(entry.internal_format, 0, "{:?} has no internal format", format);
        assert_ne!(entry.format, 0, "{:?} has no pixel format", format);
        assert_ne!(entry.data_type, 0, "{:?} has no pixel type", format);
    }
}

#[test]
fn test_table_length_matches_format_count() {
    assert_eq!(GL_FORMAT_TABLE.len(), Format::COUNT);
}

#[test]
fn test_srgb_formats_use_srgb_storage() {
    assert_eq!(gl_format(Format::R8G8B8A8_UNORM_SRGB).internal_format, glow::SRGB8_ALPHA8);
    assert_eq!(gl_format(Format::B8G8R8A8_UNORM_SRGB).internal_format, glow::SRGB8_ALPHA8);
    assert_eq!(gl_format(Format::B8G8R8A8_UNORM).format, glow::BGRA);
}

#[test]
fn test_integer_formats_use_integer_pixel_formats() {
    for format in Format::ALL.into_iter().filter(|format| format.is_integer()) {
        let pixel_format = gl_format(format).format;
        assert!(
            matches!(
                pixel_format,
                glow::RED_INTEGER | glow::RG_INTEGER | glow::RGB_INTEGER | glow::RGBA_INTEGER
            ),
            "{:?} uploads through {:#x}",
            format,
            pixel_format
        );
    }
}

#[test]
fn test_depth_formats() {
    assert_eq!(gl_format(Format::D24_UNORM_S8_UINT).internal_format, glow::DEPTH24_STENCIL8);
    assert_eq!(gl_format(Format::D32_FLOAT).format, glow::DEPTH_COMPONENT);
    assert_eq!(gl_format(Format::D32_FLOAT_S8X24_UINT).format, glow::DEPTH_STENCIL);
}

// ============================================================================
// VERTEX ATTRIBUTES
// ============================================================================

#[test]
fn test_vertex_attribute_float() {
    let attribute = vertex_attribute(Format::R32G32B32_FLOAT).unwrap();
    assert_eq!(attribute.components, 3);
    assert_eq!(attribute.data_type, glow::FLOAT);
    assert!(!attribute.normalized);
    assert!(!attribute.integer);
}

#[test]
fn test_vertex_attribute_normalized_bytes() {
    let attribute = vertex_attribute(Format::R8G8B8A8_UNORM).unwrap();
    assert_eq!(attribute.components, 4);
    assert_eq!(attribute.data_type, glow::UNSIGNED_BYTE);
    assert!(attribute.normalized);

    let packed = vertex_attribute(Format::R10G10B10A2_UNORM).unwrap();
    assert_eq!(packed.components, 4);
    assert!(packed.normalized);
}

#[test]
fn test_vertex_attribute_integer() {
    let attribute = vertex_attribute(Format::R32G32B32A32_UINT).unwrap();
    assert!(attribute.integer);
    assert!(!attribute.normalized);
}

#[test]
fn test_vertex_attribute_rejects_texture_only_formats() {
    assert!(vertex_attribute(Format::Unknown).is_none());
    assert!(vertex_attribute(Format::D32_FLOAT).is_none());
    assert!(vertex_attribute(Format::BC1_UNORM).is_none());
    assert!(vertex_attribute(Format::R8G8B8A8_UNORM_SRGB).is_none());
    assert!(vertex_attribute(Format::B8G8R8A8_UNORM).is_none());
}

// ============================================================================
// INDEX AND IMAGE FORMATS
// ============================================================================

#[test]
fn test_index_type() {
    assert_eq!(index_type(Format::R16_UINT), Some((glow::UNSIGNED_SHORT, 2)));
    assert_eq!(index_type(Format::R32_UINT), Some((glow::UNSIGNED_INT, 4)));
    assert_eq!(index_type(Format::R8_UINT), None);
}

#[test]
fn test_image_format() {
    assert_eq!(image_format(Format::R32G32B32A32_FLOAT), glow::RGBA32F);
    assert_eq!(image_format(Format::R8G8B8A8_UNORM), glow::RGBA8);
    assert_eq!(image_format(Format::R8G8B8A8_UNORM_SRGB), glow::R32UI);
    assert_eq!(image_format(Format::BC7_UNORM), glow::R32UI);
}
