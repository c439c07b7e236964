/// OpenGL format table
///
/// Maps every engine `Format` to the internal format, pixel format and
/// pixel type used by texture storage and uploads, and derives vertex
/// attribute formats for input layouts.

use gek_engine::gek::video::Format;

// Extension and 4.6 enums not every binding exposes
pub(crate) const COMPRESSED_RGBA_S3TC_DXT1_EXT: u32 = 0x83F1;
pub(crate) const COMPRESSED_RGBA_S3TC_DXT3_EXT: u32 = 0x83F2;
pub(crate) const COMPRESSED_RGBA_S3TC_DXT5_EXT: u32 = 0x83F3;
pub(crate) const COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT: u32 = 0x8C4D;
pub(crate) const COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT: u32 = 0x8C4E;
pub(crate) const COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT: u32 = 0x8C4F;
pub(crate) const COMPRESSED_RED_RGTC1: u32 = 0x8DBB;
pub(crate) const COMPRESSED_SIGNED_RED_RGTC1: u32 = 0x8DBC;
pub(crate) const COMPRESSED_RG_RGTC2: u32 = 0x8DBD;
pub(crate) const COMPRESSED_SIGNED_RG_RGTC2: u32 = 0x8DBE;
pub(crate) const COMPRESSED_RGBA_BPTC_UNORM: u32 = 0x8E8C;
pub(crate) const COMPRESSED_SRGB_ALPHA_BPTC_UNORM: u32 = 0x8E8D;
pub(crate) const COMPRESSED_RGB_BPTC_SIGNED_FLOAT: u32 = 0x8E8E;
pub(crate) const COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT: u32 = 0x8E8F;
pub(crate) const TEXTURE_MAX_ANISOTROPY: u32 = 0x84FE;

/// Texture format triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlFormat {
    /// Sized internal format for `glTexStorage*`
    pub internal_format: u32,
    /// Pixel format for `glTexSubImage*`
    pub format: u32,
    /// Pixel type for `glTexSubImage*`
    pub data_type: u32,
}

const fn gl(internal_format: u32, format: u32, data_type: u32) -> GlFormat {
    GlFormat {
        internal_format,
        format,
        data_type,
    }
}

const fn compressed(internal_format: u32) -> GlFormat {
    gl(internal_format, glow::RGBA, glow::UNSIGNED_BYTE)
}

/// GL format for each `Format`, indexed by `Format::index()`
pub const GL_FORMAT_TABLE: [GlFormat; Format::COUNT] = [
    gl(0, 0, 0), // Unknown
    // Float
    gl(glow::RGBA32F, glow::RGBA, glow::FLOAT),
    gl(glow::RGBA16F, glow::RGBA, glow::HALF_FLOAT),
    gl(glow::RGB32F, glow::RGB, glow::FLOAT),
    gl(glow::R11F_G11F_B10F, glow::RGB, glow::UNSIGNED_INT_10F_11F_11F_REV),
    gl(glow::RG32F, glow::RG, glow::FLOAT),
    gl(glow::RG16F, glow::RG, glow::HALF_FLOAT),
    gl(glow::R32F, glow::RED, glow::FLOAT),
    gl(glow::R16F, glow::RED, glow::HALF_FLOAT),
    // Unsigned integer
    gl(glow::RGBA32UI, glow::RGBA_INTEGER, glow::UNSIGNED_INT),
    gl(glow::RGBA16UI, glow::RGBA_INTEGER, glow::UNSIGNED_SHORT),
    gl(glow::RGB10_A2UI, glow::RGBA_INTEGER, glow::UNSIGNED_INT_2_10_10_10_REV),
    gl(glow::RGBA8UI, glow::RGBA_INTEGER, glow::UNSIGNED_BYTE),
    gl(glow::RGB32UI, glow::RGB_INTEGER, glow::UNSIGNED_INT),
    gl(glow::RG32UI, glow::RG_INTEGER, glow::UNSIGNED_INT),
    gl(glow::RG16UI, glow::RG_INTEGER, glow::UNSIGNED_SHORT),
    gl(glow::RG8UI, glow::RG_INTEGER, glow::UNSIGNED_BYTE),
    gl(glow::R32UI, glow::RED_INTEGER, glow::UNSIGNED_INT),
    gl(glow::R16UI, glow::RED_INTEGER, glow::UNSIGNED_SHORT),
    gl(glow::R8UI, glow::RED_INTEGER, glow::UNSIGNED_BYTE),
    // Signed integer
    gl(glow::RGBA32I, glow::RGBA_INTEGER, glow::INT),
    gl(glow::RGBA16I, glow::RGBA_INTEGER, glow::SHORT),
    gl(glow::RGBA8I, glow::RGBA_INTEGER, glow::BYTE),
    gl(glow::RGB32I, glow::RGB_INTEGER, glow::INT),
    gl(glow::RG32I, glow::RG_INTEGER, glow::INT),
    gl(glow::RG16I, glow::RG_INTEGER, glow::SHORT),
    gl(glow::RG8I, glow::RG_INTEGER, glow::BYTE),
    gl(glow::R32I, glow::RED_INTEGER, glow::INT),
    gl(glow::R16I, glow::RED_INTEGER, glow::SHORT),
    gl(glow::R8I, glow::RED_INTEGER, glow::BYTE),
    // Unsigned normalized
    gl(glow::RGBA16, glow::RGBA, glow::UNSIGNED_SHORT),
    gl(glow::RGB10_A2, glow::RGBA, glow::UNSIGNED_INT_2_10_10_10_REV),
    gl(glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
    gl(glow::SRGB8_ALPHA8, glow::RGBA, glow::UNSIGNED_BYTE),
    gl(glow::RGBA8, glow::BGRA, glow::UNSIGNED_BYTE),
    gl(glow::SRGB8_ALPHA8, glow::BGRA, glow::UNSIGNED_BYTE),
    gl(glow::RG16, glow::RG, glow::UNSIGNED_SHORT),
    gl(glow::RG8, glow::RG, glow::UNSIGNED_BYTE),
    gl(glow::R16, glow::RED, glow::UNSIGNED_SHORT),
    gl(glow::R8, glow::RED, glow::UNSIGNED_BYTE),
    // Signed normalized
    gl(glow::RGBA16_SNORM, glow::RGBA, glow::SHORT),
    gl(glow::RGBA8_SNORM, glow::RGBA, glow::BYTE),
    gl(glow::RG16_SNORM, glow::RG, glow::SHORT),
    gl(glow::RG8_SNORM, glow::RG, glow::BYTE),
    gl(glow::R16_SNORM, glow::RED, glow::SHORT),
    gl(glow::R8_SNORM, glow::RED, glow::BYTE),
    // Depth / stencil
    gl(glow::DEPTH32F_STENCIL8, glow::DEPTH_STENCIL, glow::FLOAT_32_UNSIGNED_INT_24_8_REV),
    gl(glow::DEPTH24_STENCIL8, glow::DEPTH_STENCIL, glow::UNSIGNED_INT_24_8),
    gl(glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT),
    gl(glow::DEPTH_COMPONENT16, glow::DEPTH_COMPONENT, glow::UNSIGNED_SHORT),
    // Block compressed
    compressed(COMPRESSED_RGBA_S3TC_DXT1_EXT),
    compressed(COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT),
    compressed(COMPRESSED_RGBA_S3TC_DXT3_EXT),
    compressed(COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT),
    compressed(COMPRESSED_RGBA_S3TC_DXT5_EXT),
    compressed(COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT),
    compressed(COMPRESSED_RED_RGTC1),
    compressed(COMPRESSED_SIGNED_RED_RGTC1),
    compressed(COMPRESSED_RG_RGTC2),
    compressed(COMPRESSED_SIGNED_RG_RGTC2),
    compressed(COMPRESSED_RGB_BPTC_UNSIGNED_FLOAT),
    compressed(COMPRESSED_RGB_BPTC_SIGNED_FLOAT),
    compressed(COMPRESSED_RGBA_BPTC_UNORM),
    compressed(COMPRESSED_SRGB_ALPHA_BPTC_UNORM),
];

#[inline]
pub fn gl_format(format: Format) -> GlFormat {
    GL_FORMAT_TABLE[format.index()]
}

/// Vertex attribute format for `glVertexAttribFormat`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub components: i32,
    pub data_type: u32,
    pub normalized: bool,
    /// Bound with `glVertexAttribIFormat` (integer inputs)
    pub integer: bool,
}

/// Attribute format of an input element, `None` when GL cannot fetch it
///
/// BGRA, sRGB, depth and block-compressed formats are texture-only.
pub fn vertex_attribute(format: Format) -> Option<VertexAttribute> {
    if format == Format::Unknown
        || format.is_depth()
        || format.is_compressed()
        || format.is_srgb()
        || matches!(format, Format::B8G8R8A8_UNORM)
    {
        return None;
    }
    let entry = gl_format(format);
    let components = match entry.data_type {
        glow::UNSIGNED_INT_2_10_10_10_REV => 4,
        glow::UNSIGNED_INT_10F_11F_11F_REV => 3,
        _ => format.component_count() as i32,
    };
    let floating = matches!(
        entry.data_type,
        glow::FLOAT | glow::HALF_FLOAT | glow::UNSIGNED_INT_10F_11F_11F_REV
    );
    Some(VertexAttribute {
        components,
        data_type: entry.data_type,
        normalized: !format.is_integer() && !floating,
        integer: format.is_integer(),
    })
}

/// Index type for `glDrawElements*` and the index size in bytes
pub fn index_type(format: Format) -> Option<(u32, u32)> {
    match format {
        Format::R16_UINT => Some((glow::UNSIGNED_SHORT, 2)),
        Format::R32_UINT => Some((glow::UNSIGNED_INT, 4)),
        _ => None,
    }
}

/// Image unit format for `glBindImageTexture`
///
/// Image load/store only covers the uncompressed color formats with a
/// GLSL image format qualifier; everything else falls back to R32UI.
pub fn image_format(format: Format) -> u32 {
    match format {
        Format::R32G32B32A32_FLOAT
        | Format::R16G16B16A16_FLOAT
        | Format::R11G11B10_FLOAT
        | Format::R32G32_FLOAT
        | Format::R16G16_FLOAT
        | Format::R32_FLOAT
        | Format::R16_FLOAT
        | Format::R32G32B32A32_UINT
        | Format::R16G16B16A16_UINT
        | Format::R10G10B10A2_UINT
        | Format::R8G8B8A8_UINT
        | Format::R32G32_UINT
        | Format::R16G16_UINT
        | Format::R8G8_UINT
        | Format::R32_UINT
        | Format::R16_UINT
        | Format::R8_UINT
        | Format::R32G32B32A32_INT
        | Format::R16G16B16A16_INT
        | Format::R8G8B8A8_INT
        | Format::R32G32_INT
        | Format::R16G16_INT
        | Format::R8G8_INT
        | Format::R32_INT
        | Format::R16_INT
        | Format::R8_INT
        | Format::R16G16B16A16_UNORM
        | Format::R10G10B10A2_UNORM
        | Format::R8G8B8A8_UNORM
        | Format::R16G16_UNORM
        | Format::R8G8_UNORM
        | Format::R16_UNORM
        | Format::R8_UNORM
        | Format::R16G16B16A16_NORM
        | Format::R8G8B8A8_NORM
        | Format::R16G16_NORM
        | Format::R8G8_NORM
        | Format::R16_NORM
        | Format::R8_NORM => gl_format(format).internal_format,
        _ => glow::R32UI,
    }
}

#[cfg(test)]
#[path = "opengl_format_tests.rs"]
mod tests;
