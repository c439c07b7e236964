/// DXGI format selection
///
/// The numeric `DXGI_FORMAT` table lives in the core crate (DDS files share
/// it). This module adds what only the device needs: typeless storage for
/// sampled depth targets, index formats and raw-view formats.

use gek_engine::gek::video::dxgi::to_dxgi;
use gek_engine::gek::video::{Format, TextureDescription, TextureFlags};

pub const DXGI_FORMAT_UNKNOWN: u32 = 0;
pub const DXGI_FORMAT_R32G8X24_TYPELESS: u32 = 19;
pub const DXGI_FORMAT_R32_FLOAT_X8X24_TYPELESS: u32 = 21;
pub const DXGI_FORMAT_R32_TYPELESS: u32 = 39;
pub const DXGI_FORMAT_R24G8_TYPELESS: u32 = 44;
pub const DXGI_FORMAT_R24_UNORM_X8_TYPELESS: u32 = 46;
pub const DXGI_FORMAT_R16_TYPELESS: u32 = 53;

/// Formats of a depth texture and its views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthFormats {
    /// Storage format (typeless so both views can be created)
    pub texture: u32,
    /// Shader-resource view format
    pub shader_resource: u32,
    /// Depth-stencil view format
    pub depth_stencil: u32,
}

/// Typeless storage and view formats of a depth format
pub fn depth_formats(format: Format) -> Option<DepthFormats> {
    let (texture, shader_resource) = match format {
        Format::D32_FLOAT_S8X24_UINT => (DXGI_FORMAT_R32G8X24_TYPELESS, DXGI_FORMAT_R32_FLOAT_X8X24_TYPELESS),
        Format::D24_UNORM_S8_UINT => (DXGI_FORMAT_R24G8_TYPELESS, DXGI_FORMAT_R24_UNORM_X8_TYPELESS),
        Format::D32_FLOAT => (DXGI_FORMAT_R32_TYPELESS, to_dxgi(Format::R32_FLOAT)),
        Format::D16_UNORM => (DXGI_FORMAT_R16_TYPELESS, to_dxgi(Format::R16_UNORM)),
        _ => return None,
    };
    Some(DepthFormats {
        texture,
        shader_resource,
        depth_stencil: to_dxgi(format),
    })
}

/// True when a depth texture is also sampled and needs typeless storage
pub fn is_sampled_depth(desc: &TextureDescription) -> bool {
    desc.format.is_depth() && desc.flags.intersects(TextureFlags::RESOURCE | TextureFlags::READ_WRITE)
}

/// Storage format of a texture
pub fn texture_format(desc: &TextureDescription) -> u32 {
    if is_sampled_depth(desc) {
        if let Some(formats) = depth_formats(desc.format) {
            return formats.texture;
        }
    }
    to_dxgi(desc.format)
}

/// Shader-resource view format of a texture
pub fn shader_resource_format(desc: &TextureDescription) -> u32 {
    match depth_formats(desc.format) {
        Some(formats) => formats.shader_resource,
        None => to_dxgi(desc.format),
    }
}

/// Index buffer format, `None` for anything but 16 and 32-bit unsigned indices
pub fn index_format(format: Format) -> Option<u32> {
    match format {
        Format::R16_UINT | Format::R32_UINT => Some(to_dxgi(format)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "d3d11_format_tests.rs"]
mod tests;
