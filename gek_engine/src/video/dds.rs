/// DirectDraw Surface (DDS) container parsing
///
/// Supports the legacy header (FourCC block formats and the common RGBA
/// masks) and the DX10 extension header. Data is returned in engine
/// subresource order, which is also the order DDS stores it in.

use crate::error::{Error, Result};
use crate::video::dxgi::from_dxgi;
use crate::video::{Format, TextureData, TextureDescription, TextureFlags};

const SOURCE: &str = "gek::video::Dds";

const MAGIC: u32 = 0x2053_4444; // "DDS "
const HEADER_SIZE: usize = 124;
/// Magic plus header
pub const BASE_HEADER_LEN: usize = 4 + HEADER_SIZE;
const DX10_HEADER_LEN: usize = 20;
/// Longest header, magic and DX10 extension included
pub const MAX_HEADER_LEN: usize = BASE_HEADER_LEN + DX10_HEADER_LEN;

// Pixel format flags
const DDPF_ALPHAPIXELS: u32 = 0x1;
const DDPF_ALPHA: u32 = 0x2;
const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;
const DDPF_LUMINANCE: u32 = 0x2_0000;

// Caps2
const DDSCAPS2_CUBEMAP: u32 = 0x200;
const DDSCAPS2_VOLUME: u32 = 0x20_0000;

// DX10 header
const DDS_DIMENSION_TEXTURE3D: u32 = 4;
const DDS_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;

const fn four_cc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

fn invalid(message: String) -> Error {
    crate::engine_error!(SOURCE, "{}", message);
    Error::FileSystem(message)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Parsed DDS header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdsHeader {
    pub description: TextureDescription,
    /// Byte offset of the first subresource
    pub data_offset: usize,
}

struct PixelFormat {
    flags: u32,
    four_cc: u32,
    bit_count: u32,
    masks: [u32; 4],
}

fn legacy_format(pf: &PixelFormat) -> Option<Format> {
    if pf.flags & DDPF_FOURCC != 0 {
        let format = match pf.four_cc {
            code if code == four_cc(b"DXT1") => Format::BC1_UNORM,
            code if code == four_cc(b"DXT2") || code == four_cc(b"DXT3") => Format::BC2_UNORM,
            code if code == four_cc(b"DXT4") || code == four_cc(b"DXT5") => Format::BC3_UNORM,
            code if code == four_cc(b"ATI1") || code == four_cc(b"BC4U") => Format::BC4_UNORM,
            code if code == four_cc(b"BC4S") => Format::BC4_NORM,
            code if code == four_cc(b"ATI2") || code == four_cc(b"BC5U") => Format::BC5_UNORM,
            code if code == four_cc(b"BC5S") => Format::BC5_NORM,
            // D3DFORMAT values stored directly in the FourCC field
            36 => Format::R16G16B16A16_UNORM,
            110 => Format::R16G16B16A16_NORM,
            111 => Format::R16_FLOAT,
            112 => Format::R16G16_FLOAT,
            113 => Format::R16G16B16A16_FLOAT,
            114 => Format::R32_FLOAT,
            115 => Format::R32G32_FLOAT,
            116 => Format::R32G32B32A32_FLOAT,
            _ => return None,
        };
        return Some(format);
    }

    let [r, g, b, a] = pf.masks;
    if pf.flags & DDPF_RGB != 0 {
        return match (pf.bit_count, r, g, b, a) {
            (32, 0xFF, 0xFF00, 0xFF_0000, 0xFF00_0000) => Some(Format::R8G8B8A8_UNORM),
            (32, 0xFF_0000, 0xFF00, 0xFF, 0xFF00_0000) => Some(Format::B8G8R8A8_UNORM),
            (32, 0x3FF, 0xF_FC00, 0x3FF0_0000, 0xC000_0000) => Some(Format::R10G10B10A2_UNORM),
            (32, 0xFFFF, 0xFFFF_0000, 0, 0) => Some(Format::R16G16_UNORM),
            (32, 0xFFFF_FFFF, 0, 0, 0) => Some(Format::R32_FLOAT),
            _ => None,
        };
    }
    if pf.flags & DDPF_LUMINANCE != 0 {
        return match (pf.bit_count, r, g, a) {
            (8, 0xFF, _, _) => Some(Format::R8_UNORM),
            (16, 0xFFFF, _, _) => Some(Format::R16_UNORM),
            (16, 0xFF, _, 0xFF00) if pf.flags & DDPF_ALPHAPIXELS != 0 => Some(Format::R8G8_UNORM),
            _ => None,
        };
    }
    if pf.flags & DDPF_ALPHA != 0 && pf.bit_count == 8 {
        return Some(Format::R8_UNORM);
    }
    None
}

/// Parse the header of a DDS file
///
/// `bytes` only needs to hold the header (`MAX_HEADER_LEN` is always enough).
pub fn parse_header(bytes: &[u8], name: &str) -> Result<DdsHeader> {
    if bytes.len() < BASE_HEADER_LEN || read_u32(bytes, 0) != MAGIC {
        return Err(invalid(format!("'{}' is not a DDS file", name)));
    }
    if read_u32(bytes, 4) as usize != HEADER_SIZE {
        return Err(invalid(format!("'{}' has a malformed DDS header", name)));
    }

    let height = read_u32(bytes, 12);
    let width = read_u32(bytes, 16);
    let depth = read_u32(bytes, 24).max(1);
    let mip_map_count = read_u32(bytes, 28).max(1);
    let pixel_format = PixelFormat {
        flags: read_u32(bytes, 80),
        four_cc: read_u32(bytes, 84),
        bit_count: read_u32(bytes, 88),
        masks: [read_u32(bytes, 92), read_u32(bytes, 96), read_u32(bytes, 100), read_u32(bytes, 104)],
    };
    let caps2 = read_u32(bytes, 112);

    let mut flags = TextureFlags::RESOURCE;
    let mut volume = caps2 & DDSCAPS2_VOLUME != 0;
    let format;
    let data_offset;

    if pixel_format.flags & DDPF_FOURCC != 0 && pixel_format.four_cc == four_cc(b"DX10") {
        if bytes.len() < MAX_HEADER_LEN {
            return Err(invalid(format!("'{}' is truncated inside the DX10 header", name)));
        }
        let dxgi_format = read_u32(bytes, BASE_HEADER_LEN);
        let dimension = read_u32(bytes, BASE_HEADER_LEN + 4);
        let misc = read_u32(bytes, BASE_HEADER_LEN + 8);
        let array_size = read_u32(bytes, BASE_HEADER_LEN + 12).max(1);

        format = from_dxgi(dxgi_format);
        if format == Format::Unknown {
            return Err(invalid(format!("'{}' uses unsupported DXGI format {}", name, dxgi_format)));
        }
        let cube = misc & DDS_RESOURCE_MISC_TEXTURECUBE != 0;
        if array_size != 1 {
            return Err(invalid(format!("'{}' is a texture array, which is not supported", name)));
        }
        if cube {
            flags |= TextureFlags::CUBE;
        }
        volume = dimension == DDS_DIMENSION_TEXTURE3D;
        data_offset = MAX_HEADER_LEN;
    } else {
        format = match legacy_format(&pixel_format) {
            Some(format) => format,
            None => return Err(invalid(format!("'{}' uses an unsupported DDS pixel format", name))),
        };
        if caps2 & DDSCAPS2_CUBEMAP != 0 {
            flags |= TextureFlags::CUBE;
        }
        data_offset = BASE_HEADER_LEN;
    }

    let description = TextureDescription {
        name: name.to_string(),
        format,
        width,
        height,
        depth: if volume { depth } else { 1 },
        mip_map_count,
        flags,
        ..Default::default()
    };

    if description.width == 0 || description.height == 0 {
        return Err(invalid(format!("'{}' has a zero dimension", name)));
    }
    let limit = description.dimension_limit();
    if description.width > limit || description.height > limit || description.depth > limit {
        return Err(invalid(format!(
            "'{}' is {}x{}x{}, larger than {} on some axis",
            name, description.width, description.height, description.depth, limit
        )));
    }
    if description.mip_levels() > description.full_mip_chain() {
        return Err(invalid(format!(
            "'{}' declares {} mip levels for {}x{}",
            name, mip_map_count, width, height
        )));
    }

    Ok(DdsHeader { description, data_offset })
}

/// Parse a whole DDS file into a description and subresource data
///
/// With `top_mip_only` the remaining mips are skipped and the description
/// reports a single level.
pub fn parse(bytes: &[u8], name: &str, top_mip_only: bool) -> Result<(TextureDescription, TextureData)> {
    let header = parse_header(bytes, name)?;
    let mut description = header.description;
    let mip_levels = description.mip_levels();
    let kept_levels = if top_mip_only { 1 } else { mip_levels };

    let mut offset = header.data_offset;
    let mut subresources = Vec::with_capacity((description.array_size() * kept_levels) as usize);
    for _slice in 0..description.array_size() {
        for mip in 0..mip_levels {
            let size = description.subresource_size(mip);
            let end = match offset.checked_add(size) {
                Some(end) if end <= bytes.len() => end,
                _ => {
                    return Err(invalid(format!(
                        "'{}' is truncated: mip {} needs {} bytes past offset {}, has {}",
                        name, mip, size, offset, bytes.len()
                    )))
                }
            };
            if mip < kept_levels {
                subresources.push(bytes[offset..end].to_vec());
            }
            offset = end;
        }
    }

    description.mip_map_count = kept_levels;
    Ok((description, TextureData { subresources }))
}

#[cfg(test)]
#[path = "dds_tests.rs"]
mod tests;
