/// Engine-neutral pixel and element formats
///
/// `Format` is the single format enumeration shared by textures, buffers and
/// input layouts. Backends translate it through lookup tables indexed by
/// `Format::index()`; every table is sized with `Format::COUNT` so a
/// missing entry fails to compile.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Pixel / element format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum Format {
    #[default]
    Unknown,

    // Float
    R32G32B32A32_FLOAT,
    R16G16B16A16_FLOAT,
    R32G32B32_FLOAT,
    R11G11B10_FLOAT,
    R32G32_FLOAT,
    R16G16_FLOAT,
    R32_FLOAT,
    R16_FLOAT,

    // Unsigned integer
    R32G32B32A32_UINT,
    R16G16B16A16_UINT,
    R10G10B10A2_UINT,
    R8G8B8A8_UINT,
    R32G32B32_UINT,
    R32G32_UINT,
    R16G16_UINT,
    R8G8_UINT,
    R32_UINT,
    R16_UINT,
    R8_UINT,

    // Signed integer
    R32G32B32A32_INT,
    R16G16B16A16_INT,
    R8G8B8A8_INT,
    R32G32B32_INT,
    R32G32_INT,
    R16G16_INT,
    R8G8_INT,
    R32_INT,
    R16_INT,
    R8_INT,

    // Unsigned normalized
    R16G16B16A16_UNORM,
    R10G10B10A2_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_UNORM_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_UNORM_SRGB,
    R16G16_UNORM,
    R8G8_UNORM,
    R16_UNORM,
    R8_UNORM,

    // Signed normalized
    R16G16B16A16_NORM,
    R8G8B8A8_NORM,
    R16G16_NORM,
    R8G8_NORM,
    R16_NORM,
    R8_NORM,

    // Depth / stencil
    D32_FLOAT_S8X24_UINT,
    D24_UNORM_S8_UINT,
    D32_FLOAT,
    D16_UNORM,

    // Block compressed
    BC1_UNORM,
    BC1_UNORM_SRGB,
    BC2_UNORM,
    BC2_UNORM_SRGB,
    BC3_UNORM,
    BC3_UNORM_SRGB,
    BC4_UNORM,
    BC4_NORM,
    BC5_UNORM,
    BC5_NORM,
    BC6H_UF16,
    BC6H_SF16,
    BC7_UNORM,
    BC7_UNORM_SRGB,
}

impl Format {
    /// Every format, in declaration order (`ALL[f.index()] == f`)
    pub const ALL: [Format; 64] = [
        Format::Unknown,
        Format::R32G32B32A32_FLOAT,
        Format::R16G16B16A16_FLOAT,
        Format::R32G32B32_FLOAT,
        Format::R11G11B10_FLOAT,
        Format::R32G32_FLOAT,
        Format::R16G16_FLOAT,
        Format::R32_FLOAT,
        Format::R16_FLOAT,
        Format::R32G32B32A32_UINT,
        Format::R16G16B16A16_UINT,
        Format::R10G10B10A2_UINT,
        Format::R8G8B8A8_UINT,
        Format::R32G32B32_UINT,
        Format::R32G32_UINT,
        Format::R16G16_UINT,
        Format::R8G8_UINT,
        Format::R32_UINT,
        Format::R16_UINT,
        Format::R8_UINT,
        Format::R32G32B32A32_INT,
        Format::R16G16B16A16_INT,
        Format::R8G8B8A8_INT,
        Format::R32G32B32_INT,
        Format::R32G32_INT,
        Format::R16G16_INT,
        Format::R8G8_INT,
        Format::R32_INT,
        Format::R16_INT,
        Format::R8_INT,
        Format::R16G16B16A16_UNORM,
        Format::R10G10B10A2_UNORM,
        Format::R8G8B8A8_UNORM,
        Format::R8G8B8A8_UNORM_SRGB,
        Format::B8G8R8A8_UNORM,
        Format::B8G8R8A8_UNORM_SRGB,
        Format::R16G16_UNORM,
        Format::R8G8_UNORM,
        Format::R16_UNORM,
        Format::R8_UNORM,
        Format::R16G16B16A16_NORM,
        Format::R8G8B8A8_NORM,
        Format::R16G16_NORM,
        Format::R8G8_NORM,
        Format::R16_NORM,
        Format::R8_NORM,
        Format::D32_FLOAT_S8X24_UINT,
        Format::D24_UNORM_S8_UINT,
        Format::D32_FLOAT,
        Format::D16_UNORM,
        Format::BC1_UNORM,
        Format::BC1_UNORM_SRGB,
        Format::BC2_UNORM,
        Format::BC2_UNORM_SRGB,
        Format::BC3_UNORM,
        Format::BC3_UNORM_SRGB,
        Format::BC4_UNORM,
        Format::BC4_NORM,
        Format::BC5_UNORM,
        Format::BC5_NORM,
        Format::BC6H_UF16,
        Format::BC6H_SF16,
        Format::BC7_UNORM,
        Format::BC7_UNORM_SRGB,
    ];

    /// Number of formats; the length of every backend lookup table
    pub const COUNT: usize = Self::ALL.len();

    /// Index into backend lookup tables
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Size in bytes of one element, or of one 4x4 block for compressed formats
    pub const fn stride(self) -> u32 {
        use Format::*;
        match self {
            Unknown => 0,

            R32G32B32A32_FLOAT | R32G32B32A32_UINT | R32G32B32A32_INT => 16,
            R32G32B32_FLOAT | R32G32B32_UINT | R32G32B32_INT => 12,
            R16G16B16A16_FLOAT | R16G16B16A16_UINT | R16G16B16A16_INT
            | R16G16B16A16_UNORM | R16G16B16A16_NORM
            | R32G32_FLOAT | R32G32_UINT | R32G32_INT => 8,

            R11G11B10_FLOAT | R10G10B10A2_UINT | R10G10B10A2_UNORM
            | R8G8B8A8_UINT | R8G8B8A8_INT | R8G8B8A8_UNORM | R8G8B8A8_UNORM_SRGB
            | R8G8B8A8_NORM | B8G8R8A8_UNORM | B8G8R8A8_UNORM_SRGB
            | R16G16_FLOAT | R16G16_UINT | R16G16_INT | R16G16_UNORM | R16G16_NORM
            | R32_FLOAT | R32_UINT | R32_INT => 4,

            R8G8_UINT | R8G8_INT | R8G8_UNORM | R8G8_NORM
            | R16_FLOAT | R16_UINT | R16_INT | R16_UNORM | R16_NORM => 2,

            R8_UINT | R8_INT | R8_UNORM | R8_NORM => 1,

            D32_FLOAT_S8X24_UINT => 8,
            D24_UNORM_S8_UINT | D32_FLOAT => 4,
            D16_UNORM => 2,

            BC1_UNORM | BC1_UNORM_SRGB | BC4_UNORM | BC4_NORM => 8,
            BC2_UNORM | BC2_UNORM_SRGB | BC3_UNORM | BC3_UNORM_SRGB
            | BC5_UNORM | BC5_NORM | BC6H_UF16 | BC6H_SF16
            | BC7_UNORM | BC7_UNORM_SRGB => 16,
        }
    }

    /// Number of color (or depth) components
    pub const fn component_count(self) -> u32 {
        use Format::*;
        match self {
            Unknown => 0,
            R32G32B32A32_FLOAT | R16G16B16A16_FLOAT | R32G32B32A32_UINT | R16G16B16A16_UINT
            | R10G10B10A2_UINT | R8G8B8A8_UINT | R32G32B32A32_INT | R16G16B16A16_INT
            | R8G8B8A8_INT | R16G16B16A16_UNORM | R10G10B10A2_UNORM | R8G8B8A8_UNORM
            | R8G8B8A8_UNORM_SRGB | B8G8R8A8_UNORM | B8G8R8A8_UNORM_SRGB
            | R16G16B16A16_NORM | R8G8B8A8_NORM
            | BC1_UNORM | BC1_UNORM_SRGB | BC2_UNORM | BC2_UNORM_SRGB
            | BC3_UNORM | BC3_UNORM_SRGB | BC7_UNORM | BC7_UNORM_SRGB => 4,
            R32G32B32_FLOAT | R11G11B10_FLOAT | R32G32B32_UINT | R32G32B32_INT
            | BC6H_UF16 | BC6H_SF16 => 3,
            R32G32_FLOAT | R16G16_FLOAT | R32G32_UINT | R16G16_UINT | R8G8_UINT
            | R32G32_INT | R16G16_INT | R8G8_INT | R16G16_UNORM | R8G8_UNORM
            | R16G16_NORM | R8G8_NORM | BC5_UNORM | BC5_NORM
            | D32_FLOAT_S8X24_UINT | D24_UNORM_S8_UINT => 2,
            R32_FLOAT | R16_FLOAT | R32_UINT | R16_UINT | R8_UINT | R32_INT | R16_INT
            | R8_INT | R16_UNORM | R8_UNORM | R16_NORM | R8_NORM
            | D32_FLOAT | D16_UNORM | BC4_UNORM | BC4_NORM => 1,
        }
    }

    /// Depth (or depth-stencil) format
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            Format::D32_FLOAT_S8X24_UINT | Format::D24_UNORM_S8_UINT | Format::D32_FLOAT | Format::D16_UNORM
        )
    }

    /// Depth format with a stencil channel
    pub const fn has_stencil(self) -> bool {
        matches!(self, Format::D32_FLOAT_S8X24_UINT | Format::D24_UNORM_S8_UINT)
    }

    /// Block-compressed (4x4 blocks)
    pub const fn is_compressed(self) -> bool {
        matches!(
            self,
            Format::BC1_UNORM | Format::BC1_UNORM_SRGB | Format::BC2_UNORM | Format::BC2_UNORM_SRGB
                | Format::BC3_UNORM | Format::BC3_UNORM_SRGB | Format::BC4_UNORM | Format::BC4_NORM
                | Format::BC5_UNORM | Format::BC5_NORM | Format::BC6H_UF16 | Format::BC6H_SF16
                | Format::BC7_UNORM | Format::BC7_UNORM_SRGB
        )
    }

    /// sRGB-encoded color format
    pub const fn is_srgb(self) -> bool {
        matches!(
            self,
            Format::R8G8B8A8_UNORM_SRGB | Format::B8G8R8A8_UNORM_SRGB | Format::BC1_UNORM_SRGB
                | Format::BC2_UNORM_SRGB | Format::BC3_UNORM_SRGB | Format::BC7_UNORM_SRGB
        )
    }

    /// Integer (non-normalized) format
    pub const fn is_integer(self) -> bool {
        use Format::*;
        matches!(
            self,
            R32G32B32A32_UINT | R16G16B16A16_UINT | R10G10B10A2_UINT | R8G8B8A8_UINT
                | R32G32B32_UINT | R32G32_UINT | R16G16_UINT | R8G8_UINT | R32_UINT
                | R16_UINT | R8_UINT | R32G32B32A32_INT | R16G16B16A16_INT | R8G8B8A8_INT
                | R32G32B32_INT | R32G32_INT | R16G16_INT | R8G8_INT | R32_INT | R16_INT | R8_INT
        )
    }

    /// The sRGB twin of a linear format, if one exists
    pub const fn to_srgb(self) -> Format {
        match self {
            Format::R8G8B8A8_UNORM => Format::R8G8B8A8_UNORM_SRGB,
            Format::B8G8R8A8_UNORM => Format::B8G8R8A8_UNORM_SRGB,
            Format::BC1_UNORM => Format::BC1_UNORM_SRGB,
            Format::BC2_UNORM => Format::BC2_UNORM_SRGB,
            Format::BC3_UNORM => Format::BC3_UNORM_SRGB,
            Format::BC7_UNORM => Format::BC7_UNORM_SRGB,
            other => other,
        }
    }

    /// Width/height in texels of one addressable unit (4 for block-compressed)
    pub const fn block_dimension(self) -> u32 {
        if self.is_compressed() {
            4
        } else {
            1
        }
    }

    /// Bytes in one row of `width` texels (one row of blocks when compressed)
    pub fn row_pitch(self, width: u32) -> usize {
        let block = self.block_dimension();
        let blocks_wide = width.div_ceil(block).max(1);
        (blocks_wide as usize).saturating_mul(self.stride() as usize)
    }

    /// Bytes in one `width` x `height` slice
    pub fn slice_pitch(self, width: u32, height: u32) -> usize {
        let block = self.block_dimension();
        let blocks_high = height.div_ceil(block).max(1);
        self.row_pitch(width).saturating_mul(blocks_high as usize)
    }

    /// Canonical name (matches the enum variant)
    pub fn name(self) -> &'static str {
        FORMAT_NAMES[self.index()]
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    /// Parse a format name, case-insensitively (`"r8g8b8a8_unorm_srgb"`)
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .iter()
            .copied()
            .find(|format| format.name().eq_ignore_ascii_case(text.trim()))
            .ok_or_else(|| Error::InvalidResource(format!("Unknown format name '{}'", text)))
    }
}

static FORMAT_NAMES: [&str; Format::COUNT] = [
    "Unknown",
    "R32G32B32A32_FLOAT",
    "R16G16B16A16_FLOAT",
    "R32G32B32_FLOAT",
    "R11G11B10_FLOAT",
    "R32G32_FLOAT",
    "R16G16_FLOAT",
    "R32_FLOAT",
    "R16_FLOAT",
    "R32G32B32A32_UINT",
    "R16G16B16A16_UINT",
    "R10G10B10A2_UINT",
    "R8G8B8A8_UINT",
    "R32G32B32_UINT",
    "R32G32_UINT",
    "R16G16_UINT",
    "R8G8_UINT",
    "R32_UINT",
    "R16_UINT",
    "R8_UINT",
    "R32G32B32A32_INT",
    "R16G16B16A16_INT",
    "R8G8B8A8_INT",
    "R32G32B32_INT",
    "R32G32_INT",
    "R16G16_INT",
    "R8G8_INT",
    "R32_INT",
    "R16_INT",
    "R8_INT",
    "R16G16B16A16_UNORM",
    "R10G10B10A2_UNORM",
    "R8G8B8A8_UNORM",
    "R8G8B8A8_UNORM_SRGB",
    "B8G8R8A8_UNORM",
    "B8G8R8A8_UNORM_SRGB",
    "R16G16_UNORM",
    "R8G8_UNORM",
    "R16_UNORM",
    "R8_UNORM",
    "R16G16B16A16_NORM",
    "R8G8B8A8_NORM",
    "R16G16_NORM",
    "R8G8_NORM",
    "R16_NORM",
    "R8_NORM",
    "D32_FLOAT_S8X24_UINT",
    "D24_UNORM_S8_UINT",
    "D32_FLOAT",
    "D16_UNORM",
    "BC1_UNORM",
    "BC1_UNORM_SRGB",
    "BC2_UNORM",
    "BC2_UNORM_SRGB",
    "BC3_UNORM",
    "BC3_UNORM_SRGB",
    "BC4_UNORM",
    "BC4_NORM",
    "BC5_UNORM",
    "BC5_NORM",
    "BC6H_UF16",
    "BC6H_SF16",
    "BC7_UNORM",
    "BC7_UNORM_SRGB",
];

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
