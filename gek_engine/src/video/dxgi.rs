/// DXGI format codes
///
/// DDS files and the Direct3D 11 backend both speak DXGI, so the numeric
/// table lives here rather than in the backend crate.

use crate::video::Format;

/// `DXGI_FORMAT` code for each `Format`, indexed by `Format::index()`
pub const DXGI_FORMAT_TABLE: [u32; Format::COUNT] = [
    0,  // Unknown
    2,  // R32G32B32A32_FLOAT
    10, // R16G16B16A16_FLOAT
    6,  // R32G32B32_FLOAT
    26, // R11G11B10_FLOAT
    16, // R32G32_FLOAT
    34, // R16G16_FLOAT
    41, // R32_FLOAT
    54, // R16_FLOAT
    3,  // R32G32B32A32_UINT
    12, // R16G16B16A16_UINT
    25, // R10G10B10A2_UINT
    30, // R8G8B8A8_UINT
    7,  // R32G32B32_UINT
    17, // R32G32_UINT
    36, // R16G16_UINT
    50, // R8G8_UINT
    42, // R32_UINT
    57, // R16_UINT
    62, // R8_UINT
    4,  // R32G32B32A32_INT
    14, // R16G16B16A16_INT
    32, // R8G8B8A8_INT
    8,  // R32G32B32_INT
    18, // R32G32_INT
    38, // R16G16_INT
    52, // R8G8_INT
    43, // R32_INT
    59, // R16_INT
    64, // R8_INT
    11, // R16G16B16A16_UNORM
    24, // R10G10B10A2_UNORM
    28, // R8G8B8A8_UNORM
    29, // R8G8B8A8_UNORM_SRGB
    87, // B8G8R8A8_UNORM
    91, // B8G8R8A8_UNORM_SRGB
    35, // R16G16_UNORM
    49, // R8G8_UNORM
    56, // R16_UNORM
    61, // R8_UNORM
    13, // R16G16B16A16_NORM
    31, // R8G8B8A8_NORM
    37, // R16G16_NORM
    51, // R8G8_NORM
    58, // R16_NORM
    63, // R8_NORM
    20, // D32_FLOAT_S8X24_UINT
    45, // D24_UNORM_S8_UINT
    40, // D32_FLOAT
    55, // D16_UNORM
    71, // BC1_UNORM
    72, // BC1_UNORM_SRGB
    74, // BC2_UNORM
    75, // BC2_UNORM_SRGB
    77, // BC3_UNORM
    78, // BC3_UNORM_SRGB
    80, // BC4_UNORM
    81, // BC4_NORM
    83, // BC5_UNORM
    84, // BC5_NORM
    95, // BC6H_UF16
    96, // BC6H_SF16
    98, // BC7_UNORM
    99, // BC7_UNORM_SRGB
];

const _: () = assert!(DXGI_FORMAT_TABLE.len() == Format::COUNT);

/// `DXGI_FORMAT` code of a format
#[inline]
pub fn to_dxgi(format: Format) -> u32 {
    DXGI_FORMAT_TABLE[format.index()]
}

/// Format for a `DXGI_FORMAT` code, `Format::Unknown` when the engine has no equivalent
pub fn from_dxgi(code: u32) -> Format {
    if code == 0 {
        return Format::Unknown;
    }
    DXGI_FORMAT_TABLE
        .iter()
        .position(|&value| value == code)
        .map(|index| Format::ALL[index])
        .unwrap_or(Format::Unknown)
}
