//! Unit tests for dds.rs
//!
//! DDS files are assembled in memory by `DdsBuilder`.

use crate::gek::Error;
use crate::video::dds::{parse, parse_header, MAX_HEADER_LEN};
use crate::video::{Format, TextureFlags};

// ============================================================================
// TEST HELPERS
// ============================================================================

struct DdsBuilder {
    width: u32,
    height: u32,
    depth: u32,
    mips: u32,
    pf_flags: u32,
    four_cc: [u8; 4],
    bit_count: u32,
    masks: [u32; 4],
    caps2: u32,
    dx10: Option<(u32, u32, u32, u32)>,
}

impl DdsBuilder {
    fn rgba(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth: 0,
            mips: 1,
            pf_flags: 0x41,
            four_cc: [0; 4],
            bit_count: 32,
            masks: [0xFF, 0xFF00, 0xFF_0000, 0xFF00_0000],
            caps2: 0,
            dx10: None,
        }
    }

    fn four_cc(width: u32, height: u32, code: &[u8; 4]) -> Self {
        Self {
            pf_flags: 0x4,
            four_cc: *code,
            bit_count: 0,
            masks: [0; 4],
            ..Self::rgba(width, height)
        }
    }

    fn dx10(width: u32, height: u32, dxgi: u32, dimension: u32, misc: u32) -> Self {
        Self {
            dx10: Some((dxgi, dimension, misc, 1)),
            ..Self::four_cc(width, height, b"DX10")
        }
    }

    fn header(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut push = |value: u32| bytes.extend_from_slice(&value.to_le_bytes());
        push(0x2053_4444);
        push(124);
        push(0x1007);
        push(self.height);
        push(self.width);
        push(0);
        push(self.depth);
        push(self.mips);
        for _ in 0..11 {
            push(0);
        }
        push(32);
        push(self.pf_flags);
        push(u32::from_le_bytes(self.four_cc));
        push(self.bit_count);
        for mask in self.masks {
            push(mask);
        }
        push(0x1000);
        push(self.caps2);
        push(0);
        push(0);
        push(0);
        if let Some((dxgi, dimension, misc, array_size)) = self.dx10 {
            push(dxgi);
            push(dimension);
            push(misc);
            push(array_size);
            push(0);
        }
        bytes
    }

    fn file(&self, payload_len: usize) -> Vec<u8> {
        let mut bytes = self.header();
        bytes.extend((0..payload_len).map(|index| index as u8));
        bytes
    }
}

// ============================================================================
// HEADER
// ============================================================================

#[test]
fn test_rgba_header() {
    let header = parse_header(&DdsBuilder::rgba(16, 8).header(), "rgba").unwrap();
    assert_eq!(header.description.format, Format::R8G8B8A8_UNORM);
    assert_eq!((header.description.width, header.description.height), (16, 8));
    assert_eq!(header.description.depth, 1);
    assert_eq!(header.data_offset, 128);
    assert!(header.description.flags.contains(TextureFlags::RESOURCE));
}

#[test]
fn test_bgra_masks() {
    let mut builder = DdsBuilder::rgba(4, 4);
    builder.masks = [0xFF_0000, 0xFF00, 0xFF, 0xFF00_0000];
    let header = parse_header(&builder.header(), "bgra").unwrap();
    assert_eq!(header.description.format, Format::B8G8R8A8_UNORM);
}

#[test]
fn test_four_cc_formats() {
    let cases: [(&[u8; 4], Format); 5] = [
        (b"DXT1", Format::BC1_UNORM),
        (b"DXT5", Format::BC3_UNORM),
        (b"ATI1", Format::BC4_UNORM),
        (b"ATI2", Format::BC5_UNORM),
        (b"BC5S", Format::BC5_NORM),
    ];
    for (code, expected) in cases {
        let header = parse_header(&DdsBuilder::four_cc(64, 64, code).header(), "bc").unwrap();
        assert_eq!(header.description.format, expected);
    }
}

#[test]
fn test_d3dformat_four_cc() {
    let mut builder = DdsBuilder::four_cc(8, 8, &[0; 4]);
    builder.four_cc = 113u32.to_le_bytes();
    let header = parse_header(&builder.header(), "half").unwrap();
    assert_eq!(header.description.format, Format::R16G16B16A16_FLOAT);
}

#[test]
fn test_dx10_header() {
    let header = parse_header(&DdsBuilder::dx10(32, 32, 98, 3, 0).header(), "bc7").unwrap();
    assert_eq!(header.description.format, Format::BC7_UNORM);
    assert_eq!(header.data_offset, MAX_HEADER_LEN);
}

#[test]
fn test_dx10_cube() {
    let header = parse_header(&DdsBuilder::dx10(32, 32, 28, 3, 0x4).header(), "sky").unwrap();
    assert!(header.description.is_cube());
    assert_eq!(header.description.array_size(), 6);
}

#[test]
fn test_legacy_cube_and_volume_caps() {
    let mut cube = DdsBuilder::rgba(8, 8);
    cube.caps2 = 0x200 | 0xFC00;
    assert!(parse_header(&cube.header(), "cube").unwrap().description.is_cube());

    let mut volume = DdsBuilder::rgba(8, 8);
    volume.caps2 = 0x20_0000;
    volume.depth = 4;
    let description = parse_header(&volume.header(), "volume").unwrap().description;
    assert!(description.is_volume());
    assert_eq!(description.depth, 4);
}

#[test]
fn test_rejects_bad_magic_and_formats() {
    let mut bytes = DdsBuilder::rgba(4, 4).header();
    bytes[0] = b'X';
    assert!(matches!(parse_header(&bytes, "bad"), Err(Error::FileSystem(_))));

    assert!(parse_header(&bytes[..20], "short").is_err());

    let unknown = DdsBuilder::four_cc(4, 4, b"ABCD");
    assert!(parse_header(&unknown.header(), "unknown").is_err());

    let unsupported_dxgi = DdsBuilder::dx10(4, 4, 44, 3, 0);
    assert!(parse_header(&unsupported_dxgi.header(), "typeless").is_err());
}

#[test]
fn test_rejects_impossible_mip_count() {
    let mut builder = DdsBuilder::rgba(4, 4);
    builder.mips = 4;
    assert!(parse_header(&builder.header(), "mips").is_err());
}

#[test]
fn test_rejects_oversized_dimensions() {
    // R32G32B32A32_FLOAT volume at the largest extent a header can hold
    let mut huge = DdsBuilder::dx10(u32::MAX, u32::MAX, 2, 4, 0);
    huge.depth = u32::MAX;
    let result = parse_header(&huge.header(), "huge");
    assert!(matches!(&result, Err(Error::FileSystem(message)) if message.contains("larger than 2048")));
    assert!(matches!(parse(&huge.file(64), "huge", false), Err(Error::FileSystem(_))));

    let mut volume = DdsBuilder::dx10(2049, 4, 2, 4, 0);
    volume.depth = 4;
    assert!(parse_header(&volume.header(), "tall").is_err());

    assert!(parse_header(&DdsBuilder::rgba(16385, 1).header(), "wide").is_err());
    assert!(parse_header(&DdsBuilder::rgba(16384, 1).header(), "widest").is_ok());
}

// ============================================================================
// DATA
// ============================================================================

#[test]
fn test_parse_splits_mips() {
    let mut builder = DdsBuilder::rgba(4, 4);
    builder.mips = 3;
    let bytes = builder.file(64 + 16 + 4);

    let (description, data) = parse(&bytes, "mips", false).unwrap();
    assert_eq!(description.mip_map_count, 3);
    let sizes: Vec<usize> = data.subresources.iter().map(|s| s.len()).collect();
    assert_eq!(sizes, vec![64, 16, 4]);
    assert_eq!(data.subresources[1][0], 64);
}

#[test]
fn test_parse_top_mip_only() {
    let mut builder = DdsBuilder::rgba(4, 4);
    builder.mips = 3;
    let bytes = builder.file(84);

    let (description, data) = parse(&bytes, "mips", true).unwrap();
    assert_eq!(description.mip_map_count, 1);
    assert_eq!(data.subresources.len(), 1);
    assert_eq!(data.subresources[0].len(), 64);
}

#[test]
fn test_parse_cube_faces() {
    let bytes = DdsBuilder::dx10(4, 4, 71, 3, 0x4).file(6 * 8);
    let (description, data) = parse(&bytes, "cube", false).unwrap();
    assert_eq!(description.format, Format::BC1_UNORM);
    assert_eq!(data.subresources.len(), 6);
    assert!(data.subresources.iter().all(|face| face.len() == 8));
}

#[test]
fn test_parse_truncated_data() {
    let bytes = DdsBuilder::rgba(4, 4).file(10);
    assert!(matches!(parse(&bytes, "short", false), Err(Error::FileSystem(_))));
}
