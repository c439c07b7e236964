//! Unit tests for texture_loader.rs

use crate::gek::Error;
use crate::video::texture_loader::{load_texture_file, read_texture_description};
use crate::video::{Format, TextureLoadFlags};
use image::{Rgba, RgbaImage};

/// Minimal uncompressed RGBA DDS with one mip
fn rgba_dds(width: u32, height: u32) -> Vec<u8> {
    let mut header = [0u32; 32];
    header[0] = 0x2053_4444;
    header[1] = 124;
    header[2] = 0x1007;
    header[3] = height;
    header[4] = width;
    header[7] = 1;
    header[19] = 32;
    header[20] = 0x41;
    header[22] = 32;
    header[23] = 0xFF;
    header[24] = 0xFF00;
    header[25] = 0xFF_0000;
    header[26] = 0xFF00_0000;
    header[27] = 0x1000;

    let mut bytes: Vec<u8> = header.iter().flat_map(|value| value.to_le_bytes()).collect();
    bytes.extend(std::iter::repeat(0x80u8).take((width * height * 4) as usize));
    bytes
}

#[test]
fn test_load_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("albedo.png");
    RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255])).save(&path).unwrap();

    let (description, data) = load_texture_file(&path, TextureLoadFlags::empty()).unwrap();
    assert_eq!(description.format, Format::R8G8B8A8_UNORM);
    assert_eq!((description.width, description.height), (3, 2));
    assert_eq!(description.mip_levels(), 1);
    assert_eq!(data.subresources.len(), 1);
    assert_eq!(data.subresources[0].len(), 3 * 2 * 4);
    assert_eq!(&data.subresources[0][..4], &[10, 20, 30, 255]);
}

#[test]
fn test_load_png_srgb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("albedo.PNG");
    RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])).save_with_format(&path, image::ImageFormat::Png).unwrap();

    let (description, _) = load_texture_file(&path, TextureLoadFlags::SRGB).unwrap();
    assert_eq!(description.format, Format::R8G8B8A8_UNORM_SRGB);
}

#[test]
fn test_load_bmp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mask.bmp");
    RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])).save(&path).unwrap();

    let (description, data) = load_texture_file(&path, TextureLoadFlags::empty()).unwrap();
    assert_eq!((description.width, description.height), (4, 4));
    assert_eq!(data.subresources[0].len(), 64);
}

#[test]
fn test_load_dds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("normal.dds");
    std::fs::write(&path, rgba_dds(8, 4)).unwrap();

    let (description, data) = load_texture_file(&path, TextureLoadFlags::SRGB).unwrap();
    assert_eq!(description.format, Format::R8G8B8A8_UNORM_SRGB);
    assert_eq!((description.width, description.height), (8, 4));
    assert_eq!(data.subresources[0].len(), 128);
}

#[test]
fn test_description_only() {
    let dir = tempfile::tempdir().unwrap();
    let dds_path = dir.path().join("header.dds");
    std::fs::write(&dds_path, rgba_dds(16, 16)).unwrap();
    let png_path = dir.path().join("size.png");
    RgbaImage::from_pixel(5, 7, Rgba([0, 0, 0, 255])).save(&png_path).unwrap();

    let description = read_texture_description(&dds_path).unwrap();
    assert_eq!((description.width, description.height), (16, 16));

    let description = read_texture_description(&png_path).unwrap();
    assert_eq!((description.width, description.height), (5, 7));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("texture.exr");
    std::fs::write(&path, [0u8; 16]).unwrap();

    assert!(matches!(load_texture_file(&path, TextureLoadFlags::empty()), Err(Error::FileSystem(_))));
    assert!(matches!(read_texture_description(&path), Err(Error::FileSystem(_))));
}

#[test]
fn test_corrupt_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    assert!(matches!(load_texture_file(&path, TextureLoadFlags::empty()), Err(Error::FileSystem(_))));
}
