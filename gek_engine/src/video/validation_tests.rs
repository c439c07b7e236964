//! Unit tests for validation.rs

use crate::gek::Error;
use crate::video::validation::{
    validate_buffer, validate_buffer_copy, validate_compiled_program, validate_map, validate_sampler,
    validate_texture, validate_texture_copy,
};
use crate::video::{
    BufferDescription, BufferFlags, BufferType, CompiledProgram, Format, MapMode, PipelineType,
    SamplerStateDescription, ShaderLanguage, TextureData, TextureDescription, TextureFlags,
};

fn is_invalid<T>(result: crate::gek::Result<T>) -> bool {
    matches!(result, Err(Error::InvalidResource(_)))
}

// ============================================================================
// BUFFERS
// ============================================================================

#[test]
fn test_valid_buffers_pass() {
    assert!(validate_buffer(&BufferDescription::vertex("v", 32, 3), None).is_ok());
    assert!(validate_buffer(&BufferDescription::index("i", Format::R32_UINT, 6), None).is_ok());
    assert!(validate_buffer(&BufferDescription::constant("c", 64), None).is_ok());
    assert!(validate_buffer(&BufferDescription::structured("s", 12, 100), None).is_ok());
}

#[test]
fn test_zero_count_rejected() {
    assert!(is_invalid(validate_buffer(&BufferDescription::vertex("v", 32, 0), None)));
}

#[test]
fn test_missing_stride_rejected() {
    let desc = BufferDescription {
        name: "raw".into(),
        count: 4,
        ..Default::default()
    };
    assert!(is_invalid(validate_buffer(&desc, None)));
}

#[test]
fn test_index_format_rejected() {
    let desc = BufferDescription::index("i", Format::R8_UINT, 6);
    assert!(is_invalid(validate_buffer(&desc, None)));
}

#[test]
fn test_constant_size_must_be_multiple_of_16() {
    assert!(is_invalid(validate_buffer(&BufferDescription::constant("c", 20), None)));
}

#[test]
fn test_staging_cannot_be_bound() {
    let desc = BufferDescription {
        name: "readback".into(),
        stride: 4,
        count: 16,
        buffer_type: BufferType::Raw,
        flags: BufferFlags::STAGING | BufferFlags::RESOURCE,
        ..Default::default()
    };
    assert!(is_invalid(validate_buffer(&desc, None)));
}

#[test]
fn test_counter_needs_unordered_access() {
    let mut desc = BufferDescription::structured("s", 16, 8);
    desc.flags |= BufferFlags::COUNTER;
    assert!(is_invalid(validate_buffer(&desc, None)));
    desc.flags |= BufferFlags::UNORDERED_ACCESS;
    assert!(validate_buffer(&desc, None).is_ok());
}

#[test]
fn test_map_modes_follow_buffer_usage() {
    let mutable = BufferDescription::constant("frame", 16);
    assert!(validate_map(&mutable, MapMode::WriteDiscard).is_ok());
    assert!(validate_map(&mutable, MapMode::WriteNoOverwrite).is_ok());
    assert!(is_invalid(validate_map(&mutable, MapMode::Read)));
    assert!(is_invalid(validate_map(&mutable, MapMode::Write)));

    let staging = BufferDescription {
        flags: BufferFlags::STAGING,
        ..BufferDescription::vertex("readback", 4, 4)
    };
    assert!(validate_map(&staging, MapMode::Read).is_ok());
    assert!(validate_map(&staging, MapMode::Write).is_ok());

    assert!(is_invalid(validate_map(&BufferDescription::vertex("static", 4, 4), MapMode::Read)));
}

#[test]
fn test_initial_data_must_fit() {
    let desc = BufferDescription::vertex("v", 4, 4);
    assert!(validate_buffer(&desc, Some(&[0u8; 16][..])).is_ok());
    assert!(validate_buffer(&desc, Some(&[0u8; 8][..])).is_ok());
    assert!(is_invalid(validate_buffer(&desc, Some(&[0u8; 17][..]))));
    assert!(is_invalid(validate_buffer(&desc, Some(&[0u8; 0][..]))));
}

// ============================================================================
// TEXTURES
// ============================================================================

#[test]
fn test_valid_textures_pass() {
    let color = TextureDescription::render_target("rt", Format::R8G8B8A8_UNORM, 64, 64);
    assert!(validate_texture(&color, None).is_ok());
    let depth = TextureDescription::depth_target("ds", Format::D24_UNORM_S8_UINT, 64, 64);
    assert!(validate_texture(&depth, None).is_ok());
}

#[test]
fn test_zero_dimension_rejected() {
    let desc = TextureDescription::texture_2d("t", Format::R8G8B8A8_UNORM, 0, 64);
    assert!(is_invalid(validate_texture(&desc, None)));
    let mut desc = TextureDescription::texture_2d("t", Format::R8G8B8A8_UNORM, 64, 64);
    desc.depth = 0;
    assert!(is_invalid(validate_texture(&desc, None)));
}

#[test]
fn test_oversized_textures_rejected() {
    let desc = TextureDescription::texture_2d("t", Format::R8G8B8A8_UNORM, 16384, 16384);
    assert!(validate_texture(&desc, None).is_ok());
    let desc = TextureDescription::texture_2d("t", Format::R8G8B8A8_UNORM, 16385, 4);
    assert!(is_invalid(validate_texture(&desc, None)));

    let mut desc = TextureDescription::texture_2d("v", Format::R32G32B32A32_FLOAT, u32::MAX, u32::MAX);
    desc.depth = u32::MAX;
    desc.mip_map_count = 1;
    assert!(is_invalid(validate_texture(&desc, None)));
    assert_eq!(desc.subresource_size(0), usize::MAX);
}

#[test]
fn test_unknown_format_rejected() {
    let desc = TextureDescription::texture_2d("t", Format::Unknown, 64, 64);
    assert!(is_invalid(validate_texture(&desc, None)));
}

#[test]
fn test_depth_target_requires_depth_format() {
    let desc = TextureDescription::depth_target("ds", Format::R32_FLOAT, 64, 64);
    assert!(is_invalid(validate_texture(&desc, None)));
}

#[test]
fn test_depth_format_cannot_be_unordered_access() {
    let mut desc = TextureDescription::depth_target("ds", Format::D32_FLOAT, 64, 64);
    desc.flags |= TextureFlags::UNORDERED_ACCESS;
    assert!(is_invalid(validate_texture(&desc, None)));
}

#[test]
fn test_too_many_mips_rejected() {
    let mut desc = TextureDescription::texture_2d("t", Format::R8G8B8A8_UNORM, 16, 16);
    desc.mip_map_count = 5;
    assert!(validate_texture(&desc, None).is_ok());
    desc.mip_map_count = 6;
    assert!(is_invalid(validate_texture(&desc, None)));
}

#[test]
fn test_multisample_rules() {
    let mut desc = TextureDescription::render_target("msaa", Format::R8G8B8A8_UNORM, 64, 64);
    desc.sample_count = 4;
    assert!(validate_texture(&desc, None).is_ok());
    desc.sample_count = 3;
    assert!(is_invalid(validate_texture(&desc, None)));
    desc.sample_count = 4;
    desc.mip_map_count = 2;
    assert!(is_invalid(validate_texture(&desc, None)));
}

#[test]
fn test_compressed_render_target_rejected() {
    let desc = TextureDescription::render_target("bc", Format::BC1_UNORM, 64, 64);
    assert!(is_invalid(validate_texture(&desc, None)));
}

#[test]
fn test_cube_must_be_square() {
    let desc = TextureDescription {
        name: "sky".into(),
        format: Format::R8G8B8A8_UNORM,
        width: 64,
        height: 32,
        flags: TextureFlags::RESOURCE | TextureFlags::CUBE,
        ..Default::default()
    };
    assert!(is_invalid(validate_texture(&desc, None)));
}

#[test]
fn test_texture_data_sizes_checked() {
    let mut desc = TextureDescription::texture_2d("t", Format::R8G8B8A8_UNORM, 4, 4);
    desc.mip_map_count = 3;
    let good = TextureData {
        subresources: vec![vec![0; 64], vec![0; 16], vec![0; 4]],
    };
    assert!(validate_texture(&desc, Some(&good)).is_ok());

    let short = TextureData {
        subresources: vec![vec![0; 64], vec![0; 16]],
    };
    assert!(is_invalid(validate_texture(&desc, Some(&short))));

    let wrong_size = TextureData {
        subresources: vec![vec![0; 64], vec![0; 15], vec![0; 4]],
    };
    assert!(is_invalid(validate_texture(&desc, Some(&wrong_size))));
}

// ============================================================================
// SAMPLERS, PROGRAMS, COPIES
// ============================================================================

#[test]
fn test_sampler_limits() {
    assert!(validate_sampler(&SamplerStateDescription::default()).is_ok());
    let desc = SamplerStateDescription {
        max_anisotropy: 17,
        ..Default::default()
    };
    assert!(is_invalid(validate_sampler(&desc)));
    let desc = SamplerStateDescription {
        min_lod: 4.0,
        max_lod: 1.0,
        ..Default::default()
    };
    assert!(is_invalid(validate_sampler(&desc)));
}

#[test]
fn test_empty_bytecode_rejected() {
    let program = CompiledProgram {
        pipeline: PipelineType::Pixel,
        name: "empty".into(),
        entry_point: "main".into(),
        language: ShaderLanguage::Dxbc,
        bytecode: Vec::new(),
        bindings: Vec::new(),
    };
    assert!(is_invalid(validate_compiled_program(&program)));
}

#[test]
fn test_copy_compatibility() {
    let a = BufferDescription::vertex("a", 16, 4);
    let b = BufferDescription::structured("b", 8, 8);
    assert!(validate_buffer_copy(&a, &b).is_ok());
    let c = BufferDescription::vertex("c", 16, 5);
    assert!(is_invalid(validate_buffer_copy(&a, &c)));

    let x = TextureDescription::texture_2d("x", Format::R8G8B8A8_UNORM, 32, 32);
    let y = TextureDescription::texture_2d("y", Format::R32_FLOAT, 32, 32);
    assert!(validate_texture_copy(&x, &y).is_ok());
    let z = TextureDescription::texture_2d("z", Format::R8G8B8A8_UNORM, 32, 16);
    assert!(is_invalid(validate_texture_copy(&x, &z)));
}
