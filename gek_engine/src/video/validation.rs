/// Description checks run by every device before it touches the native API
///
/// Each function logs the first problem it finds and returns
/// `Error::InvalidResource`.

use crate::error::Result;
use crate::video::pipeline::MAX_VERTEX_BUFFERS;
use crate::video::state::MAX_RENDER_TARGETS;
use crate::video::{
    BufferDescription, BufferFlags, BufferType, CompiledProgram, Format, MapMode, PipelineStateDescription,
    SamplerStateDescription, TextureData, TextureDescription, TextureFlags,
};

const SOURCE: &str = "gek::video::Validation";

/// Check a buffer description and its optional initial data
pub fn validate_buffer(desc: &BufferDescription, data: Option<&[u8]>) -> Result<()> {
    if desc.count == 0 {
        crate::engine_bail_invalid!(SOURCE, "Buffer '{}' has a zero element count", desc.name);
    }
    if desc.element_stride() == 0 {
        crate::engine_bail_invalid!(
            SOURCE,
            "Buffer '{}' has neither a stride nor a sized format",
            desc.name
        );
    }

    match desc.buffer_type {
        BufferType::Index => {
            if desc.format != Format::R16_UINT && desc.format != Format::R32_UINT {
                crate::engine_bail_invalid!(
                    SOURCE,
                    "Index buffer '{}' must be R16_UINT or R32_UINT, not {}",
                    desc.name, desc.format
                );
            }
        }
        BufferType::Constant => {
            if desc.size_bytes() % 16 != 0 {
                crate::engine_bail_invalid!(
                    SOURCE,
                    "Constant buffer '{}' is {} bytes, not a multiple of 16",
                    desc.name, desc.size_bytes()
                );
            }
            if desc.flags.contains(BufferFlags::UNORDERED_ACCESS) {
                crate::engine_bail_invalid!(
                    SOURCE,
                    "Constant buffer '{}' cannot have an unordered-access view",
                    desc.name
                );
            }
        }
        BufferType::Structured => {
            if desc.stride == 0 {
                crate::engine_bail_invalid!(
                    SOURCE,
                    "Structured buffer '{}' needs an explicit stride",
                    desc.name
                );
            }
        }
        BufferType::Raw | BufferType::Vertex => {}
    }

    if desc.flags.contains(BufferFlags::STAGING)
        && desc.flags.intersects(BufferFlags::RESOURCE | BufferFlags::UNORDERED_ACCESS | BufferFlags::MUTABLE)
    {
        crate::engine_bail_invalid!(
            SOURCE,
            "Staging buffer '{}' cannot be bound or mutable",
            desc.name
        );
    }
    if desc.flags.contains(BufferFlags::COUNTER) && !desc.flags.contains(BufferFlags::UNORDERED_ACCESS) {
        crate::engine_bail_invalid!(
            SOURCE,
            "Buffer '{}' asks for a counter without an unordered-access view",
            desc.name
        );
    }

    if let Some(data) = data {
        if data.is_empty() || data.len() as u64 > desc.size_bytes() {
            crate::engine_bail_invalid!(
                SOURCE,
                "Initial data for buffer '{}' is {} bytes, buffer holds {}",
                desc.name, data.len(), desc.size_bytes()
            );
        }
    }
    Ok(())
}

/// Check a texture description and its optional initial data
pub fn validate_texture(desc: &TextureDescription, data: Option<&TextureData>) -> Result<()> {
    if desc.width == 0 || desc.height == 0 || desc.depth == 0 {
        crate::engine_bail_invalid!(
            SOURCE,
            "Texture '{}' has a zero dimension ({}x{}x{})",
            desc.name, desc.width, desc.height, desc.depth
        );
    }
    let limit = desc.dimension_limit();
    if desc.width > limit || desc.height > limit || desc.depth > limit {
        crate::engine_bail_invalid!(
            SOURCE,
            "Texture '{}' is {}x{}x{}, larger than {} on some axis",
            desc.name, desc.width, desc.height, desc.depth, limit
        );
    }
    if desc.format == Format::Unknown {
        crate::engine_bail_invalid!(SOURCE, "Texture '{}' has an unknown format", desc.name);
    }
    if desc.mip_levels() > desc.full_mip_chain() {
        crate::engine_bail_invalid!(
            SOURCE,
            "Texture '{}' asks for {} mip levels, at most {} fit",
            desc.name, desc.mip_levels(), desc.full_mip_chain()
        );
    }
    if desc.sample_count == 0 || !desc.sample_count.is_power_of_two() || desc.sample_count > 32 {
        crate::engine_bail_invalid!(
            SOURCE,
            "Texture '{}' has an invalid sample count {}",
            desc.name, desc.sample_count
        );
    }
    if desc.is_multisampled()
        && (desc.mip_levels() > 1 || desc.flags.contains(TextureFlags::UNORDERED_ACCESS))
    {
        crate::engine_bail_invalid!(
            SOURCE,
            "Multisampled texture '{}' cannot have mips or an unordered-access view",
            desc.name
        );
    }

    let flags = desc.flags;
    if flags.contains(TextureFlags::DEPTH_TARGET) {
        if !desc.format.is_depth() {
            crate::engine_bail_invalid!(
                SOURCE,
                "Depth target '{}' needs a depth format, not {}",
                desc.name, desc.format
            );
        }
        if desc.is_volume() {
            crate::engine_bail_invalid!(SOURCE, "Volume texture '{}' cannot be a depth target", desc.name);
        }
    }
    if desc.format.is_depth() {
        if flags.contains(TextureFlags::UNORDERED_ACCESS) {
            crate::engine_bail_invalid!(
                SOURCE,
                "Depth format texture '{}' cannot have an unordered-access view",
                desc.name
            );
        }
        if flags.contains(TextureFlags::RENDER_TARGET) {
            crate::engine_bail_invalid!(
                SOURCE,
                "Depth format texture '{}' cannot be a render target",
                desc.name
            );
        }
    }
    if flags.contains(TextureFlags::READ_WRITE) && !flags.contains(TextureFlags::DEPTH_TARGET) {
        crate::engine_bail_invalid!(
            SOURCE,
            "READ_WRITE on texture '{}' requires DEPTH_TARGET",
            desc.name
        );
    }
    if desc.format.is_compressed()
        && flags.intersects(TextureFlags::RENDER_TARGET | TextureFlags::UNORDERED_ACCESS)
    {
        crate::engine_bail_invalid!(
            SOURCE,
            "Block-compressed texture '{}' cannot be written by the GPU",
            desc.name
        );
    }
    if desc.is_cube() {
        if desc.width != desc.height {
            crate::engine_bail_invalid!(
                SOURCE,
                "Cube map '{}' faces must be square, got {}x{}",
                desc.name, desc.width, desc.height
            );
        }
        if desc.depth != 1 {
            crate::engine_bail_invalid!(SOURCE, "Cube map '{}' must have a depth of 1", desc.name);
        }
    }

    if let Some(data) = data {
        let expected = desc.subresource_count() as usize;
        if data.subresources.len() != expected {
            crate::engine_bail_invalid!(
                SOURCE,
                "Texture '{}' expects {} subresources, got {}",
                desc.name, expected, data.subresources.len()
            );
        }
        let mip_levels = desc.mip_levels();
        for (index, subresource) in data.subresources.iter().enumerate() {
            let mip = index as u32 % mip_levels;
            let size = desc.subresource_size(mip);
            if subresource.len() != size {
                crate::engine_bail_invalid!(
                    SOURCE,
                    "Texture '{}' subresource {} (mip {}) is {} bytes, expected {}",
                    desc.name, index, mip, subresource.len(), size
                );
            }
        }
    }
    Ok(())
}

/// Check a sampler description
pub fn validate_sampler(desc: &SamplerStateDescription) -> Result<()> {
    if desc.max_anisotropy == 0 || desc.max_anisotropy > 16 {
        crate::engine_bail_invalid!(
            SOURCE,
            "Sampler max anisotropy {} is outside 1..=16",
            desc.max_anisotropy
        );
    }
    if desc.min_lod > desc.max_lod {
        crate::engine_bail_invalid!(
            SOURCE,
            "Sampler min LOD {} is above max LOD {}",
            desc.min_lod, desc.max_lod
        );
    }
    Ok(())
}

/// Check a compiled program before a backend builds it
pub fn validate_compiled_program(program: &CompiledProgram) -> Result<()> {
    if program.bytecode.is_empty() {
        crate::engine_bail_invalid!(
            SOURCE,
            "Program '{}' ({}) has no bytecode",
            program.name, program.pipeline
        );
    }
    Ok(())
}

/// Check program stages and input layout of a pipeline state
pub fn validate_pipeline_state(desc: &PipelineStateDescription) -> Result<()> {
    for (stage, program) in desc.programs() {
        if program.pipeline() != stage {
            crate::engine_bail_invalid!(
                SOURCE,
                "Pipeline '{}' has {} program '{}' in its {} slot",
                desc.name, program.pipeline(), program.name(), stage
            );
        }
    }

    if desc.is_compute() {
        if desc.vertex_program.is_some() || desc.geometry_program.is_some() || desc.pixel_program.is_some() {
            crate::engine_bail_invalid!(
                SOURCE,
                "Compute pipeline '{}' cannot also have graphics programs",
                desc.name
            );
        }
        return Ok(());
    }

    if desc.vertex_program.is_none() {
        crate::engine_bail_invalid!(SOURCE, "Pipeline '{}' has no vertex program", desc.name);
    }
    if desc.render_target_formats.len() > MAX_RENDER_TARGETS {
        crate::engine_bail_invalid!(
            SOURCE,
            "Pipeline '{}' targets {} render targets, at most {} are supported",
            desc.name, desc.render_target_formats.len(), MAX_RENDER_TARGETS
        );
    }
    if desc.depth_format != Format::Unknown && !desc.depth_format.is_depth() {
        crate::engine_bail_invalid!(
            SOURCE,
            "Pipeline '{}' depth format {} is not a depth format",
            desc.name, desc.depth_format
        );
    }
    for element in &desc.input_layout {
        if element.format == Format::Unknown || element.format.is_compressed() || element.format.is_depth() {
            crate::engine_bail_invalid!(
                SOURCE,
                "Pipeline '{}' input {}{} has unusable format {}",
                desc.name, element.semantic, element.semantic_index, element.format
            );
        }
        if element.source_index as usize >= MAX_VERTEX_BUFFERS {
            crate::engine_bail_invalid!(
                SOURCE,
                "Pipeline '{}' input {}{} reads vertex slot {}, at most {} exist",
                desc.name, element.semantic, element.semantic_index, element.source_index, MAX_VERTEX_BUFFERS
            );
        }
    }
    Ok(())
}

/// Check that `desc` can be mapped with `mode`
///
/// Mutable buffers are CPU-write-only; reading back goes through a copy
/// into a staging buffer.
pub fn validate_map(desc: &BufferDescription, mode: MapMode) -> Result<()> {
    if !desc.flags.intersects(BufferFlags::MUTABLE | BufferFlags::STAGING) {
        crate::engine_bail_invalid!(SOURCE, "Buffer '{}' is neither mutable nor staging", desc.name);
    }
    if desc.flags.contains(BufferFlags::MUTABLE) && matches!(mode, MapMode::Read | MapMode::Write) {
        crate::engine_bail_invalid!(
            SOURCE,
            "Mutable buffer '{}' can only be mapped with WriteDiscard or WriteNoOverwrite, not {:?}",
            desc.name, mode
        );
    }
    Ok(())
}

/// Check that two buffers can be copied wholesale
pub fn validate_buffer_copy(destination: &BufferDescription, source: &BufferDescription) -> Result<()> {
    if destination.size_bytes() != source.size_bytes() {
        crate::engine_bail_invalid!(
            SOURCE,
            "Cannot copy buffer '{}' ({} bytes) into '{}' ({} bytes)",
            source.name, source.size_bytes(), destination.name, destination.size_bytes()
        );
    }
    Ok(())
}

/// Check that two textures can be copied wholesale
pub fn validate_texture_copy(destination: &TextureDescription, source: &TextureDescription) -> Result<()> {
    let same_shape = destination.width == source.width
        && destination.height == source.height
        && destination.depth == source.depth
        && destination.mip_levels() == source.mip_levels()
        && destination.array_size() == source.array_size()
        && destination.sample_count == source.sample_count;
    if !same_shape || destination.format.stride() != source.format.stride() {
        crate::engine_bail_invalid!(
            SOURCE,
            "Cannot copy texture '{}' into '{}': shapes or formats differ",
            source.name, destination.name
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
