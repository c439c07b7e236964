/// Fixed-function state translation
///
/// Pure enum mappings from the engine state descriptions to GL enums, and
/// the functions that apply a pipeline's rasterizer, depth-stencil and blend
/// state to the current GL context.

use glow::HasContext;

use gek_engine::gek::video::{
    AddressMode, BlendOperation, BlendSource, BlendStateDescription, ColorWriteMask, ComparisonFunction,
    CullMode, DepthStateDescription, DepthWrite, FillMode, FilterType, PrimitiveType,
    RasterizerStateDescription, StencilOperation, StencilStateDescription,
};

// ============================================================================
// ENUM MAPPINGS
// ============================================================================

pub fn comparison_function(function: ComparisonFunction) -> u32 {
    match function {
        ComparisonFunction::Always => glow::ALWAYS,
        ComparisonFunction::Never => glow::NEVER,
        ComparisonFunction::Equal => glow::EQUAL,
        ComparisonFunction::NotEqual => glow::NOTEQUAL,
        ComparisonFunction::Less => glow::LESS,
        ComparisonFunction::LessEqual => glow::LEQUAL,
        ComparisonFunction::Greater => glow::GREATER,
        ComparisonFunction::GreaterEqual => glow::GEQUAL,
    }
}

pub fn stencil_operation(operation: StencilOperation) -> u32 {
    match operation {
        StencilOperation::Keep => glow::KEEP,
        StencilOperation::Zero => glow::ZERO,
        StencilOperation::Replace => glow::REPLACE,
        StencilOperation::Invert => glow::INVERT,
        StencilOperation::Increase => glow::INCR_WRAP,
        StencilOperation::IncreaseSaturated => glow::INCR,
        StencilOperation::Decrease => glow::DECR_WRAP,
        StencilOperation::DecreaseSaturated => glow::DECR,
    }
}

pub fn blend_factor(source: BlendSource) -> u32 {
    match source {
        BlendSource::Zero => glow::ZERO,
        BlendSource::One => glow::ONE,
        BlendSource::BlendFactor => glow::CONSTANT_COLOR,
        BlendSource::InverseBlendFactor => glow::ONE_MINUS_CONSTANT_COLOR,
        BlendSource::SourceColor => glow::SRC_COLOR,
        BlendSource::InverseSourceColor => glow::ONE_MINUS_SRC_COLOR,
        BlendSource::SourceAlpha => glow::SRC_ALPHA,
        BlendSource::InverseSourceAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendSource::SourceAlphaSaturated => glow::SRC_ALPHA_SATURATE,
        BlendSource::DestinationColor => glow::DST_COLOR,
        BlendSource::InverseDestinationColor => glow::ONE_MINUS_DST_COLOR,
        BlendSource::DestinationAlpha => glow::DST_ALPHA,
        BlendSource::InverseDestinationAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendSource::SecondarySourceColor => glow::SRC1_COLOR,
        BlendSource::InverseSecondarySourceColor => glow::ONE_MINUS_SRC1_COLOR,
        BlendSource::SecondarySourceAlpha => glow::SRC1_ALPHA,
        BlendSource::InverseSecondarySourceAlpha => glow::ONE_MINUS_SRC1_ALPHA,
    }
}

pub fn blend_operation(operation: BlendOperation) -> u32 {
    match operation {
        BlendOperation::Add => glow::FUNC_ADD,
        BlendOperation::Subtract => glow::FUNC_SUBTRACT,
        BlendOperation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendOperation::Minimum => glow::MIN,
        BlendOperation::Maximum => glow::MAX,
    }
}

/// Minification filter combining the texel and mip filters
pub fn min_filter(filter: FilterType, mip_filter: FilterType) -> u32 {
    match (filter, mip_filter) {
        (FilterType::Point, FilterType::Point) => glow::NEAREST_MIPMAP_NEAREST,
        (FilterType::Point, FilterType::Linear) => glow::NEAREST_MIPMAP_LINEAR,
        (FilterType::Linear, FilterType::Point) => glow::LINEAR_MIPMAP_NEAREST,
        (FilterType::Linear, FilterType::Linear) => glow::LINEAR_MIPMAP_LINEAR,
    }
}

pub fn mag_filter(filter: FilterType) -> u32 {
    match filter {
        FilterType::Point => glow::NEAREST,
        FilterType::Linear => glow::LINEAR,
    }
}

pub fn address_mode(mode: AddressMode) -> u32 {
    match mode {
        AddressMode::Wrap => glow::REPEAT,
        AddressMode::Mirror => glow::MIRRORED_REPEAT,
        AddressMode::Clamp => glow::CLAMP_TO_EDGE,
        AddressMode::Border => glow::CLAMP_TO_BORDER,
        AddressMode::MirrorOnce => glow::MIRROR_CLAMP_TO_EDGE,
    }
}

pub fn primitive_mode(primitive: PrimitiveType) -> u32 {
    match primitive {
        PrimitiveType::PointList => glow::POINTS,
        PrimitiveType::LineList => glow::LINES,
        PrimitiveType::LineStrip => glow::LINE_STRIP,
        PrimitiveType::TriangleList => glow::TRIANGLES,
        PrimitiveType::TriangleStrip => glow::TRIANGLE_STRIP,
    }
}

/// Face to cull, `None` disables culling
pub fn cull_face(mode: CullMode) -> Option<u32> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(glow::FRONT),
        CullMode::Back => Some(glow::BACK),
    }
}

pub fn polygon_mode(mode: FillMode) -> u32 {
    match mode {
        FillMode::Solid => glow::FILL,
        FillMode::WireFrame => glow::LINE,
    }
}

/// Window-space y of a top-left-origin rectangle in a target `target_height` tall
pub fn flip_y(top: f32, height: f32, target_height: f32) -> f32 {
    target_height - (top + height)
}

// ============================================================================
// APPLY
// ============================================================================

fn set_capability(gl: &glow::Context, capability: u32, enabled: bool) {
    unsafe {
        if enabled {
            gl.enable(capability);
        } else {
            gl.disable(capability);
        }
    }
}

pub fn apply_rasterizer(gl: &glow::Context, desc: &RasterizerStateDescription) {
    unsafe {
        match cull_face(desc.cull_mode) {
            Some(face) => {
                gl.enable(glow::CULL_FACE);
                gl.cull_face(face);
            }
            None => gl.disable(glow::CULL_FACE),
        }
        gl.front_face(if desc.front_counter_clockwise { glow::CCW } else { glow::CW });
        gl.polygon_mode(glow::FRONT_AND_BACK, polygon_mode(desc.fill_mode));

        let biased = desc.depth_bias != 0 || desc.slope_scaled_depth_bias != 0.0;
        set_capability(gl, glow::POLYGON_OFFSET_FILL, biased);
        if biased {
            gl.polygon_offset(desc.slope_scaled_depth_bias, desc.depth_bias as f32);
        }
    }
    set_capability(gl, glow::DEPTH_CLAMP, !desc.depth_clip_enable);
    set_capability(gl, glow::SCISSOR_TEST, desc.scissor_enable);
    set_capability(gl, glow::MULTISAMPLE, desc.multisample_enable);
    set_capability(gl, glow::LINE_SMOOTH, desc.antialiased_line_enable);
}

fn apply_stencil_face(gl: &glow::Context, face: u32, state: &StencilStateDescription, reference: u32, read_mask: u8) {
    unsafe {
        gl.stencil_func_separate(
            face,
            comparison_function(state.comparison_function),
            reference as i32,
            read_mask as u32,
        );
        gl.stencil_op_separate(
            face,
            stencil_operation(state.fail_operation),
            stencil_operation(state.depth_fail_operation),
            stencil_operation(state.pass_operation),
        );
    }
}

pub fn apply_depth(gl: &glow::Context, desc: &DepthStateDescription, stencil_reference: u32) {
    set_capability(gl, glow::DEPTH_TEST, desc.enable);
    unsafe {
        gl.depth_func(comparison_function(desc.comparison_function));
        gl.depth_mask(desc.write_mask == DepthWrite::All);
    }

    set_capability(gl, glow::STENCIL_TEST, desc.stencil_enable);
    if desc.stencil_enable {
        apply_stencil_reference(gl, desc, stencil_reference);
        unsafe {
            gl.stencil_mask_separate(glow::FRONT_AND_BACK, desc.stencil_write_mask as u32);
        }
    }
}

/// Re-issue the stencil functions with a new reference value
pub fn apply_stencil_reference(gl: &glow::Context, desc: &DepthStateDescription, reference: u32) {
    apply_stencil_face(gl, glow::FRONT, &desc.stencil_front_state, reference, desc.stencil_read_mask);
    apply_stencil_face(gl, glow::BACK, &desc.stencil_back_state, reference, desc.stencil_read_mask);
}

pub fn apply_blend(gl: &glow::Context, desc: &BlendStateDescription, target_count: usize) {
    set_capability(gl, glow::SAMPLE_ALPHA_TO_COVERAGE, desc.alpha_to_coverage);
    for index in 0..target_count.max(1) {
        let target = desc.target(index);
        let buffer = index as u32;
        unsafe {
            if target.enable {
                gl.enable_draw_buffer(glow::BLEND, buffer);
                gl.blend_func_separate_draw_buffer(
                    buffer,
                    blend_factor(target.color_source),
                    blend_factor(target.color_destination),
                    blend_factor(target.alpha_source),
                    blend_factor(target.alpha_destination),
                );
                gl.blend_equation_separate_draw_buffer(
                    buffer,
                    blend_operation(target.color_operation),
                    blend_operation(target.alpha_operation),
                );
            } else {
                gl.disable_draw_buffer(glow::BLEND, buffer);
            }
            let mask = target.write_mask;
            gl.color_mask_draw_buffer(
                buffer,
                mask.contains(ColorWriteMask::R),
                mask.contains(ColorWriteMask::G),
                mask.contains(ColorWriteMask::B),
                mask.contains(ColorWriteMask::A),
            );
        }
    }
}

#[cfg(test)]
#[path = "opengl_state_tests.rs"]
mod tests;
