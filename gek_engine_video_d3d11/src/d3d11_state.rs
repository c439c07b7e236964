/// Fixed-function state translation
///
/// Maps the engine state enums to their numeric D3D11 values. The values
/// are plain integers so the tables stay testable off Windows; the native
/// modules wrap them in the `windows` newtypes.

use gek_engine::gek::video::{
    AddressMode, BlendOperation, BlendSource, ColorWriteMask, ComparisonFunction, CullMode, FillMode, FilterType,
    PrimitiveType, SamplerStateDescription, StencilOperation,
};

pub fn comparison_function(function: ComparisonFunction) -> i32 {
    match function {
        ComparisonFunction::Never => 1,
        ComparisonFunction::Less => 2,
        ComparisonFunction::Equal => 3,
        ComparisonFunction::LessEqual => 4,
        ComparisonFunction::Greater => 5,
        ComparisonFunction::NotEqual => 6,
        ComparisonFunction::GreaterEqual => 7,
        ComparisonFunction::Always => 8,
    }
}

pub fn stencil_operation(operation: StencilOperation) -> i32 {
    match operation {
        StencilOperation::Keep => 1,
        StencilOperation::Zero => 2,
        StencilOperation::Replace => 3,
        StencilOperation::IncreaseSaturated => 4,
        StencilOperation::DecreaseSaturated => 5,
        StencilOperation::Invert => 6,
        StencilOperation::Increase => 7,
        StencilOperation::Decrease => 8,
    }
}

pub fn blend_source(source: BlendSource) -> i32 {
    match source {
        BlendSource::Zero => 1,
        BlendSource::One => 2,
        BlendSource::SourceColor => 3,
        BlendSource::InverseSourceColor => 4,
        BlendSource::SourceAlpha => 5,
        BlendSource::InverseSourceAlpha => 6,
        BlendSource::DestinationAlpha => 7,
        BlendSource::InverseDestinationAlpha => 8,
        BlendSource::DestinationColor => 9,
        BlendSource::InverseDestinationColor => 10,
        BlendSource::SourceAlphaSaturated => 11,
        BlendSource::BlendFactor => 14,
        BlendSource::InverseBlendFactor => 15,
        BlendSource::SecondarySourceColor => 16,
        BlendSource::InverseSecondarySourceColor => 17,
        BlendSource::SecondarySourceAlpha => 18,
        BlendSource::InverseSecondarySourceAlpha => 19,
    }
}

/// Alpha blend factor; D3D11 rejects the color variants in the alpha equation
pub fn alpha_blend_source(source: BlendSource) -> i32 {
    match source {
        BlendSource::SourceColor => blend_source(BlendSource::SourceAlpha),
        BlendSource::InverseSourceColor => blend_source(BlendSource::InverseSourceAlpha),
        BlendSource::DestinationColor => blend_source(BlendSource::DestinationAlpha),
        BlendSource::InverseDestinationColor => blend_source(BlendSource::InverseDestinationAlpha),
        BlendSource::SecondarySourceColor => blend_source(BlendSource::SecondarySourceAlpha),
        BlendSource::InverseSecondarySourceColor => blend_source(BlendSource::InverseSecondarySourceAlpha),
        other => blend_source(other),
    }
}

pub fn blend_operation(operation: BlendOperation) -> i32 {
    match operation {
        BlendOperation::Add => 1,
        BlendOperation::Subtract => 2,
        BlendOperation::ReverseSubtract => 3,
        BlendOperation::Minimum => 4,
        BlendOperation::Maximum => 5,
    }
}

/// `D3D11_COLOR_WRITE_ENABLE` bits (same layout as `ColorWriteMask`)
pub fn color_write_mask(mask: ColorWriteMask) -> u8 {
    mask.bits()
}

pub fn fill_mode(mode: FillMode) -> i32 {
    match mode {
        FillMode::WireFrame => 2,
        FillMode::Solid => 3,
    }
}

pub fn cull_mode(mode: CullMode) -> i32 {
    match mode {
        CullMode::None => 1,
        CullMode::Front => 2,
        CullMode::Back => 3,
    }
}

pub fn address_mode(mode: AddressMode) -> i32 {
    match mode {
        AddressMode::Wrap => 1,
        AddressMode::Mirror => 2,
        AddressMode::Clamp => 3,
        AddressMode::Border => 4,
        AddressMode::MirrorOnce => 5,
    }
}

pub fn primitive_topology(primitive: PrimitiveType) -> i32 {
    match primitive {
        PrimitiveType::PointList => 1,
        PrimitiveType::LineList => 2,
        PrimitiveType::LineStrip => 3,
        PrimitiveType::TriangleList => 4,
        PrimitiveType::TriangleStrip => 5,
    }
}

const FILTER_ANISOTROPIC: i32 = 0x55;
const FILTER_REDUCTION_COMPARISON: i32 = 1 << 7;

fn filter_bits(filter: FilterType) -> i32 {
    match filter {
        FilterType::Point => 0,
        FilterType::Linear => 1,
    }
}

/// `D3D11_FILTER` encoding of a sampler's min/mag/mip filters
pub fn sampler_filter(desc: &SamplerStateDescription) -> i32 {
    let reduction = if desc.comparison_function.is_some() {
        FILTER_REDUCTION_COMPARISON
    } else {
        0
    };
    if desc.is_anisotropic() {
        return FILTER_ANISOTROPIC | reduction;
    }
    (filter_bits(desc.min_filter) << 4) | (filter_bits(desc.mag_filter) << 2) | filter_bits(desc.mip_filter) | reduction
}

#[cfg(test)]
#[path = "d3d11_state_tests.rs"]
mod tests;
