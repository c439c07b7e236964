/// Per-stage register counts of shader model 5.0
///
/// Slot lists that run past a register space fail before anything reaches
/// the native context.

use gek_engine::engine_bail_invalid;
use gek_engine::gek::video::PipelineType;
use gek_engine::gek::Result;

const SOURCE: &str = "gek::video::d3d11::Context";

/// `b0..b13`
pub const CONSTANT_BUFFER_SLOTS: u32 = 14;
/// `t0..t127`
pub const SHADER_RESOURCE_SLOTS: u32 = 128;
/// `s0..s15`
pub const SAMPLER_SLOTS: u32 = 16;
/// `u0..u7`, pixel and compute stages only
pub const UNORDERED_ACCESS_SLOTS: u32 = 8;

/// Register space a slot list is bound into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    ConstantBuffer,
    ShaderResource,
    Sampler,
    UnorderedAccess,
}

impl SlotKind {
    pub fn limit(self) -> u32 {
        match self {
            SlotKind::ConstantBuffer => CONSTANT_BUFFER_SLOTS,
            SlotKind::ShaderResource => SHADER_RESOURCE_SLOTS,
            SlotKind::Sampler => SAMPLER_SLOTS,
            SlotKind::UnorderedAccess => UNORDERED_ACCESS_SLOTS,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SlotKind::ConstantBuffer => "constant buffer",
            SlotKind::ShaderResource => "shader resource",
            SlotKind::Sampler => "sampler",
            SlotKind::UnorderedAccess => "unordered-access",
        }
    }
}

/// Check that `count` slots starting at `first_slot` exist on `pipeline`
pub fn check_slot_range(kind: SlotKind, pipeline: PipelineType, first_slot: u32, count: usize) -> Result<()> {
    if kind == SlotKind::UnorderedAccess && matches!(pipeline, PipelineType::Vertex | PipelineType::Geometry) {
        engine_bail_invalid!(SOURCE, "The {} stage has no unordered-access slots", pipeline);
    }
    let end = first_slot as u64 + count as u64;
    if end > kind.limit() as u64 {
        engine_bail_invalid!(
            SOURCE,
            "{} slots {}..{} of the {} stage exceed the {} available",
            kind.label(), first_slot, end, pipeline, kind.limit()
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "d3d11_slots_tests.rs"]
mod tests;
