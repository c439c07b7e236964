/// Slot-based binding tracker shared by every context implementation
///
/// Tracks what is bound by `ResourceId`, checks bindings before they reach
/// the native API, and decides whether a draw or dispatch may run. Two
/// trackers compare equal when the same objects sit in the same slots.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::video::pipeline::MAX_VERTEX_BUFFERS;
use crate::video::state::MAX_RENDER_TARGETS;
use crate::video::{
    Buffer, BufferType, PipelineState, PipelineType, Rect, ResourceId, ResourceRef, SamplerState,
    Texture, ViewFlags, Viewport,
};

const SOURCE: &str = "gek::video::Context";

/// Bound pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundPipeline {
    pub id: ResourceId,
    pub is_compute: bool,
}

/// Snapshot of everything bound on a context
#[derive(Debug, Clone, PartialEq)]
pub struct BindingState {
    pub pipeline: Option<BoundPipeline>,
    /// Vertex buffer id and byte offset per slot
    pub vertex_buffers: BTreeMap<u32, (ResourceId, u32)>,
    pub index_buffer: Option<(ResourceId, u32)>,
    pub constant_buffers: BTreeMap<(PipelineType, u32), ResourceId>,
    pub resources: BTreeMap<(PipelineType, u32), ResourceId>,
    pub unordered_access: BTreeMap<(PipelineType, u32), ResourceId>,
    pub samplers: BTreeMap<(PipelineType, u32), ResourceId>,
    pub render_targets: Vec<ResourceId>,
    pub depth_target: Option<ResourceId>,
    pub viewports: Vec<Viewport>,
    pub scissors: Vec<Rect>,
    pub blend_factor: [f32; 4],
    pub sample_mask: u32,
    pub stencil_reference: u32,
}

impl Default for BindingState {
    fn default() -> Self {
        Self {
            pipeline: None,
            vertex_buffers: BTreeMap::new(),
            index_buffer: None,
            constant_buffers: BTreeMap::new(),
            resources: BTreeMap::new(),
            unordered_access: BTreeMap::new(),
            samplers: BTreeMap::new(),
            render_targets: Vec::new(),
            depth_target: None,
            viewports: Vec::new(),
            scissors: Vec::new(),
            blend_factor: [1.0; 4],
            sample_mask: u32::MAX,
            stencil_reference: 0,
        }
    }
}

fn assign(
    map: &mut BTreeMap<(PipelineType, u32), ResourceId>,
    pipeline: PipelineType,
    slot: u32,
    id: Option<ResourceId>,
) {
    match id {
        Some(id) => {
            map.insert((pipeline, slot), id);
        }
        None => {
            map.remove(&(pipeline, slot));
        }
    }
}

impl BindingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every binding
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn bind_pipeline_state(&mut self, pipeline_state: &Arc<dyn PipelineState>) -> Result<()> {
        self.pipeline = Some(BoundPipeline {
            id: pipeline_state.id(),
            is_compute: pipeline_state.is_compute(),
        });
        Ok(())
    }

    pub fn bind_vertex_buffers(
        &mut self,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
        offsets: &[u32],
    ) -> Result<()> {
        if first_slot as usize + buffers.len() > MAX_VERTEX_BUFFERS {
            crate::engine_bail_invalid!(
                SOURCE,
                "Vertex buffer slots {}..{} exceed the {} available",
                first_slot, first_slot as usize + buffers.len(), MAX_VERTEX_BUFFERS
            );
        }
        for (index, buffer) in buffers.iter().enumerate() {
            if let Some(buffer) = buffer {
                if buffer.description().buffer_type != BufferType::Vertex {
                    crate::engine_bail_invalid!(
                        SOURCE,
                        "Buffer '{}' bound to vertex slot {} is not a vertex buffer",
                        buffer.name(), first_slot + index as u32
                    );
                }
            }
        }
        for (index, buffer) in buffers.iter().enumerate() {
            let slot = first_slot + index as u32;
            match buffer {
                Some(buffer) => {
                    let offset = offsets.get(index).copied().unwrap_or(0);
                    self.vertex_buffers.insert(slot, (buffer.id(), offset));
                }
                None => {
                    self.vertex_buffers.remove(&slot);
                }
            }
        }
        Ok(())
    }

    pub fn bind_index_buffer(&mut self, buffer: Option<&Arc<dyn Buffer>>, offset: u32) -> Result<()> {
        match buffer {
            Some(buffer) => {
                if buffer.description().buffer_type != BufferType::Index {
                    crate::engine_bail_invalid!(
                        SOURCE,
                        "Buffer '{}' is not an index buffer",
                        buffer.name()
                    );
                }
                self.index_buffer = Some((buffer.id(), offset));
            }
            None => self.index_buffer = None,
        }
        Ok(())
    }

    /// Binds every slot or, when any element is rejected, none of them
    pub fn bind_constant_buffers(
        &mut self,
        pipeline: PipelineType,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
    ) -> Result<()> {
        for (index, buffer) in buffers.iter().enumerate() {
            if let Some(buffer) = buffer {
                if buffer.description().buffer_type != BufferType::Constant {
                    crate::engine_bail_invalid!(
                        SOURCE,
                        "Buffer '{}' bound to {} constant slot {} is not a constant buffer",
                        buffer.name(), pipeline, first_slot + index as u32
                    );
                }
            }
        }
        for (index, buffer) in buffers.iter().enumerate() {
            let slot = first_slot + index as u32;
            assign(&mut self.constant_buffers, pipeline, slot, buffer.as_ref().map(|b| b.id()));
        }
        Ok(())
    }

    pub fn bind_resources(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        for (index, resource) in resources.iter().enumerate() {
            if let Some(resource) = resource {
                if !resource.views().contains(ViewFlags::SHADER_RESOURCE) {
                    crate::engine_bail_invalid!(
                        SOURCE,
                        "'{}' bound to {} resource slot {} has no shader-resource view",
                        resource.name(), pipeline, first_slot + index as u32
                    );
                }
            }
        }
        for (index, resource) in resources.iter().enumerate() {
            let slot = first_slot + index as u32;
            assign(&mut self.resources, pipeline, slot, resource.as_ref().map(|r| r.id()));
        }
        Ok(())
    }

    pub fn bind_unordered_access(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        for (index, resource) in resources.iter().enumerate() {
            if let Some(resource) = resource {
                if !resource.views().contains(ViewFlags::UNORDERED_ACCESS) {
                    crate::engine_bail_invalid!(
                        SOURCE,
                        "'{}' bound to {} unordered-access slot {} has no unordered-access view",
                        resource.name(), pipeline, first_slot + index as u32
                    );
                }
            }
        }
        for (index, resource) in resources.iter().enumerate() {
            let slot = first_slot + index as u32;
            assign(&mut self.unordered_access, pipeline, slot, resource.as_ref().map(|r| r.id()));
        }
        Ok(())
    }

    pub fn bind_samplers(
        &mut self,
        pipeline: PipelineType,
        samplers: &[Option<Arc<dyn SamplerState>>],
        first_slot: u32,
    ) -> Result<()> {
        for (index, sampler) in samplers.iter().enumerate() {
            let slot = first_slot + index as u32;
            assign(&mut self.samplers, pipeline, slot, sampler.as_ref().map(|s| s.id()));
        }
        Ok(())
    }

    pub fn bind_render_targets(
        &mut self,
        targets: &[Arc<dyn Texture>],
        depth: Option<&Arc<dyn Texture>>,
    ) -> Result<()> {
        if targets.len() > MAX_RENDER_TARGETS {
            crate::engine_bail_invalid!(
                SOURCE,
                "{} render targets bound, at most {} are supported",
                targets.len(), MAX_RENDER_TARGETS
            );
        }
        for target in targets {
            check_render_target(target)?;
        }
        if let Some(depth) = depth {
            check_depth_target(depth)?;
        }
        self.render_targets = targets.iter().map(|target| target.id()).collect();
        self.depth_target = depth.map(|depth| depth.id());
        Ok(())
    }

    pub fn set_viewports(&mut self, viewports: &[Viewport]) -> Result<()> {
        self.viewports = viewports.to_vec();
        Ok(())
    }

    pub fn set_scissors(&mut self, rects: &[Rect]) -> Result<()> {
        self.scissors = rects.to_vec();
        Ok(())
    }

    pub fn set_blend_factor(&mut self, factor: [f32; 4], sample_mask: u32) {
        self.blend_factor = factor;
        self.sample_mask = sample_mask;
    }

    pub fn set_stencil_reference(&mut self, reference: u32) {
        self.stencil_reference = reference;
    }

    /// Check that a draw may run
    pub fn check_draw(&self, indexed: bool) -> Result<()> {
        match self.pipeline {
            None => crate::engine_bail_invalid!(SOURCE, "Draw issued without a pipeline state"),
            Some(pipeline) if pipeline.is_compute => {
                crate::engine_bail_invalid!(SOURCE, "Draw issued with a compute pipeline state bound")
            }
            Some(_) => {}
        }
        if indexed && self.index_buffer.is_none() {
            crate::engine_bail_invalid!(SOURCE, "Indexed draw issued without an index buffer");
        }
        Ok(())
    }

    /// Check that a dispatch may run
    pub fn check_dispatch(&self) -> Result<()> {
        match self.pipeline {
            Some(pipeline) if pipeline.is_compute => Ok(()),
            Some(_) => {
                crate::engine_bail_invalid!(SOURCE, "Dispatch issued with a graphics pipeline state bound")
            }
            None => crate::engine_bail_invalid!(SOURCE, "Dispatch issued without a pipeline state"),
        }
    }
}

/// Check a texture for use as a render target
pub fn check_render_target(target: &Arc<dyn Texture>) -> Result<()> {
    if !target.views().contains(ViewFlags::RENDER_TARGET) {
        crate::engine_bail_invalid!(SOURCE, "Texture '{}' has no render-target view", target.name());
    }
    if !target.is_current() {
        crate::engine_bail_invalid!(
            SOURCE,
            "Back buffer '{}' is stale, fetch it again after a swap-chain change",
            target.name()
        );
    }
    Ok(())
}

/// Check a texture for use as a depth-stencil target
pub fn check_depth_target(target: &Arc<dyn Texture>) -> Result<()> {
    if !target.views().contains(ViewFlags::DEPTH_STENCIL) {
        crate::engine_bail_invalid!(SOURCE, "Texture '{}' has no depth-stencil view", target.name());
    }
    Ok(())
}

/// Check a resource for an unordered-access clear
pub fn check_unordered_access(resource: &ResourceRef) -> Result<()> {
    if !resource.views().contains(ViewFlags::UNORDERED_ACCESS) {
        crate::engine_bail_invalid!(SOURCE, "'{}' has no unordered-access view", resource.name());
    }
    Ok(())
}
