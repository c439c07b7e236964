/// Context trait: binding, clearing, draw and dispatch
///
/// A device owns one immediate context that executes calls directly.
/// Deferred contexts record calls into a `CommandList` that the device
/// executes later on the immediate context.

use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec4;

use crate::error::Result;
use crate::video::{
    Buffer, CommandList, PipelineState, PipelineType, Resource, ResourceRef, SamplerState, Texture,
};

/// Viewport rectangle and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with the [0, 1] depth range
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle in pixels (right and bottom are exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

bitflags! {
    /// Which parts of a depth-stencil target to clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const DEPTH = 1 << 0;
        const STENCIL = 1 << 1;
    }
}

/// GPU progress marker
///
/// Signalled by `Context::signal_fence` once the GPU reaches that point,
/// polled through `Device::is_fence_signaled`.
pub trait Fence: Resource {}

/// Recording and execution interface shared by immediate and deferred contexts
///
/// Slot lists accept `None` entries to unbind a slot.
pub trait Context {
    /// True for deferred (recording) contexts
    fn is_deferred(&self) -> bool;

    // ===== BINDING =====

    fn set_pipeline_state(&mut self, pipeline_state: &Arc<dyn PipelineState>) -> Result<()>;

    fn set_vertex_buffer_list(
        &mut self,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
        offsets: &[u32],
    ) -> Result<()>;

    fn set_index_buffer(&mut self, buffer: Option<&Arc<dyn Buffer>>, offset: u32) -> Result<()>;

    fn set_constant_buffer_list(
        &mut self,
        pipeline: PipelineType,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
    ) -> Result<()>;

    fn set_resource_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()>;

    fn set_unordered_access_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()>;

    fn set_sampler_state_list(
        &mut self,
        pipeline: PipelineType,
        samplers: &[Option<Arc<dyn SamplerState>>],
        first_slot: u32,
    ) -> Result<()>;

    /// Bind render targets and an optional depth target
    ///
    /// Fails with `InvalidResource` for a stale back buffer or a texture
    /// created without the matching view.
    fn set_render_target_list(
        &mut self,
        targets: &[Arc<dyn Texture>],
        depth: Option<&Arc<dyn Texture>>,
    ) -> Result<()>;

    fn set_viewport_list(&mut self, viewports: &[Viewport]) -> Result<()>;

    fn set_scissor_list(&mut self, rects: &[Rect]) -> Result<()>;

    fn set_blend_factor(&mut self, factor: Vec4, sample_mask: u32) -> Result<()>;

    fn set_stencil_reference(&mut self, reference: u32) -> Result<()>;

    // ===== CLEARING =====

    fn clear_render_target(&mut self, target: &Arc<dyn Texture>, color: Vec4) -> Result<()>;

    fn clear_depth_stencil_target(
        &mut self,
        target: &Arc<dyn Texture>,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()>;

    fn clear_unordered_access_float(&mut self, resource: &ResourceRef, value: Vec4) -> Result<()>;

    fn clear_unordered_access_uint(&mut self, resource: &ResourceRef, value: [u32; 4]) -> Result<()>;

    /// Unbind everything and restore default state
    fn clear_state(&mut self) -> Result<()>;

    // ===== WORK =====

    fn draw_primitive(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    fn draw_instanced_primitive(
        &mut self,
        instance_count: u32,
        first_instance: u32,
        vertex_count: u32,
        first_vertex: u32,
    ) -> Result<()>;

    fn draw_indexed_primitive(
        &mut self,
        index_count: u32,
        first_index: u32,
        first_vertex: i32,
    ) -> Result<()>;

    fn draw_instanced_indexed_primitive(
        &mut self,
        instance_count: u32,
        first_instance: u32,
        index_count: u32,
        first_index: u32,
        first_vertex: i32,
    ) -> Result<()>;

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()>;

    fn generate_mip_maps(&mut self, texture: &Arc<dyn Texture>) -> Result<()>;

    fn signal_fence(&mut self, fence: &Arc<dyn Fence>) -> Result<()>;

    /// Take the recorded commands and reset the recorder
    ///
    /// Only valid on deferred contexts; an immediate context returns
    /// `Error::InvalidResource`.
    fn finish_command_list(&mut self) -> Result<Box<dyn CommandList>>;
}
