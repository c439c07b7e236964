/// Backend-neutral command recording
///
/// `CommandRecorder` is a deferred `Context` that validates and stores
/// calls as `Command`s. Finishing it yields a `RecordedCommandList`, which
/// `replay()` feeds into any other context (the immediate one, usually).

use std::any::Any;
use std::sync::Arc;

use glam::Vec4;

use crate::error::Result;
use crate::video::binding_state::{check_depth_target, check_render_target, check_unordered_access};
use crate::video::{
    BindingState, Buffer, ClearFlags, Context, Fence, PipelineState, PipelineType, Rect, ResourceRef,
    SamplerState, Texture, Viewport,
};

const SOURCE: &str = "gek::video::CommandRecorder";

/// A finished list of recorded work
///
/// Consumed exactly once by `Device::execute_command_list`.
pub trait CommandList: Send {
    /// Number of recorded commands
    fn command_count(&self) -> usize;

    /// Downcast hook for backends
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// One recorded context call
#[derive(Clone)]
pub enum Command {
    SetPipelineState(Arc<dyn PipelineState>),
    SetVertexBufferList {
        buffers: Vec<Option<Arc<dyn Buffer>>>,
        first_slot: u32,
        offsets: Vec<u32>,
    },
    SetIndexBuffer {
        buffer: Option<Arc<dyn Buffer>>,
        offset: u32,
    },
    SetConstantBufferList {
        pipeline: PipelineType,
        buffers: Vec<Option<Arc<dyn Buffer>>>,
        first_slot: u32,
    },
    SetResourceList {
        pipeline: PipelineType,
        resources: Vec<Option<ResourceRef>>,
        first_slot: u32,
    },
    SetUnorderedAccessList {
        pipeline: PipelineType,
        resources: Vec<Option<ResourceRef>>,
        first_slot: u32,
    },
    SetSamplerStateList {
        pipeline: PipelineType,
        samplers: Vec<Option<Arc<dyn SamplerState>>>,
        first_slot: u32,
    },
    SetRenderTargetList {
        targets: Vec<Arc<dyn Texture>>,
        depth: Option<Arc<dyn Texture>>,
    },
    SetViewportList(Vec<Viewport>),
    SetScissorList(Vec<Rect>),
    SetBlendFactor {
        factor: Vec4,
        sample_mask: u32,
    },
    SetStencilReference(u32),
    ClearRenderTarget {
        target: Arc<dyn Texture>,
        color: Vec4,
    },
    ClearDepthStencilTarget {
        target: Arc<dyn Texture>,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    },
    ClearUnorderedAccessFloat {
        resource: ResourceRef,
        value: Vec4,
    },
    ClearUnorderedAccessUint {
        resource: ResourceRef,
        value: [u32; 4],
    },
    ClearState,
    DrawPrimitive {
        vertex_count: u32,
        first_vertex: u32,
    },
    DrawInstancedPrimitive {
        instance_count: u32,
        first_instance: u32,
        vertex_count: u32,
        first_vertex: u32,
    },
    DrawIndexedPrimitive {
        index_count: u32,
        first_index: u32,
        first_vertex: i32,
    },
    DrawInstancedIndexedPrimitive {
        instance_count: u32,
        first_instance: u32,
        index_count: u32,
        first_index: u32,
        first_vertex: i32,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    GenerateMipMaps(Arc<dyn Texture>),
    SignalFence(Arc<dyn Fence>),
}

impl Command {
    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            Command::SetPipelineState(_) => "SetPipelineState",
            Command::SetVertexBufferList { .. } => "SetVertexBufferList",
            Command::SetIndexBuffer { .. } => "SetIndexBuffer",
            Command::SetConstantBufferList { .. } => "SetConstantBufferList",
            Command::SetResourceList { .. } => "SetResourceList",
            Command::SetUnorderedAccessList { .. } => "SetUnorderedAccessList",
            Command::SetSamplerStateList { .. } => "SetSamplerStateList",
            Command::SetRenderTargetList { .. } => "SetRenderTargetList",
            Command::SetViewportList(_) => "SetViewportList",
            Command::SetScissorList(_) => "SetScissorList",
            Command::SetBlendFactor { .. } => "SetBlendFactor",
            Command::SetStencilReference(_) => "SetStencilReference",
            Command::ClearRenderTarget { .. } => "ClearRenderTarget",
            Command::ClearDepthStencilTarget { .. } => "ClearDepthStencilTarget",
            Command::ClearUnorderedAccessFloat { .. } => "ClearUnorderedAccessFloat",
            Command::ClearUnorderedAccessUint { .. } => "ClearUnorderedAccessUint",
            Command::ClearState => "ClearState",
            Command::DrawPrimitive { .. } => "DrawPrimitive",
            Command::DrawInstancedPrimitive { .. } => "DrawInstancedPrimitive",
            Command::DrawIndexedPrimitive { .. } => "DrawIndexedPrimitive",
            Command::DrawInstancedIndexedPrimitive { .. } => "DrawInstancedIndexedPrimitive",
            Command::Dispatch { .. } => "Dispatch",
            Command::GenerateMipMaps(_) => "GenerateMipMaps",
            Command::SignalFence(_) => "SignalFence",
        }
    }

    /// Issue this command on `context`
    pub fn execute(&self, context: &mut dyn Context) -> Result<()> {
        match self {
            Command::SetPipelineState(pipeline_state) => context.set_pipeline_state(pipeline_state),
            Command::SetVertexBufferList { buffers, first_slot, offsets } => {
                context.set_vertex_buffer_list(buffers, *first_slot, offsets)
            }
            Command::SetIndexBuffer { buffer, offset } => context.set_index_buffer(buffer.as_ref(), *offset),
            Command::SetConstantBufferList { pipeline, buffers, first_slot } => {
                context.set_constant_buffer_list(*pipeline, buffers, *first_slot)
            }
            Command::SetResourceList { pipeline, resources, first_slot } => {
                context.set_resource_list(*pipeline, resources, *first_slot)
            }
            Command::SetUnorderedAccessList { pipeline, resources, first_slot } => {
                context.set_unordered_access_list(*pipeline, resources, *first_slot)
            }
            Command::SetSamplerStateList { pipeline, samplers, first_slot } => {
                context.set_sampler_state_list(*pipeline, samplers, *first_slot)
            }
            Command::SetRenderTargetList { targets, depth } => {
                context.set_render_target_list(targets, depth.as_ref())
            }
            Command::SetViewportList(viewports) => context.set_viewport_list(viewports),
            Command::SetScissorList(rects) => context.set_scissor_list(rects),
            Command::SetBlendFactor { factor, sample_mask } => context.set_blend_factor(*factor, *sample_mask),
            Command::SetStencilReference(reference) => context.set_stencil_reference(*reference),
            Command::ClearRenderTarget { target, color } => context.clear_render_target(target, *color),
            Command::ClearDepthStencilTarget { target, flags, depth, stencil } => {
                context.clear_depth_stencil_target(target, *flags, *depth, *stencil)
            }
            Command::ClearUnorderedAccessFloat { resource, value } => {
                context.clear_unordered_access_float(resource, *value)
            }
            Command::ClearUnorderedAccessUint { resource, value } => {
                context.clear_unordered_access_uint(resource, *value)
            }
            Command::ClearState => context.clear_state(),
            Command::DrawPrimitive { vertex_count, first_vertex } => {
                context.draw_primitive(*vertex_count, *first_vertex)
            }
            Command::DrawInstancedPrimitive { instance_count, first_instance, vertex_count, first_vertex } => {
                context.draw_instanced_primitive(*instance_count, *first_instance, *vertex_count, *first_vertex)
            }
            Command::DrawIndexedPrimitive { index_count, first_index, first_vertex } => {
                context.draw_indexed_primitive(*index_count, *first_index, *first_vertex)
            }
            Command::DrawInstancedIndexedPrimitive {
                instance_count,
                first_instance,
                index_count,
                first_index,
                first_vertex,
            } => context.draw_instanced_indexed_primitive(
                *instance_count,
                *first_instance,
                *index_count,
                *first_index,
                *first_vertex,
            ),
            Command::Dispatch { x, y, z } => context.dispatch(*x, *y, *z),
            Command::GenerateMipMaps(texture) => context.generate_mip_maps(texture),
            Command::SignalFence(fence) => context.signal_fence(fence),
        }
    }
}

// ===== RECORDED COMMAND LIST =====

/// Command list produced by `CommandRecorder`
pub struct RecordedCommandList {
    commands: Vec<Command>,
}

impl RecordedCommandList {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Issue every command on `context`, in recording order
    ///
    /// Stops at the first failing command.
    pub fn replay(&self, context: &mut dyn Context) -> Result<()> {
        for command in &self.commands {
            command.execute(context)?;
        }
        Ok(())
    }
}

impl CommandList for RecordedCommandList {
    fn command_count(&self) -> usize {
        self.commands.len()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

// ===== RECORDER =====

/// Deferred context that records commands
///
/// Calls are validated against a recording-side `BindingState`, so a draw
/// without a pipeline fails at the call site rather than at replay.
#[derive(Default)]
pub struct CommandRecorder {
    commands: Vec<Command>,
    bindings: BindingState,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings as seen by the recorded stream so far
    pub fn binding_state(&self) -> &BindingState {
        &self.bindings
    }

    /// Commands recorded since the last finish
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of commands recorded since the last finish
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take the recorded list and reset the recorder
    pub fn finish(&mut self) -> RecordedCommandList {
        self.bindings.clear();
        RecordedCommandList {
            commands: std::mem::take(&mut self.commands),
        }
    }
}

impl Context for CommandRecorder {
    fn is_deferred(&self) -> bool {
        true
    }

    fn set_pipeline_state(&mut self, pipeline_state: &Arc<dyn PipelineState>) -> Result<()> {
        self.bindings.bind_pipeline_state(pipeline_state)?;
        self.commands.push(Command::SetPipelineState(pipeline_state.clone()));
        Ok(())
    }

    fn set_vertex_buffer_list(
        &mut self,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
        offsets: &[u32],
    ) -> Result<()> {
        self.bindings.bind_vertex_buffers(buffers, first_slot, offsets)?;
        self.commands.push(Command::SetVertexBufferList {
            buffers: buffers.to_vec(),
            first_slot,
            offsets: offsets.to_vec(),
        });
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: Option<&Arc<dyn Buffer>>, offset: u32) -> Result<()> {
        self.bindings.bind_index_buffer(buffer, offset)?;
        self.commands.push(Command::SetIndexBuffer {
            buffer: buffer.cloned(),
            offset,
        });
        Ok(())
    }

    fn set_constant_buffer_list(
        &mut self,
        pipeline: PipelineType,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
    ) -> Result<()> {
        self.bindings.bind_constant_buffers(pipeline, buffers, first_slot)?;
        self.commands.push(Command::SetConstantBufferList {
            pipeline,
            buffers: buffers.to_vec(),
            first_slot,
        });
        Ok(())
    }

    fn set_resource_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        self.bindings.bind_resources(pipeline, resources, first_slot)?;
        self.commands.push(Command::SetResourceList {
            pipeline,
            resources: resources.to_vec(),
            first_slot,
        });
        Ok(())
    }

    fn set_unordered_access_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        self.bindings.bind_unordered_access(pipeline, resources, first_slot)?;
        self.commands.push(Command::SetUnorderedAccessList {
            pipeline,
            resources: resources.to_vec(),
            first_slot,
        });
        Ok(())
    }

    fn set_sampler_state_list(
        &mut self,
        pipeline: PipelineType,
        samplers: &[Option<Arc<dyn SamplerState>>],
        first_slot: u32,
    ) -> Result<()> {
        self.bindings.bind_samplers(pipeline, samplers, first_slot)?;
        self.commands.push(Command::SetSamplerStateList {
            pipeline,
            samplers: samplers.to_vec(),
            first_slot,
        });
        Ok(())
    }

    fn set_render_target_list(
        &mut self,
        targets: &[Arc<dyn Texture>],
        depth: Option<&Arc<dyn Texture>>,
    ) -> Result<()> {
        self.bindings.bind_render_targets(targets, depth)?;
        self.commands.push(Command::SetRenderTargetList {
            targets: targets.to_vec(),
            depth: depth.cloned(),
        });
        Ok(())
    }

    fn set_viewport_list(&mut self, viewports: &[Viewport]) -> Result<()> {
        self.bindings.set_viewports(viewports)?;
        self.commands.push(Command::SetViewportList(viewports.to_vec()));
        Ok(())
    }

    fn set_scissor_list(&mut self, rects: &[Rect]) -> Result<()> {
        self.bindings.set_scissors(rects)?;
        self.commands.push(Command::SetScissorList(rects.to_vec()));
        Ok(())
    }

    fn set_blend_factor(&mut self, factor: Vec4, sample_mask: u32) -> Result<()> {
        self.bindings.set_blend_factor(factor.to_array(), sample_mask);
        self.commands.push(Command::SetBlendFactor { factor, sample_mask });
        Ok(())
    }

    fn set_stencil_reference(&mut self, reference: u32) -> Result<()> {
        self.bindings.set_stencil_reference(reference);
        self.commands.push(Command::SetStencilReference(reference));
        Ok(())
    }

    fn clear_render_target(&mut self, target: &Arc<dyn Texture>, color: Vec4) -> Result<()> {
        check_render_target(target)?;
        self.commands.push(Command::ClearRenderTarget {
            target: target.clone(),
            color,
        });
        Ok(())
    }

    fn clear_depth_stencil_target(
        &mut self,
        target: &Arc<dyn Texture>,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        check_depth_target(target)?;
        self.commands.push(Command::ClearDepthStencilTarget {
            target: target.clone(),
            flags,
            depth,
            stencil,
        });
        Ok(())
    }

    fn clear_unordered_access_float(&mut self, resource: &ResourceRef, value: Vec4) -> Result<()> {
        check_unordered_access(resource)?;
        self.commands.push(Command::ClearUnorderedAccessFloat {
            resource: resource.clone(),
            value,
        });
        Ok(())
    }

    fn clear_unordered_access_uint(&mut self, resource: &ResourceRef, value: [u32; 4]) -> Result<()> {
        check_unordered_access(resource)?;
        self.commands.push(Command::ClearUnorderedAccessUint {
            resource: resource.clone(),
            value,
        });
        Ok(())
    }

    fn clear_state(&mut self) -> Result<()> {
        self.bindings.clear();
        self.commands.push(Command::ClearState);
        Ok(())
    }

    fn draw_primitive(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.bindings.check_draw(false)?;
        self.commands.push(Command::DrawPrimitive { vertex_count, first_vertex });
        Ok(())
    }

    fn draw_instanced_primitive(
        &mut self,
        instance_count: u32,
        first_instance: u32,
        vertex_count: u32,
        first_vertex: u32,
    ) -> Result<()> {
        self.bindings.check_draw(false)?;
        self.commands.push(Command::DrawInstancedPrimitive {
            instance_count,
            first_instance,
            vertex_count,
            first_vertex,
        });
        Ok(())
    }

    fn draw_indexed_primitive(&mut self, index_count: u32, first_index: u32, first_vertex: i32) -> Result<()> {
        self.bindings.check_draw(true)?;
        self.commands.push(Command::DrawIndexedPrimitive {
            index_count,
            first_index,
            first_vertex,
        });
        Ok(())
    }

    fn draw_instanced_indexed_primitive(
        &mut self,
        instance_count: u32,
        first_instance: u32,
        index_count: u32,
        first_index: u32,
        first_vertex: i32,
    ) -> Result<()> {
        self.bindings.check_draw(true)?;
        self.commands.push(Command::DrawInstancedIndexedPrimitive {
            instance_count,
            first_instance,
            index_count,
            first_index,
            first_vertex,
        });
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.bindings.check_dispatch()?;
        self.commands.push(Command::Dispatch { x, y, z });
        Ok(())
    }

    fn generate_mip_maps(&mut self, texture: &Arc<dyn Texture>) -> Result<()> {
        self.commands.push(Command::GenerateMipMaps(texture.clone()));
        Ok(())
    }

    fn signal_fence(&mut self, fence: &Arc<dyn Fence>) -> Result<()> {
        self.commands.push(Command::SignalFence(fence.clone()));
        Ok(())
    }

    fn finish_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        let list = self.finish();
        crate::engine_trace!(SOURCE, "Finished command list with {} commands", list.command_count());
        Ok(Box::new(list))
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
