/// Context - immediate and deferred `ID3D11DeviceContext`s
///
/// One type serves both roles. Calls are checked by a `BindingState` and
/// the D3D11 register limits before they reach the native context, so
/// invalid bindings fail the same way as on every other backend.
///
/// Deferred contexts record into a native `ID3D11CommandList`; the frame
/// counters of the recording travel with the list and are added to the
/// immediate context when it executes.

use std::any::Any;
use std::sync::Arc;

use gek_engine::glam::Vec4;
use windows::Win32::Foundation::RECT;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Buffer, ID3D11CommandList, ID3D11DepthStencilView, ID3D11DeviceContext, ID3D11RenderTargetView,
    ID3D11SamplerState, ID3D11ShaderResourceView, ID3D11UnorderedAccessView, D3D11_VIEWPORT,
};
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT;

use gek_engine::gek::video::resource::downcast;
use gek_engine::gek::video::{
    check_depth_target, check_render_target, check_unordered_access, BindingState, Buffer, ClearFlags, CommandList,
    Context, Fence, FrameCounters, PipelineState, PipelineType, Rect, Resource, ResourceRef, SamplerState, Texture,
    ViewFlags, Viewport,
};
use gek_engine::gek::Result;
use gek_engine::{engine_bail_invalid, engine_trace};

use crate::d3d11_buffer::D3D11Buffer;
use crate::d3d11_error::{check, created};
use crate::d3d11_fence::D3D11Fence;
use crate::d3d11_format::index_format;
use crate::d3d11_pipeline::D3D11PipelineState;
use crate::d3d11_sampler::D3D11SamplerState;
use crate::d3d11_slots::{check_slot_range, SlotKind};
use crate::d3d11_texture::D3D11Texture;

const SOURCE: &str = "gek::video::d3d11::Context";

const CLEAR_DEPTH: u32 = 0x1;
const CLEAR_STENCIL: u32 = 0x2;

/// `D3D11_KEEP_RENDER_TARGETS_AND_DEPTH_STENCIL`
const KEEP_RENDER_TARGETS_AND_DEPTH_STENCIL: u32 = u32::MAX;

// ============================================================================
// COMMAND LIST
// ============================================================================

/// Native command list plus the work it records
pub struct D3D11CommandList {
    pub(crate) native: ID3D11CommandList,
    pub(crate) frame: FrameCounters,
    commands: usize,
}

// SAFETY: a finished command list is immutable and may be executed from any thread.
unsafe impl Send for D3D11CommandList {}

impl CommandList for D3D11CommandList {
    fn command_count(&self) -> usize {
        self.commands
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

pub struct D3D11Context {
    pub(crate) native: ID3D11DeviceContext,
    deferred: bool,
    bindings: BindingState,
    pipeline: Option<Arc<dyn PipelineState>>,
    /// Calls recorded since the last `finish_command_list`
    commands: usize,
    pub(crate) frame: FrameCounters,
}

// SAFETY: a context is only ever used by the thread that currently owns it.
unsafe impl Send for D3D11Context {}

fn buffer<'a>(buffer: &'a Arc<dyn Buffer>) -> Result<&'a D3D11Buffer> {
    downcast::<D3D11Buffer>(buffer.as_any(), buffer.name())
}

fn texture<'a>(texture: &'a Arc<dyn Texture>) -> Result<&'a D3D11Texture> {
    downcast::<D3D11Texture>(texture.as_any(), texture.name())
}

fn shader_resource_view(resource: &ResourceRef) -> Result<Option<ID3D11ShaderResourceView>> {
    Ok(match resource {
        ResourceRef::Buffer(buffer) => self::buffer(buffer)?.shader_resource.clone(),
        ResourceRef::Texture(texture) => self::texture(texture)?.views.shader_resource.clone(),
    })
}

fn unordered_access_view(resource: &ResourceRef) -> Result<Option<ID3D11UnorderedAccessView>> {
    Ok(match resource {
        ResourceRef::Buffer(buffer) => self::buffer(buffer)?.unordered_access.clone(),
        ResourceRef::Texture(texture) => self::texture(texture)?.views.unordered_access.clone(),
    })
}

/// Native viewport of an engine viewport
pub(crate) fn native_viewport(viewport: &Viewport) -> D3D11_VIEWPORT {
    D3D11_VIEWPORT {
        TopLeftX: viewport.x,
        TopLeftY: viewport.y,
        Width: viewport.width,
        Height: viewport.height,
        MinDepth: viewport.min_depth,
        MaxDepth: viewport.max_depth,
    }
}

impl D3D11Context {
    pub fn new(native: ID3D11DeviceContext, deferred: bool) -> Self {
        Self {
            native,
            deferred,
            bindings: BindingState::new(),
            pipeline: None,
            commands: 0,
            frame: FrameCounters::default(),
        }
    }

    pub fn binding_state(&self) -> &BindingState {
        &self.bindings
    }

    /// Forget tracked bindings after the native state was reset elsewhere
    pub(crate) fn reset_tracking(&mut self) {
        self.bindings.clear();
        self.pipeline = None;
    }

    fn bound_pipeline(&self) -> Option<&D3D11PipelineState> {
        self.pipeline
            .as_ref()
            .and_then(|pipeline| pipeline.as_any().downcast_ref::<D3D11PipelineState>())
    }

    fn recorded(&mut self) {
        self.commands += 1;
    }

    fn apply_blend_state(&self) {
        let Some(graphics) = self.bound_pipeline().and_then(|pipeline| pipeline.graphics.as_ref()) else {
            return;
        };
        let factor = self.bindings.blend_factor;
        unsafe {
            self.native
                .OMSetBlendState(&graphics.blend, Some(&factor), self.bindings.sample_mask)
        };
    }

    fn prepare_draw(&self, indexed: bool) -> Result<()> {
        self.bindings.check_draw(indexed)
    }

    fn set_constant_buffers(&self, pipeline: PipelineType, first_slot: u32, buffers: &[Option<ID3D11Buffer>]) {
        let buffers = Some(buffers);
        unsafe {
            match pipeline {
                PipelineType::Compute => self.native.CSSetConstantBuffers(first_slot, buffers),
                PipelineType::Vertex => self.native.VSSetConstantBuffers(first_slot, buffers),
                PipelineType::Geometry => self.native.GSSetConstantBuffers(first_slot, buffers),
                PipelineType::Pixel => self.native.PSSetConstantBuffers(first_slot, buffers),
            }
        }
    }

    fn set_shader_resources(
        &self,
        pipeline: PipelineType,
        first_slot: u32,
        views: &[Option<ID3D11ShaderResourceView>],
    ) {
        let views = Some(views);
        unsafe {
            match pipeline {
                PipelineType::Compute => self.native.CSSetShaderResources(first_slot, views),
                PipelineType::Vertex => self.native.VSSetShaderResources(first_slot, views),
                PipelineType::Geometry => self.native.GSSetShaderResources(first_slot, views),
                PipelineType::Pixel => self.native.PSSetShaderResources(first_slot, views),
            }
        }
    }

    fn set_samplers(&self, pipeline: PipelineType, first_slot: u32, samplers: &[Option<ID3D11SamplerState>]) {
        let samplers = Some(samplers);
        unsafe {
            match pipeline {
                PipelineType::Compute => self.native.CSSetSamplers(first_slot, samplers),
                PipelineType::Vertex => self.native.VSSetSamplers(first_slot, samplers),
                PipelineType::Geometry => self.native.GSSetSamplers(first_slot, samplers),
                PipelineType::Pixel => self.native.PSSetSamplers(first_slot, samplers),
            }
        }
    }
}

impl Context for D3D11Context {
    fn is_deferred(&self) -> bool {
        self.deferred
    }

    // ===== BINDING =====

    fn set_pipeline_state(&mut self, pipeline_state: &Arc<dyn PipelineState>) -> Result<()> {
        let native = downcast::<D3D11PipelineState>(pipeline_state.as_any(), pipeline_state.name())?;
        self.bindings.bind_pipeline_state(pipeline_state)?;
        unsafe {
            match &native.graphics {
                None => self.native.CSSetShader(native.compute.as_ref(), None),
                Some(graphics) => {
                    self.native.VSSetShader(native.vertex.as_ref(), None);
                    self.native.GSSetShader(native.geometry.as_ref(), None);
                    self.native.PSSetShader(native.pixel.as_ref(), None);
                    self.native.IASetInputLayout(native.input_layout.as_ref());
                    self.native.IASetPrimitiveTopology(graphics.topology);
                    self.native.RSSetState(&graphics.rasterizer);
                    self.native
                        .OMSetDepthStencilState(&graphics.depth_stencil, self.bindings.stencil_reference);
                }
            }
        }
        self.pipeline = Some(pipeline_state.clone());
        self.apply_blend_state();
        self.recorded();
        Ok(())
    }

    fn set_vertex_buffer_list(
        &mut self,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
        offsets: &[u32],
    ) -> Result<()> {
        let mut natives = Vec::with_capacity(buffers.len());
        let mut strides = Vec::with_capacity(buffers.len());
        for buffer in buffers {
            match buffer {
                Some(buffer) => {
                    natives.push(Some(self::buffer(buffer)?.native.clone()));
                    strides.push(buffer.description().element_stride());
                }
                None => {
                    natives.push(None);
                    strides.push(0);
                }
            }
        }
        self.bindings.bind_vertex_buffers(buffers, first_slot, offsets)?;
        let offsets: Vec<u32> = (0..buffers.len()).map(|index| offsets.get(index).copied().unwrap_or(0)).collect();
        unsafe {
            self.native.IASetVertexBuffers(
                first_slot,
                natives.len() as u32,
                Some(natives.as_ptr()),
                Some(strides.as_ptr()),
                Some(offsets.as_ptr()),
            );
        }
        self.recorded();
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: Option<&Arc<dyn Buffer>>, offset: u32) -> Result<()> {
        let binding = match buffer {
            Some(buffer) => {
                let native = self::buffer(buffer)?.native.clone();
                let format = buffer.description().format;
                let Some(dxgi) = index_format(format) else {
                    engine_bail_invalid!(SOURCE, "Index buffer '{}' uses {}, expected R16_UINT or R32_UINT", buffer.name(), format);
                };
                Some((native, dxgi))
            }
            None => None,
        };
        self.bindings.bind_index_buffer(buffer, offset)?;
        unsafe {
            match &binding {
                Some((native, format)) => self.native.IASetIndexBuffer(native, DXGI_FORMAT(*format as i32), offset),
                None => self.native.IASetIndexBuffer(None::<&ID3D11Buffer>, DXGI_FORMAT(0), 0),
            }
        }
        self.recorded();
        Ok(())
    }

    fn set_constant_buffer_list(
        &mut self,
        pipeline: PipelineType,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
    ) -> Result<()> {
        check_slot_range(SlotKind::ConstantBuffer, pipeline, first_slot, buffers.len())?;
        let mut natives = Vec::with_capacity(buffers.len());
        for buffer in buffers {
            natives.push(match buffer {
                Some(buffer) => Some(self::buffer(buffer)?.native.clone()),
                None => None,
            });
        }
        self.bindings.bind_constant_buffers(pipeline, buffers, first_slot)?;
        self.set_constant_buffers(pipeline, first_slot, &natives);
        self.recorded();
        Ok(())
    }

    fn set_resource_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        check_slot_range(SlotKind::ShaderResource, pipeline, first_slot, resources.len())?;
        self.bindings.bind_resources(pipeline, resources, first_slot)?;
        let mut views = Vec::with_capacity(resources.len());
        for resource in resources {
            views.push(match resource {
                Some(resource) => shader_resource_view(resource)?,
                None => None,
            });
        }
        self.set_shader_resources(pipeline, first_slot, &views);
        self.recorded();
        Ok(())
    }

    fn set_unordered_access_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        check_slot_range(SlotKind::UnorderedAccess, pipeline, first_slot, resources.len())?;
        self.bindings.bind_unordered_access(pipeline, resources, first_slot)?;
        let mut views = Vec::with_capacity(resources.len());
        for resource in resources {
            views.push(match resource {
                Some(resource) => unordered_access_view(resource)?,
                None => None,
            });
        }
        unsafe {
            match pipeline {
                PipelineType::Compute => {
                    self.native
                        .CSSetUnorderedAccessViews(first_slot, views.len() as u32, Some(views.as_ptr()), None)
                }
                // Pixel UAVs share the output-merger slots with the render targets
                _ => self.native.OMSetRenderTargetsAndUnorderedAccessViews(
                    KEEP_RENDER_TARGETS_AND_DEPTH_STENCIL,
                    None,
                    None::<&ID3D11DepthStencilView>,
                    first_slot,
                    views.len() as u32,
                    Some(views.as_ptr()),
                    None,
                ),
            }
        }
        self.recorded();
        Ok(())
    }

    fn set_sampler_state_list(
        &mut self,
        pipeline: PipelineType,
        samplers: &[Option<Arc<dyn SamplerState>>],
        first_slot: u32,
    ) -> Result<()> {
        check_slot_range(SlotKind::Sampler, pipeline, first_slot, samplers.len())?;
        let mut natives = Vec::with_capacity(samplers.len());
        for sampler in samplers {
            natives.push(match sampler {
                Some(sampler) => Some(downcast::<D3D11SamplerState>(sampler.as_any(), sampler.name())?.native.clone()),
                None => None,
            });
        }
        self.bindings.bind_samplers(pipeline, samplers, first_slot)?;
        self.set_samplers(pipeline, first_slot, &natives);
        self.recorded();
        Ok(())
    }

    fn set_render_target_list(
        &mut self,
        targets: &[Arc<dyn Texture>],
        depth: Option<&Arc<dyn Texture>>,
    ) -> Result<()> {
        self.bindings.bind_render_targets(targets, depth)?;
        let mut views: Vec<Option<ID3D11RenderTargetView>> = Vec::with_capacity(targets.len());
        for target in targets {
            views.push(texture(target)?.views.render_target.clone());
        }
        let depth_view = match depth {
            Some(depth) => texture(depth)?.views.depth_stencil.clone(),
            None => None,
        };
        unsafe {
            self.native.OMSetRenderTargets(
                if views.is_empty() { None } else { Some(&views) },
                depth_view.as_ref(),
            );
        }
        self.recorded();
        Ok(())
    }

    fn set_viewport_list(&mut self, viewports: &[Viewport]) -> Result<()> {
        self.bindings.set_viewports(viewports)?;
        let natives: Vec<D3D11_VIEWPORT> = viewports.iter().map(native_viewport).collect();
        unsafe { self.native.RSSetViewports(Some(&natives)) };
        self.recorded();
        Ok(())
    }

    fn set_scissor_list(&mut self, rects: &[Rect]) -> Result<()> {
        self.bindings.set_scissors(rects)?;
        let natives: Vec<RECT> = rects
            .iter()
            .map(|rect| RECT {
                left: rect.left,
                top: rect.top,
                right: rect.right,
                bottom: rect.bottom,
            })
            .collect();
        unsafe { self.native.RSSetScissorRects(Some(&natives)) };
        self.recorded();
        Ok(())
    }

    fn set_blend_factor(&mut self, factor: Vec4, sample_mask: u32) -> Result<()> {
        self.bindings.set_blend_factor(factor.to_array(), sample_mask);
        // Blend factor and sample mask only reach D3D11 through OMSetBlendState
        self.apply_blend_state();
        self.recorded();
        Ok(())
    }

    fn set_stencil_reference(&mut self, reference: u32) -> Result<()> {
        self.bindings.set_stencil_reference(reference);
        if let Some(graphics) = self.bound_pipeline().and_then(|pipeline| pipeline.graphics.as_ref()) {
            unsafe { self.native.OMSetDepthStencilState(&graphics.depth_stencil, reference) };
        }
        self.recorded();
        Ok(())
    }

    // ===== CLEARING =====

    fn clear_render_target(&mut self, target: &Arc<dyn Texture>, color: Vec4) -> Result<()> {
        check_render_target(target)?;
        if let Some(view) = &texture(target)?.views.render_target {
            unsafe { self.native.ClearRenderTargetView(view, &color.to_array()) };
        }
        self.recorded();
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
        let mut native_flags = 0;
        if flags.contains(ClearFlags::DEPTH) {
            native_flags |= CLEAR_DEPTH;
        }
        if flags.contains(ClearFlags::STENCIL) && target.description().format.has_stencil() {
            native_flags |= CLEAR_STENCIL;
        }
        if native_flags == 0 {
            return Ok(());
        }
        if let Some(view) = &texture(target)?.views.depth_stencil {
            unsafe { self.native.ClearDepthStencilView(view, native_flags, depth, stencil) };
        }
        self.recorded();
        Ok(())
    }

    fn clear_unordered_access_float(&mut self, resource: &ResourceRef, value: Vec4) -> Result<()> {
        check_unordered_access(resource)?;
        if let Some(view) = unordered_access_view(resource)? {
            unsafe { self.native.ClearUnorderedAccessViewFloat(&view, &value.to_array()) };
        }
        self.recorded();
        Ok(())
    }

    fn clear_unordered_access_uint(&mut self, resource: &ResourceRef, value: [u32; 4]) -> Result<()> {
        check_unordered_access(resource)?;
        if let Some(view) = unordered_access_view(resource)? {
            unsafe { self.native.ClearUnorderedAccessViewUint(&view, &value) };
        }
        self.recorded();
        Ok(())
    }

    fn clear_state(&mut self) -> Result<()> {
        unsafe { self.native.ClearState() };
        self.reset_tracking();
        self.recorded();
        Ok(())
    }

    // ===== WORK =====

    fn draw_primitive(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.prepare_draw(false)?;
        unsafe { self.native.Draw(vertex_count, first_vertex) };
        self.frame.draw_calls += 1;
        self.recorded();
        Ok(())
    }

    fn draw_instanced_primitive(
        &mut self,
        instance_count: u32,
        first_instance: u32,
        vertex_count: u32,
        first_vertex: u32,
    ) -> Result<()> {
        self.prepare_draw(false)?;
        unsafe {
            self.native
                .DrawInstanced(vertex_count, instance_count, first_vertex, first_instance)
        };
        self.frame.draw_calls += 1;
        self.recorded();
        Ok(())
    }

    fn draw_indexed_primitive(&mut self, index_count: u32, first_index: u32, first_vertex: i32) -> Result<()> {
        self.prepare_draw(true)?;
        unsafe { self.native.DrawIndexed(index_count, first_index, first_vertex) };
        self.frame.draw_calls += 1;
        self.recorded();
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
        self.prepare_draw(true)?;
        unsafe {
            self.native.DrawIndexedInstanced(
                index_count,
                instance_count,
                first_index,
                first_vertex,
                first_instance,
            )
        };
        self.frame.draw_calls += 1;
        self.recorded();
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.bindings.check_dispatch()?;
        unsafe { self.native.Dispatch(x, y, z) };
        self.frame.dispatch_calls += 1;
        self.recorded();
        Ok(())
    }

    fn generate_mip_maps(&mut self, texture: &Arc<dyn Texture>) -> Result<()> {
        let desc = texture.description();
        if desc.is_multisampled() || !texture.views().contains(ViewFlags::SHADER_RESOURCE | ViewFlags::RENDER_TARGET) {
            engine_bail_invalid!(
                SOURCE,
                "Cannot generate mip maps for '{}': it must be a single-sample shader resource and render target",
                texture.name()
            );
        }
        if let Some(view) = &self::texture(texture)?.views.shader_resource {
            unsafe { self.native.GenerateMips(view) };
        }
        self.recorded();
        Ok(())
    }

    fn signal_fence(&mut self, fence: &Arc<dyn Fence>) -> Result<()> {
        downcast::<D3D11Fence>(fence.as_any(), fence.name())?.signal(&self.native);
        self.recorded();
        Ok(())
    }

    fn finish_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        if !self.deferred {
            engine_bail_invalid!(SOURCE, "finish_command_list called on the immediate context");
        }
        let mut list: Option<ID3D11CommandList> = None;
        check(unsafe { self.native.FinishCommandList(false.into(), Some(&mut list)) }, "FinishCommandList")?;
        let native = created(list, "FinishCommandList")?;

        // FinishCommandList leaves the deferred context in its default state
        self.reset_tracking();
        let commands = std::mem::take(&mut self.commands);
        engine_trace!(SOURCE, "Finished command list with {} commands", commands);
        Ok(Box::new(D3D11CommandList {
            native,
            frame: self.frame.take(),
            commands,
        }))
    }
}
