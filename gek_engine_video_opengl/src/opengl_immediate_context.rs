/// Immediate context - executes context calls directly on the GL context
///
/// Every call is checked by a `BindingState` before it reaches GL, so an
/// invalid binding fails the same way on every backend. GL has one binding
/// namespace for all stages: the `PipelineType` of a slot list is tracked
/// but does not change which GL unit is written.
///
/// Slot mapping:
/// - constant slot `k` is uniform-buffer binding `k`
/// - texture resource `k` and sampler `k` share texture unit `k`
/// - buffer resource `k` is storage-buffer binding `k`, for `k` below
///   `UNORDERED_ACCESS_SHIFT`
/// - unordered-access slot `k` is image unit or storage-buffer binding
///   `k + UNORDERED_ACCESS_SHIFT`

use std::sync::Arc;

use gek_engine::glam::Vec4;
use glow::HasContext;
use rustc_hash::FxHashMap;

use gek_engine::gek::video::pipeline::MAX_VERTEX_BUFFERS;
use gek_engine::gek::video::resource::downcast;
use gek_engine::gek::video::{
    check_depth_target, check_render_target, check_unordered_access, BindingState, Buffer, BlendStateDescription,
    ClearFlags, CommandList, Context, DepthStateDescription, Fence, FrameCounters, PipelineState,
    PipelineStateDescription, PipelineType,
    RasterizerStateDescription, Rect, Resource, ResourceId, ResourceRef, SamplerState, Texture, ViewFlags, Viewport,
};
use gek_engine::gek::Result;
use gek_engine::{engine_bail_invalid, engine_trace};

use crate::opengl_buffer::OpenGlBuffer;
use crate::opengl_fence::OpenGlFence;
use crate::opengl_format::{image_format, index_type};
use crate::opengl_framebuffer::{create_framebuffer, FramebufferCache, FramebufferKey};
use crate::opengl_pipeline::OpenGlPipelineState;
use crate::opengl_sampler::OpenGlSamplerState;
use crate::opengl_shader_compiler::UNORDERED_ACCESS_SHIFT;
use crate::opengl_state::{apply_blend, apply_depth, apply_rasterizer, apply_stencil_reference, flip_y};
use crate::opengl_texture::{OpenGlTexture, SCRATCH_TEXTURE_UNIT};

const SOURCE: &str = "gek::video::opengl::Context";

// ============================================================================
// HELPERS
// ============================================================================

/// GL viewport (bottom-left origin) of a top-left-origin viewport
pub fn gl_viewport(viewport: &Viewport, target_height: u32) -> [f32; 4] {
    [
        viewport.x,
        flip_y(viewport.y, viewport.height, target_height as f32),
        viewport.width,
        viewport.height,
    ]
}

/// GL scissor box (x, y, width, height) of a top-left-origin rectangle
pub fn gl_scissor(rect: &Rect, target_height: u32) -> [i32; 4] {
    let height = rect.height().max(0);
    [
        rect.left,
        target_height as i32 - (rect.top + height),
        rect.width().max(0),
        height,
    ]
}

/// Buffer contents where every 32-bit word is `word`
pub fn fill_pattern(word: u32, size: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = word.to_le_bytes().iter().copied().cycle().take(size - size % 4).collect();
    bytes.resize(size, 0);
    bytes
}

/// Byte offset of `first_index` inside an index buffer bound at `offset`
pub fn index_byte_offset(offset: u32, first_index: u32, index_size: u32) -> i32 {
    (offset + first_index * index_size) as i32
}

/// Buffer resources use storage-buffer bindings below the unordered-access range
pub fn check_buffer_resource_slot(name: &str, slot: u32) -> Result<()> {
    if slot >= UNORDERED_ACCESS_SHIFT {
        engine_bail_invalid!(
            SOURCE,
            "Buffer '{}' at resource slot {} overlaps unordered-access slot {}; buffer resources must use slots 0..{}",
            name,
            slot,
            slot - UNORDERED_ACCESS_SHIFT,
            UNORDERED_ACCESS_SHIFT
        );
    }
    Ok(())
}

/// Native object behind a resource list entry
#[derive(Debug, Clone, Copy)]
enum NativeResource {
    Texture {
        native: glow::NativeTexture,
        target: u32,
        layered: bool,
        format: u32,
    },
    Buffer(glow::NativeBuffer),
}

fn native_resources(resources: &[Option<ResourceRef>]) -> Result<Vec<Option<NativeResource>>> {
    resources
        .iter()
        .map(|resource| {
            Ok(match resource {
                Some(ResourceRef::Texture(texture)) => {
                    let native = downcast::<OpenGlTexture>(texture.as_any(), texture.name())?;
                    let desc = texture.description();
                    Some(NativeResource::Texture {
                        native: native.native,
                        target: native.target,
                        layered: desc.is_cube() || desc.is_volume(),
                        format: image_format(desc.format),
                    })
                }
                Some(ResourceRef::Buffer(buffer)) => Some(NativeResource::Buffer(
                    downcast::<OpenGlBuffer>(buffer.as_any(), buffer.name())?.native,
                )),
                None => None,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct IndexBinding {
    native: glow::NativeBuffer,
    offset: u32,
    data_type: u32,
    size: u32,
}

// ============================================================================
// CONTEXT
// ============================================================================

pub struct OpenGlImmediateContext {
    gl: glow::Context,
    bindings: BindingState,
    pipeline: Option<Arc<dyn PipelineState>>,
    vertex_buffers: [Option<(glow::NativeBuffer, u32)>; MAX_VERTEX_BUFFERS],
    index_buffer: Option<IndexBinding>,
    /// Texture target bound on each texture unit
    texture_units: FxHashMap<u32, u32>,
    framebuffers: FramebufferCache<glow::NativeFramebuffer>,
    framebuffer: Option<glow::NativeFramebuffer>,
    /// Height of the bound render targets, used to flip viewports and scissors
    target_height: u32,
    target_count: usize,
    pub(crate) frame: FrameCounters,
}

impl OpenGlImmediateContext {
    pub fn new(gl: glow::Context) -> Self {
        unsafe {
            // Render into sRGB targets the way D3D does
            gl.enable(glow::FRAMEBUFFER_SRGB);
            gl.enable(glow::TEXTURE_CUBE_MAP_SEAMLESS);
        }
        Self {
            gl,
            bindings: BindingState::new(),
            pipeline: None,
            vertex_buffers: [None; MAX_VERTEX_BUFFERS],
            index_buffer: None,
            texture_units: FxHashMap::default(),
            framebuffers: FramebufferCache::new(),
            framebuffer: None,
            target_height: 0,
            target_count: 0,
            frame: FrameCounters::default(),
        }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    pub fn binding_state(&self) -> &BindingState {
        &self.bindings
    }

    /// Drop cached framebuffers that use deleted textures; returns them for deletion
    pub(crate) fn purge_framebuffers(&mut self, deleted: &[ResourceId]) -> Vec<glow::NativeFramebuffer> {
        let removed = self.framebuffers.purge(deleted);
        if self.framebuffer.is_some_and(|current| removed.contains(&current)) {
            self.framebuffer = None;
            unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, None) };
        }
        removed
    }

    /// Every cached framebuffer, for deletion when the device goes away
    pub(crate) fn drain_framebuffers(&mut self) -> Vec<glow::NativeFramebuffer> {
        self.framebuffer = None;
        self.framebuffers.drain()
    }

    fn framebuffer_for(
        &mut self,
        colors: &[&OpenGlTexture],
        depth: Option<&OpenGlTexture>,
    ) -> Result<glow::NativeFramebuffer> {
        let key = FramebufferKey {
            colors: colors.iter().map(|texture| texture.id()).collect(),
            depth: depth.map(|texture| texture.id()),
        };
        if let Some(framebuffer) = self.framebuffers.get(&key) {
            return Ok(framebuffer);
        }
        let framebuffer = create_framebuffer(&self.gl, colors, depth)?;
        engine_trace!(SOURCE, "Created framebuffer for {} color target(s)", colors.len());
        self.framebuffers.insert(key, framebuffer);
        Ok(framebuffer)
    }

    fn bound_pipeline(&self) -> Option<&OpenGlPipelineState> {
        self.pipeline
            .as_ref()
            .and_then(|pipeline| pipeline.as_any().downcast_ref::<OpenGlPipelineState>())
    }

    /// Re-apply fixed-function state after a clear or blit touched it
    fn restore_state(&self) {
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, self.framebuffer);
        }
        match self.bound_pipeline() {
            Some(pipeline) if !pipeline.is_compute() => self.apply_fixed_function(pipeline.description()),
            _ => {
                apply_rasterizer(&self.gl, &RasterizerStateDescription::default());
                apply_depth(&self.gl, &DepthStateDescription::default(), self.bindings.stencil_reference);
                apply_blend(&self.gl, &BlendStateDescription::default(), self.target_count);
            }
        }
    }

    fn apply_fixed_function(&self, desc: &PipelineStateDescription) {
        apply_rasterizer(&self.gl, &desc.rasterizer);
        apply_depth(&self.gl, &desc.depth, self.bindings.stencil_reference);
        apply_blend(&self.gl, &desc.blend, self.target_count);
    }

    fn apply_viewports(&self) {
        if self.bindings.viewports.is_empty() {
            return;
        }
        let rects: Vec<[f32; 4]> = self
            .bindings
            .viewports
            .iter()
            .map(|viewport| gl_viewport(viewport, self.target_height))
            .collect();
        let depths: Vec<[f64; 2]> = self
            .bindings
            .viewports
            .iter()
            .map(|viewport| [viewport.min_depth as f64, viewport.max_depth as f64])
            .collect();
        unsafe {
            self.gl.viewport_f32_slice(0, rects.len() as i32, &rects);
            self.gl.depth_range_f64_slice(0, depths.len() as i32, &depths);
        }
    }

    fn apply_scissors(&self) {
        if self.bindings.scissors.is_empty() {
            return;
        }
        let boxes: Vec<[i32; 4]> = self
            .bindings
            .scissors
            .iter()
            .map(|rect| gl_scissor(rect, self.target_height))
            .collect();
        unsafe { self.gl.scissor_slice(0, boxes.len() as i32, &boxes) };
    }

    /// Bind the pipeline's vertex array with the current buffers
    fn prepare_draw(&self, indexed: bool) -> Result<u32> {
        self.bindings.check_draw(indexed)?;
        let Some(pipeline) = self.bound_pipeline() else {
            engine_bail_invalid!(SOURCE, "Bound pipeline state was not created by the OpenGL device");
        };
        unsafe {
            self.gl.bind_vertex_array(pipeline.vertex_array);
            for (slot, binding) in self.vertex_buffers.iter().enumerate() {
                if let Some((native, offset)) = binding {
                    self.gl.bind_vertex_buffer(
                        slot as u32,
                        Some(*native),
                        *offset as i32,
                        pipeline.strides[slot] as i32,
                    );
                }
            }
            if indexed {
                self.gl
                    .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, self.index_buffer.map(|index| index.native));
            }
        }
        Ok(pipeline.mode)
    }

    fn index_binding(&self) -> Result<IndexBinding> {
        match self.index_buffer {
            Some(index) => Ok(index),
            None => engine_bail_invalid!(SOURCE, "Indexed draw issued without an index buffer"),
        }
    }

    /// Copy the back buffer into the window's default framebuffer
    pub(crate) fn blit_to_window(&mut self, back_buffer: &OpenGlTexture, width: u32, height: u32) -> Result<()> {
        let source = self.framebuffer_for(&[back_buffer], None)?;
        let (width, height) = (width as i32, height as i32);
        unsafe {
            self.gl.disable(glow::SCISSOR_TEST);
            self.gl.disable(glow::FRAMEBUFFER_SRGB);
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(source));
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);
            self.gl.blit_framebuffer(
                0,
                0,
                width,
                height,
                0,
                0,
                width,
                height,
                glow::COLOR_BUFFER_BIT,
                glow::NEAREST,
            );
            self.gl.enable(glow::FRAMEBUFFER_SRGB);
        }
        self.restore_state();
        Ok(())
    }
}

impl Context for OpenGlImmediateContext {
    fn is_deferred(&self) -> bool {
        false
    }

    // ===== BINDING =====

    fn set_pipeline_state(&mut self, pipeline_state: &Arc<dyn PipelineState>) -> Result<()> {
        let native = downcast::<OpenGlPipelineState>(pipeline_state.as_any(), pipeline_state.name())?;
        self.bindings.bind_pipeline_state(pipeline_state)?;
        unsafe { self.gl.use_program(Some(native.program)) };
        if !native.is_compute() {
            self.apply_fixed_function(native.description());
        }
        self.pipeline = Some(pipeline_state.clone());
        Ok(())
    }

    fn set_vertex_buffer_list(
        &mut self,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
        offsets: &[u32],
    ) -> Result<()> {
        let mut natives = Vec::with_capacity(buffers.len());
        for buffer in buffers {
            natives.push(match buffer {
                Some(buffer) => Some(downcast::<OpenGlBuffer>(buffer.as_any(), buffer.name())?.native),
                None => None,
            });
        }
        self.bindings.bind_vertex_buffers(buffers, first_slot, offsets)?;
        for (index, native) in natives.into_iter().enumerate() {
            let offset = offsets.get(index).copied().unwrap_or(0);
            self.vertex_buffers[first_slot as usize + index] = native.map(|native| (native, offset));
        }
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: Option<&Arc<dyn Buffer>>, offset: u32) -> Result<()> {
        let binding = match buffer {
            Some(buffer) => {
                let native = downcast::<OpenGlBuffer>(buffer.as_any(), buffer.name())?.native;
                let format = buffer.description().format;
                let Some((data_type, size)) = index_type(format) else {
                    engine_bail_invalid!(SOURCE, "Index buffer '{}' uses {}, expected R16_UINT or R32_UINT", buffer.name(), format);
                };
                Some(IndexBinding { native, offset, data_type, size })
            }
            None => None,
        };
        self.bindings.bind_index_buffer(buffer, offset)?;
        self.index_buffer = binding;
        Ok(())
    }

    fn set_constant_buffer_list(
        &mut self,
        pipeline: PipelineType,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
    ) -> Result<()> {
        let mut natives = Vec::with_capacity(buffers.len());
        for buffer in buffers {
            natives.push(match buffer {
                Some(buffer) => Some(downcast::<OpenGlBuffer>(buffer.as_any(), buffer.name())?.native),
                None => None,
            });
        }
        self.bindings.bind_constant_buffers(pipeline, buffers, first_slot)?;
        for (index, native) in natives.into_iter().enumerate() {
            unsafe {
                self.gl
                    .bind_buffer_base(glow::UNIFORM_BUFFER, first_slot + index as u32, native);
            }
        }
        Ok(())
    }

    fn set_resource_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        let natives = native_resources(resources)?;
        for (index, resource) in resources.iter().enumerate() {
            if let Some(ResourceRef::Buffer(buffer)) = resource {
                check_buffer_resource_slot(buffer.name(), first_slot + index as u32)?;
            }
        }
        self.bindings.bind_resources(pipeline, resources, first_slot)?;

        for (index, native) in natives.into_iter().enumerate() {
            let slot = first_slot + index as u32;
            unsafe {
                match native {
                    Some(NativeResource::Texture { native, target, .. }) => {
                        self.gl.active_texture(glow::TEXTURE0 + slot);
                        self.gl.bind_texture(target, Some(native));
                        self.texture_units.insert(slot, target);
                    }
                    Some(NativeResource::Buffer(native)) => {
                        self.gl.bind_buffer_base(glow::SHADER_STORAGE_BUFFER, slot, Some(native));
                    }
                    None => {
                        if let Some(target) = self.texture_units.remove(&slot) {
                            self.gl.active_texture(glow::TEXTURE0 + slot);
                            self.gl.bind_texture(target, None);
                        }
                        if slot < UNORDERED_ACCESS_SHIFT {
                            self.gl.bind_buffer_base(glow::SHADER_STORAGE_BUFFER, slot, None);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn set_unordered_access_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        let natives = native_resources(resources)?;
        self.bindings.bind_unordered_access(pipeline, resources, first_slot)?;

        for (index, native) in natives.into_iter().enumerate() {
            let unit = first_slot + index as u32 + UNORDERED_ACCESS_SHIFT;
            unsafe {
                match native {
                    Some(NativeResource::Texture { native, layered, format, .. }) => {
                        self.gl
                            .bind_image_texture(unit, Some(native), 0, layered, 0, glow::READ_WRITE, format);
                    }
                    Some(NativeResource::Buffer(native)) => {
                        self.gl.bind_buffer_base(glow::SHADER_STORAGE_BUFFER, unit, Some(native));
                    }
                    None => {
                        self.gl.bind_image_texture(unit, None, 0, false, 0, glow::READ_WRITE, glow::R32UI);
                        self.gl.bind_buffer_base(glow::SHADER_STORAGE_BUFFER, unit, None);
                    }
                }
            }
        }
        Ok(())
    }

    fn set_sampler_state_list(
        &mut self,
        pipeline: PipelineType,
        samplers: &[Option<Arc<dyn SamplerState>>],
        first_slot: u32,
    ) -> Result<()> {
        let mut natives = Vec::with_capacity(samplers.len());
        for sampler in samplers {
            natives.push(match sampler {
                Some(sampler) => Some(downcast::<OpenGlSamplerState>(sampler.as_any(), sampler.name())?.native),
                None => None,
            });
        }
        self.bindings.bind_samplers(pipeline, samplers, first_slot)?;
        for (index, native) in natives.into_iter().enumerate() {
            unsafe { self.gl.bind_sampler(first_slot + index as u32, native) };
        }
        Ok(())
    }

    fn set_render_target_list(
        &mut self,
        targets: &[Arc<dyn Texture>],
        depth: Option<&Arc<dyn Texture>>,
    ) -> Result<()> {
        self.bindings.bind_render_targets(targets, depth)?;

        let mut colors = Vec::with_capacity(targets.len());
        for target in targets {
            colors.push(downcast::<OpenGlTexture>(target.as_any(), target.name())?);
        }
        let depth_native = match depth {
            Some(depth) => Some(downcast::<OpenGlTexture>(depth.as_any(), depth.name())?),
            None => None,
        };

        let framebuffer = if colors.is_empty() && depth_native.is_none() {
            None
        } else {
            Some(self.framebuffer_for(&colors, depth_native)?)
        };
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
        self.framebuffer = framebuffer;

        self.target_height = targets
            .first()
            .or(depth)
            .map(|texture| texture.description().height)
            .unwrap_or(0);
        self.target_count = targets.len();

        // Flipped rectangles depend on the target height
        self.apply_viewports();
        self.apply_scissors();
        if let Some(pipeline) = self.bound_pipeline() {
            if !pipeline.is_compute() {
                apply_blend(&self.gl, &pipeline.description().blend, self.target_count);
            }
        }
        Ok(())
    }

    fn set_viewport_list(&mut self, viewports: &[Viewport]) -> Result<()> {
        self.bindings.set_viewports(viewports)?;
        self.apply_viewports();
        Ok(())
    }

    fn set_scissor_list(&mut self, rects: &[Rect]) -> Result<()> {
        self.bindings.set_scissors(rects)?;
        self.apply_scissors();
        Ok(())
    }

    fn set_blend_factor(&mut self, factor: Vec4, sample_mask: u32) -> Result<()> {
        // The sample mask is tracked but not applied on GL
        self.bindings.set_blend_factor(factor.to_array(), sample_mask);
        unsafe { self.gl.blend_color(factor.x, factor.y, factor.z, factor.w) };
        Ok(())
    }

    fn set_stencil_reference(&mut self, reference: u32) -> Result<()> {
        self.bindings.set_stencil_reference(reference);
        if let Some(pipeline) = self.bound_pipeline() {
            let depth = &pipeline.description().depth;
            if depth.stencil_enable {
                apply_stencil_reference(&self.gl, depth, reference);
            }
        }
        Ok(())
    }

    // ===== CLEARING =====

    fn clear_render_target(&mut self, target: &Arc<dyn Texture>, color: Vec4) -> Result<()> {
        check_render_target(target)?;
        let native = downcast::<OpenGlTexture>(target.as_any(), target.name())?;
        let framebuffer = self.framebuffer_for(&[native], None)?;
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            self.gl.disable(glow::SCISSOR_TEST);
            self.gl.color_mask_draw_buffer(0, true, true, true, true);
            self.gl.clear_buffer_f32_slice(glow::COLOR, 0, &color.to_array());
        }
        self.restore_state();
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
        let native = downcast::<OpenGlTexture>(target.as_any(), target.name())?;
        let framebuffer = self.framebuffer_for(&[], Some(native))?;
        let has_stencil = target.description().format.has_stencil();
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            self.gl.disable(glow::SCISSOR_TEST);
            self.gl.depth_mask(true);
            self.gl.stencil_mask(0xFF);
            let clear_depth = flags.contains(ClearFlags::DEPTH);
            let clear_stencil = flags.contains(ClearFlags::STENCIL) && has_stencil;
            match (clear_depth, clear_stencil) {
                (true, true) => self.gl.clear_buffer_depth_stencil(glow::DEPTH_STENCIL, 0, depth, stencil as i32),
                (true, false) => self.gl.clear_buffer_f32_slice(glow::DEPTH, 0, &[depth]),
                (false, true) => self.gl.clear_buffer_i32_slice(glow::STENCIL, 0, &[stencil as i32]),
                (false, false) => {}
            }
        }
        self.restore_state();
        Ok(())
    }

    fn clear_unordered_access_float(&mut self, resource: &ResourceRef, value: Vec4) -> Result<()> {
        check_unordered_access(resource)?;
        match resource {
            ResourceRef::Texture(texture) => {
                let native = downcast::<OpenGlTexture>(texture.as_any(), texture.name())?;
                let framebuffer = self.framebuffer_for(&[native], None)?;
                unsafe {
                    self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
                    self.gl.disable(glow::SCISSOR_TEST);
                    self.gl.color_mask_draw_buffer(0, true, true, true, true);
                    self.gl.clear_buffer_f32_slice(glow::COLOR, 0, &value.to_array());
                }
                self.restore_state();
            }
            ResourceRef::Buffer(buffer) => {
                let native = downcast::<OpenGlBuffer>(buffer.as_any(), buffer.name())?;
                let bytes = fill_pattern(value.x.to_bits(), buffer.description().size_bytes() as usize);
                unsafe {
                    self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(native.native));
                    self.gl.buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, 0, &bytes);
                    self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
                }
            }
        }
        Ok(())
    }

    fn clear_unordered_access_uint(&mut self, resource: &ResourceRef, value: [u32; 4]) -> Result<()> {
        check_unordered_access(resource)?;
        match resource {
            ResourceRef::Texture(texture) => {
                let native = downcast::<OpenGlTexture>(texture.as_any(), texture.name())?;
                if !texture.description().format.is_integer() {
                    engine_bail_invalid!(
                        SOURCE,
                        "Integer clear of '{}' needs an integer format, not {}",
                        texture.name(), texture.description().format
                    );
                }
                let framebuffer = self.framebuffer_for(&[native], None)?;
                unsafe {
                    self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
                    self.gl.disable(glow::SCISSOR_TEST);
                    self.gl.color_mask_draw_buffer(0, true, true, true, true);
                    self.gl.clear_buffer_u32_slice(glow::COLOR, 0, &value);
                }
                self.restore_state();
            }
            ResourceRef::Buffer(buffer) => {
                let native = downcast::<OpenGlBuffer>(buffer.as_any(), buffer.name())?;
                let bytes = fill_pattern(value[0], buffer.description().size_bytes() as usize);
                unsafe {
                    self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(native.native));
                    self.gl.buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, 0, &bytes);
                    self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
                }
            }
        }
        Ok(())
    }

    fn clear_state(&mut self) -> Result<()> {
        unsafe {
            for &slot in self.bindings.constant_buffers.keys().map(|(_, slot)| slot) {
                self.gl.bind_buffer_base(glow::UNIFORM_BUFFER, slot, None);
            }
            for &slot in self.bindings.resources.keys().map(|(_, slot)| slot) {
                if slot < UNORDERED_ACCESS_SHIFT {
                    self.gl.bind_buffer_base(glow::SHADER_STORAGE_BUFFER, slot, None);
                }
            }
            for &slot in self.bindings.unordered_access.keys().map(|(_, slot)| slot) {
                let unit = slot + UNORDERED_ACCESS_SHIFT;
                self.gl.bind_image_texture(unit, None, 0, false, 0, glow::READ_WRITE, glow::R32UI);
                self.gl.bind_buffer_base(glow::SHADER_STORAGE_BUFFER, unit, None);
            }
            for &slot in self.bindings.samplers.keys().map(|(_, slot)| slot) {
                self.gl.bind_sampler(slot, None);
            }
            for (unit, target) in self.texture_units.drain() {
                self.gl.active_texture(glow::TEXTURE0 + unit);
                self.gl.bind_texture(target, None);
            }
            self.gl.active_texture(glow::TEXTURE0);
            self.gl.use_program(None);
            self.gl.bind_vertex_array(None);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            self.gl.blend_color(1.0, 1.0, 1.0, 1.0);
        }

        self.bindings.clear();
        self.pipeline = None;
        self.vertex_buffers = [None; MAX_VERTEX_BUFFERS];
        self.index_buffer = None;
        self.framebuffer = None;
        self.target_height = 0;
        self.target_count = 0;
        self.restore_state();
        Ok(())
    }

    // ===== WORK =====

    fn draw_primitive(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        let mode = self.prepare_draw(false)?;
        unsafe { self.gl.draw_arrays(mode, first_vertex as i32, vertex_count as i32) };
        self.frame.draw_calls += 1;
        Ok(())
    }

    fn draw_instanced_primitive(
        &mut self,
        instance_count: u32,
        first_instance: u32,
        vertex_count: u32,
        first_vertex: u32,
    ) -> Result<()> {
        let mode = self.prepare_draw(false)?;
        unsafe {
            self.gl.draw_arrays_instanced_base_instance(
                mode,
                first_vertex as i32,
                vertex_count as i32,
                instance_count as i32,
                first_instance,
            );
        }
        self.frame.draw_calls += 1;
        Ok(())
    }

    fn draw_indexed_primitive(&mut self, index_count: u32, first_index: u32, first_vertex: i32) -> Result<()> {
        let mode = self.prepare_draw(true)?;
        let index = self.index_binding()?;
        unsafe {
            self.gl.draw_elements_base_vertex(
                mode,
                index_count as i32,
                index.data_type,
                index_byte_offset(index.offset, first_index, index.size),
                first_vertex,
            );
        }
        self.frame.draw_calls += 1;
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
        let mode = self.prepare_draw(true)?;
        let index = self.index_binding()?;
        unsafe {
            self.gl.draw_elements_instanced_base_vertex_base_instance(
                mode,
                index_count as i32,
                index.data_type,
                index_byte_offset(index.offset, first_index, index.size),
                instance_count as i32,
                first_vertex,
                first_instance,
            );
        }
        self.frame.draw_calls += 1;
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.bindings.check_dispatch()?;
        unsafe {
            self.gl.dispatch_compute(x, y, z);
            // Make writes visible to whatever reads them next
            self.gl.memory_barrier(glow::ALL_BARRIER_BITS);
        }
        self.frame.dispatch_calls += 1;
        Ok(())
    }

    fn generate_mip_maps(&mut self, texture: &Arc<dyn Texture>) -> Result<()> {
        let native = downcast::<OpenGlTexture>(texture.as_any(), texture.name())?;
        let desc = texture.description();
        if desc.is_multisampled() || !texture.views().contains(ViewFlags::SHADER_RESOURCE) {
            engine_bail_invalid!(
                SOURCE,
                "Cannot generate mip maps for '{}': it must be a single-sample shader resource",
                texture.name()
            );
        }
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + SCRATCH_TEXTURE_UNIT);
            self.gl.bind_texture(native.target, Some(native.native));
            self.gl.generate_mipmap(native.target);
            self.gl.bind_texture(native.target, None);
        }
        Ok(())
    }

    fn signal_fence(&mut self, fence: &Arc<dyn Fence>) -> Result<()> {
        downcast::<OpenGlFence>(fence.as_any(), fence.name())?.signal(&self.gl);
        Ok(())
    }

    fn finish_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        engine_bail_invalid!(SOURCE, "finish_command_list called on the immediate context")
    }
}

#[cfg(test)]
#[path = "opengl_immediate_context_tests.rs"]
mod tests;
