/// OpenGL device - the OpenGL 4.5 implementation of the Device trait
///
/// Owns the GL context (through the swap chain), the immediate context and
/// the deletion queue. The device must stay on the thread that created it;
/// resources it returns are `Send + Sync` and may be dropped anywhere.
///
/// Deferred contexts are `CommandRecorder`s replayed on the immediate
/// context by `execute_command_list`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use glow::HasContext;

use gek_engine::gek::config::DeviceConfig;
use gek_engine::gek::video::resource::downcast;
use gek_engine::gek::video::swap_chain::{
    transition, DisplayMode, SwapChainBackend, SwapChainRequest, SwapChainState,
};
use gek_engine::gek::video::{
    validation, Buffer, BufferDescription, CommandList, CommandRecorder, CompiledProgram, Context,
    DeviceStats, Fence, Format, FrameCounters, MapMode, PipelineState, PipelineStateDescription, PipelineType,
    Program, RecordedCommandList, Resource, ResourceCounters, ResourceRef, SamplerState, SamplerStateDescription, Texture,
    TextureData, TextureDescription,
};
use gek_engine::gek::window::target::display_modes;
use gek_engine::gek::window::WindowTarget;
use gek_engine::gek::{Device, Error, Result};
use gek_engine::{engine_bail_invalid, engine_err, engine_info, engine_warn};

use crate::opengl_buffer::{self, OpenGlBuffer};
use crate::opengl_debug::{check_error, driver_error_count, install_debug_callback};
use crate::opengl_deletion::{deleted_texture_ids, DeletionQueue};
use crate::opengl_fence::OpenGlFence;
use crate::opengl_immediate_context::OpenGlImmediateContext;
use crate::opengl_pipeline::OpenGlPipelineState;
use crate::opengl_program::OpenGlProgram;
use crate::opengl_sampler::OpenGlSamplerState;
use crate::opengl_shader_compiler::ShaderCompiler;
use crate::opengl_swap_chain::SwapChain;
use crate::opengl_texture::OpenGlTexture;

const SOURCE: &str = "gek::video::opengl::Device";

/// `glMapBufferRange` access bits for a map mode
pub fn map_access(mode: MapMode) -> u32 {
    match mode {
        MapMode::Read => glow::MAP_READ_BIT,
        MapMode::Write => glow::MAP_WRITE_BIT,
        MapMode::WriteDiscard => glow::MAP_WRITE_BIT | glow::MAP_INVALIDATE_BUFFER_BIT,
        MapMode::WriteNoOverwrite => glow::MAP_WRITE_BIT | glow::MAP_UNSYNCHRONIZED_BIT,
    }
}

/// Depth target owned by the device
fn create_depth_buffer(
    gl: &glow::Context,
    format: Option<Format>,
    width: u32,
    height: u32,
    deletion: &Arc<DeletionQueue>,
    counters: &ResourceCounters,
) -> Result<Option<Arc<dyn Texture>>> {
    let Some(format) = format else {
        return Ok(None);
    };
    let description = TextureDescription::depth_target("depth", format, width, height);
    validation::validate_texture(&description, None)?;
    let texture = OpenGlTexture::create(gl, &description, None, deletion, counters)?;
    Ok(Some(Arc::new(texture)))
}

// ============================================================================
// SWAP CHAIN HOOKS
// ============================================================================

struct SwapChainHooks<'a> {
    swap_chain: &'a SwapChain,
    context: &'a mut OpenGlImmediateContext,
    window: &'a dyn WindowTarget,
    back_buffer: &'a Mutex<Option<Arc<dyn Texture>>>,
    depth_buffer: &'a mut Option<Arc<dyn Texture>>,
    depth_format: Option<Format>,
    deletion: &'a Arc<DeletionQueue>,
    counters: &'a ResourceCounters,
}

impl SwapChainBackend for SwapChainHooks<'_> {
    fn clear_bindings(&mut self) -> Result<()> {
        self.context.clear_state()
    }

    fn release_back_buffer(&mut self) -> Result<()> {
        let mut back_buffer = self
            .back_buffer
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Back buffer lock poisoned"))?;
        *back_buffer = None;
        Ok(())
    }

    fn resize_buffers(&mut self, width: u32, height: u32, fullscreen: bool) -> Result<()> {
        if self.window.is_fullscreen() != fullscreen {
            self.window.set_fullscreen(fullscreen);
        }
        self.swap_chain.resize(width, height);
        Ok(())
    }

    fn recreate_targets(&mut self, width: u32, height: u32) -> Result<()> {
        // The back buffer is recreated lazily by `back_buffer()`
        *self.depth_buffer = create_depth_buffer(
            self.context.gl(),
            self.depth_format,
            width,
            height,
            self.deletion,
            self.counters,
        )?;
        Ok(())
    }
}

// ============================================================================
// DEVICE
// ============================================================================

pub struct OpenGlDevice {
    config: DeviceConfig,
    window: Arc<dyn WindowTarget>,
    state: SwapChainState,
    live_generation: Arc<AtomicU64>,
    back_buffer: Mutex<Option<Arc<dyn Texture>>>,
    depth_buffer: Option<Arc<dyn Texture>>,
    context: OpenGlImmediateContext,
    swap_chain: SwapChain,
    deletion: Arc<DeletionQueue>,
    compiler: ShaderCompiler,
    counters: ResourceCounters,
    last_frame: FrameCounters,
    frames_presented: u64,
}

impl OpenGlDevice {
    /// Create a GL 4.5 core context on `window` and make it current on this thread
    pub fn new(window: Arc<dyn WindowTarget>, config: DeviceConfig) -> Result<Self> {
        let (width, height) = window.client_size();
        if width == 0 || height == 0 {
            return Err(Error::InitializationFailed(format!(
                "Unable to create rendering device for a {}x{} window",
                width, height
            )));
        }

        let (swap_chain, mut gl) = SwapChain::create(window.as_ref(), &config)?;
        if config.debug_layer {
            install_debug_callback(&mut gl);
        }

        let deletion = Arc::new(DeletionQueue::new());
        let counters = ResourceCounters::new();
        let depth_buffer = create_depth_buffer(&gl, config.depth_format, width, height, &deletion, &counters)?;

        engine_info!(
            SOURCE,
            "OpenGL device created for '{}' on {} ({}x{}, {})",
            config.application_name,
            swap_chain.api_name(),
            width,
            height,
            config.back_buffer_format
        );

        Ok(Self {
            state: SwapChainState::new(width, height, config.back_buffer_format, config.fullscreen),
            compiler: ShaderCompiler::new(&config.shader_tools),
            config,
            window,
            live_generation: Arc::new(AtomicU64::new(0)),
            back_buffer: Mutex::new(None),
            depth_buffer,
            context: OpenGlImmediateContext::new(gl),
            swap_chain,
            deletion,
            counters,
            last_frame: FrameCounters::default(),
            frames_presented: 0,
        })
    }

    fn gl(&self) -> &glow::Context {
        self.context.gl()
    }

    fn apply(&mut self, request: SwapChainRequest) -> Result<()> {
        let mut hooks = SwapChainHooks {
            swap_chain: &self.swap_chain,
            context: &mut self.context,
            window: self.window.as_ref(),
            back_buffer: &self.back_buffer,
            depth_buffer: &mut self.depth_buffer,
            depth_format: self.config.depth_format,
            deletion: &self.deletion,
            counters: &self.counters,
        };
        let result = transition(&mut self.state, &mut hooks, request);
        self.live_generation.store(self.state.generation, Ordering::Release);
        result.map(|_| ())
    }

    /// Delete GL objects whose last reference dropped since the previous drain
    fn drain_deletions(&mut self) {
        let objects = self.deletion.take();
        if objects.is_empty() {
            return;
        }
        let framebuffers = self.context.purge_framebuffers(&deleted_texture_ids(&objects));
        let gl = self.context.gl();
        for framebuffer in framebuffers {
            unsafe { gl.delete_framebuffer(framebuffer) };
        }
        for object in objects {
            object.delete(gl);
        }
    }

    fn buffer<'a>(&self, buffer: &'a Arc<dyn Buffer>) -> Result<&'a OpenGlBuffer> {
        downcast::<OpenGlBuffer>(buffer.as_any(), buffer.name())
    }

    fn copy_texture(&self, destination: &Arc<dyn Texture>, source: &Arc<dyn Texture>) -> Result<()> {
        validation::validate_texture_copy(destination.description(), source.description())?;
        let to = downcast::<OpenGlTexture>(destination.as_any(), destination.name())?;
        let from = downcast::<OpenGlTexture>(source.as_any(), source.name())?;
        let desc = source.description();
        let gl = self.gl();
        for mip in 0..desc.mip_levels() {
            let (width, height, depth) = desc.mip_extent(mip);
            // Cube faces are copied as six layers
            let layers = if desc.is_cube() { desc.array_size() } else { depth };
            unsafe {
                gl.copy_image_sub_data(
                    from.native,
                    from.target,
                    mip as i32,
                    0,
                    0,
                    0,
                    to.native,
                    to.target,
                    mip as i32,
                    0,
                    0,
                    0,
                    width as i32,
                    height as i32,
                    layers as i32,
                );
            }
        }
        check_error(gl, &format!("Copying '{}' into '{}'", source.name(), destination.name()))
    }
}

impl Device for OpenGlDevice {
    fn backend_name(&self) -> &str {
        "opengl"
    }

    fn immediate_context(&mut self) -> &mut dyn Context {
        &mut self.context
    }

    fn create_deferred_context(&self) -> Result<Box<dyn Context + Send>> {
        Ok(Box::new(CommandRecorder::new()))
    }

    fn back_buffer(&self) -> Result<Arc<dyn Texture>> {
        let mut cached = self
            .back_buffer
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Back buffer lock poisoned"))?;
        if let Some(texture) = cached.as_ref() {
            return Ok(texture.clone());
        }
        let description = TextureDescription {
            sample_count: self.config.sample_count.max(1),
            ..TextureDescription::render_target("back_buffer", self.state.format, self.state.width, self.state.height)
        };
        validation::validate_texture(&description, None)?;
        let texture = OpenGlTexture::create(self.gl(), &description, None, &self.deletion, &self.counters)?
            .with_generation(self.state.generation, self.live_generation.clone());
        let texture: Arc<dyn Texture> = Arc::new(texture);
        *cached = Some(texture.clone());
        Ok(texture)
    }

    fn depth_buffer(&self) -> Option<Arc<dyn Texture>> {
        self.depth_buffer.clone()
    }

    fn swap_chain_state(&self) -> SwapChainState {
        self.state
    }

    fn display_mode_list(&self, format: Format) -> Result<Vec<DisplayMode>> {
        Ok(display_modes(&self.window.video_modes(), format))
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.apply(SwapChainRequest::Resize { width, height })
    }

    fn set_fullscreen_state(&mut self, fullscreen: bool) -> Result<()> {
        self.apply(SwapChainRequest::SetFullScreen(fullscreen))
    }

    fn set_display_mode(&mut self, mode: &DisplayMode) -> Result<()> {
        // GL cannot switch the output mode; the surface takes the mode's size
        self.apply(SwapChainRequest::SetDisplayMode(*mode))
    }

    fn create_buffer(&self, desc: &BufferDescription, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>> {
        validation::validate_buffer(desc, data)?;
        opengl_buffer::check_supported(desc)?;
        Ok(Arc::new(OpenGlBuffer::create(self.gl(), desc, data, &self.deletion, &self.counters)?))
    }

    fn create_texture(&self, desc: &TextureDescription, data: Option<&TextureData>) -> Result<Arc<dyn Texture>> {
        validation::validate_texture(desc, data)?;
        Ok(Arc::new(OpenGlTexture::create(self.gl(), desc, data, &self.deletion, &self.counters)?))
    }

    fn create_sampler_state(&self, desc: &SamplerStateDescription) -> Result<Arc<dyn SamplerState>> {
        validation::validate_sampler(desc)?;
        Ok(Arc::new(OpenGlSamplerState::create(self.gl(), desc, &self.deletion, &self.counters)?))
    }

    fn compile_program(
        &self,
        pipeline: PipelineType,
        name: &str,
        source: &str,
        entry_point: &str,
    ) -> Result<CompiledProgram> {
        self.compiler.compile(pipeline, name, source, entry_point)
    }

    fn create_program(&self, compiled: &CompiledProgram) -> Result<Arc<dyn Program>> {
        validation::validate_compiled_program(compiled)?;
        Ok(Arc::new(OpenGlProgram::create(self.gl(), compiled, &self.deletion, &self.counters)?))
    }

    fn create_pipeline_state(&self, desc: &PipelineStateDescription) -> Result<Arc<dyn PipelineState>> {
        validation::validate_pipeline_state(desc)?;
        Ok(Arc::new(OpenGlPipelineState::create(self.gl(), desc, &self.deletion, &self.counters)?))
    }

    fn update_resource(&self, buffer: &Arc<dyn Buffer>, data: &[u8]) -> Result<()> {
        let native = self.buffer(buffer)?;
        let size = buffer.description().size_bytes();
        if data.len() as u64 > size {
            engine_bail_invalid!(
                SOURCE,
                "{} bytes do not fit buffer '{}' ({} bytes)",
                data.len(), buffer.name(), size
            );
        }
        let gl = self.gl();
        unsafe {
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(native.native));
            gl.buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, 0, data);
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        check_error(gl, &format!("Updating buffer '{}'", buffer.name()))
    }

    fn map_buffer(&self, buffer: &Arc<dyn Buffer>, mode: MapMode, f: &mut dyn FnMut(&mut [u8])) -> Result<()> {
        validation::validate_map(buffer.description(), mode)?;
        let native = self.buffer(buffer)?;
        let size = buffer.description().size_bytes() as usize;
        let gl = self.gl();

        unsafe { gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(native.native)) };
        let result = if mode == MapMode::Read {
            // Read mappings are read-only in GL; hand out a copy
            let mut contents = vec![0u8; size];
            unsafe { gl.get_buffer_sub_data(glow::COPY_WRITE_BUFFER, 0, &mut contents) };
            f(&mut contents);
            Ok(())
        } else {
            let pointer = unsafe { gl.map_buffer_range(glow::COPY_WRITE_BUFFER, 0, size as i32, map_access(mode)) };
            if pointer.is_null() {
                Err(engine_err!(SOURCE, "Unable to map buffer '{}'", buffer.name()))
            } else {
                let contents = unsafe { std::slice::from_raw_parts_mut(pointer, size) };
                f(contents);
                unsafe { gl.unmap_buffer(glow::COPY_WRITE_BUFFER) };
                Ok(())
            }
        };
        unsafe { gl.bind_buffer(glow::COPY_WRITE_BUFFER, None) };
        result?;
        check_error(gl, &format!("Mapping buffer '{}'", buffer.name()))
    }

    fn copy_resource(&self, destination: &ResourceRef, source: &ResourceRef) -> Result<()> {
        match (destination, source) {
            (ResourceRef::Buffer(destination), ResourceRef::Buffer(source)) => {
                validation::validate_buffer_copy(destination.description(), source.description())?;
                let to = self.buffer(destination)?;
                let from = self.buffer(source)?;
                let gl = self.gl();
                unsafe {
                    gl.bind_buffer(glow::COPY_READ_BUFFER, Some(from.native));
                    gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(to.native));
                    gl.copy_buffer_sub_data(
                        glow::COPY_READ_BUFFER,
                        glow::COPY_WRITE_BUFFER,
                        0,
                        0,
                        source.description().size_bytes() as i32,
                    );
                    gl.bind_buffer(glow::COPY_READ_BUFFER, None);
                    gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
                }
                check_error(gl, &format!("Copying '{}' into '{}'", source.name(), destination.name()))
            }
            (ResourceRef::Texture(destination), ResourceRef::Texture(source)) => {
                self.copy_texture(destination, source)
            }
            _ => engine_bail_invalid!(
                SOURCE,
                "Cannot copy '{}' into '{}': buffer/texture mismatch",
                source.name(), destination.name()
            ),
        }
    }

    fn create_fence(&self) -> Result<Arc<dyn Fence>> {
        Ok(Arc::new(OpenGlFence::create(self.gl(), &self.deletion)?))
    }

    fn is_fence_signaled(&self, fence: &Arc<dyn Fence>) -> Result<bool> {
        Ok(downcast::<OpenGlFence>(fence.as_any(), fence.name())?.is_signaled(self.gl()))
    }

    fn execute_command_list(&mut self, list: Box<dyn CommandList>) -> Result<()> {
        let list = match list.into_any().downcast::<RecordedCommandList>() {
            Ok(list) => list,
            Err(_) => engine_bail_invalid!(SOURCE, "Command list was not recorded by this device"),
        };
        let result = list.replay(&mut self.context);
        // Nothing the list bound stays bound on the immediate context
        self.context.clear_state()?;
        self.context.frame.command_lists += 1;
        drop(list);
        self.drain_deletions();
        result
    }

    fn present(&mut self, wait_for_vsync: bool) -> Result<()> {
        let back_buffer = self
            .back_buffer
            .lock()
            .map_err(|_| engine_err!(SOURCE, "Back buffer lock poisoned"))?
            .clone();
        if let Some(back_buffer) = back_buffer {
            let native = downcast::<OpenGlTexture>(back_buffer.as_any(), back_buffer.name())?;
            self.context.blit_to_window(native, self.state.width, self.state.height)?;
        }
        self.swap_chain.present(wait_for_vsync)?;

        self.last_frame = self.context.frame.take();
        self.frames_presented += 1;
        self.drain_deletions();
        Ok(())
    }

    fn stats(&self) -> DeviceStats {
        DeviceStats {
            last_frame: self.last_frame,
            current_frame: self.context.frame,
            frames_presented: self.frames_presented,
            ..Default::default()
        }
        .with_counts(&self.counters)
    }
}

impl Drop for OpenGlDevice {
    fn drop(&mut self) {
        if let Ok(mut back_buffer) = self.back_buffer.lock() {
            *back_buffer = None;
        }
        self.depth_buffer = None;
        if let Err(error) = self.context.clear_state() {
            engine_warn!(SOURCE, "Unable to clear state on shutdown: {}", error);
        }
        self.drain_deletions();
        let framebuffers = self.context.drain_framebuffers();
        for framebuffer in framebuffers {
            unsafe { self.context.gl().delete_framebuffer(framebuffer) };
        }
        if self.config.debug_layer && driver_error_count() > 0 {
            engine_warn!(SOURCE, "Driver reported {} error(s) during the session", driver_error_count());
        }
    }
}

#[cfg(test)]
#[path = "opengl_device_tests.rs"]
mod tests;
