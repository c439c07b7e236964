/// Direct3D 11 device - the feature level 11.0 implementation of the Device trait
///
/// Owns the `ID3D11Device`, the immediate context and the DXGI swap chain.
/// Deferred contexts are native deferred contexts; their command lists run
/// through `ExecuteCommandList` on the immediate context.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use windows::Win32::Foundation::HMODULE;
use windows::Win32::Graphics::Direct3D::{D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_11_0};
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, D3D11_BOX, D3D11_CREATE_DEVICE_BGRA_SUPPORT,
    D3D11_CREATE_DEVICE_DEBUG, D3D11_CREATE_DEVICE_FLAG, D3D11_MAP, D3D11_MAPPED_SUBRESOURCE, D3D11_SDK_VERSION,
};
use windows::Win32::Graphics::Dxgi::IDXGIAdapter;

use gek_engine::gek::config::DeviceConfig;
use gek_engine::gek::video::resource::downcast;
use gek_engine::gek::video::swap_chain::{
    transition, DisplayMode, SwapChainBackend, SwapChainRequest, SwapChainState,
};
use gek_engine::gek::video::{
    validation, Buffer, BufferDescription, BufferFlags, BufferType, CommandList, CompiledProgram, Context,
    DeviceStats, Fence, Format, FrameCounters, MapMode, PipelineState, PipelineStateDescription, PipelineType,
    Program, Resource, ResourceCounters, ResourceRef, SamplerState, SamplerStateDescription, Texture, TextureData,
    TextureDescription,
};
use gek_engine::gek::window::WindowTarget;
use gek_engine::gek::{Device, Error, Result};
use gek_engine::{engine_bail_invalid, engine_err, engine_error, engine_info, engine_warn};

use crate::d3d11_buffer::D3D11Buffer;
use crate::d3d11_context::{D3D11CommandList, D3D11Context};
use crate::d3d11_error::{check, created};
use crate::d3d11_fence::D3D11Fence;
use crate::d3d11_pipeline::D3D11PipelineState;
use crate::d3d11_program::D3D11Program;
use crate::d3d11_sampler::D3D11SamplerState;
use crate::d3d11_shader_compiler;
use crate::d3d11_swap_chain::SwapChain;
use crate::d3d11_texture::D3D11Texture;
use crate::d3d11_usage::map_type;
use crate::BACKEND_NAME;

const SOURCE: &str = "gek::video::d3d11::Device";

fn initialization_failed(message: &str) -> Error {
    engine_error!(SOURCE, "{}", message);
    Error::InitializationFailed(message.to_string())
}

fn create_native_device(debug: bool) -> Result<(ID3D11Device, ID3D11DeviceContext)> {
    let mut flags = D3D11_CREATE_DEVICE_BGRA_SUPPORT.0;
    if debug {
        flags |= D3D11_CREATE_DEVICE_DEBUG.0;
    }
    let levels = [D3D_FEATURE_LEVEL_11_0];
    let mut device: Option<ID3D11Device> = None;
    let mut context: Option<ID3D11DeviceContext> = None;
    let mut level = D3D_FEATURE_LEVEL::default();
    unsafe {
        D3D11CreateDevice(
            None::<&IDXGIAdapter>,
            D3D_DRIVER_TYPE_HARDWARE,
            HMODULE::default(),
            D3D11_CREATE_DEVICE_FLAG(flags),
            Some(&levels),
            D3D11_SDK_VERSION,
            Some(&mut device),
            Some(&mut level),
            Some(&mut context),
        )
    }
    .map_err(|error| initialization_failed(&format!("D3D11CreateDevice: {}", error.message())))?;

    match (device, context) {
        (Some(device), Some(context)) => Ok((device, context)),
        _ => Err(initialization_failed("D3D11CreateDevice returned no device")),
    }
}

/// Depth target owned by the device
fn create_depth_buffer(
    device: &ID3D11Device,
    format: Option<Format>,
    width: u32,
    height: u32,
    sample_count: u32,
    counters: &ResourceCounters,
) -> Result<Option<Arc<dyn Texture>>> {
    let Some(format) = format else {
        return Ok(None);
    };
    let description = TextureDescription {
        sample_count: sample_count.max(1),
        ..TextureDescription::depth_target("depth", format, width, height)
    };
    validation::validate_texture(&description, None)?;
    let texture = D3D11Texture::create(device, &description, None, counters)?;
    Ok(Some(Arc::new(texture)))
}

// ============================================================================
// SWAP CHAIN HOOKS
// ============================================================================

struct SwapChainHooks<'a> {
    device: &'a ID3D11Device,
    swap_chain: &'a SwapChain,
    context: &'a mut D3D11Context,
    back_buffer: &'a Mutex<Option<Arc<dyn Texture>>>,
    depth_buffer: &'a mut Option<Arc<dyn Texture>>,
    depth_format: Option<Format>,
    sample_count: u32,
    was_fullscreen: bool,
    /// Mode to switch the output to before resizing the buffers
    display_mode: Option<DisplayMode>,
    counters: &'a ResourceCounters,
}

impl SwapChainBackend for SwapChainHooks<'_> {
    fn clear_bindings(&mut self) -> Result<()> {
        self.context.clear_state()?;
        // Release views the runtime still holds from unbound targets
        unsafe { self.context.native.Flush() };
        Ok(())
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
        if fullscreen != self.was_fullscreen {
            self.swap_chain.set_fullscreen(fullscreen)?;
        }
        if let Some(mode) = &self.display_mode {
            self.swap_chain.resize_target(mode)?;
        }
        self.swap_chain.resize(width, height)
    }

    fn recreate_targets(&mut self, width: u32, height: u32) -> Result<()> {
        // The back buffer is fetched again lazily by `back_buffer()`
        *self.depth_buffer = create_depth_buffer(
            self.device,
            self.depth_format,
            width,
            height,
            self.sample_count,
            self.counters,
        )?;
        Ok(())
    }
}

// ============================================================================
// DEVICE
// ============================================================================

pub struct D3D11Device {
    config: DeviceConfig,
    debug: bool,
    state: SwapChainState,
    live_generation: Arc<AtomicU64>,
    back_buffer: Mutex<Option<Arc<dyn Texture>>>,
    depth_buffer: Option<Arc<dyn Texture>>,
    context: D3D11Context,
    swap_chain: SwapChain,
    device: ID3D11Device,
    counters: ResourceCounters,
    last_frame: FrameCounters,
    frames_presented: u64,
}

impl D3D11Device {
    /// Create a feature level 11.0 device and a swap chain on `window`
    pub fn new(window: Arc<dyn WindowTarget>, config: DeviceConfig) -> Result<Self> {
        let (width, height) = window.client_size();
        if width == 0 || height == 0 {
            return Err(initialization_failed(&format!(
                "Unable to create rendering device for a {}x{} window",
                width, height
            )));
        }

        let mut debug = config.debug_layer || cfg!(feature = "d3d11-debug-layer");
        let (device, immediate) = match create_native_device(debug) {
            Ok(created) => created,
            Err(error) if debug => {
                // The debug layer needs the Graphics Tools optional feature
                engine_warn!(SOURCE, "Debug layer unavailable ({}), continuing without it", error);
                debug = false;
                create_native_device(false)?
            }
            Err(error) => return Err(error),
        };

        let swap_chain = SwapChain::create(&device, window.as_ref(), &config)?;
        let counters = ResourceCounters::new();
        let depth_buffer =
            create_depth_buffer(&device, config.depth_format, width, height, config.sample_count, &counters)?;

        engine_info!(
            SOURCE,
            "Direct3D 11 device created for '{}' ({}x{}, {}{})",
            config.application_name,
            width,
            height,
            config.back_buffer_format,
            if debug { ", debug layer" } else { "" }
        );

        Ok(Self {
            state: SwapChainState::new(width, height, config.back_buffer_format, config.fullscreen),
            config,
            debug,
            live_generation: Arc::new(AtomicU64::new(0)),
            back_buffer: Mutex::new(None),
            depth_buffer,
            context: D3D11Context::new(immediate, false),
            swap_chain,
            device,
            counters,
            last_frame: FrameCounters::default(),
            frames_presented: 0,
        })
    }

    fn apply(&mut self, request: SwapChainRequest) -> Result<()> {
        let display_mode = match request {
            SwapChainRequest::SetDisplayMode(mode) => Some(mode),
            _ => None,
        };
        let mut hooks = SwapChainHooks {
            device: &self.device,
            swap_chain: &self.swap_chain,
            context: &mut self.context,
            back_buffer: &self.back_buffer,
            depth_buffer: &mut self.depth_buffer,
            depth_format: self.config.depth_format,
            sample_count: self.config.sample_count,
            was_fullscreen: self.state.fullscreen,
            display_mode,
            counters: &self.counters,
        };
        let result = transition(&mut self.state, &mut hooks, request);
        self.live_generation.store(self.state.generation, Ordering::Release);
        result.map(|_| ())
    }

    fn buffer<'a>(&self, buffer: &'a Arc<dyn Buffer>) -> Result<&'a D3D11Buffer> {
        downcast::<D3D11Buffer>(buffer.as_any(), buffer.name())
    }

    fn immediate(&self) -> &ID3D11DeviceContext {
        &self.context.native
    }

    /// Write-discard `data` into a dynamic buffer
    fn write_dynamic(&self, buffer: &Arc<dyn Buffer>, data: &[u8]) -> Result<()> {
        let native = self.buffer(buffer)?;
        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        check(
            unsafe {
                self.immediate()
                    .Map(&native.native, 0, D3D11_MAP(map_type(MapMode::WriteDiscard)), 0, Some(&mut mapped))
            },
            &format!("Map '{}'", buffer.name()),
        )?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.pData as *mut u8, data.len());
            self.immediate().Unmap(&native.native, 0);
        }
        Ok(())
    }
}

impl Device for D3D11Device {
    fn backend_name(&self) -> &str {
        BACKEND_NAME
    }

    fn immediate_context(&mut self) -> &mut dyn Context {
        &mut self.context
    }

    fn create_deferred_context(&self) -> Result<Box<dyn Context + Send>> {
        let mut native: Option<ID3D11DeviceContext> = None;
        check(unsafe { self.device.CreateDeferredContext(0, Some(&mut native)) }, "CreateDeferredContext")?;
        Ok(Box::new(D3D11Context::new(created(native, "CreateDeferredContext")?, true)))
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
        let native = self.swap_chain.back_buffer_texture()?;
        let texture = D3D11Texture::from_back_buffer(
            &self.device,
            native,
            &description,
            self.state.generation,
            self.live_generation.clone(),
            &self.counters,
        )?;
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
        self.swap_chain.display_modes(format)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.apply(SwapChainRequest::Resize { width, height })
    }

    fn set_fullscreen_state(&mut self, fullscreen: bool) -> Result<()> {
        self.apply(SwapChainRequest::SetFullScreen(fullscreen))
    }

    fn set_display_mode(&mut self, mode: &DisplayMode) -> Result<()> {
        self.apply(SwapChainRequest::SetDisplayMode(*mode))
    }

    fn create_buffer(&self, desc: &BufferDescription, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>> {
        validation::validate_buffer(desc, data)?;
        Ok(Arc::new(D3D11Buffer::create(&self.device, desc, data, &self.counters)?))
    }

    fn create_texture(&self, desc: &TextureDescription, data: Option<&TextureData>) -> Result<Arc<dyn Texture>> {
        validation::validate_texture(desc, data)?;
        Ok(Arc::new(D3D11Texture::create(&self.device, desc, data, &self.counters)?))
    }

    fn create_sampler_state(&self, desc: &SamplerStateDescription) -> Result<Arc<dyn SamplerState>> {
        validation::validate_sampler(desc)?;
        Ok(Arc::new(D3D11SamplerState::create(&self.device, desc, &self.counters)?))
    }

    fn compile_program(
        &self,
        pipeline: PipelineType,
        name: &str,
        source: &str,
        entry_point: &str,
    ) -> Result<CompiledProgram> {
        d3d11_shader_compiler::compile(pipeline, name, source, entry_point, self.debug)
    }

    fn create_program(&self, compiled: &CompiledProgram) -> Result<Arc<dyn Program>> {
        validation::validate_compiled_program(compiled)?;
        Ok(Arc::new(D3D11Program::create(&self.device, compiled, &self.counters)?))
    }

    fn create_pipeline_state(&self, desc: &PipelineStateDescription) -> Result<Arc<dyn PipelineState>> {
        validation::validate_pipeline_state(desc)?;
        Ok(Arc::new(D3D11PipelineState::create(&self.device, desc, &self.counters)?))
    }

    fn update_resource(&self, buffer: &Arc<dyn Buffer>, data: &[u8]) -> Result<()> {
        let desc = buffer.description();
        let size = desc.size_bytes();
        if data.len() as u64 > size {
            engine_bail_invalid!(
                SOURCE,
                "{} bytes do not fit buffer '{}' ({} bytes)",
                data.len(), buffer.name(), size
            );
        }
        if desc.flags.contains(BufferFlags::MUTABLE) {
            return self.write_dynamic(buffer, data);
        }
        if desc.buffer_type == BufferType::Constant && data.len() as u64 != size {
            engine_bail_invalid!(
                SOURCE,
                "Constant buffer '{}' must be updated whole ({} bytes, got {})",
                buffer.name(), size, data.len()
            );
        }

        let native = self.buffer(buffer)?;
        let region = D3D11_BOX {
            left: 0,
            top: 0,
            front: 0,
            right: data.len() as u32,
            bottom: 1,
            back: 1,
        };
        let partial = (data.len() as u64) < size;
        unsafe {
            self.immediate().UpdateSubresource(
                &native.native,
                0,
                if partial { Some(&region as *const _) } else { None },
                data.as_ptr().cast(),
                0,
                0,
            );
        }
        Ok(())
    }

    fn map_buffer(&self, buffer: &Arc<dyn Buffer>, mode: MapMode, f: &mut dyn FnMut(&mut [u8])) -> Result<()> {
        validation::validate_map(buffer.description(), mode)?;
        let native = self.buffer(buffer)?;
        let size = buffer.description().size_bytes() as usize;

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        check(
            unsafe { self.immediate().Map(&native.native, 0, D3D11_MAP(map_type(mode)), 0, Some(&mut mapped)) },
            &format!("Map '{}'", buffer.name()),
        )?;
        let contents = unsafe { std::slice::from_raw_parts_mut(mapped.pData as *mut u8, size) };
        f(contents);
        unsafe { self.immediate().Unmap(&native.native, 0) };
        Ok(())
    }

    fn copy_resource(&self, destination: &ResourceRef, source: &ResourceRef) -> Result<()> {
        match (destination, source) {
            (ResourceRef::Buffer(destination), ResourceRef::Buffer(source)) => {
                validation::validate_buffer_copy(destination.description(), source.description())?;
                let to = self.buffer(destination)?;
                let from = self.buffer(source)?;
                unsafe { self.immediate().CopyResource(&to.native, &from.native) };
                Ok(())
            }
            (ResourceRef::Texture(destination), ResourceRef::Texture(source)) => {
                validation::validate_texture_copy(destination.description(), source.description())?;
                let to = downcast::<D3D11Texture>(destination.as_any(), destination.name())?;
                let from = downcast::<D3D11Texture>(source.as_any(), source.name())?;
                unsafe { self.immediate().CopyResource(&to.native, &from.native) };
                Ok(())
            }
            _ => engine_bail_invalid!(
                SOURCE,
                "Cannot copy '{}' into '{}': buffer/texture mismatch",
                source.name(), destination.name()
            ),
        }
    }

    fn create_fence(&self) -> Result<Arc<dyn Fence>> {
        Ok(Arc::new(D3D11Fence::create(&self.device)?))
    }

    fn is_fence_signaled(&self, fence: &Arc<dyn Fence>) -> Result<bool> {
        Ok(downcast::<D3D11Fence>(fence.as_any(), fence.name())?.is_signaled(self.immediate()))
    }

    fn execute_command_list(&mut self, list: Box<dyn CommandList>) -> Result<()> {
        let list = match list.into_any().downcast::<D3D11CommandList>() {
            Ok(list) => list,
            Err(_) => engine_bail_invalid!(SOURCE, "Command list was not recorded by this device"),
        };
        unsafe { self.context.native.ExecuteCommandList(&list.native, false.into()) };
        // Without state restore the immediate context is left in its default state
        self.context.reset_tracking();

        let frame = &mut self.context.frame;
        frame.draw_calls += list.frame.draw_calls;
        frame.dispatch_calls += list.frame.dispatch_calls;
        frame.command_lists += list.frame.command_lists + 1;
        Ok(())
    }

    fn present(&mut self, wait_for_vsync: bool) -> Result<()> {
        self.swap_chain.present(wait_for_vsync)?;
        self.last_frame = self.context.frame.take();
        self.frames_presented += 1;
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

impl Drop for D3D11Device {
    fn drop(&mut self) {
        if let Ok(mut back_buffer) = self.back_buffer.lock() {
            *back_buffer = None;
        }
        self.depth_buffer = None;
        if let Err(error) = self.context.clear_state() {
            engine_warn!(SOURCE, "Unable to clear state on shutdown: {}", error);
        }
        unsafe { self.context.native.Flush() };
    }
}
