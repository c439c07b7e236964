/// Mock device for unit tests (no GPU required)
///
/// Implements every video trait on plain memory: buffers keep their bytes,
/// the immediate context validates through a `CommandRecorder` and keeps
/// what it executed, and swap-chain hooks are logged in call order.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use glam::Vec4;
use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};

use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::video::resource::downcast;
use crate::video::swap_chain::{
    transition, DisplayMode, SwapChainBackend, SwapChainRequest, SwapChainState,
};
use crate::video::{
    validation, Buffer, BufferDescription, ClearFlags, Command, CommandList,
    CommandRecorder, CompiledProgram, Context, Device, DeviceStats, Fence, Format, FrameCounters,
    MapMode, PipelineState, PipelineStateDescription, PipelineType, Program, Rect,
    RecordedCommandList, Resource, ResourceCounters, ResourceId, ResourceKind, ResourceRef,
    ResourceTicket, SamplerState, SamplerStateDescription, ShaderLanguage, Texture, TextureData,
    TextureDescription, Viewport,
};
use crate::window::{VideoMode, WindowTarget};

const SOURCE: &str = "gek::video::mock";

// ============================================================================
// Headless window
// ============================================================================

/// Window target without a native window
pub struct HeadlessWindow {
    pub size: (u32, u32),
    pub fullscreen: AtomicBool,
    pub modes: Vec<VideoMode>,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            fullscreen: AtomicBool::new(false),
            modes: vec![
                VideoMode { width: 1280, height: 720, bit_depth: 32, refresh_rate_millihertz: 60_000 },
                VideoMode { width: 1920, height: 1080, bit_depth: 32, refresh_rate_millihertz: 60_000 },
            ],
        }
    }
}

impl HasWindowHandle for HeadlessWindow {
    fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for HeadlessWindow {
    fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl WindowTarget for HeadlessWindow {
    fn client_size(&self) -> (u32, u32) {
        self.size
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::Relaxed)
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.store(fullscreen, Ordering::Relaxed);
    }

    fn video_modes(&self) -> Vec<VideoMode> {
        self.modes.clone()
    }
}

// ============================================================================
// Mock resources
// ============================================================================

pub struct MockBuffer {
    id: ResourceId,
    description: BufferDescription,
    pub data: Mutex<Vec<u8>>,
    _ticket: ResourceTicket,
}

impl MockBuffer {
    pub fn new(description: BufferDescription, counters: &ResourceCounters) -> Self {
        let size = description.size_bytes() as usize;
        Self {
            id: ResourceId::next(),
            description,
            data: Mutex::new(vec![0; size]),
            _ticket: counters.track(ResourceKind::Buffer),
        }
    }

    /// Standalone buffer with its own counters
    pub fn create(description: BufferDescription) -> Arc<dyn Buffer> {
        Arc::new(Self::new(description, &ResourceCounters::new()))
    }

    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Resource for MockBuffer {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.description.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Buffer for MockBuffer {
    fn description(&self) -> &BufferDescription {
        &self.description
    }
}

pub struct MockTexture {
    id: ResourceId,
    description: TextureDescription,
    pub data: Mutex<TextureData>,
    /// Generation fetched under and the swap chain's live generation (back buffers only)
    generation: Option<(u64, Arc<AtomicU64>)>,
    _ticket: ResourceTicket,
}

impl MockTexture {
    pub fn new(description: TextureDescription, counters: &ResourceCounters) -> Self {
        Self {
            id: ResourceId::next(),
            description,
            data: Mutex::new(TextureData::default()),
            generation: None,
            _ticket: counters.track(ResourceKind::Texture),
        }
    }

    pub fn create(description: TextureDescription) -> Arc<dyn Texture> {
        Arc::new(Self::new(description, &ResourceCounters::new()))
    }
}

impl Resource for MockTexture {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.description.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Texture for MockTexture {
    fn description(&self) -> &TextureDescription {
        &self.description
    }

    fn is_current(&self) -> bool {
        match &self.generation {
            Some((fetched, live)) => *fetched == live.load(Ordering::Acquire),
            None => true,
        }
    }
}

pub struct MockSamplerState {
    id: ResourceId,
    description: SamplerStateDescription,
    _ticket: ResourceTicket,
}

impl MockSamplerState {
    pub fn create(description: SamplerStateDescription) -> Arc<dyn SamplerState> {
        Arc::new(Self {
            id: ResourceId::next(),
            description,
            _ticket: ResourceCounters::new().track(ResourceKind::SamplerState),
        })
    }
}

impl Resource for MockSamplerState {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        "sampler"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl SamplerState for MockSamplerState {
    fn description(&self) -> &SamplerStateDescription {
        &self.description
    }
}

pub struct MockProgram {
    id: ResourceId,
    name: String,
    pipeline: PipelineType,
    entry_point: String,
    _ticket: Option<ResourceTicket>,
}

impl MockProgram {
    pub fn create(pipeline: PipelineType, name: &str) -> Arc<dyn Program> {
        Arc::new(Self {
            id: ResourceId::next(),
            name: name.to_string(),
            pipeline,
            entry_point: "main".to_string(),
            _ticket: None,
        })
    }
}

impl Resource for MockProgram {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Program for MockProgram {
    fn pipeline(&self) -> PipelineType {
        self.pipeline
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

pub struct MockPipelineState {
    id: ResourceId,
    description: PipelineStateDescription,
    _ticket: Option<ResourceTicket>,
}

impl MockPipelineState {
    pub fn create(description: PipelineStateDescription) -> Arc<dyn PipelineState> {
        Arc::new(Self {
            id: ResourceId::next(),
            description,
            _ticket: None,
        })
    }

    /// Graphics pipeline with only a vertex program
    pub fn graphics(name: &str) -> Arc<dyn PipelineState> {
        Self::create(PipelineStateDescription {
            name: name.to_string(),
            vertex_program: Some(MockProgram::create(PipelineType::Vertex, name)),
            ..Default::default()
        })
    }

    /// Compute pipeline
    pub fn compute(name: &str) -> Arc<dyn PipelineState> {
        Self::create(PipelineStateDescription::compute(
            name,
            MockProgram::create(PipelineType::Compute, name),
        ))
    }
}

impl Resource for MockPipelineState {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.description.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl PipelineState for MockPipelineState {
    fn description(&self) -> &PipelineStateDescription {
        &self.description
    }
}

pub struct MockFence {
    id: ResourceId,
    signaled: AtomicBool,
}

impl MockFence {
    pub fn create() -> Arc<dyn Fence> {
        Arc::new(Self {
            id: ResourceId::next(),
            signaled: AtomicBool::new(false),
        })
    }
}

impl Resource for MockFence {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        "fence"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Fence for MockFence {}

// ============================================================================
// Mock immediate context
// ============================================================================

/// Immediate context that validates like a recorder and keeps what it executed
#[derive(Default)]
pub struct MockContext {
    executed: CommandRecorder,
    pub frame: FrameCounters,
}

impl MockContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binding_state(&self) -> &crate::video::BindingState {
        self.executed.binding_state()
    }

    /// Labels of every command executed so far
    pub fn executed(&self) -> Vec<&'static str> {
        self.executed.commands().iter().map(Command::label).collect()
    }
}

impl Context for MockContext {
    fn is_deferred(&self) -> bool {
        false
    }

    fn set_pipeline_state(&mut self, pipeline_state: &Arc<dyn PipelineState>) -> Result<()> {
        self.executed.set_pipeline_state(pipeline_state)
    }

    fn set_vertex_buffer_list(
        &mut self,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
        offsets: &[u32],
    ) -> Result<()> {
        self.executed.set_vertex_buffer_list(buffers, first_slot, offsets)
    }

    fn set_index_buffer(&mut self, buffer: Option<&Arc<dyn Buffer>>, offset: u32) -> Result<()> {
        self.executed.set_index_buffer(buffer, offset)
    }

    fn set_constant_buffer_list(
        &mut self,
        pipeline: PipelineType,
        buffers: &[Option<Arc<dyn Buffer>>],
        first_slot: u32,
    ) -> Result<()> {
        self.executed.set_constant_buffer_list(pipeline, buffers, first_slot)
    }

    fn set_resource_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        self.executed.set_resource_list(pipeline, resources, first_slot)
    }

    fn set_unordered_access_list(
        &mut self,
        pipeline: PipelineType,
        resources: &[Option<ResourceRef>],
        first_slot: u32,
    ) -> Result<()> {
        self.executed.set_unordered_access_list(pipeline, resources, first_slot)
    }

    fn set_sampler_state_list(
        &mut self,
        pipeline: PipelineType,
        samplers: &[Option<Arc<dyn SamplerState>>],
        first_slot: u32,
    ) -> Result<()> {
        self.executed.set_sampler_state_list(pipeline, samplers, first_slot)
    }

    fn set_render_target_list(
        &mut self,
        targets: &[Arc<dyn Texture>],
        depth: Option<&Arc<dyn Texture>>,
    ) -> Result<()> {
        self.executed.set_render_target_list(targets, depth)
    }

    fn set_viewport_list(&mut self, viewports: &[Viewport]) -> Result<()> {
        self.executed.set_viewport_list(viewports)
    }

    fn set_scissor_list(&mut self, rects: &[Rect]) -> Result<()> {
        self.executed.set_scissor_list(rects)
    }

    fn set_blend_factor(&mut self, factor: Vec4, sample_mask: u32) -> Result<()> {
        self.executed.set_blend_factor(factor, sample_mask)
    }

    fn set_stencil_reference(&mut self, reference: u32) -> Result<()> {
        self.executed.set_stencil_reference(reference)
    }

    fn clear_render_target(&mut self, target: &Arc<dyn Texture>, color: Vec4) -> Result<()> {
        self.executed.clear_render_target(target, color)
    }

    fn clear_depth_stencil_target(
        &mut self,
        target: &Arc<dyn Texture>,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        self.executed.clear_depth_stencil_target(target, flags, depth, stencil)
    }

    fn clear_unordered_access_float(&mut self, resource: &ResourceRef, value: Vec4) -> Result<()> {
        self.executed.clear_unordered_access_float(resource, value)
    }

    fn clear_unordered_access_uint(&mut self, resource: &ResourceRef, value: [u32; 4]) -> Result<()> {
        self.executed.clear_unordered_access_uint(resource, value)
    }

    fn clear_state(&mut self) -> Result<()> {
        self.executed.clear_state()
    }

    fn draw_primitive(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.executed.draw_primitive(vertex_count, first_vertex)?;
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
        self.executed
            .draw_instanced_primitive(instance_count, first_instance, vertex_count, first_vertex)?;
        self.frame.draw_calls += 1;
        Ok(())
    }

    fn draw_indexed_primitive(&mut self, index_count: u32, first_index: u32, first_vertex: i32) -> Result<()> {
        self.executed.draw_indexed_primitive(index_count, first_index, first_vertex)?;
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
        self.executed.draw_instanced_indexed_primitive(
            instance_count,
            first_instance,
            index_count,
            first_index,
            first_vertex,
        )?;
        self.frame.draw_calls += 1;
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.executed.dispatch(x, y, z)?;
        self.frame.dispatch_calls += 1;
        Ok(())
    }

    fn generate_mip_maps(&mut self, texture: &Arc<dyn Texture>) -> Result<()> {
        self.executed.generate_mip_maps(texture)
    }

    fn signal_fence(&mut self, fence: &Arc<dyn Fence>) -> Result<()> {
        // Mock work completes immediately
        downcast::<MockFence>(fence.as_any(), fence.name())?
            .signaled
            .store(true, Ordering::Release);
        self.executed.signal_fence(fence)
    }

    fn finish_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        crate::engine_bail_invalid!(SOURCE, "finish_command_list called on the immediate context")
    }
}

// ============================================================================
// Mock swap chain
// ============================================================================

/// Swap-chain hook log; `fail_on` makes the named hook fail once
#[derive(Default)]
pub struct MockSwapChain {
    pub calls: Vec<&'static str>,
    pub fail_on: Option<&'static str>,
    pub back_buffer_released: bool,
}

impl MockSwapChain {
    fn step(&mut self, name: &'static str) -> Result<()> {
        self.calls.push(name);
        if self.fail_on == Some(name) {
            self.fail_on = None;
            return Err(Error::BackendError(format!("{} failed", name)));
        }
        Ok(())
    }
}

struct SwapChainHooks<'a> {
    swap_chain: &'a mut MockSwapChain,
    context: &'a mut MockContext,
    back_buffer: &'a Mutex<Option<Arc<dyn Texture>>>,
}

impl SwapChainBackend for SwapChainHooks<'_> {
    fn clear_bindings(&mut self) -> Result<()> {
        self.swap_chain.step("clear_bindings")?;
        self.context.clear_state()
    }

    fn release_back_buffer(&mut self) -> Result<()> {
        self.swap_chain.step("release_back_buffer")?;
        if let Ok(mut back_buffer) = self.back_buffer.lock() {
            *back_buffer = None;
        }
        self.swap_chain.back_buffer_released = true;
        Ok(())
    }

    fn resize_buffers(&mut self, _width: u32, _height: u32, _fullscreen: bool) -> Result<()> {
        self.swap_chain.step("resize_buffers")
    }

    fn recreate_targets(&mut self, _width: u32, _height: u32) -> Result<()> {
        self.swap_chain.step("recreate_targets")
    }
}

// ============================================================================
// Mock device
// ============================================================================

pub struct MockDevice {
    config: DeviceConfig,
    window: Arc<dyn WindowTarget>,
    state: SwapChainState,
    live_generation: Arc<AtomicU64>,
    back_buffer: Mutex<Option<Arc<dyn Texture>>>,
    depth_buffer: Option<Arc<dyn Texture>>,
    pub swap_chain: MockSwapChain,
    pub context: MockContext,
    counters: ResourceCounters,
    last_frame: FrameCounters,
    frames_presented: u64,
}

impl MockDevice {
    pub fn new(window: Arc<dyn WindowTarget>, config: DeviceConfig) -> Result<Self> {
        let (width, height) = window.client_size();
        if width == 0 || height == 0 {
            return Err(Error::InitializationFailed(format!(
                "Unable to create rendering device for a {}x{} window",
                width, height
            )));
        }
        let counters = ResourceCounters::new();
        let depth_buffer = match config.depth_format {
            Some(format) => {
                let description = TextureDescription::depth_target("depth", format, width, height);
                validation::validate_texture(&description, None)?;
                Some(Arc::new(MockTexture::new(description, &counters)) as Arc<dyn Texture>)
            }
            None => None,
        };
        Ok(Self {
            state: SwapChainState::new(width, height, config.back_buffer_format, config.fullscreen),
            config,
            window,
            live_generation: Arc::new(AtomicU64::new(0)),
            back_buffer: Mutex::new(None),
            depth_buffer,
            swap_chain: MockSwapChain::default(),
            context: MockContext::new(),
            counters,
            last_frame: FrameCounters::default(),
            frames_presented: 0,
        })
    }

    /// Mock device on a headless 800x600 window
    pub fn headless() -> Self {
        match Self::new(Arc::new(HeadlessWindow::new(800, 600)), DeviceConfig::default()) {
            Ok(device) => device,
            Err(error) => panic!("headless mock device: {}", error),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    fn apply(&mut self, request: SwapChainRequest) -> Result<()> {
        let mut hooks = SwapChainHooks {
            swap_chain: &mut self.swap_chain,
            context: &mut self.context,
            back_buffer: &self.back_buffer,
        };
        let result = transition(&mut self.state, &mut hooks, request);
        self.live_generation.store(self.state.generation, Ordering::Release);
        result.map(|_| ())
    }

    fn buffer<'a>(&self, buffer: &'a Arc<dyn Buffer>) -> Result<&'a MockBuffer> {
        downcast::<MockBuffer>(buffer.as_any(), buffer.name())
    }
}

impl Device for MockDevice {
    fn backend_name(&self) -> &str {
        "mock"
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
            .map_err(|_| crate::engine_err!(SOURCE, "Back buffer lock poisoned"))?;
        if let Some(texture) = cached.as_ref() {
            return Ok(texture.clone());
        }
        let mut texture = MockTexture::new(
            TextureDescription::render_target("back_buffer", self.state.format, self.state.width, self.state.height),
            &self.counters,
        );
        texture.generation = Some((self.state.generation, self.live_generation.clone()));
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
        Ok(crate::window::target::display_modes(&self.window.video_modes(), format))
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.apply(SwapChainRequest::Resize { width, height })
    }

    fn set_fullscreen_state(&mut self, fullscreen: bool) -> Result<()> {
        self.apply(SwapChainRequest::SetFullScreen(fullscreen))?;
        self.window.set_fullscreen(self.state.fullscreen);
        Ok(())
    }

    fn set_display_mode(&mut self, mode: &DisplayMode) -> Result<()> {
        self.apply(SwapChainRequest::SetDisplayMode(*mode))
    }

    fn create_buffer(&self, desc: &BufferDescription, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>> {
        validation::validate_buffer(desc, data)?;
        let buffer = MockBuffer::new(desc.clone(), &self.counters);
        if let Some(data) = data {
            buffer.data.lock().unwrap()[..data.len()].copy_from_slice(data);
        }
        Ok(Arc::new(buffer))
    }

    fn create_texture(&self, desc: &TextureDescription, data: Option<&TextureData>) -> Result<Arc<dyn Texture>> {
        validation::validate_texture(desc, data)?;
        let texture = MockTexture::new(desc.clone(), &self.counters);
        if let Some(data) = data {
            *texture.data.lock().unwrap() = data.clone();
        }
        Ok(Arc::new(texture))
    }

    fn create_sampler_state(&self, desc: &SamplerStateDescription) -> Result<Arc<dyn SamplerState>> {
        validation::validate_sampler(desc)?;
        Ok(Arc::new(MockSamplerState {
            id: ResourceId::next(),
            description: desc.clone(),
            _ticket: self.counters.track(ResourceKind::SamplerState),
        }))
    }

    fn compile_program(
        &self,
        pipeline: PipelineType,
        name: &str,
        source: &str,
        entry_point: &str,
    ) -> Result<CompiledProgram> {
        // Sources containing "#error" fail, mimicking a compiler diagnostic
        if source.contains("#error") || !source.contains(entry_point) {
            let message = format!("{}.hlsl(1,1): error X3501: '{}': entrypoint not found", name, entry_point);
            crate::engine_error!(SOURCE, "{}", message);
            return Err(Error::CompilationFailed(message));
        }
        Ok(CompiledProgram {
            pipeline,
            name: name.to_string(),
            entry_point: entry_point.to_string(),
            language: ShaderLanguage::Dxbc,
            bytecode: source.as_bytes().to_vec(),
            bindings: Vec::new(),
        })
    }

    fn create_program(&self, compiled: &CompiledProgram) -> Result<Arc<dyn Program>> {
        validation::validate_compiled_program(compiled)?;
        Ok(Arc::new(MockProgram {
            id: ResourceId::next(),
            name: compiled.name.clone(),
            pipeline: compiled.pipeline,
            entry_point: compiled.entry_point.clone(),
            _ticket: Some(self.counters.track(ResourceKind::Program)),
        }))
    }

    fn create_pipeline_state(&self, desc: &PipelineStateDescription) -> Result<Arc<dyn PipelineState>> {
        validation::validate_pipeline_state(desc)?;
        Ok(Arc::new(MockPipelineState {
            id: ResourceId::next(),
            description: desc.clone(),
            _ticket: Some(self.counters.track(ResourceKind::PipelineState)),
        }))
    }

    fn update_resource(&self, buffer: &Arc<dyn Buffer>, data: &[u8]) -> Result<()> {
        let native = self.buffer(buffer)?;
        let mut contents = native.data.lock().unwrap();
        if data.len() > contents.len() {
            crate::engine_bail_invalid!(
                SOURCE,
                "{} bytes do not fit buffer '{}' ({} bytes)",
                data.len(), buffer.name(), contents.len()
            );
        }
        contents[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn map_buffer(&self, buffer: &Arc<dyn Buffer>, mode: MapMode, f: &mut dyn FnMut(&mut [u8])) -> Result<()> {
        validation::validate_map(buffer.description(), mode)?;
        let native = self.buffer(buffer)?;
        let mut contents = native.data.lock().unwrap();
        if mode == MapMode::WriteDiscard {
            contents.fill(0);
        }
        f(contents.as_mut_slice());
        Ok(())
    }

    fn copy_resource(&self, destination: &ResourceRef, source: &ResourceRef) -> Result<()> {
        match (destination, source) {
            (ResourceRef::Buffer(destination), ResourceRef::Buffer(source)) => {
                validation::validate_buffer_copy(destination.description(), source.description())?;
                let bytes = self.buffer(source)?.contents();
                self.buffer(destination)?.data.lock().unwrap().copy_from_slice(&bytes);
                Ok(())
            }
            (ResourceRef::Texture(destination), ResourceRef::Texture(source)) => {
                validation::validate_texture_copy(destination.description(), source.description())?;
                let data = downcast::<MockTexture>(source.as_any(), source.name())?
                    .data
                    .lock()
                    .unwrap()
                    .clone();
                *downcast::<MockTexture>(destination.as_any(), destination.name())?
                    .data
                    .lock()
                    .unwrap() = data;
                Ok(())
            }
            _ => crate::engine_bail_invalid!(
                SOURCE,
                "Cannot copy '{}' into '{}': buffer/texture mismatch",
                source.name(), destination.name()
            ),
        }
    }

    fn create_fence(&self) -> Result<Arc<dyn Fence>> {
        Ok(MockFence::create())
    }

    fn is_fence_signaled(&self, fence: &Arc<dyn Fence>) -> Result<bool> {
        Ok(downcast::<MockFence>(fence.as_any(), fence.name())?
            .signaled
            .load(Ordering::Acquire))
    }

    fn execute_command_list(&mut self, list: Box<dyn CommandList>) -> Result<()> {
        let list = match list.into_any().downcast::<RecordedCommandList>() {
            Ok(list) => list,
            Err(_) => crate::engine_bail_invalid!(SOURCE, "Command list was not recorded by this device"),
        };
        let result = list.replay(&mut self.context);
        self.context.clear_state()?;
        self.context.frame.command_lists += 1;
        result
    }

    fn present(&mut self, _wait_for_vsync: bool) -> Result<()> {
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

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
