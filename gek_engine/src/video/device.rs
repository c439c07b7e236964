/// Device trait - the top-level factory and swap-chain owner
///
/// One device per window. Backends implement every method; texture file
/// loading has a default implementation built on `create_texture`.
///
/// The trait is not `Send`: an OpenGL device is bound to the thread that
/// owns its context. Resources it creates are `Send + Sync` and can be
/// handed to recording threads together with deferred contexts.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::video::swap_chain::{DisplayMode, SwapChainState};
use crate::video::{
    texture_loader, Buffer, BufferDescription, CommandList, CompiledProgram, Context, DeviceStats,
    Fence, Format, MapMode, PipelineState, PipelineStateDescription, PipelineType, Program,
    ResourceRef, SamplerState, SamplerStateDescription, Texture, TextureData, TextureDescription,
    TextureLoadFlags,
};

pub trait Device {
    /// Backend name ("opengl", "d3d11", ...)
    fn backend_name(&self) -> &str;

    // ===== CONTEXTS =====

    /// The context that executes directly on the device
    fn immediate_context(&mut self) -> &mut dyn Context;

    /// A new recording context
    fn create_deferred_context(&self) -> Result<Box<dyn Context + Send>>;

    // ===== SWAP CHAIN =====

    /// Back buffer texture of the current swap-chain generation
    fn back_buffer(&self) -> Result<Arc<dyn Texture>>;

    /// Device-owned depth target, when `DeviceConfig::depth_format` is set
    fn depth_buffer(&self) -> Option<Arc<dyn Texture>>;

    fn swap_chain_state(&self) -> SwapChainState;

    /// Display modes of the output the window is on, filtered by `format`
    fn display_mode_list(&self, format: Format) -> Result<Vec<DisplayMode>>;

    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    fn set_fullscreen_state(&mut self, fullscreen: bool) -> Result<()>;

    fn set_display_mode(&mut self, mode: &DisplayMode) -> Result<()>;

    // ===== RESOURCES =====

    fn create_buffer(&self, desc: &BufferDescription, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>>;

    fn create_texture(&self, desc: &TextureDescription, data: Option<&TextureData>) -> Result<Arc<dyn Texture>>;

    /// Load a `.dds`, `.png`, `.jpg`, `.jpeg`, `.tga` or `.bmp` file
    fn load_texture(&self, path: &Path, flags: TextureLoadFlags) -> Result<Arc<dyn Texture>> {
        let (desc, data) = texture_loader::load_texture_file(path, flags)?;
        self.create_texture(&desc, Some(&data))
    }

    /// Description of a texture file without decoding its pixels
    fn texture_description(&self, path: &Path) -> Result<TextureDescription> {
        texture_loader::read_texture_description(path)
    }

    fn create_sampler_state(&self, desc: &SamplerStateDescription) -> Result<Arc<dyn SamplerState>>;

    // ===== PROGRAMS =====

    /// Compile HLSL `source` for this backend
    fn compile_program(
        &self,
        pipeline: PipelineType,
        name: &str,
        source: &str,
        entry_point: &str,
    ) -> Result<CompiledProgram>;

    fn create_program(&self, compiled: &CompiledProgram) -> Result<Arc<dyn Program>>;

    fn create_pipeline_state(&self, desc: &PipelineStateDescription) -> Result<Arc<dyn PipelineState>>;

    // ===== DATA =====

    /// Replace the contents of `buffer` (from offset 0)
    fn update_resource(&self, buffer: &Arc<dyn Buffer>, data: &[u8]) -> Result<()>;

    /// Map `buffer` for the duration of `f`
    fn map_buffer(&self, buffer: &Arc<dyn Buffer>, mode: MapMode, f: &mut dyn FnMut(&mut [u8])) -> Result<()>;

    /// Copy the whole of `source` into `destination`
    fn copy_resource(&self, destination: &ResourceRef, source: &ResourceRef) -> Result<()>;

    // ===== SYNCHRONISATION =====

    fn create_fence(&self) -> Result<Arc<dyn Fence>>;

    fn is_fence_signaled(&self, fence: &Arc<dyn Fence>) -> Result<bool>;

    // ===== EXECUTION =====

    /// Execute a finished command list on the immediate context
    ///
    /// The list does not inherit the immediate context's bindings, and the
    /// immediate context is left in its default state afterwards: every
    /// pipeline, buffer, resource and target must be bound again before
    /// the next draw.
    fn execute_command_list(&mut self, list: Box<dyn CommandList>) -> Result<()>;

    fn present(&mut self, wait_for_vsync: bool) -> Result<()>;

    fn stats(&self) -> DeviceStats;
}

/// Create a buffer from a typed slice
pub fn create_typed_buffer<T: bytemuck::Pod>(
    device: &dyn Device,
    desc: &BufferDescription,
    data: &[T],
) -> Result<Arc<dyn Buffer>> {
    device.create_buffer(desc, Some(bytemuck::cast_slice(data)))
}

/// Replace buffer contents from a typed slice
pub fn update_typed_resource<T: bytemuck::Pod>(
    device: &dyn Device,
    buffer: &Arc<dyn Buffer>,
    data: &[T],
) -> Result<()> {
    device.update_resource(buffer, bytemuck::cast_slice(data))
}
