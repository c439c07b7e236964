/*!
# GEK Engine - OpenGL Video Backend

OpenGL 4.5 core-profile implementation of the GEK engine video traits.

The context and window surface are created with glutin and GL is called
through glow. HLSL programs are compiled to SPIR-V with `dxc`, reflected
with spirq and translated to GLSL by `spirv-cross`; both tools are looked
up through `ShaderToolConfig`, the `GEK_DXC` / `GEK_SPIRV_CROSS`
environment variables, then `PATH`.

The backend registers itself as the `"opengl"` device plugin.
*/

// Resources
mod opengl_format;
mod opengl_deletion;
mod opengl_debug;
mod opengl_buffer;
mod opengl_texture;
mod opengl_sampler;
mod opengl_fence;
mod opengl_program;
mod opengl_pipeline;

// Programs
mod opengl_shader_compiler;

// Execution
mod opengl_state;
mod opengl_framebuffer;
mod opengl_immediate_context;
mod opengl_swap_chain;
mod opengl_device;

pub use opengl_device::OpenGlDevice;
pub use opengl_shader_compiler::ShaderCompiler;

use gek_engine::gek::{Engine, Result};

/// Name the backend registers under
pub const BACKEND_NAME: &str = "opengl";

/// Register the OpenGL backend with the device plugin registry
///
/// # Example
///
/// ```no_run
/// use gek_engine::gek::Engine;
///
/// Engine::initialize()?;
/// gek_engine_video_opengl::register()?;
/// // let device = Engine::create_device("opengl", window, DeviceConfig::default())?;
/// # Ok::<(), gek_engine::gek::Error>(())
/// ```
pub fn register() -> Result<()> {
    Engine::register_device_plugin(BACKEND_NAME, |window, config| {
        Ok(Box::new(OpenGlDevice::new(window, config)?))
    })
}
