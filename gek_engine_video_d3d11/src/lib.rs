/*!
# GEK Engine - Direct3D 11 Video Backend

Feature level 11.0 implementation of the GEK engine video traits.

The device, its immediate and deferred contexts and the DXGI swap chain are
driven through the `windows` crate. HLSL is compiled with `D3DCompile` to
DXBC, so no external tool is needed. The native code only builds on
Windows; elsewhere `register()` reports the backend as unavailable.

The backend registers itself as the `"d3d11"` device plugin.
*/

#![cfg_attr(not(windows), allow(dead_code))]

// Tables
mod d3d11_format;
mod d3d11_state;
mod d3d11_usage;
mod d3d11_slots;
mod d3d11_error;

// Programs
mod d3d11_shader_compiler;

// Presentation
mod d3d11_swap_chain;

// Resources
#[cfg(windows)]
mod d3d11_buffer;
#[cfg(windows)]
mod d3d11_texture;
#[cfg(windows)]
mod d3d11_sampler;
#[cfg(windows)]
mod d3d11_fence;
#[cfg(windows)]
mod d3d11_program;
#[cfg(windows)]
mod d3d11_pipeline;

// Execution
#[cfg(windows)]
mod d3d11_context;
#[cfg(windows)]
mod d3d11_device;

#[cfg(windows)]
pub use d3d11_device::D3D11Device;

use gek_engine::gek::Result;

/// Name the backend registers under
pub const BACKEND_NAME: &str = "d3d11";

/// Register the Direct3D 11 backend with the device plugin registry
///
/// # Example
///
/// ```no_run
/// use gek_engine::gek::Engine;
///
/// Engine::initialize()?;
/// gek_engine_video_d3d11::register()?;
/// // let device = Engine::create_device("d3d11", window, DeviceConfig::default())?;
/// # Ok::<(), gek_engine::gek::Error>(())
/// ```
#[cfg(windows)]
pub fn register() -> Result<()> {
    use gek_engine::gek::Engine;

    Engine::register_device_plugin(BACKEND_NAME, |window, config| {
        Ok(Box::new(D3D11Device::new(window, config)?))
    })
}

/// Direct3D 11 only exists on Windows
#[cfg(not(windows))]
pub fn register() -> Result<()> {
    use gek_engine::engine_error;
    use gek_engine::gek::Error;

    let message = "The Direct3D 11 backend is only available on Windows".to_string();
    engine_error!("gek::video::d3d11", "{}", message);
    Err(Error::InitializationFailed(message))
}
