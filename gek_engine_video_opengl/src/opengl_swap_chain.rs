/// Window surface and GL context creation through glutin
///
/// The engine renders into an offscreen back buffer texture; the window's
/// default framebuffer only receives the final blit before `swap_buffers`.

use std::num::NonZeroU32;

use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};

use gek_engine::gek::config::DeviceConfig;
use gek_engine::gek::window::WindowTarget;
use gek_engine::gek::{Error, Result};
use gek_engine::{engine_err, engine_error, engine_info, engine_warn};

const SOURCE: &str = "gek::video::opengl::SwapChain";

/// Core-profile version the device needs
pub const GL_VERSION: (u8, u8) = (4, 5);

fn initialization_failed(what: &str, error: impl std::fmt::Display) -> Error {
    let message = format!("{}: {}", what, error);
    engine_error!(SOURCE, "{}", message);
    Error::InitializationFailed(message)
}

/// Non-zero surface extent; glutin rejects empty surfaces
pub fn surface_extent(width: u32, height: u32) -> (NonZeroU32, NonZeroU32) {
    (
        NonZeroU32::new(width).unwrap_or(NonZeroU32::MIN),
        NonZeroU32::new(height).unwrap_or(NonZeroU32::MIN),
    )
}

pub fn swap_interval(wait_for_vsync: bool) -> SwapInterval {
    if wait_for_vsync {
        SwapInterval::Wait(NonZeroU32::MIN)
    } else {
        SwapInterval::DontWait
    }
}

#[allow(unused_variables)]
fn display_preference(window: RawWindowHandle) -> DisplayApiPreference {
    #[cfg(target_os = "windows")]
    {
        DisplayApiPreference::Wgl(Some(window))
    }
    #[cfg(target_os = "macos")]
    {
        DisplayApiPreference::Cgl
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        DisplayApiPreference::Egl
    }
}

/// Window surface plus the current GL context
pub struct SwapChain {
    display: Display,
    context: PossiblyCurrentContext,
    surface: Surface<WindowSurface>,
    vsync: bool,
}

impl SwapChain {
    /// Create the context, make it current on this thread and load GL
    pub fn create(window: &dyn WindowTarget, config: &DeviceConfig) -> Result<(Self, glow::Context)> {
        let raw_window = window
            .window_handle()
            .map_err(|error| initialization_failed("Window handle unavailable", error))?
            .as_raw();
        let raw_display = window
            .display_handle()
            .map_err(|error| initialization_failed("Display handle unavailable", error))?
            .as_raw();

        let display = unsafe { Display::new(raw_display, display_preference(raw_window)) }
            .map_err(|error| initialization_failed("Unable to open GL display", error))?;

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .compatible_with_native_window(raw_window)
            .build();
        let gl_config = unsafe { display.find_configs(template) }
            .map_err(|error| initialization_failed("Unable to query GL configs", error))?
            .min_by_key(|candidate| candidate.num_samples())
            .ok_or_else(|| initialization_failed("No GL config", "the window supports no GL pixel format"))?;

        let attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(GL_VERSION.0, GL_VERSION.1))))
            .with_debug(config.debug_layer)
            .build(Some(raw_window));
        let not_current = unsafe { display.create_context(&gl_config, &attributes) }
            .map_err(|error| initialization_failed("Unable to create a GL 4.5 core context", error))?;

        let (width, height) = window.client_size();
        let (width, height) = surface_extent(width, height);
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_window, width, height);
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(|error| initialization_failed("Unable to create window surface", error))?;

        let context = not_current
            .make_current(&surface)
            .map_err(|error| initialization_failed("Unable to make GL context current", error))?;
        if let Err(error) = surface.set_swap_interval(&context, swap_interval(config.vsync)) {
            engine_warn!(SOURCE, "Unable to set swap interval: {}", error);
        }

        let gl = unsafe { glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name)) };
        engine_info!(
            SOURCE,
            "GL context ready: {} ({})",
            unsafe { glow::HasContext::get_parameter_string(&gl, glow::VERSION) },
            unsafe { glow::HasContext::get_parameter_string(&gl, glow::RENDERER) }
        );

        Ok((
            Self {
                display,
                context,
                surface,
                vsync: config.vsync,
            },
            gl,
        ))
    }

    /// Resize the window surface
    pub fn resize(&self, width: u32, height: u32) {
        let (width, height) = surface_extent(width, height);
        self.surface.resize(&self.context, width, height);
    }

    /// Show the default framebuffer
    pub fn present(&mut self, wait_for_vsync: bool) -> Result<()> {
        if wait_for_vsync != self.vsync {
            self.surface
                .set_swap_interval(&self.context, swap_interval(wait_for_vsync))
                .map_err(|error| engine_err!(SOURCE, "Unable to change swap interval: {}", error))?;
            self.vsync = wait_for_vsync;
        }
        self.surface
            .swap_buffers(&self.context)
            .map_err(|error| engine_err!(SOURCE, "swap_buffers failed: {}", error))
    }

    /// Name of the platform GL API in use
    pub fn api_name(&self) -> String {
        self.display.version_string()
    }
}

#[cfg(test)]
#[path = "opengl_swap_chain_tests.rs"]
mod tests;
