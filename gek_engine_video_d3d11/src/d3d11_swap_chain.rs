/// DXGI swap chain bound to the device window
///
/// A blt-model (`DXGI_SWAP_EFFECT_DISCARD`) swap chain so sRGB and
/// multisampled back buffers work without an extra resolve. Alt+Enter is
/// left to the application; fullscreen only changes through the device.

use gek_engine::gek::video::swap_chain::{DisplayMode, RefreshRate};
use gek_engine::gek::video::Format;

/// `Present` sync interval
pub fn sync_interval(wait_for_vsync: bool) -> u32 {
    if wait_for_vsync {
        1
    } else {
        0
    }
}

/// Display modes from `(width, height, numerator, denominator)` rows
///
/// DXGI reports each size once per scanline ordering and scaling; the
/// duplicates are dropped and the list sorted by size, then refresh rate.
pub fn display_modes_from_rows(rows: &[(u32, u32, u32, u32)], format: Format) -> Vec<DisplayMode> {
    let mut modes: Vec<DisplayMode> = rows
        .iter()
        .map(|&(width, height, numerator, denominator)| {
            DisplayMode::new(width, height, format, RefreshRate { numerator, denominator })
        })
        .collect();
    modes.sort_by(|a, b| {
        (a.width, a.height)
            .cmp(&(b.width, b.height))
            .then(a.refresh_rate.hz().total_cmp(&b.refresh_rate.hz()))
    });
    modes.dedup();
    modes
}

#[cfg(windows)]
pub use native::SwapChain;

#[cfg(windows)]
mod native {
    use std::ffi::c_void;

    use raw_window_handle::RawWindowHandle;
    use windows::core::Interface;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::Graphics::Direct3D11::{ID3D11Device, ID3D11Texture2D};
    use windows::Win32::Graphics::Dxgi::Common::{
        DXGI_FORMAT, DXGI_MODE_DESC, DXGI_RATIONAL, DXGI_SAMPLE_DESC,
    };
    use windows::Win32::Graphics::Dxgi::{
        IDXGIAdapter, IDXGIDevice, IDXGIFactory, IDXGIOutput, IDXGISwapChain, DXGI_MWA_NO_ALT_ENTER,
        DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH, DXGI_SWAP_EFFECT_DISCARD, DXGI_USAGE,
        DXGI_USAGE_RENDER_TARGET_OUTPUT, DXGI_USAGE_SHADER_INPUT,
    };

    use gek_engine::gek::config::DeviceConfig;
    use gek_engine::gek::video::dxgi::to_dxgi;
    use gek_engine::gek::video::swap_chain::DisplayMode;
    use gek_engine::gek::video::Format;
    use gek_engine::gek::window::WindowTarget;
    use gek_engine::gek::{Error, Result};
    use gek_engine::{engine_error, engine_info, engine_warn};

    use super::{display_modes_from_rows, sync_interval};
    use crate::d3d11_error::check;

    const SOURCE: &str = "gek::video::d3d11::SwapChain";

    fn initialization_failed(what: &str, error: impl std::fmt::Display) -> Error {
        let message = format!("{}: {}", what, error);
        engine_error!(SOURCE, "{}", message);
        Error::InitializationFailed(message)
    }

    fn window_handle(window: &dyn WindowTarget) -> Result<HWND> {
        let handle = window
            .window_handle()
            .map_err(|error| initialization_failed("Window handle unavailable", error))?;
        match handle.as_raw() {
            RawWindowHandle::Win32(handle) => Ok(HWND(handle.hwnd.get() as *mut c_void)),
            other => Err(initialization_failed("Direct3D 11 needs a Win32 window", format!("{:?}", other))),
        }
    }

    fn mode_desc(width: u32, height: u32, format: Format, refresh: Option<(u32, u32)>) -> DXGI_MODE_DESC {
        let (numerator, denominator) = refresh.unwrap_or((0, 0));
        DXGI_MODE_DESC {
            Width: width,
            Height: height,
            RefreshRate: DXGI_RATIONAL {
                Numerator: numerator,
                Denominator: denominator,
            },
            Format: DXGI_FORMAT(to_dxgi(format) as i32),
            ..Default::default()
        }
    }

    pub struct SwapChain {
        native: IDXGISwapChain,
        format: Format,
        buffer_count: u32,
    }

    impl SwapChain {
        pub fn create(device: &ID3D11Device, window: &dyn WindowTarget, config: &DeviceConfig) -> Result<Self> {
            let (width, height) = window.client_size();
            let hwnd = window_handle(window)?;

            let factory: IDXGIFactory = unsafe {
                let dxgi_device: IDXGIDevice = device
                    .cast()
                    .map_err(|error| initialization_failed("IDXGIDevice unavailable", error))?;
                let adapter: IDXGIAdapter = dxgi_device
                    .GetAdapter()
                    .map_err(|error| initialization_failed("GetAdapter", error))?;
                adapter
                    .GetParent()
                    .map_err(|error| initialization_failed("IDXGIFactory unavailable", error))?
            };

            let buffer_count = config.buffer_count.max(1);
            let desc = DXGI_SWAP_CHAIN_DESC {
                BufferDesc: mode_desc(width, height, config.back_buffer_format, None),
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: config.sample_count.max(1),
                    Quality: 0,
                },
                BufferUsage: DXGI_USAGE(DXGI_USAGE_RENDER_TARGET_OUTPUT.0 | DXGI_USAGE_SHADER_INPUT.0),
                BufferCount: buffer_count,
                OutputWindow: hwnd,
                // Always start windowed; fullscreen is entered through SetFullscreenState
                Windowed: true.into(),
                SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
                Flags: DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH.0 as u32,
            };

            let mut native: Option<IDXGISwapChain> = None;
            unsafe { factory.CreateSwapChain(device, &desc, &mut native) }
                .ok()
                .map_err(|error| initialization_failed("CreateSwapChain", error))?;
            let native = native.ok_or_else(|| initialization_failed("CreateSwapChain", "no swap chain returned"))?;

            if let Err(error) = unsafe { factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER) } {
                engine_warn!(SOURCE, "Unable to disable Alt+Enter handling: {}", error);
            }

            engine_info!(
                SOURCE,
                "Swap chain created ({}x{}, {}, {} buffer(s), {}x MSAA)",
                width,
                height,
                config.back_buffer_format,
                buffer_count,
                config.sample_count.max(1)
            );

            let swap_chain = Self {
                native,
                format: config.back_buffer_format,
                buffer_count,
            };
            if config.fullscreen {
                swap_chain.set_fullscreen(true)?;
            }
            Ok(swap_chain)
        }

        /// Buffer 0 of the swap chain
        pub fn back_buffer_texture(&self) -> Result<ID3D11Texture2D> {
            check(unsafe { self.native.GetBuffer::<ID3D11Texture2D>(0) }, "GetBuffer")
        }

        /// Resize the buffers; every reference to buffer 0 must be released first
        pub fn resize(&self, width: u32, height: u32) -> Result<()> {
            check(
                unsafe {
                    self.native.ResizeBuffers(
                        self.buffer_count,
                        width,
                        height,
                        DXGI_FORMAT(to_dxgi(self.format) as i32),
                        DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH,
                    )
                },
                "ResizeBuffers",
            )
        }

        pub fn set_fullscreen(&self, fullscreen: bool) -> Result<()> {
            check(
                unsafe { self.native.SetFullscreenState(fullscreen.into(), None::<&IDXGIOutput>) },
                "SetFullscreenState",
            )
        }

        /// Switch the output (fullscreen) or the window (windowed) to `mode`
        pub fn resize_target(&self, mode: &DisplayMode) -> Result<()> {
            let desc = mode_desc(
                mode.width,
                mode.height,
                mode.format,
                Some((mode.refresh_rate.numerator, mode.refresh_rate.denominator)),
            );
            check(unsafe { self.native.ResizeTarget(&desc) }, "ResizeTarget")
        }

        /// Modes of the output that contains most of the window
        pub fn display_modes(&self, format: Format) -> Result<Vec<DisplayMode>> {
            let output = check(unsafe { self.native.GetContainingOutput() }, "GetContainingOutput")?;
            let native_format = DXGI_FORMAT(to_dxgi(format) as i32);

            let mut count = 0u32;
            check(
                unsafe { output.GetDisplayModeList(native_format, Default::default(), &mut count, None) },
                "GetDisplayModeList",
            )?;
            let mut descs = vec![DXGI_MODE_DESC::default(); count as usize];
            if count > 0 {
                check(
                    unsafe {
                        output.GetDisplayModeList(
                            native_format,
                            Default::default(),
                            &mut count,
                            Some(descs.as_mut_ptr()),
                        )
                    },
                    "GetDisplayModeList",
                )?;
                descs.truncate(count as usize);
            }

            let rows: Vec<(u32, u32, u32, u32)> = descs
                .iter()
                .map(|desc| (desc.Width, desc.Height, desc.RefreshRate.Numerator, desc.RefreshRate.Denominator))
                .collect();
            Ok(display_modes_from_rows(&rows, format))
        }

        pub fn present(&self, wait_for_vsync: bool) -> Result<()> {
            check(
                unsafe { self.native.Present(sync_interval(wait_for_vsync), Default::default()) }.ok(),
                "Present",
            )
        }
    }

    impl Drop for SwapChain {
        fn drop(&mut self) {
            // A fullscreen swap chain cannot be released
            if let Err(error) = self.set_fullscreen(false) {
                engine_warn!(SOURCE, "Unable to leave fullscreen on shutdown: {}", error);
            }
        }
    }
}

#[cfg(test)]
#[path = "d3d11_swap_chain_tests.rs"]
mod tests;
