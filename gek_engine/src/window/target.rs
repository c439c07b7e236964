/// Window abstraction a device binds its swap chain to
///
/// Implemented for `winit::window::Window`. Devices hold an
/// `Arc<dyn WindowTarget>` for the lifetime of their swap chain.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::{Fullscreen, Window};

use crate::video::swap_chain::{DisplayMode, RefreshRate};
use crate::video::Format;

/// A video mode reported by the monitor a window is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoMode {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u16,
    pub refresh_rate_millihertz: u32,
}

impl VideoMode {
    /// Display mode of this video mode in `format`
    pub fn to_display_mode(&self, format: Format) -> DisplayMode {
        DisplayMode::new(
            self.width,
            self.height,
            format,
            RefreshRate {
                numerator: self.refresh_rate_millihertz,
                denominator: 1000,
            },
        )
    }
}

/// Display modes for `format`, sorted by size then refresh rate, without duplicates
///
/// Only 32-bit video modes are kept; monitors report the same resolution once
/// per bit depth.
pub fn display_modes(modes: &[VideoMode], format: Format) -> Vec<DisplayMode> {
    let mut filtered: Vec<VideoMode> = modes
        .iter()
        .copied()
        .filter(|mode| mode.bit_depth == 32 || mode.bit_depth == 0)
        .collect();
    filtered.sort_by_key(|mode| (mode.width, mode.height, mode.refresh_rate_millihertz));
    filtered.dedup_by_key(|mode| (mode.width, mode.height, mode.refresh_rate_millihertz));
    filtered.iter().map(|mode| mode.to_display_mode(format)).collect()
}

/// Native window a device can present to
pub trait WindowTarget: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// Client-area size in physical pixels
    fn client_size(&self) -> (u32, u32);

    fn is_fullscreen(&self) -> bool;

    /// Switch between windowed and borderless fullscreen on the current monitor
    fn set_fullscreen(&self, fullscreen: bool);

    /// Video modes of the monitor the window is on
    fn video_modes(&self) -> Vec<VideoMode>;
}

impl WindowTarget for Window {
    fn client_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen().is_some()
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        let mode = if fullscreen {
            Some(Fullscreen::Borderless(self.current_monitor()))
        } else {
            None
        };
        Window::set_fullscreen(self, mode);
    }

    fn video_modes(&self) -> Vec<VideoMode> {
        let Some(monitor) = self.current_monitor() else {
            return Vec::new();
        };
        monitor
            .video_modes()
            .map(|mode| {
                let size = mode.size();
                VideoMode {
                    width: size.width,
                    height: size.height,
                    bit_depth: mode.bit_depth(),
                    refresh_rate_millihertz: mode.refresh_rate_millihertz(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
