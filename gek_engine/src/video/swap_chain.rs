/// Swap-chain state and the resize / fullscreen / display-mode transition
///
/// Backends implement `SwapChainBackend`; `transition()` owns the ordering
/// and the generation counter so every backend invalidates stale back
/// buffers the same way.

use crate::error::Result;
use crate::video::Format;

const SOURCE: &str = "gek::video::SwapChain";

/// Current swap-chain properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapChainState {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub fullscreen: bool,
    /// Bumped by every transition; back buffers remember the value they were fetched under
    pub generation: u64,
}

impl SwapChainState {
    pub fn new(width: u32, height: u32, format: Format, fullscreen: bool) -> Self {
        Self {
            width,
            height,
            format,
            fullscreen,
            generation: 0,
        }
    }
}

/// Display aspect ratio class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    Unknown,
    Ratio4x3,
    Ratio16x9,
    Ratio16x10,
}

impl AspectRatio {
    /// Classify `width / height`
    pub fn from_size(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectRatio::Unknown;
        }
        let ratio = width as f32 / height as f32;
        let close = |target: f32| (ratio - target).abs() < 0.01;
        if close(4.0 / 3.0) {
            AspectRatio::Ratio4x3
        } else if close(16.0 / 9.0) {
            AspectRatio::Ratio16x9
        } else if close(16.0 / 10.0) {
            AspectRatio::Ratio16x10
        } else {
            AspectRatio::Unknown
        }
    }
}

/// Refresh rate as a rational number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl RefreshRate {
    pub fn hz(&self) -> f32 {
        if self.denominator == 0 {
            0.0
        } else {
            self.numerator as f32 / self.denominator as f32
        }
    }
}

/// One display mode of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub refresh_rate: RefreshRate,
    pub aspect_ratio: AspectRatio,
}

impl DisplayMode {
    pub fn new(width: u32, height: u32, format: Format, refresh_rate: RefreshRate) -> Self {
        Self {
            width,
            height,
            format,
            refresh_rate,
            aspect_ratio: AspectRatio::from_size(width, height),
        }
    }
}

/// A requested swap-chain change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwapChainRequest {
    Resize { width: u32, height: u32 },
    SetFullScreen(bool),
    SetDisplayMode(DisplayMode),
}

/// Native hooks driven by `transition()`, always called in declaration order
pub trait SwapChainBackend {
    /// Unbind render targets and reset device state
    fn clear_bindings(&mut self) -> Result<()>;

    /// Drop the cached back-buffer texture and its views
    fn release_back_buffer(&mut self) -> Result<()>;

    /// Resize or recreate the native swap chain
    fn resize_buffers(&mut self, width: u32, height: u32, fullscreen: bool) -> Result<()>;

    /// Rebuild the back-buffer view and the depth target
    fn recreate_targets(&mut self, width: u32, height: u32) -> Result<()>;
}

/// Outcome of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do; state untouched
    Unchanged,
    /// Hooks ran and the generation was bumped
    Applied,
}

/// Apply `request` to `state` through `backend`
///
/// Zero-size resizes, resizes to the current size and fullscreen requests
/// matching the current state are no-ops. On failure the old dimensions are
/// kept, but the generation still moves once the back buffer was released.
pub fn transition(
    state: &mut SwapChainState,
    backend: &mut dyn SwapChainBackend,
    request: SwapChainRequest,
) -> Result<Transition> {
    let (width, height, fullscreen) = match request {
        SwapChainRequest::Resize { width, height } => {
            if width == 0 || height == 0 {
                crate::engine_debug!(SOURCE, "Ignoring resize to {}x{}", width, height);
                return Ok(Transition::Unchanged);
            }
            if width == state.width && height == state.height {
                return Ok(Transition::Unchanged);
            }
            (width, height, state.fullscreen)
        }
        SwapChainRequest::SetFullScreen(fullscreen) => {
            if fullscreen == state.fullscreen {
                return Ok(Transition::Unchanged);
            }
            (state.width, state.height, fullscreen)
        }
        SwapChainRequest::SetDisplayMode(mode) => {
            if mode.width == 0 || mode.height == 0 {
                crate::engine_debug!(SOURCE, "Ignoring display mode {}x{}", mode.width, mode.height);
                return Ok(Transition::Unchanged);
            }
            (mode.width, mode.height, state.fullscreen)
        }
    };

    backend.clear_bindings()?;

    let result = backend
        .release_back_buffer()
        .and_then(|_| backend.resize_buffers(width, height, fullscreen))
        .and_then(|_| backend.recreate_targets(width, height));

    // The back buffer may already be gone, so any texture fetched earlier is stale
    state.generation += 1;

    match result {
        Ok(()) => {
            state.width = width;
            state.height = height;
            state.fullscreen = fullscreen;
            crate::engine_debug!(
                SOURCE,
                "Swap chain now {}x{} ({}), generation {}",
                width,
                height,
                if fullscreen { "fullscreen" } else { "windowed" },
                state.generation
            );
            Ok(Transition::Applied)
        }
        Err(error) => {
            crate::engine_error!(SOURCE, "Swap-chain transition to {}x{} failed: {}", width, height, error);
            Err(error)
        }
    }
}

#[cfg(test)]
#[path = "swap_chain_tests.rs"]
mod tests;
