//! Unit tests for swap_chain.rs
//!
//! A recording backend captures hook order; failures are injected per step.

use crate::gek::Error;
use crate::video::swap_chain::{
    transition, AspectRatio, DisplayMode, RefreshRate, SwapChainBackend, SwapChainRequest,
    SwapChainState, Transition,
};
use crate::video::Format;

// ============================================================================
// TEST HELPERS
// ============================================================================

#[derive(Default)]
struct RecordingBackend {
    calls: Vec<String>,
    fail_at: Option<&'static str>,
}

impl RecordingBackend {
    fn failing_at(step: &'static str) -> Self {
        Self {
            calls: Vec::new(),
            fail_at: Some(step),
        }
    }

    fn step(&mut self, name: &'static str, call: String) -> crate::gek::Result<()> {
        self.calls.push(call);
        if self.fail_at == Some(name) {
            return Err(Error::BackendError(format!("{} failed", name)));
        }
        Ok(())
    }
}

impl SwapChainBackend for RecordingBackend {
    fn clear_bindings(&mut self) -> crate::gek::Result<()> {
        self.step("clear_bindings", "clear_bindings".to_string())
    }

    fn release_back_buffer(&mut self) -> crate::gek::Result<()> {
        self.step("release_back_buffer", "release_back_buffer".to_string())
    }

    fn resize_buffers(&mut self, width: u32, height: u32, fullscreen: bool) -> crate::gek::Result<()> {
        self.step("resize_buffers", format!("resize_buffers({}, {}, {})", width, height, fullscreen))
    }

    fn recreate_targets(&mut self, width: u32, height: u32) -> crate::gek::Result<()> {
        self.step("recreate_targets", format!("recreate_targets({}, {})", width, height))
    }
}

fn state() -> SwapChainState {
    SwapChainState::new(800, 600, Format::R8G8B8A8_UNORM, false)
}

// ============================================================================
// ORDER AND GENERATION
// ============================================================================

#[test]
fn test_resize_runs_hooks_in_order() {
    let mut state = state();
    let mut backend = RecordingBackend::default();

    let outcome = transition(&mut state, &mut backend, SwapChainRequest::Resize { width: 1024, height: 768 }).unwrap();

    assert_eq!(outcome, Transition::Applied);
    assert_eq!(
        backend.calls,
        vec![
            "clear_bindings",
            "release_back_buffer",
            "resize_buffers(1024, 768, false)",
            "recreate_targets(1024, 768)",
        ]
    );
    assert_eq!((state.width, state.height), (1024, 768));
    assert_eq!(state.generation, 1);
}

#[test]
fn test_fullscreen_keeps_size() {
    let mut state = state();
    let mut backend = RecordingBackend::default();

    transition(&mut state, &mut backend, SwapChainRequest::SetFullScreen(true)).unwrap();

    assert!(state.fullscreen);
    assert_eq!((state.width, state.height), (800, 600));
    assert_eq!(backend.calls[2], "resize_buffers(800, 600, true)");
    assert_eq!(state.generation, 1);
}

#[test]
fn test_display_mode_applies_mode_size() {
    let mut state = state();
    let mut backend = RecordingBackend::default();
    let mode = DisplayMode::new(1920, 1080, Format::R8G8B8A8_UNORM, RefreshRate { numerator: 60, denominator: 1 });

    transition(&mut state, &mut backend, SwapChainRequest::SetDisplayMode(mode)).unwrap();

    assert_eq!((state.width, state.height), (1920, 1080));
    assert_eq!(state.generation, 1);
}

#[test]
fn test_every_transition_bumps_generation() {
    let mut state = state();
    let mut backend = RecordingBackend::default();

    transition(&mut state, &mut backend, SwapChainRequest::Resize { width: 640, height: 480 }).unwrap();
    transition(&mut state, &mut backend, SwapChainRequest::SetFullScreen(true)).unwrap();
    transition(&mut state, &mut backend, SwapChainRequest::SetFullScreen(false)).unwrap();

    assert_eq!(state.generation, 3);
}

// ============================================================================
// NO-OPS
// ============================================================================

#[test]
fn test_zero_size_resize_is_noop() {
    let mut state = state();
    let mut backend = RecordingBackend::default();

    let outcome = transition(&mut state, &mut backend, SwapChainRequest::Resize { width: 0, height: 600 }).unwrap();

    assert_eq!(outcome, Transition::Unchanged);
    assert!(backend.calls.is_empty());
    assert_eq!(state, self::state());
}

#[test]
fn test_same_size_resize_is_noop() {
    let mut state = state();
    let mut backend = RecordingBackend::default();

    let outcome = transition(&mut state, &mut backend, SwapChainRequest::Resize { width: 800, height: 600 }).unwrap();

    assert_eq!(outcome, Transition::Unchanged);
    assert!(backend.calls.is_empty());
    assert_eq!(state.generation, 0);
}

#[test]
fn test_matching_fullscreen_is_noop() {
    let mut state = state();
    let mut backend = RecordingBackend::default();

    let outcome = transition(&mut state, &mut backend, SwapChainRequest::SetFullScreen(false)).unwrap();

    assert_eq!(outcome, Transition::Unchanged);
    assert!(backend.calls.is_empty());
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_failed_resize_keeps_dimensions_and_bumps_generation() {
    let mut state = state();
    let mut backend = RecordingBackend::failing_at("resize_buffers");

    let result = transition(&mut state, &mut backend, SwapChainRequest::Resize { width: 1024, height: 768 });

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!((state.width, state.height), (800, 600));
    assert_eq!(state.generation, 1);
    // recreate_targets never ran
    assert_eq!(backend.calls.len(), 3);
}

#[test]
fn test_failed_clear_leaves_generation() {
    let mut state = state();
    let mut backend = RecordingBackend::failing_at("clear_bindings");

    let result = transition(&mut state, &mut backend, SwapChainRequest::Resize { width: 1024, height: 768 });

    assert!(result.is_err());
    assert_eq!(state.generation, 0);
    assert_eq!(backend.calls, vec!["clear_bindings"]);
}

// ============================================================================
// DISPLAY MODES
// ============================================================================

#[test]
fn test_aspect_ratio_classification() {
    assert_eq!(AspectRatio::from_size(1024, 768), AspectRatio::Ratio4x3);
    assert_eq!(AspectRatio::from_size(1920, 1080), AspectRatio::Ratio16x9);
    assert_eq!(AspectRatio::from_size(1920, 1200), AspectRatio::Ratio16x10);
    assert_eq!(AspectRatio::from_size(1280, 1024), AspectRatio::Unknown);
    assert_eq!(AspectRatio::from_size(0, 1024), AspectRatio::Unknown);
}

#[test]
fn test_refresh_rate_hz() {
    let rate = RefreshRate { numerator: 60000, denominator: 1001 };
    assert!((rate.hz() - 59.94).abs() < 0.01);
    assert_eq!(RefreshRate { numerator: 60, denominator: 0 }.hz(), 0.0);
}
