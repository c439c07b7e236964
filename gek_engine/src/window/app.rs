/// winit application host
///
/// `WindowApp` creates the window on the first `resumed` event, hands it to
/// the `WindowHandler`, and forwards resizes, redraws and close requests.
/// Input events are folded into an `InputState` the handler reads at redraw.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use crate::config::WindowConfig;
use crate::error::{Error, Result};
use crate::window::InputState;

const SOURCE: &str = "gek::Window";

/// Application callbacks driven by `WindowApp`
pub trait WindowHandler {
    /// Called once the window exists; create the device here
    fn init(&mut self, window: Arc<Window>) -> Result<()>;

    /// Client area changed size (already non-zero)
    fn resized(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    /// Render a frame
    fn redraw(&mut self, input: &InputState) -> Result<()>;

    /// Raw window event, before it reaches `InputState`
    fn window_event(&mut self, _event: &WindowEvent) {}

    /// Return false to keep the window open
    fn close_requested(&mut self) -> bool {
        true
    }
}

/// Runs the event loop for one window
pub struct WindowApp<H: WindowHandler> {
    config: WindowConfig,
    handler: H,
    window: Option<Arc<Window>>,
    input: InputState,
    failure: Option<Error>,
}

impl<H: WindowHandler> WindowApp<H> {
    pub fn new(config: WindowConfig, handler: H) -> Self {
        Self {
            config,
            handler,
            window: None,
            input: InputState::new(),
            failure: None,
        }
    }

    /// Run until the window closes or a handler callback fails
    ///
    /// Returns the handler so callers can inspect its final state.
    pub fn run(mut self) -> Result<H> {
        let event_loop = EventLoop::new().map_err(|error| {
            let message = format!("Unable to create event loop: {}", error);
            crate::engine_error!(SOURCE, "{}", message);
            Error::InitializationFailed(message)
        })?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop.run_app(&mut self).map_err(|error| {
            let message = format!("Event loop failed: {}", error);
            crate::engine_error!(SOURCE, "{}", message);
            Error::InitializationFailed(message)
        })?;

        match self.failure.take() {
            Some(error) => Err(error),
            None => Ok(self.handler),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        crate::engine_error!(SOURCE, "Stopping event loop: {}", error);
        self.failure = Some(error);
        event_loop.exit();
    }
}

impl<H: WindowHandler> ApplicationHandler for WindowApp<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(self.config.resizable);
        if self.config.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(error) => {
                let message = format!("Unable to create window: {}", error);
                self.fail(event_loop, Error::InitializationFailed(message));
                return;
            }
        };
        crate::engine_info!(
            SOURCE,
            "Created window '{}' ({}x{})",
            self.config.title, self.config.width, self.config.height
        );

        self.window = Some(window.clone());
        if let Err(error) = self.handler.init(window) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        self.handler.window_event(&event);
        if self.input.handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if self.handler.close_requested() {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(size) => {
                // Minimised windows report 0x0
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Err(error) = self.handler.resized(size.width, size.height) {
                    self.fail(event_loop, error);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(error) = self.handler.redraw(&self.input) {
                    self.fail(event_loop, error);
                    return;
                }
                self.input.begin_frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
