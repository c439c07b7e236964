/// Keyboard and mouse state fed from window events
///
/// Keys are tracked by physical `KeyCode`, so bindings do not depend on
/// the keyboard layout.

use glam::Vec2;
use rustc_hash::FxHashSet;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels per wheel line when a device reports pixel deltas
const PIXELS_PER_LINE: f32 = 120.0;

#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys_down: FxHashSet<KeyCode>,
    keys_pressed: FxHashSet<KeyCode>,
    keys_released: FxHashSet<KeyCode>,
    buttons_down: FxHashSet<MouseButton>,
    buttons_pressed: FxHashSet<MouseButton>,
    buttons_released: FxHashSet<MouseButton>,
    cursor_position: Option<Vec2>,
    cursor_delta: Vec2,
    wheel_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame state (pressed/released edges, deltas)
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.cursor_delta = Vec2::ZERO;
        self.wheel_delta = Vec2::ZERO;
    }

    /// Update from a window event; returns whether the event was input
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press_key(code),
                        ElementState::Released => self.release_key(code),
                    }
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                match state {
                    ElementState::Pressed => self.press_button(*button),
                    ElementState::Released => self.release_button(*button),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_position = None;
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(position) => {
                        Vec2::new(position.x as f32, position.y as f32) / PIXELS_PER_LINE
                    }
                };
                self.scroll(lines);
                true
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                false
            }
            _ => false,
        }
    }

    pub fn press_key(&mut self, key: KeyCode) {
        // Auto-repeat reports Pressed again; only the first one is an edge
        if self.keys_down.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        if self.keys_down.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    pub fn press_button(&mut self, button: MouseButton) {
        if self.buttons_down.insert(button) {
            self.buttons_pressed.insert(button);
        }
    }

    pub fn release_button(&mut self, button: MouseButton) {
        if self.buttons_down.remove(&button) {
            self.buttons_released.insert(button);
        }
    }

    /// Move the cursor to `position` (client pixels)
    ///
    /// The first position after the cursor enters the window produces no delta.
    pub fn move_cursor(&mut self, position: Vec2) {
        if let Some(previous) = self.cursor_position {
            self.cursor_delta += position - previous;
        }
        self.cursor_position = Some(position);
    }

    /// Accumulate wheel movement, in lines
    pub fn scroll(&mut self, lines: Vec2) {
        self.wheel_delta += lines;
    }

    /// Release everything held (focus lost)
    pub fn release_all(&mut self) {
        let keys: Vec<KeyCode> = self.keys_down.iter().copied().collect();
        for key in keys {
            self.release_key(key);
        }
        let buttons: Vec<MouseButton> = self.buttons_down.iter().copied().collect();
        for button in buttons {
            self.release_button(button);
        }
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn was_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn was_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn was_button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Last known cursor position, `None` while outside the window
    pub fn cursor_position(&self) -> Option<Vec2> {
        self.cursor_position
    }

    pub fn cursor_delta(&self) -> Vec2 {
        self.cursor_delta
    }

    pub fn wheel_delta(&self) -> Vec2 {
        self.wheel_delta
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
