/// Window integration: winit host, swap-chain target and input state

mod app;
mod input;
pub mod target;

pub use app::{WindowApp, WindowHandler};
pub use input::InputState;
pub use target::{VideoMode, WindowTarget};
