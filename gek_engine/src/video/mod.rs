/// Video module - backend-neutral device, context and resource model

// Data model
pub mod format;
pub mod resource;
pub mod buffer;
pub mod texture;
pub mod state;
pub mod program;
pub mod pipeline;

// Execution
pub mod context;
pub mod command;
pub mod binding_state;
pub mod device;
pub mod stats;

// Used through their module path
pub mod dxgi;
pub mod dds;
pub mod texture_loader;
pub mod validation;
pub mod swap_chain;
pub mod registry;

pub use format::*;
pub use resource::*;
pub use buffer::*;
pub use texture::*;
pub use state::*;
pub use program::*;
pub use pipeline::*;
pub use context::*;
pub use command::*;
pub use binding_state::*;
pub use device::*;
pub use stats::*;

// Mock device for tests (no GPU required)
#[cfg(test)]
pub mod mock_device;
