/*!
# GEK Engine

Core traits and types for the GEK engine video layer.

This crate defines the backend-neutral device model: formats, resource
descriptions, the `Device` and `Context` traits, command recording, and the
swap-chain state machine. Backends (`gek_engine_video_opengl`,
`gek_engine_video_d3d11`) implement the traits and register themselves in the
device plugin registry under a name.

## Architecture

- **Device**: creates resources, compiles programs, owns the swap chain
- **Context**: binds state and issues draws/dispatches (immediate or deferred)
- **CommandList**: recorded work replayed on the immediate context
- **Buffer / Texture / SamplerState / Program / PipelineState**: resources
- **WindowTarget**: the window a device presents into
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod filesystem;
pub mod video;
pub mod window;

// Main gek namespace module
pub mod gek {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine entry point
    pub use crate::engine::Engine;

    // Device trait at the top level
    pub use crate::video::Device;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    pub mod video {
        pub use crate::video::*;
    }

    pub mod window {
        pub use crate::window::*;
    }

    pub mod config {
        pub use crate::config::*;
    }

    pub mod filesystem {
        pub use crate::filesystem::*;
    }
}

// Re-export math library at crate root
pub use glam;
