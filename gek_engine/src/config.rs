/// Device and window configuration
///
/// Plain data with `Default` values suitable for a windowed 1280x720 device.

use std::path::PathBuf;

use crate::video::Format;

/// Environment variable naming the `dxc` executable
pub const DXC_ENV: &str = "GEK_DXC";

/// Environment variable naming the `spirv-cross` executable
pub const SPIRV_CROSS_ENV: &str = "GEK_SPIRV_CROSS";

/// Locations of the external shader tools used by the OpenGL backend
///
/// A `None` path is looked up on `PATH` when the tool is first needed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderToolConfig {
    pub dxc: Option<PathBuf>,
    pub spirv_cross: Option<PathBuf>,
}

impl ShaderToolConfig {
    /// Read `GEK_DXC` and `GEK_SPIRV_CROSS`; empty values are ignored
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key).map(PathBuf::from))
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let read = |key: &str| lookup(key).filter(|path| !path.as_os_str().is_empty());
        Self {
            dxc: read(DXC_ENV),
            spirv_cross: read(SPIRV_CROSS_ENV),
        }
    }

    /// Keep explicit paths, fill the rest from `other`
    pub fn or(self, other: ShaderToolConfig) -> Self {
        Self {
            dxc: self.dxc.or(other.dxc),
            spirv_cross: self.spirv_cross.or(other.spirv_cross),
        }
    }
}

/// Device creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Enable the native debug layer (D3D11 debug device, GL debug context)
    pub debug_layer: bool,

    /// Swap-chain format
    pub back_buffer_format: Format,

    /// Format of the device-owned depth target; `None` creates no depth target
    pub depth_format: Option<Format>,

    /// Number of swap-chain buffers
    pub buffer_count: u32,

    /// MSAA sample count of the back buffer
    pub sample_count: u32,

    /// Default present interval
    pub vsync: bool,

    /// Start in fullscreen
    pub fullscreen: bool,

    /// Name reported to debug tools
    pub application_name: String,

    pub shader_tools: ShaderToolConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            debug_layer: cfg!(debug_assertions),
            back_buffer_format: Format::R8G8B8A8_UNORM_SRGB,
            depth_format: Some(Format::D24_UNORM_S8_UINT),
            buffer_count: 2,
            sample_count: 1,
            vsync: true,
            fullscreen: false,
            application_name: "GEK Application".to_string(),
            shader_tools: ShaderToolConfig::from_env(),
        }
    }
}

/// Window creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "GEK Engine".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
            fullscreen: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
