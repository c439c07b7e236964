/// Texture trait, texture description, and initial texture data

use bitflags::bitflags;

use crate::video::{Format, Resource, ViewFlags};

/// Largest width or height of a 1D, 2D or cube texture
pub const MAX_TEXTURE_DIMENSION: u32 = 16384;

/// Largest extent of a volume texture along any axis
pub const MAX_VOLUME_DIMENSION: u32 = 2048;

bitflags! {
    /// Texture creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        /// Bindable as a render target
        const RENDER_TARGET = 1 << 0;
        /// Bindable as a depth-stencil target
        const DEPTH_TARGET = 1 << 1;
        /// Readable from shaders
        const RESOURCE = 1 << 2;
        /// Writable from shaders
        const UNORDERED_ACCESS = 1 << 3;
        /// Depth target that can also be sampled
        const READ_WRITE = 1 << 4;
        /// Six-face cube map
        const CUBE = 1 << 5;
    }
}

bitflags! {
    /// Options for `Device::load_texture`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureLoadFlags: u32 {
        /// Interpret color data as sRGB
        const SRGB = 1 << 0;
        /// Only load the top mip level
        const SKIP_MIP_MAPS = 1 << 1;
    }
}

/// Description of a texture (immutable after creation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescription {
    /// Debug name
    pub name: String,
    /// Pixel format
    pub format: Format,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Depth in pixels (1 for 2D and cube textures, >1 for volume textures)
    pub depth: u32,
    /// Mip levels; 0 means the full chain
    pub mip_map_count: u32,
    /// Samples per pixel (1 = no multisampling)
    pub sample_count: u32,
    /// Multisample quality level
    pub sample_quality: u32,
    /// Creation flags
    pub flags: TextureFlags,
}

impl Default for TextureDescription {
    fn default() -> Self {
        Self {
            name: String::new(),
            format: Format::Unknown,
            width: 1,
            height: 1,
            depth: 1,
            mip_map_count: 1,
            sample_count: 1,
            sample_quality: 0,
            flags: TextureFlags::empty(),
        }
    }
}

impl TextureDescription {
    /// Sampled 2D texture with a single mip level
    pub fn texture_2d(name: &str, format: Format, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            format,
            width,
            height,
            flags: TextureFlags::RESOURCE,
            ..Default::default()
        }
    }

    /// Render target that can also be sampled
    pub fn render_target(name: &str, format: Format, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            format,
            width,
            height,
            flags: TextureFlags::RENDER_TARGET | TextureFlags::RESOURCE,
            ..Default::default()
        }
    }

    /// Depth-stencil target
    pub fn depth_target(name: &str, format: Format, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            format,
            width,
            height,
            flags: TextureFlags::DEPTH_TARGET,
            ..Default::default()
        }
    }

    /// Number of levels in a full mip chain for these dimensions
    pub fn full_mip_chain(&self) -> u32 {
        let largest = self.width.max(self.height).max(self.depth).max(1);
        32 - largest.leading_zeros()
    }

    /// Resolved mip level count (`mip_map_count == 0` becomes the full chain)
    pub fn mip_levels(&self) -> u32 {
        if self.mip_map_count == 0 {
            self.full_mip_chain()
        } else {
            self.mip_map_count
        }
    }

    /// Cube map
    pub fn is_cube(&self) -> bool {
        self.flags.contains(TextureFlags::CUBE)
    }

    /// Volume texture
    pub fn is_volume(&self) -> bool {
        self.depth > 1 && !self.is_cube()
    }

    /// Number of array slices (6 for cube maps)
    pub fn array_size(&self) -> u32 {
        if self.is_cube() {
            6
        } else {
            1
        }
    }

    /// Multisampled texture
    pub fn is_multisampled(&self) -> bool {
        self.sample_count > 1
    }

    /// Width, height and depth of a mip level (each at least 1)
    pub fn mip_extent(&self, mip: u32) -> (u32, u32, u32) {
        let width = (self.width >> mip).max(1);
        let height = (self.height >> mip).max(1);
        let depth = if self.is_volume() { (self.depth >> mip).max(1) } else { 1 };
        (width, height, depth)
    }

    /// Largest extent allowed along any axis
    pub fn dimension_limit(&self) -> u32 {
        if self.is_volume() {
            MAX_VOLUME_DIMENSION
        } else {
            MAX_TEXTURE_DIMENSION
        }
    }

    /// Tightly packed byte size of one subresource at `mip`
    ///
    /// Saturates instead of wrapping for descriptions past `dimension_limit`.
    pub fn subresource_size(&self, mip: u32) -> usize {
        let (width, height, depth) = self.mip_extent(mip);
        self.format.slice_pitch(width, height).saturating_mul(depth as usize)
    }

    /// Number of subresources (array slices × mip levels)
    pub fn subresource_count(&self) -> u32 {
        self.array_size() * self.mip_levels()
    }

    /// Views implied by the flags
    pub fn views(&self) -> ViewFlags {
        let mut views = ViewFlags::empty();
        if self.flags.intersects(TextureFlags::RESOURCE | TextureFlags::READ_WRITE) {
            views |= ViewFlags::SHADER_RESOURCE;
        }
        if self.flags.contains(TextureFlags::UNORDERED_ACCESS) {
            views |= ViewFlags::UNORDERED_ACCESS;
        }
        if self.flags.contains(TextureFlags::RENDER_TARGET) {
            views |= ViewFlags::RENDER_TARGET;
        }
        if self.flags.contains(TextureFlags::DEPTH_TARGET) {
            views |= ViewFlags::DEPTH_STENCIL;
        }
        views
    }
}

// ===== TEXTURE DATA =====

/// Initial texture contents
///
/// Subresources are ordered array slice first, then mip level:
/// `[slice0 mip0, slice0 mip1, ..., slice1 mip0, ...]`. Each entry is
/// tightly packed (`TextureDescription::subresource_size`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureData {
    pub subresources: Vec<Vec<u8>>,
}

impl TextureData {
    /// Data for a single-level, single-slice texture
    pub fn single(bytes: Vec<u8>) -> Self {
        Self {
            subresources: vec![bytes],
        }
    }

    /// Index of a subresource in `subresources`
    pub fn subresource_index(mip: u32, slice: u32, mip_levels: u32) -> usize {
        (slice * mip_levels + mip) as usize
    }
}

// ===== TEXTURE TRAIT =====

/// Texture resource trait
///
/// Implemented by backend-specific texture types. The native texture is
/// released when the last `Arc` drops.
pub trait Texture: Resource {
    /// Description the texture was created with
    fn description(&self) -> &TextureDescription;

    /// Views created for this texture
    fn views(&self) -> ViewFlags {
        self.description().views()
    }

    /// False for a back buffer fetched before the last swap-chain transition
    fn is_current(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
