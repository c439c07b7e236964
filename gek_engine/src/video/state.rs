/// Fixed-function state descriptions and the sampler state trait

use bitflags::bitflags;

use crate::video::Resource;

/// Maximum number of simultaneously bound render targets
pub const MAX_RENDER_TARGETS: usize = 8;

// ===== RASTERIZER STATE =====

/// Polygon fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    #[default]
    Solid,
    WireFrame,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Rasterizer state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerStateDescription {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    /// Counter-clockwise triangles are front facing
    pub front_counter_clockwise: bool,
    /// Constant depth offset
    pub depth_bias: i32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub scissor_enable: bool,
    pub multisample_enable: bool,
    pub antialiased_line_enable: bool,
}

impl Default for RasterizerStateDescription {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::Back,
            front_counter_clockwise: false,
            depth_bias: 0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: true,
            scissor_enable: false,
            multisample_enable: false,
            antialiased_line_enable: false,
        }
    }
}

// ===== DEPTH/STENCIL STATE =====

/// Comparison function for depth, stencil and comparison samplers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComparisonFunction {
    #[default]
    Always,
    Never,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Stencil buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    #[default]
    Keep,
    Zero,
    Replace,
    Invert,
    Increase,
    IncreaseSaturated,
    Decrease,
    DecreaseSaturated,
}

/// Per-face stencil state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StencilStateDescription {
    /// Stencil test failed
    pub fail_operation: StencilOperation,
    /// Stencil passed, depth failed
    pub depth_fail_operation: StencilOperation,
    /// Both passed
    pub pass_operation: StencilOperation,
    pub comparison_function: ComparisonFunction,
}

/// Depth-write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthWrite {
    Zero,
    #[default]
    All,
}

/// Depth and stencil test state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStateDescription {
    pub enable: bool,
    pub write_mask: DepthWrite,
    pub comparison_function: ComparisonFunction,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub stencil_front_state: StencilStateDescription,
    pub stencil_back_state: StencilStateDescription,
}

impl Default for DepthStateDescription {
    fn default() -> Self {
        Self {
            enable: false,
            write_mask: DepthWrite::All,
            comparison_function: ComparisonFunction::Less,
            stencil_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            stencil_front_state: StencilStateDescription::default(),
            stencil_back_state: StencilStateDescription::default(),
        }
    }
}

// ===== BLEND STATE =====

/// Blend factor source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendSource {
    Zero,
    One,
    BlendFactor,
    InverseBlendFactor,
    SourceColor,
    InverseSourceColor,
    SourceAlpha,
    InverseSourceAlpha,
    SourceAlphaSaturated,
    DestinationColor,
    InverseDestinationColor,
    DestinationAlpha,
    InverseDestinationAlpha,
    SecondarySourceColor,
    InverseSecondarySourceColor,
    SecondarySourceAlpha,
    InverseSecondarySourceAlpha,
}

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Minimum,
    Maximum,
}

bitflags! {
    /// Color channels written to a render target
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u8 {
        const R = 1 << 0;
        const G = 1 << 1;
        const B = 1 << 2;
        const A = 1 << 3;
        const RGB = Self::R.bits() | Self::G.bits() | Self::B.bits();
        const ALL = Self::RGB.bits() | Self::A.bits();
    }
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Blend state of one render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetBlendDescription {
    pub enable: bool,
    pub color_source: BlendSource,
    pub color_destination: BlendSource,
    pub color_operation: BlendOperation,
    pub alpha_source: BlendSource,
    pub alpha_destination: BlendSource,
    pub alpha_operation: BlendOperation,
    pub write_mask: ColorWriteMask,
}

impl Default for TargetBlendDescription {
    fn default() -> Self {
        Self {
            enable: false,
            color_source: BlendSource::One,
            color_destination: BlendSource::Zero,
            color_operation: BlendOperation::Add,
            alpha_source: BlendSource::One,
            alpha_destination: BlendSource::Zero,
            alpha_operation: BlendOperation::Add,
            write_mask: ColorWriteMask::ALL,
        }
    }
}

impl TargetBlendDescription {
    /// Classic `src * a + dst * (1 - a)` alpha blending
    pub fn alpha_blend() -> Self {
        Self {
            enable: true,
            color_source: BlendSource::SourceAlpha,
            color_destination: BlendSource::InverseSourceAlpha,
            alpha_source: BlendSource::One,
            alpha_destination: BlendSource::InverseSourceAlpha,
            ..Default::default()
        }
    }

    /// Additive blending
    pub fn additive() -> Self {
        Self {
            enable: true,
            color_source: BlendSource::One,
            color_destination: BlendSource::One,
            alpha_source: BlendSource::One,
            alpha_destination: BlendSource::One,
            ..Default::default()
        }
    }
}

/// Blend state for all render targets
///
/// When `independent_blend_enable` is false only `targets[0]` is used and
/// applies to every bound target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendStateDescription {
    pub alpha_to_coverage: bool,
    pub independent_blend_enable: bool,
    pub targets: [TargetBlendDescription; MAX_RENDER_TARGETS],
}

impl BlendStateDescription {
    /// Same blend state on every target
    pub fn uniform(target: TargetBlendDescription) -> Self {
        Self {
            targets: [target; MAX_RENDER_TARGETS],
            ..Default::default()
        }
    }

    /// Effective blend description of render target `index`
    pub fn target(&self, index: usize) -> &TargetBlendDescription {
        if self.independent_blend_enable {
            &self.targets[index]
        } else {
            &self.targets[0]
        }
    }
}

// ===== SAMPLER STATE =====

/// Texture filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterType {
    Point,
    #[default]
    Linear,
}

/// Texture coordinate addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    Wrap,
    Mirror,
    Clamp,
    Border,
    MirrorOnce,
}

/// Sampler state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerStateDescription {
    pub min_filter: FilterType,
    pub mag_filter: FilterType,
    pub mip_filter: FilterType,
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub mip_lod_bias: f32,
    /// Anisotropic filtering is enabled when greater than 1 (1..=16)
    pub max_anisotropy: u32,
    /// Comparison sampler when set (shadow maps)
    pub comparison_function: Option<ComparisonFunction>,
    pub border_color: [f32; 4],
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerStateDescription {
    fn default() -> Self {
        Self {
            min_filter: FilterType::Linear,
            mag_filter: FilterType::Linear,
            mip_filter: FilterType::Linear,
            address_mode_u: AddressMode::Wrap,
            address_mode_v: AddressMode::Wrap,
            address_mode_w: AddressMode::Wrap,
            mip_lod_bias: 0.0,
            max_anisotropy: 1,
            comparison_function: None,
            border_color: [0.0; 4],
            min_lod: 0.0,
            max_lod: f32::MAX,
        }
    }
}

impl SamplerStateDescription {
    /// Point sampling, clamped
    pub fn point_clamp() -> Self {
        Self {
            min_filter: FilterType::Point,
            mag_filter: FilterType::Point,
            mip_filter: FilterType::Point,
            address_mode_u: AddressMode::Clamp,
            address_mode_v: AddressMode::Clamp,
            address_mode_w: AddressMode::Clamp,
            ..Default::default()
        }
    }

    /// True when anisotropic filtering is requested
    pub fn is_anisotropic(&self) -> bool {
        self.max_anisotropy > 1
    }
}

/// Sampler object trait
pub trait SamplerState: Resource {
    /// Description the sampler was created with
    fn description(&self) -> &SamplerStateDescription;
}
