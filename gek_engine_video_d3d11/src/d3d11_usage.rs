/// Usage, bind and CPU-access flags for buffers and textures
///
/// Works out the `D3D11_USAGE` / `D3D11_BIND_FLAG` / `D3D11_CPU_ACCESS_FLAG`
/// / `D3D11_RESOURCE_MISC_FLAG` combination for a description. Bit values
/// match the native enums.

use bitflags::bitflags;

use gek_engine::engine_bail_invalid;
use gek_engine::gek::video::{
    BufferDescription, BufferFlags, BufferType, MapMode, TextureDescription, TextureFlags,
};
use gek_engine::gek::Result;

const SOURCE: &str = "gek::video::d3d11::Usage";

/// `D3D11_USAGE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Default,
    Immutable,
    Dynamic,
    Staging,
}

impl Usage {
    pub fn code(self) -> i32 {
        match self {
            Usage::Default => 0,
            Usage::Immutable => 1,
            Usage::Dynamic => 2,
            Usage::Staging => 3,
        }
    }
}

bitflags! {
    /// `D3D11_BIND_FLAG`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindFlags: u32 {
        const VERTEX_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        const CONSTANT_BUFFER = 0x4;
        const SHADER_RESOURCE = 0x8;
        const RENDER_TARGET = 0x20;
        const DEPTH_STENCIL = 0x40;
        const UNORDERED_ACCESS = 0x80;
    }

    /// `D3D11_CPU_ACCESS_FLAG`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CpuAccess: u32 {
        const WRITE = 0x10000;
        const READ = 0x20000;
    }

    /// `D3D11_RESOURCE_MISC_FLAG`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MiscFlags: u32 {
        const GENERATE_MIPS = 0x1;
        const TEXTURE_CUBE = 0x4;
        const BUFFER_ALLOW_RAW_VIEWS = 0x20;
        const BUFFER_STRUCTURED = 0x40;
    }
}

/// Creation flags of one native resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceUsage {
    pub usage: Usage,
    pub bind: BindFlags,
    pub cpu_access: CpuAccess,
    pub misc: MiscFlags,
}

/// Flags for a buffer
///
/// Non-staging, non-mutable buffers use default usage so
/// `Device::update_resource` keeps working on them.
pub fn buffer_usage(desc: &BufferDescription) -> Result<ResourceUsage> {
    if desc.flags.contains(BufferFlags::STAGING) {
        return Ok(ResourceUsage {
            usage: Usage::Staging,
            bind: BindFlags::empty(),
            cpu_access: CpuAccess::READ | CpuAccess::WRITE,
            misc: MiscFlags::empty(),
        });
    }

    let mut bind = match desc.buffer_type {
        BufferType::Vertex => BindFlags::VERTEX_BUFFER,
        BufferType::Index => BindFlags::INDEX_BUFFER,
        BufferType::Constant => BindFlags::CONSTANT_BUFFER,
        BufferType::Raw | BufferType::Structured => BindFlags::empty(),
    };
    if desc.flags.contains(BufferFlags::RESOURCE) {
        bind |= BindFlags::SHADER_RESOURCE;
    }
    if desc.flags.contains(BufferFlags::UNORDERED_ACCESS) {
        bind |= BindFlags::UNORDERED_ACCESS;
    }
    if bind.contains(BindFlags::CONSTANT_BUFFER) && bind != BindFlags::CONSTANT_BUFFER {
        engine_bail_invalid!(SOURCE, "Constant buffer '{}' cannot also be a shader resource", desc.name);
    }

    let (usage, cpu_access) = if desc.flags.contains(BufferFlags::MUTABLE) {
        if bind.contains(BindFlags::UNORDERED_ACCESS) {
            engine_bail_invalid!(SOURCE, "Mutable buffer '{}' cannot have an unordered-access view", desc.name);
        }
        (Usage::Dynamic, CpuAccess::WRITE)
    } else {
        (Usage::Default, CpuAccess::empty())
    };

    let misc = match desc.buffer_type {
        BufferType::Structured => MiscFlags::BUFFER_STRUCTURED,
        BufferType::Raw if bind.intersects(BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS) => {
            MiscFlags::BUFFER_ALLOW_RAW_VIEWS
        }
        _ => MiscFlags::empty(),
    };

    Ok(ResourceUsage {
        usage,
        bind,
        cpu_access,
        misc,
    })
}

/// Flags for a texture
pub fn texture_usage(desc: &TextureDescription) -> ResourceUsage {
    let mut bind = BindFlags::empty();
    if desc.flags.intersects(TextureFlags::RESOURCE | TextureFlags::READ_WRITE) {
        bind |= BindFlags::SHADER_RESOURCE;
    }
    if desc.flags.contains(TextureFlags::RENDER_TARGET) {
        bind |= BindFlags::RENDER_TARGET;
    }
    if desc.flags.contains(TextureFlags::DEPTH_TARGET) {
        bind |= BindFlags::DEPTH_STENCIL;
    }
    if desc.flags.contains(TextureFlags::UNORDERED_ACCESS) {
        bind |= BindFlags::UNORDERED_ACCESS;
    }

    let mut misc = MiscFlags::empty();
    if desc.is_cube() {
        misc |= MiscFlags::TEXTURE_CUBE;
    }
    if can_generate_mips(bind, desc) {
        misc |= MiscFlags::GENERATE_MIPS;
    }

    ResourceUsage {
        usage: Usage::Default,
        bind,
        cpu_access: CpuAccess::empty(),
        misc,
    }
}

/// `GenerateMips` needs both a render-target and a shader-resource binding
fn can_generate_mips(bind: BindFlags, desc: &TextureDescription) -> bool {
    bind.contains(BindFlags::RENDER_TARGET | BindFlags::SHADER_RESOURCE)
        && desc.mip_levels() > 1
        && !desc.is_multisampled()
}

/// `D3D11_MAP` for a map mode
pub fn map_type(mode: MapMode) -> i32 {
    match mode {
        MapMode::Read => 1,
        MapMode::Write => 2,
        MapMode::WriteDiscard => 4,
        MapMode::WriteNoOverwrite => 5,
    }
}

#[cfg(test)]
#[path = "d3d11_usage_tests.rs"]
mod tests;
