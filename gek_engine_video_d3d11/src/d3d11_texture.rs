/// Texture - Direct3D 11 implementation of the Texture trait
///
/// 2D, cube and volume textures with the views their flags ask for. Depth
/// textures that are also sampled are stored typeless so a depth-stencil
/// view and a shader-resource view can both be created.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use windows::core::Interface;
use windows::Win32::Graphics::Direct3D::{
    D3D_SRV_DIMENSION_TEXTURE2D, D3D_SRV_DIMENSION_TEXTURE2DMS, D3D_SRV_DIMENSION_TEXTURECUBE,
};
use windows::Win32::Graphics::Direct3D11::{
    ID3D11DepthStencilView, ID3D11Device, ID3D11RenderTargetView, ID3D11Resource, ID3D11ShaderResourceView,
    ID3D11Texture2D, ID3D11Texture3D, ID3D11UnorderedAccessView, D3D11_DEPTH_STENCIL_VIEW_DESC,
    D3D11_DEPTH_STENCIL_VIEW_DESC_0, D3D11_DSV_DIMENSION_TEXTURE2D, D3D11_DSV_DIMENSION_TEXTURE2DARRAY,
    D3D11_DSV_DIMENSION_TEXTURE2DMS, D3D11_SHADER_RESOURCE_VIEW_DESC, D3D11_SHADER_RESOURCE_VIEW_DESC_0,
    D3D11_SUBRESOURCE_DATA, D3D11_TEX2DMS_DSV, D3D11_TEX2DMS_SRV, D3D11_TEX2D_ARRAY_DSV, D3D11_TEX2D_DSV,
    D3D11_TEX2D_SRV, D3D11_TEXCUBE_SRV, D3D11_TEXTURE2D_DESC, D3D11_TEXTURE3D_DESC, D3D11_USAGE,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_SAMPLE_DESC};

use gek_engine::gek::video::{
    Resource, ResourceCounters, ResourceId, ResourceKind, ResourceTicket, Texture, TextureData, TextureDescription,
};
use gek_engine::gek::Result;

use crate::d3d11_error::{check, created, set_debug_name};
use crate::d3d11_format::{depth_formats, is_sampled_depth, shader_resource_format, texture_format};
use crate::d3d11_usage::{texture_usage, BindFlags};

/// Views of a texture
#[derive(Default)]
pub(crate) struct TextureViews {
    pub shader_resource: Option<ID3D11ShaderResourceView>,
    pub unordered_access: Option<ID3D11UnorderedAccessView>,
    pub render_target: Option<ID3D11RenderTargetView>,
    pub depth_stencil: Option<ID3D11DepthStencilView>,
}

pub struct D3D11Texture {
    id: ResourceId,
    description: TextureDescription,
    pub(crate) native: ID3D11Resource,
    pub(crate) views: TextureViews,
    /// Generation fetched under and the swap chain's live generation (back buffers only)
    generation: Option<(u64, Arc<AtomicU64>)>,
    _ticket: ResourceTicket,
}

// SAFETY: D3D11 device children are free-threaded; only contexts are not.
unsafe impl Send for D3D11Texture {}
unsafe impl Sync for D3D11Texture {}

fn subresource_data(desc: &TextureDescription, data: &TextureData) -> Vec<D3D11_SUBRESOURCE_DATA> {
    let mip_levels = desc.mip_levels();
    data.subresources
        .iter()
        .enumerate()
        .map(|(index, bytes)| {
            let (width, height, _) = desc.mip_extent(index as u32 % mip_levels);
            D3D11_SUBRESOURCE_DATA {
                pSysMem: bytes.as_ptr().cast(),
                SysMemPitch: desc.format.row_pitch(width) as u32,
                SysMemSlicePitch: desc.format.slice_pitch(width, height) as u32,
            }
        })
        .collect()
}

fn create_native(
    device: &ID3D11Device,
    desc: &TextureDescription,
    initial: Option<&[D3D11_SUBRESOURCE_DATA]>,
) -> Result<ID3D11Resource> {
    let usage = texture_usage(desc);
    let format = DXGI_FORMAT(texture_format(desc) as i32);
    let what = format!("CreateTexture '{}'", desc.name);
    let initial = initial.map(|subresources| subresources.as_ptr());

    if desc.is_volume() {
        let native_desc = D3D11_TEXTURE3D_DESC {
            Width: desc.width,
            Height: desc.height,
            Depth: desc.depth,
            MipLevels: desc.mip_levels(),
            Format: format,
            Usage: D3D11_USAGE(usage.usage.code()),
            BindFlags: usage.bind.bits(),
            CPUAccessFlags: usage.cpu_access.bits(),
            MiscFlags: usage.misc.bits(),
        };
        let mut texture: Option<ID3D11Texture3D> = None;
        check(unsafe { device.CreateTexture3D(&native_desc, initial, Some(&mut texture)) }, &what)?;
        return check(created(texture, &what)?.cast::<ID3D11Resource>(), &what);
    }

    let native_desc = D3D11_TEXTURE2D_DESC {
        Width: desc.width,
        Height: desc.height,
        MipLevels: desc.mip_levels(),
        ArraySize: desc.array_size(),
        Format: format,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: desc.sample_count,
            Quality: desc.sample_quality,
        },
        Usage: D3D11_USAGE(usage.usage.code()),
        BindFlags: usage.bind.bits(),
        CPUAccessFlags: usage.cpu_access.bits(),
        MiscFlags: usage.misc.bits(),
    };
    let mut texture: Option<ID3D11Texture2D> = None;
    check(unsafe { device.CreateTexture2D(&native_desc, initial, Some(&mut texture)) }, &what)?;
    check(created(texture, &what)?.cast::<ID3D11Resource>(), &what)
}

/// Explicit shader-resource view of a typeless depth texture
fn depth_shader_resource_desc(desc: &TextureDescription) -> D3D11_SHADER_RESOURCE_VIEW_DESC {
    let format = DXGI_FORMAT(shader_resource_format(desc) as i32);
    let (dimension, anonymous) = if desc.is_multisampled() {
        (
            D3D_SRV_DIMENSION_TEXTURE2DMS,
            D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2DMS: D3D11_TEX2DMS_SRV {
                    UnusedField_NothingToDefine: 0,
                },
            },
        )
    } else if desc.is_cube() {
        (
            D3D_SRV_DIMENSION_TEXTURECUBE,
            D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                TextureCube: D3D11_TEXCUBE_SRV {
                    MostDetailedMip: 0,
                    MipLevels: desc.mip_levels(),
                },
            },
        )
    } else {
        (
            D3D_SRV_DIMENSION_TEXTURE2D,
            D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D11_TEX2D_SRV {
                    MostDetailedMip: 0,
                    MipLevels: desc.mip_levels(),
                },
            },
        )
    };
    D3D11_SHADER_RESOURCE_VIEW_DESC {
        Format: format,
        ViewDimension: dimension,
        Anonymous: anonymous,
    }
}

/// Depth-stencil view of mip 0 (all six faces for cube maps)
fn depth_stencil_desc(desc: &TextureDescription, format: u32) -> D3D11_DEPTH_STENCIL_VIEW_DESC {
    let (dimension, anonymous) = if desc.is_multisampled() {
        (
            D3D11_DSV_DIMENSION_TEXTURE2DMS,
            D3D11_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2DMS: D3D11_TEX2DMS_DSV {
                    UnusedField_NothingToDefine: 0,
                },
            },
        )
    } else if desc.is_cube() {
        (
            D3D11_DSV_DIMENSION_TEXTURE2DARRAY,
            D3D11_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2DArray: D3D11_TEX2D_ARRAY_DSV {
                    MipSlice: 0,
                    FirstArraySlice: 0,
                    ArraySize: desc.array_size(),
                },
            },
        )
    } else {
        (
            D3D11_DSV_DIMENSION_TEXTURE2D,
            D3D11_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2D: D3D11_TEX2D_DSV { MipSlice: 0 },
            },
        )
    };
    D3D11_DEPTH_STENCIL_VIEW_DESC {
        Format: DXGI_FORMAT(format as i32),
        ViewDimension: dimension,
        Flags: 0,
        Anonymous: anonymous,
    }
}

fn create_views(device: &ID3D11Device, native: &ID3D11Resource, desc: &TextureDescription) -> Result<TextureViews> {
    let bind = texture_usage(desc).bind;
    let mut views = TextureViews::default();

    if bind.contains(BindFlags::SHADER_RESOURCE) {
        let what = format!("CreateShaderResourceView '{}'", desc.name);
        let view_desc = is_sampled_depth(desc).then(|| depth_shader_resource_desc(desc));
        let mut view: Option<ID3D11ShaderResourceView> = None;
        check(
            unsafe {
                device.CreateShaderResourceView(
                    native,
                    view_desc.as_ref().map(|view_desc| view_desc as *const _),
                    Some(&mut view),
                )
            },
            &what,
        )?;
        views.shader_resource = Some(created(view, &what)?);
    }

    if bind.contains(BindFlags::UNORDERED_ACCESS) {
        let what = format!("CreateUnorderedAccessView '{}'", desc.name);
        let mut view: Option<ID3D11UnorderedAccessView> = None;
        check(unsafe { device.CreateUnorderedAccessView(native, None, Some(&mut view)) }, &what)?;
        views.unordered_access = Some(created(view, &what)?);
    }

    if bind.contains(BindFlags::RENDER_TARGET) {
        let what = format!("CreateRenderTargetView '{}'", desc.name);
        let mut view: Option<ID3D11RenderTargetView> = None;
        check(unsafe { device.CreateRenderTargetView(native, None, Some(&mut view)) }, &what)?;
        views.render_target = Some(created(view, &what)?);
    }

    if bind.contains(BindFlags::DEPTH_STENCIL) {
        let what = format!("CreateDepthStencilView '{}'", desc.name);
        let view_desc = depth_formats(desc.format).map(|formats| depth_stencil_desc(desc, formats.depth_stencil));
        let mut view: Option<ID3D11DepthStencilView> = None;
        check(
            unsafe {
                device.CreateDepthStencilView(
                    native,
                    view_desc.as_ref().map(|view_desc| view_desc as *const _),
                    Some(&mut view),
                )
            },
            &what,
        )?;
        views.depth_stencil = Some(created(view, &what)?);
    }

    Ok(views)
}

impl D3D11Texture {
    /// Create the texture, upload optional initial data and build its views
    pub fn create(
        device: &ID3D11Device,
        desc: &TextureDescription,
        data: Option<&TextureData>,
        counters: &ResourceCounters,
    ) -> Result<Self> {
        let initial = data.map(|data| subresource_data(desc, data));
        let native = create_native(device, desc, initial.as_deref())?;
        set_debug_name(&native, &desc.name);
        let views = create_views(device, &native, desc)?;
        Ok(Self {
            id: ResourceId::next(),
            description: desc.clone(),
            native,
            views,
            generation: None,
            _ticket: counters.track(ResourceKind::Texture),
        })
    }

    /// Wrap swap-chain buffer 0, tied to a swap-chain generation
    pub fn from_back_buffer(
        device: &ID3D11Device,
        back_buffer: ID3D11Texture2D,
        desc: &TextureDescription,
        generation: u64,
        live: Arc<AtomicU64>,
        counters: &ResourceCounters,
    ) -> Result<Self> {
        let native = check(back_buffer.cast::<ID3D11Resource>(), "Back buffer")?;
        let views = create_views(device, &native, desc)?;
        Ok(Self {
            id: ResourceId::next(),
            description: desc.clone(),
            native,
            views,
            generation: Some((generation, live)),
            _ticket: counters.track(ResourceKind::Texture),
        })
    }
}

impl Resource for D3D11Texture {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.description.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Texture for D3D11Texture {
    fn description(&self) -> &TextureDescription {
        &self.description
    }

    fn is_current(&self) -> bool {
        match &self.generation {
            Some((generation, live)) => *generation == live.load(Ordering::Acquire),
            None => true,
        }
    }
}
