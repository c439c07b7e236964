/// Sampler - Direct3D 11 sampler states

use std::any::Any;

use windows::Win32::Graphics::Direct3D11::{
    ID3D11Device, ID3D11SamplerState, D3D11_COMPARISON_FUNC, D3D11_FILTER, D3D11_SAMPLER_DESC,
    D3D11_TEXTURE_ADDRESS_MODE,
};

use gek_engine::gek::video::{
    ComparisonFunction, Resource, ResourceCounters, ResourceId, ResourceKind, ResourceTicket, SamplerState,
    SamplerStateDescription,
};
use gek_engine::gek::Result;

use crate::d3d11_error::{check, created};
use crate::d3d11_state::{address_mode, comparison_function, sampler_filter};

pub struct D3D11SamplerState {
    id: ResourceId,
    description: SamplerStateDescription,
    pub(crate) native: ID3D11SamplerState,
    _ticket: ResourceTicket,
}

// SAFETY: D3D11 device children are free-threaded; only contexts are not.
unsafe impl Send for D3D11SamplerState {}
unsafe impl Sync for D3D11SamplerState {}

impl D3D11SamplerState {
    pub fn create(device: &ID3D11Device, desc: &SamplerStateDescription, counters: &ResourceCounters) -> Result<Self> {
        let native_desc = D3D11_SAMPLER_DESC {
            Filter: D3D11_FILTER(sampler_filter(desc)),
            AddressU: D3D11_TEXTURE_ADDRESS_MODE(address_mode(desc.address_mode_u)),
            AddressV: D3D11_TEXTURE_ADDRESS_MODE(address_mode(desc.address_mode_v)),
            AddressW: D3D11_TEXTURE_ADDRESS_MODE(address_mode(desc.address_mode_w)),
            MipLODBias: desc.mip_lod_bias,
            MaxAnisotropy: desc.max_anisotropy.clamp(1, 16),
            // Ignored unless the filter is a comparison filter
            ComparisonFunc: D3D11_COMPARISON_FUNC(comparison_function(
                desc.comparison_function.unwrap_or(ComparisonFunction::Never),
            )),
            BorderColor: desc.border_color,
            MinLOD: desc.min_lod,
            MaxLOD: desc.max_lod,
        };

        let mut native: Option<ID3D11SamplerState> = None;
        check(unsafe { device.CreateSamplerState(&native_desc, Some(&mut native)) }, "CreateSamplerState")?;
        Ok(Self {
            id: ResourceId::next(),
            description: *desc,
            native: created(native, "CreateSamplerState")?,
            _ticket: counters.track(ResourceKind::SamplerState),
        })
    }
}

impl Resource for D3D11SamplerState {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        "sampler_state"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl SamplerState for D3D11SamplerState {
    fn description(&self) -> &SamplerStateDescription {
        &self.description
    }
}
