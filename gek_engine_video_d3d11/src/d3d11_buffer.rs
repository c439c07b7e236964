/// Buffer - Direct3D 11 implementation of the Buffer trait
///
/// Owns the `ID3D11Buffer` and the views its flags ask for. Dropping the
/// wrapper releases every COM reference it holds.

use std::any::Any;

use windows::Win32::Graphics::Direct3D::D3D_SRV_DIMENSION_BUFFEREX;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Buffer, ID3D11Device, ID3D11ShaderResourceView, ID3D11UnorderedAccessView, D3D11_BUFFER_DESC,
    D3D11_BUFFER_UAV, D3D11_BUFFEREX_SRV, D3D11_SHADER_RESOURCE_VIEW_DESC,
    D3D11_SHADER_RESOURCE_VIEW_DESC_0, D3D11_SUBRESOURCE_DATA, D3D11_UAV_DIMENSION_BUFFER,
    D3D11_UNORDERED_ACCESS_VIEW_DESC, D3D11_UNORDERED_ACCESS_VIEW_DESC_0, D3D11_USAGE,
};
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT;

use gek_engine::gek::video::dxgi::to_dxgi;
use gek_engine::gek::video::{
    Buffer, BufferDescription, BufferFlags, BufferType, Resource, ResourceCounters, ResourceId, ResourceKind,
    ResourceTicket,
};
use gek_engine::gek::Result;

use crate::d3d11_error::{check, created, set_debug_name};
use crate::d3d11_format::{DXGI_FORMAT_R32_TYPELESS, DXGI_FORMAT_UNKNOWN};
use crate::d3d11_usage::{buffer_usage, BindFlags};

const BUFFEREX_SRV_FLAG_RAW: u32 = 0x1;
const BUFFER_UAV_FLAG_RAW: u32 = 0x1;
const BUFFER_UAV_FLAG_COUNTER: u32 = 0x4;

/// View format and element count of a buffer's views
fn view_layout(desc: &BufferDescription) -> (u32, u32) {
    match desc.buffer_type {
        // Raw views address 32-bit words
        BufferType::Raw => (DXGI_FORMAT_R32_TYPELESS, (desc.size_bytes() / 4) as u32),
        BufferType::Structured => (DXGI_FORMAT_UNKNOWN, desc.count),
        _ => (to_dxgi(desc.format), desc.count),
    }
}

pub struct D3D11Buffer {
    id: ResourceId,
    description: BufferDescription,
    pub(crate) native: ID3D11Buffer,
    pub(crate) shader_resource: Option<ID3D11ShaderResourceView>,
    pub(crate) unordered_access: Option<ID3D11UnorderedAccessView>,
    _ticket: ResourceTicket,
}

// SAFETY: D3D11 device children are free-threaded; only contexts are not.
unsafe impl Send for D3D11Buffer {}
unsafe impl Sync for D3D11Buffer {}

impl D3D11Buffer {
    /// Create the buffer and its views
    ///
    /// Initial data shorter than the buffer is zero-padded; D3D11 always
    /// reads the full size.
    pub fn create(
        device: &ID3D11Device,
        desc: &BufferDescription,
        data: Option<&[u8]>,
        counters: &ResourceCounters,
    ) -> Result<Self> {
        let usage = buffer_usage(desc)?;
        let size = desc.size_bytes() as usize;
        let buffer_desc = D3D11_BUFFER_DESC {
            ByteWidth: size as u32,
            Usage: D3D11_USAGE(usage.usage.code()),
            BindFlags: usage.bind.bits(),
            CPUAccessFlags: usage.cpu_access.bits(),
            MiscFlags: usage.misc.bits(),
            StructureByteStride: if desc.buffer_type == BufferType::Structured { desc.stride } else { 0 },
        };

        let padded;
        let initial = match data {
            Some(data) if data.len() < size => {
                let mut bytes = vec![0u8; size];
                bytes[..data.len()].copy_from_slice(data);
                padded = bytes;
                Some(padded.as_slice())
            }
            other => other,
        };
        let initial = initial.map(|bytes| D3D11_SUBRESOURCE_DATA {
            pSysMem: bytes.as_ptr().cast(),
            SysMemPitch: 0,
            SysMemSlicePitch: 0,
        });

        let mut native: Option<ID3D11Buffer> = None;
        check(
            unsafe {
                device.CreateBuffer(
                    &buffer_desc,
                    initial.as_ref().map(|initial| initial as *const _),
                    Some(&mut native),
                )
            },
            &format!("CreateBuffer '{}'", desc.name),
        )?;
        let native = created(native, "CreateBuffer")?;
        set_debug_name(&native, &desc.name);

        let (format, elements) = view_layout(desc);
        let raw = desc.buffer_type == BufferType::Raw;

        let shader_resource = if usage.bind.contains(BindFlags::SHADER_RESOURCE) {
            let view_desc = D3D11_SHADER_RESOURCE_VIEW_DESC {
                Format: DXGI_FORMAT(format as i32),
                ViewDimension: D3D_SRV_DIMENSION_BUFFEREX,
                Anonymous: D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                    BufferEx: D3D11_BUFFEREX_SRV {
                        FirstElement: 0,
                        NumElements: elements,
                        Flags: if raw { BUFFEREX_SRV_FLAG_RAW } else { 0 },
                    },
                },
            };
            let mut view: Option<ID3D11ShaderResourceView> = None;
            check(
                unsafe { device.CreateShaderResourceView(&native, Some(&view_desc), Some(&mut view)) },
                &format!("CreateShaderResourceView '{}'", desc.name),
            )?;
            Some(created(view, "CreateShaderResourceView")?)
        } else {
            None
        };

        let unordered_access = if usage.bind.contains(BindFlags::UNORDERED_ACCESS) {
            let mut flags = if raw { BUFFER_UAV_FLAG_RAW } else { 0 };
            if desc.flags.contains(BufferFlags::COUNTER) && desc.buffer_type == BufferType::Structured {
                flags |= BUFFER_UAV_FLAG_COUNTER;
            }
            let view_desc = D3D11_UNORDERED_ACCESS_VIEW_DESC {
                Format: DXGI_FORMAT(format as i32),
                ViewDimension: D3D11_UAV_DIMENSION_BUFFER,
                Anonymous: D3D11_UNORDERED_ACCESS_VIEW_DESC_0 {
                    Buffer: D3D11_BUFFER_UAV {
                        FirstElement: 0,
                        NumElements: elements,
                        Flags: flags,
                    },
                },
            };
            let mut view: Option<ID3D11UnorderedAccessView> = None;
            check(
                unsafe { device.CreateUnorderedAccessView(&native, Some(&view_desc), Some(&mut view)) },
                &format!("CreateUnorderedAccessView '{}'", desc.name),
            )?;
            Some(created(view, "CreateUnorderedAccessView")?)
        } else {
            None
        };

        Ok(Self {
            id: ResourceId::next(),
            description: desc.clone(),
            native,
            shader_resource,
            unordered_access,
            _ticket: counters.track(ResourceKind::Buffer),
        })
    }
}

impl Resource for D3D11Buffer {
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

impl Buffer for D3D11Buffer {
    fn description(&self) -> &BufferDescription {
        &self.description
    }
}
