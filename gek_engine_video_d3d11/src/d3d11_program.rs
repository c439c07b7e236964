/// Program - native shader objects created from DXBC
///
/// The bytecode is kept alongside the shader: vertex programs need it again
/// when a pipeline state builds its input layout.

use std::any::Any;

use windows::Win32::Graphics::Direct3D11::{
    ID3D11ComputeShader, ID3D11Device, ID3D11GeometryShader, ID3D11PixelShader, ID3D11VertexShader,
};

use gek_engine::gek::video::{
    CompiledProgram, PipelineType, Program, Resource, ResourceCounters, ResourceId, ResourceKind, ResourceTicket,
    ShaderLanguage,
};
use gek_engine::gek::Result;
use gek_engine::engine_bail_invalid;

use crate::d3d11_error::{check, created, set_debug_name};

const SOURCE: &str = "gek::video::d3d11";

/// Native shader of one stage
pub(crate) enum NativeShader {
    Compute(ID3D11ComputeShader),
    Vertex(ID3D11VertexShader),
    Geometry(ID3D11GeometryShader),
    Pixel(ID3D11PixelShader),
}

pub struct D3D11Program {
    id: ResourceId,
    name: String,
    entry_point: String,
    pipeline: PipelineType,
    pub(crate) shader: NativeShader,
    pub(crate) bytecode: Vec<u8>,
    _ticket: ResourceTicket,
}

// SAFETY: D3D11 device children are free-threaded; only contexts are not.
unsafe impl Send for D3D11Program {}
unsafe impl Sync for D3D11Program {}

impl D3D11Program {
    pub fn create(device: &ID3D11Device, compiled: &CompiledProgram, counters: &ResourceCounters) -> Result<Self> {
        if compiled.language != ShaderLanguage::Dxbc {
            engine_bail_invalid!(SOURCE, "Program '{}' is not DXBC bytecode", compiled.name);
        }
        let bytes = compiled.bytecode.as_slice();
        let what = format!("Create{}Shader '{}'", compiled.pipeline, compiled.name);

        let shader = match compiled.pipeline {
            PipelineType::Compute => {
                let mut shader: Option<ID3D11ComputeShader> = None;
                check(unsafe { device.CreateComputeShader(bytes, None, Some(&mut shader)) }, &what)?;
                let shader = created(shader, &what)?;
                set_debug_name(&shader, &compiled.name);
                NativeShader::Compute(shader)
            }
            PipelineType::Vertex => {
                let mut shader: Option<ID3D11VertexShader> = None;
                check(unsafe { device.CreateVertexShader(bytes, None, Some(&mut shader)) }, &what)?;
                let shader = created(shader, &what)?;
                set_debug_name(&shader, &compiled.name);
                NativeShader::Vertex(shader)
            }
            PipelineType::Geometry => {
                let mut shader: Option<ID3D11GeometryShader> = None;
                check(unsafe { device.CreateGeometryShader(bytes, None, Some(&mut shader)) }, &what)?;
                let shader = created(shader, &what)?;
                set_debug_name(&shader, &compiled.name);
                NativeShader::Geometry(shader)
            }
            PipelineType::Pixel => {
                let mut shader: Option<ID3D11PixelShader> = None;
                check(unsafe { device.CreatePixelShader(bytes, None, Some(&mut shader)) }, &what)?;
                let shader = created(shader, &what)?;
                set_debug_name(&shader, &compiled.name);
                NativeShader::Pixel(shader)
            }
        };

        Ok(Self {
            id: ResourceId::next(),
            name: compiled.name.clone(),
            entry_point: compiled.entry_point.clone(),
            pipeline: compiled.pipeline,
            shader,
            bytecode: compiled.bytecode.clone(),
            _ticket: counters.track(ResourceKind::Program),
        })
    }
}

impl Resource for D3D11Program {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Program for D3D11Program {
    fn pipeline(&self) -> PipelineType {
        self.pipeline
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }
}
