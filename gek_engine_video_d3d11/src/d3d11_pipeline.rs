/// Pipeline state - shaders, input layout and fixed-function state objects
///
/// Everything is created up front so binding a pipeline is a handful of
/// `*SetShader` / `*SetState` calls.

use std::any::Any;

use windows::core::{s, PCSTR};
use windows::Win32::Graphics::Direct3D::D3D_PRIMITIVE_TOPOLOGY;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11BlendState, ID3D11ComputeShader, ID3D11DepthStencilState, ID3D11Device, ID3D11GeometryShader,
    ID3D11InputLayout, ID3D11PixelShader, ID3D11RasterizerState, ID3D11VertexShader, D3D11_BLEND, D3D11_BLEND_DESC,
    D3D11_BLEND_OP, D3D11_COMPARISON_FUNC, D3D11_CULL_MODE, D3D11_DEPTH_STENCILOP_DESC, D3D11_DEPTH_STENCIL_DESC,
    D3D11_DEPTH_WRITE_MASK_ALL, D3D11_DEPTH_WRITE_MASK_ZERO, D3D11_FILL_MODE, D3D11_INPUT_ELEMENT_DESC,
    D3D11_INPUT_PER_INSTANCE_DATA, D3D11_INPUT_PER_VERTEX_DATA, D3D11_RASTERIZER_DESC,
    D3D11_RENDER_TARGET_BLEND_DESC, D3D11_STENCIL_OP,
};
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT;

use gek_engine::gek::video::dxgi::to_dxgi;
use gek_engine::gek::video::resource::downcast;
use gek_engine::gek::video::state::MAX_RENDER_TARGETS;
use gek_engine::gek::video::{
    resolve_input_layout, BlendStateDescription, DepthStateDescription, DepthWrite, ElementSource, PipelineState,
    PipelineStateDescription, RasterizerStateDescription, Resource, ResourceCounters, ResourceId, ResourceKind,
    ResourceTicket, Semantic, StencilStateDescription,
};
use gek_engine::gek::Result;
use gek_engine::engine_bail_invalid;

use crate::d3d11_error::{check, created, set_debug_name};
use crate::d3d11_program::{D3D11Program, NativeShader};
use crate::d3d11_state::{
    alpha_blend_source, blend_operation, blend_source, color_write_mask, comparison_function, cull_mode, fill_mode,
    primitive_topology, stencil_operation,
};

const SOURCE: &str = "gek::video::d3d11";

fn semantic_name(semantic: Semantic) -> PCSTR {
    match semantic {
        Semantic::Position => s!("POSITION"),
        Semantic::Tangent => s!("TANGENT"),
        Semantic::BiTangent => s!("BINORMAL"),
        Semantic::Normal => s!("NORMAL"),
        Semantic::Color => s!("COLOR"),
        Semantic::TexCoord => s!("TEXCOORD"),
    }
}

fn rasterizer_desc(desc: &RasterizerStateDescription) -> D3D11_RASTERIZER_DESC {
    D3D11_RASTERIZER_DESC {
        FillMode: D3D11_FILL_MODE(fill_mode(desc.fill_mode)),
        CullMode: D3D11_CULL_MODE(cull_mode(desc.cull_mode)),
        FrontCounterClockwise: desc.front_counter_clockwise.into(),
        DepthBias: desc.depth_bias,
        DepthBiasClamp: desc.depth_bias_clamp,
        SlopeScaledDepthBias: desc.slope_scaled_depth_bias,
        DepthClipEnable: desc.depth_clip_enable.into(),
        ScissorEnable: desc.scissor_enable.into(),
        MultisampleEnable: desc.multisample_enable.into(),
        AntialiasedLineEnable: desc.antialiased_line_enable.into(),
    }
}

fn stencil_face(desc: &StencilStateDescription) -> D3D11_DEPTH_STENCILOP_DESC {
    D3D11_DEPTH_STENCILOP_DESC {
        StencilFailOp: D3D11_STENCIL_OP(stencil_operation(desc.fail_operation)),
        StencilDepthFailOp: D3D11_STENCIL_OP(stencil_operation(desc.depth_fail_operation)),
        StencilPassOp: D3D11_STENCIL_OP(stencil_operation(desc.pass_operation)),
        StencilFunc: D3D11_COMPARISON_FUNC(comparison_function(desc.comparison_function)),
    }
}

fn depth_stencil_desc(desc: &DepthStateDescription) -> D3D11_DEPTH_STENCIL_DESC {
    D3D11_DEPTH_STENCIL_DESC {
        DepthEnable: desc.enable.into(),
        DepthWriteMask: match desc.write_mask {
            DepthWrite::Zero => D3D11_DEPTH_WRITE_MASK_ZERO,
            DepthWrite::All => D3D11_DEPTH_WRITE_MASK_ALL,
        },
        DepthFunc: D3D11_COMPARISON_FUNC(comparison_function(desc.comparison_function)),
        StencilEnable: desc.stencil_enable.into(),
        StencilReadMask: desc.stencil_read_mask,
        StencilWriteMask: desc.stencil_write_mask,
        FrontFace: stencil_face(&desc.stencil_front_state),
        BackFace: stencil_face(&desc.stencil_back_state),
    }
}

fn blend_desc(desc: &BlendStateDescription) -> D3D11_BLEND_DESC {
    let mut native = D3D11_BLEND_DESC {
        AlphaToCoverageEnable: desc.alpha_to_coverage.into(),
        IndependentBlendEnable: desc.independent_blend_enable.into(),
        RenderTarget: [D3D11_RENDER_TARGET_BLEND_DESC::default(); MAX_RENDER_TARGETS],
    };
    for (index, target) in native.RenderTarget.iter_mut().enumerate() {
        let source = desc.target(index);
        *target = D3D11_RENDER_TARGET_BLEND_DESC {
            BlendEnable: source.enable.into(),
            SrcBlend: D3D11_BLEND(blend_source(source.color_source)),
            DestBlend: D3D11_BLEND(blend_source(source.color_destination)),
            BlendOp: D3D11_BLEND_OP(blend_operation(source.color_operation)),
            SrcBlendAlpha: D3D11_BLEND(alpha_blend_source(source.alpha_source)),
            DestBlendAlpha: D3D11_BLEND(alpha_blend_source(source.alpha_destination)),
            BlendOpAlpha: D3D11_BLEND_OP(blend_operation(source.alpha_operation)),
            RenderTargetWriteMask: color_write_mask(source.write_mask),
        };
    }
    native
}

/// Fixed-function state objects of a graphics pipeline
pub(crate) struct GraphicsState {
    pub rasterizer: ID3D11RasterizerState,
    pub depth_stencil: ID3D11DepthStencilState,
    pub blend: ID3D11BlendState,
    pub topology: D3D_PRIMITIVE_TOPOLOGY,
}

pub struct D3D11PipelineState {
    id: ResourceId,
    description: PipelineStateDescription,
    pub(crate) compute: Option<ID3D11ComputeShader>,
    pub(crate) vertex: Option<ID3D11VertexShader>,
    pub(crate) geometry: Option<ID3D11GeometryShader>,
    pub(crate) pixel: Option<ID3D11PixelShader>,
    pub(crate) input_layout: Option<ID3D11InputLayout>,
    /// `None` for compute pipelines
    pub(crate) graphics: Option<GraphicsState>,
    _ticket: ResourceTicket,
}

// SAFETY: D3D11 device children are free-threaded; only contexts are not.
unsafe impl Send for D3D11PipelineState {}
unsafe impl Sync for D3D11PipelineState {}

impl D3D11PipelineState {
    pub fn create(device: &ID3D11Device, desc: &PipelineStateDescription, counters: &ResourceCounters) -> Result<Self> {
        let mut pipeline = Self {
            id: ResourceId::next(),
            description: desc.clone(),
            compute: None,
            vertex: None,
            geometry: None,
            pixel: None,
            input_layout: None,
            graphics: None,
            _ticket: counters.track(ResourceKind::PipelineState),
        };

        let mut vertex_bytecode = None;
        for (_, program) in desc.programs() {
            let native = downcast::<D3D11Program>(program.as_any(), program.name())?;
            match &native.shader {
                NativeShader::Compute(shader) => pipeline.compute = Some(shader.clone()),
                NativeShader::Vertex(shader) => {
                    pipeline.vertex = Some(shader.clone());
                    vertex_bytecode = Some(native.bytecode.as_slice());
                }
                NativeShader::Geometry(shader) => pipeline.geometry = Some(shader.clone()),
                NativeShader::Pixel(shader) => pipeline.pixel = Some(shader.clone()),
            }
        }

        if desc.is_compute() {
            return Ok(pipeline);
        }

        if !desc.input_layout.is_empty() {
            let Some(bytecode) = vertex_bytecode else {
                engine_bail_invalid!(SOURCE, "Pipeline '{}' has an input layout but no vertex program", desc.name);
            };
            pipeline.input_layout = Some(Self::create_input_layout(device, desc, bytecode)?);
        }

        let what = format!("Pipeline '{}'", desc.name);
        let mut rasterizer: Option<ID3D11RasterizerState> = None;
        check(
            unsafe { device.CreateRasterizerState(&rasterizer_desc(&desc.rasterizer), Some(&mut rasterizer)) },
            &what,
        )?;
        let mut depth_stencil: Option<ID3D11DepthStencilState> = None;
        check(
            unsafe { device.CreateDepthStencilState(&depth_stencil_desc(&desc.depth), Some(&mut depth_stencil)) },
            &what,
        )?;
        let mut blend: Option<ID3D11BlendState> = None;
        check(unsafe { device.CreateBlendState(&blend_desc(&desc.blend), Some(&mut blend)) }, &what)?;

        pipeline.graphics = Some(GraphicsState {
            rasterizer: created(rasterizer, "CreateRasterizerState")?,
            depth_stencil: created(depth_stencil, "CreateDepthStencilState")?,
            blend: created(blend, "CreateBlendState")?,
            topology: D3D_PRIMITIVE_TOPOLOGY(primitive_topology(desc.primitive_type)),
        });
        Ok(pipeline)
    }

    fn create_input_layout(
        device: &ID3D11Device,
        desc: &PipelineStateDescription,
        bytecode: &[u8],
    ) -> Result<ID3D11InputLayout> {
        let (resolved, _) = resolve_input_layout(&desc.input_layout);
        let elements: Vec<D3D11_INPUT_ELEMENT_DESC> = resolved
            .iter()
            .map(|resolved| {
                let element = &resolved.element;
                let (class, step_rate) = match element.source {
                    ElementSource::Vertex => (D3D11_INPUT_PER_VERTEX_DATA, 0),
                    ElementSource::Instance => (D3D11_INPUT_PER_INSTANCE_DATA, 1),
                };
                D3D11_INPUT_ELEMENT_DESC {
                    SemanticName: semantic_name(element.semantic),
                    SemanticIndex: element.semantic_index,
                    Format: DXGI_FORMAT(to_dxgi(element.format) as i32),
                    InputSlot: element.source_index,
                    AlignedByteOffset: resolved.offset,
                    InputSlotClass: class,
                    InstanceDataStepRate: step_rate,
                }
            })
            .collect();

        let what = format!("CreateInputLayout '{}'", desc.name);
        let mut layout: Option<ID3D11InputLayout> = None;
        check(unsafe { device.CreateInputLayout(&elements, bytecode, Some(&mut layout)) }, &what)?;
        let layout = created(layout, &what)?;
        set_debug_name(&layout, &desc.name);
        Ok(layout)
    }
}

impl Resource for D3D11PipelineState {
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

impl PipelineState for D3D11PipelineState {
    fn description(&self) -> &PipelineStateDescription {
        &self.description
    }
}
