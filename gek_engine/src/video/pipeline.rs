/// Input layouts and pipeline state description

use std::fmt;
use std::sync::Arc;

use crate::video::state::{BlendStateDescription, DepthStateDescription, RasterizerStateDescription};
use crate::video::{Format, PipelineType, Program, Resource};

/// Offset value that places an element right after the previous element of the same slot
pub const APPEND_ALIGNED: u32 = u32::MAX;

/// Maximum number of vertex buffer slots
pub const MAX_VERTEX_BUFFERS: usize = 16;

/// Vertex element semantic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Tangent,
    BiTangent,
    Normal,
    Color,
    TexCoord,
}

impl Semantic {
    /// HLSL semantic name
    pub fn hlsl_name(self) -> &'static str {
        match self {
            Semantic::Position => "POSITION",
            Semantic::Tangent => "TANGENT",
            Semantic::BiTangent => "BINORMAL",
            Semantic::Normal => "NORMAL",
            Semantic::Color => "COLOR",
            Semantic::TexCoord => "TEXCOORD",
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hlsl_name())
    }
}

/// Vertex input rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementSource {
    #[default]
    Vertex,
    Instance,
}

/// One element of an input layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputElement {
    pub format: Format,
    pub semantic: Semantic,
    pub semantic_index: u32,
    pub source: ElementSource,
    /// Vertex buffer slot
    pub source_index: u32,
    /// Byte offset inside the vertex, or `APPEND_ALIGNED`
    pub aligned_byte_offset: u32,
}

impl InputElement {
    /// Per-vertex element appended after the previous one in slot 0
    pub fn new(format: Format, semantic: Semantic, semantic_index: u32) -> Self {
        Self {
            format,
            semantic,
            semantic_index,
            source: ElementSource::Vertex,
            source_index: 0,
            aligned_byte_offset: APPEND_ALIGNED,
        }
    }

    /// Per-instance element appended after the previous one in `slot`
    pub fn instance(format: Format, semantic: Semantic, semantic_index: u32, slot: u32) -> Self {
        Self {
            source: ElementSource::Instance,
            source_index: slot,
            ..Self::new(format, semantic, semantic_index)
        }
    }
}

/// An input element with its offset resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedElement {
    /// Shader input location (index in the layout)
    pub location: u32,
    pub element: InputElement,
    pub offset: u32,
}

/// Resolve `APPEND_ALIGNED` offsets and compute per-slot strides
///
/// Returns the resolved elements in layout order and the stride of each
/// vertex buffer slot (0 for unused slots).
pub fn resolve_input_layout(
    elements: &[InputElement],
) -> (Vec<ResolvedElement>, [u32; MAX_VERTEX_BUFFERS]) {
    let mut cursors = [0u32; MAX_VERTEX_BUFFERS];
    let mut strides = [0u32; MAX_VERTEX_BUFFERS];
    let mut resolved = Vec::with_capacity(elements.len());

    for (location, element) in elements.iter().enumerate() {
        let slot = (element.source_index as usize).min(MAX_VERTEX_BUFFERS - 1);
        let offset = if element.aligned_byte_offset == APPEND_ALIGNED {
            cursors[slot]
        } else {
            element.aligned_byte_offset
        };
        let end = offset + element.format.stride();
        cursors[slot] = end;
        strides[slot] = strides[slot].max(end);
        resolved.push(ResolvedElement {
            location: location as u32,
            element: *element,
            offset,
        });
    }

    (resolved, strides)
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

/// Everything needed to build an immutable pipeline state
#[derive(Clone)]
pub struct PipelineStateDescription {
    pub name: String,
    /// Compute program; when set, the graphics programs must be absent
    pub compute_program: Option<Arc<dyn Program>>,
    pub vertex_program: Option<Arc<dyn Program>>,
    pub geometry_program: Option<Arc<dyn Program>>,
    pub pixel_program: Option<Arc<dyn Program>>,
    pub input_layout: Vec<InputElement>,
    pub primitive_type: PrimitiveType,
    pub rasterizer: RasterizerStateDescription,
    pub depth: DepthStateDescription,
    pub blend: BlendStateDescription,
    pub sample_mask: u32,
    /// Formats of the render targets the pipeline draws into
    pub render_target_formats: Vec<Format>,
    /// Format of the depth target (`Unknown` when none)
    pub depth_format: Format,
}

impl Default for PipelineStateDescription {
    fn default() -> Self {
        Self {
            name: String::new(),
            compute_program: None,
            vertex_program: None,
            geometry_program: None,
            pixel_program: None,
            input_layout: Vec::new(),
            primitive_type: PrimitiveType::TriangleList,
            rasterizer: RasterizerStateDescription::default(),
            depth: DepthStateDescription::default(),
            blend: BlendStateDescription::default(),
            sample_mask: u32::MAX,
            render_target_formats: Vec::new(),
            depth_format: Format::Unknown,
        }
    }
}

impl PipelineStateDescription {
    /// Compute pipeline wrapping a single program
    pub fn compute(name: &str, program: Arc<dyn Program>) -> Self {
        Self {
            name: name.to_string(),
            compute_program: Some(program),
            ..Default::default()
        }
    }

    /// True for compute pipelines
    pub fn is_compute(&self) -> bool {
        self.compute_program.is_some()
    }

    /// Programs paired with the stage they are bound to
    pub fn programs(&self) -> Vec<(PipelineType, &Arc<dyn Program>)> {
        let slots = [
            (PipelineType::Compute, &self.compute_program),
            (PipelineType::Vertex, &self.vertex_program),
            (PipelineType::Geometry, &self.geometry_program),
            (PipelineType::Pixel, &self.pixel_program),
        ];
        slots
            .into_iter()
            .filter_map(|(stage, program)| program.as_ref().map(|program| (stage, program)))
            .collect()
    }
}

impl fmt::Debug for PipelineStateDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let programs: Vec<String> = self
            .programs()
            .iter()
            .map(|(stage, program)| format!("{}:{}", stage, program.name()))
            .collect();
        f.debug_struct("PipelineStateDescription")
            .field("name", &self.name)
            .field("programs", &programs)
            .field("input_layout", &self.input_layout)
            .field("primitive_type", &self.primitive_type)
            .field("render_target_formats", &self.render_target_formats)
            .field("depth_format", &self.depth_format)
            .finish()
    }
}

/// Immutable pipeline state object
pub trait PipelineState: Resource {
    /// Description the pipeline was created with
    fn description(&self) -> &PipelineStateDescription;

    /// True for compute pipelines
    fn is_compute(&self) -> bool {
        self.description().is_compute()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
