/// Pipeline state - linked GL program plus the vertex array for its input layout
///
/// Fixed-function state stays in the description and is applied by the
/// immediate context when the pipeline is bound.

use std::any::Any;
use std::sync::Arc;

use glow::HasContext;
use rustc_hash::FxHashMap;

use gek_engine::gek::video::pipeline::MAX_VERTEX_BUFFERS;
use gek_engine::gek::video::resource::downcast;
use gek_engine::gek::video::{
    resolve_input_layout, BindingKind, ElementSource, PipelineState, PipelineStateDescription, Resource,
    ResourceCounters, ResourceId, ResourceKind, ResourceTicket,
};
use gek_engine::gek::{Error, Result};
use gek_engine::{engine_bail_invalid, engine_err, engine_error, engine_warn};

use crate::opengl_deletion::{DeletionQueue, GlObject};
use crate::opengl_format::vertex_attribute;
use crate::opengl_program::OpenGlProgram;
use crate::opengl_state::primitive_mode;

const SOURCE: &str = "gek::video::opengl";

pub struct OpenGlPipelineState {
    id: ResourceId,
    description: PipelineStateDescription,
    pub(crate) program: glow::NativeProgram,
    /// Vertex fetch setup (graphics pipelines only)
    pub(crate) vertex_array: Option<glow::NativeVertexArray>,
    /// Byte stride of each vertex buffer slot
    pub(crate) strides: [u32; MAX_VERTEX_BUFFERS],
    /// GL primitive mode for draws
    pub(crate) mode: u32,
    deletion: Arc<DeletionQueue>,
    _ticket: ResourceTicket,
}

impl OpenGlPipelineState {
    pub fn create(
        gl: &glow::Context,
        desc: &PipelineStateDescription,
        deletion: &Arc<DeletionQueue>,
        counters: &ResourceCounters,
    ) -> Result<Self> {
        let mut programs = Vec::new();
        for (_, program) in desc.programs() {
            programs.push(downcast::<OpenGlProgram>(program.as_any(), program.name())?);
        }
        warn_on_binding_conflicts(&desc.name, &programs);

        let program = Self::link(gl, desc, &programs)?;

        let (vertex_array, strides) = if desc.is_compute() {
            (None, [0; MAX_VERTEX_BUFFERS])
        } else {
            match Self::build_vertex_array(gl, desc) {
                Ok(result) => result,
                Err(error) => {
                    unsafe { gl.delete_program(program) };
                    return Err(error);
                }
            }
        };

        Ok(Self {
            id: ResourceId::next(),
            description: desc.clone(),
            program,
            vertex_array,
            strides,
            mode: primitive_mode(desc.primitive_type),
            deletion: deletion.clone(),
            _ticket: counters.track(ResourceKind::PipelineState),
        })
    }

    fn link(gl: &glow::Context, desc: &PipelineStateDescription, programs: &[&OpenGlProgram]) -> Result<glow::NativeProgram> {
        let program = unsafe { gl.create_program() }
            .map_err(|error| engine_err!(SOURCE, "Unable to create program for '{}': {}", desc.name, error))?;
        unsafe {
            for stage in programs {
                gl.attach_shader(program, stage.shader);
            }
            gl.link_program(program);
            for stage in programs {
                gl.detach_shader(program, stage.shader);
            }
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                let message = format!("Unable to link pipeline '{}':\n{}", desc.name, log.trim());
                engine_error!(SOURCE, "{}", message);
                return Err(Error::CompilationFailed(message));
            }
        }
        Ok(program)
    }

    fn build_vertex_array(
        gl: &glow::Context,
        desc: &PipelineStateDescription,
    ) -> Result<(Option<glow::NativeVertexArray>, [u32; MAX_VERTEX_BUFFERS])> {
        let (elements, strides) = resolve_input_layout(&desc.input_layout);

        // Check every element before creating anything
        let mut attributes = Vec::with_capacity(elements.len());
        for resolved in &elements {
            let Some(attribute) = vertex_attribute(resolved.element.format) else {
                engine_bail_invalid!(
                    SOURCE,
                    "Pipeline '{}' input {}{} uses {}, which GL cannot fetch",
                    desc.name, resolved.element.semantic, resolved.element.semantic_index, resolved.element.format
                );
            };
            attributes.push((resolved, attribute));
        }

        let vertex_array = unsafe { gl.create_vertex_array() }
            .map_err(|error| engine_err!(SOURCE, "Unable to create vertex array for '{}': {}", desc.name, error))?;
        unsafe {
            gl.bind_vertex_array(Some(vertex_array));
            for (resolved, attribute) in attributes {
                let location = resolved.location;
                let slot = resolved.element.source_index;
                gl.enable_vertex_attrib_array(location);
                if attribute.integer {
                    gl.vertex_attrib_format_i32(location, attribute.components, attribute.data_type, resolved.offset);
                } else {
                    gl.vertex_attrib_format_f32(
                        location,
                        attribute.components,
                        attribute.data_type,
                        attribute.normalized,
                        resolved.offset,
                    );
                }
                gl.vertex_attrib_binding(location, slot);
                let divisor = match resolved.element.source {
                    ElementSource::Vertex => 0,
                    ElementSource::Instance => 1,
                };
                gl.vertex_binding_divisor(slot, divisor);
            }
            gl.bind_vertex_array(None);
        }
        Ok((Some(vertex_array), strides))
    }
}

/// Log reflected bindings that two stages place in the same slot under different names
fn warn_on_binding_conflicts(pipeline: &str, programs: &[&OpenGlProgram]) {
    let mut seen: FxHashMap<(BindingKind, u32), &str> = FxHashMap::default();
    for program in programs {
        for binding in program.bindings() {
            match seen.get(&(binding.kind, binding.slot)) {
                Some(existing) if *existing != binding.name => {
                    engine_warn!(
                        SOURCE,
                        "Pipeline '{}': {:?} slot {} is '{}' in one stage and '{}' in {}",
                        pipeline, binding.kind, binding.slot, existing, binding.name, program.name()
                    );
                }
                Some(_) => {}
                None => {
                    seen.insert((binding.kind, binding.slot), &binding.name);
                }
            }
        }
    }
}

impl Resource for OpenGlPipelineState {
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

impl PipelineState for OpenGlPipelineState {
    fn description(&self) -> &PipelineStateDescription {
        &self.description
    }
}

impl Drop for OpenGlPipelineState {
    fn drop(&mut self) {
        self.deletion.push(GlObject::Program(self.program));
        if let Some(vertex_array) = self.vertex_array {
            self.deletion.push(GlObject::VertexArray(vertex_array));
        }
    }
}
