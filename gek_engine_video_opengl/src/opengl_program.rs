/// Program - a driver-compiled GLSL shader object
///
/// Programs are linked into a GL program object by the pipeline state that
/// uses them.

use std::any::Any;
use std::sync::Arc;

use glow::HasContext;

use gek_engine::gek::video::{
    CompiledProgram, PipelineType, Program, ProgramBinding, Resource, ResourceCounters, ResourceId, ResourceKind,
    ResourceTicket, ShaderLanguage,
};
use gek_engine::gek::{Error, Result};
use gek_engine::{engine_bail_invalid, engine_err, engine_error};

use crate::opengl_deletion::{DeletionQueue, GlObject};

const SOURCE: &str = "gek::video::opengl";

/// GL shader type of a pipeline stage
pub fn shader_type(pipeline: PipelineType) -> u32 {
    match pipeline {
        PipelineType::Compute => glow::COMPUTE_SHADER,
        PipelineType::Vertex => glow::VERTEX_SHADER,
        PipelineType::Geometry => glow::GEOMETRY_SHADER,
        PipelineType::Pixel => glow::FRAGMENT_SHADER,
    }
}

pub struct OpenGlProgram {
    id: ResourceId,
    name: String,
    pipeline: PipelineType,
    entry_point: String,
    pub(crate) shader: glow::NativeShader,
    bindings: Vec<ProgramBinding>,
    deletion: Arc<DeletionQueue>,
    _ticket: ResourceTicket,
}

impl OpenGlProgram {
    pub fn create(
        gl: &glow::Context,
        compiled: &CompiledProgram,
        deletion: &Arc<DeletionQueue>,
        counters: &ResourceCounters,
    ) -> Result<Self> {
        if compiled.language != ShaderLanguage::Glsl {
            engine_bail_invalid!(
                SOURCE,
                "Program '{}' holds {:?} bytecode, the OpenGL device needs GLSL",
                compiled.name, compiled.language
            );
        }
        let Some(source) = compiled.source_text() else {
            engine_bail_invalid!(SOURCE, "Program '{}' is not valid UTF-8 GLSL", compiled.name);
        };

        let shader = unsafe { gl.create_shader(shader_type(compiled.pipeline)) }
            .map_err(|error| engine_err!(SOURCE, "Unable to create shader '{}': {}", compiled.name, error))?;
        unsafe {
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                let message = format!(
                    "Driver rejected {} program '{}':\n{}",
                    compiled.pipeline,
                    compiled.name,
                    log.trim()
                );
                engine_error!(SOURCE, "{}", message);
                return Err(Error::CompilationFailed(message));
            }
        }

        Ok(Self {
            id: ResourceId::next(),
            name: compiled.name.clone(),
            pipeline: compiled.pipeline,
            entry_point: compiled.entry_point.clone(),
            shader,
            bindings: compiled.bindings.clone(),
            deletion: deletion.clone(),
            _ticket: counters.track(ResourceKind::Program),
        })
    }

    /// Bindings reflected when the program was compiled
    pub fn bindings(&self) -> &[ProgramBinding] {
        &self.bindings
    }
}

impl Resource for OpenGlProgram {
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

impl Program for OpenGlProgram {
    fn pipeline(&self) -> PipelineType {
        self.pipeline
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

impl Drop for OpenGlProgram {
    fn drop(&mut self) {
        self.deletion.push(GlObject::Shader(self.shader));
    }
}
