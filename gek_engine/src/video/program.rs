/// Shader programs: compiled output, reflected bindings and the program trait

use std::fmt;

use crate::error::Result;
use crate::video::{Device, Resource};

/// Pipeline stage a program runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineType {
    Compute,
    Vertex,
    Geometry,
    Pixel,
}

impl PipelineType {
    /// Every stage, in binding order
    pub const ALL: [PipelineType; 4] = [
        PipelineType::Compute,
        PipelineType::Vertex,
        PipelineType::Geometry,
        PipelineType::Pixel,
    ];

    /// Dense index for per-stage binding tables
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short lowercase name used in log messages
    pub fn label(self) -> &'static str {
        match self {
            PipelineType::Compute => "compute",
            PipelineType::Vertex => "vertex",
            PipelineType::Geometry => "geometry",
            PipelineType::Pixel => "pixel",
        }
    }
}

impl fmt::Display for PipelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Representation of `CompiledProgram::bytecode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderLanguage {
    /// Direct3D bytecode blob
    Dxbc,
    /// GLSL source text (UTF-8)
    Glsl,
}

/// Kind of resource a shader binding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    ConstantBuffer,
    Resource,
    UnorderedAccess,
    Sampler,
}

/// Reflected shader binding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramBinding {
    /// Variable name in the shader
    pub name: String,
    pub kind: BindingKind,
    /// Binding slot after register shifting
    pub slot: u32,
}

/// Result of compiling a shader for one backend
///
/// `bytecode` is never empty for a successfully compiled program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledProgram {
    pub pipeline: PipelineType,
    pub name: String,
    pub entry_point: String,
    pub language: ShaderLanguage,
    pub bytecode: Vec<u8>,
    pub bindings: Vec<ProgramBinding>,
}

impl CompiledProgram {
    /// Bytecode as text (GLSL programs)
    pub fn source_text(&self) -> Option<&str> {
        match self.language {
            ShaderLanguage::Glsl => std::str::from_utf8(&self.bytecode).ok(),
            ShaderLanguage::Dxbc => None,
        }
    }

    /// Reflected binding by variable name
    pub fn binding(&self, name: &str) -> Option<&ProgramBinding> {
        self.bindings.iter().find(|binding| binding.name == name)
    }
}

/// Backend program object
pub trait Program: Resource {
    /// Stage the program was compiled for
    fn pipeline(&self) -> PipelineType;

    /// Entry point the program was compiled from
    fn entry_point(&self) -> &str;
}

/// Compile `source`, falling back to `fallback_source` when compilation fails
///
/// The failure is logged as a warning and the fallback compiled with the
/// same entry point. An error is only returned when the fallback fails too.
pub fn compile_or_fallback(
    device: &dyn Device,
    pipeline: PipelineType,
    name: &str,
    source: &str,
    entry_point: &str,
    fallback_source: &str,
) -> Result<CompiledProgram> {
    match device.compile_program(pipeline, name, source, entry_point) {
        Ok(program) => Ok(program),
        Err(error) => {
            crate::engine_warn!(
                "gek::video::Program",
                "Unable to compile {} program '{}', using fallback: {}",
                pipeline, name, error
            );
            let fallback_name = format!("{}_fallback", name);
            device.compile_program(pipeline, &fallback_name, fallback_source, entry_point)
        }
    }
}
