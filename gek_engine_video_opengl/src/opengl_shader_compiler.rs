/// HLSL to GLSL through external tools
///
/// `dxc` compiles HLSL to SPIR-V, the SPIR-V is reflected with spirq, and
/// `spirv-cross` turns it into GLSL 4.50 for the driver. Every compile runs
/// in a fresh temporary directory that is removed when it finishes. The
/// tools block the calling thread; there is no timeout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use gek_engine::gek::config::ShaderToolConfig;
use gek_engine::gek::video::{BindingKind, CompiledProgram, PipelineType, ProgramBinding, ShaderLanguage};
use gek_engine::gek::{Error, Result};
use gek_engine::{engine_debug, engine_error};

const SOURCE: &str = "gek::video::opengl::compiler";

/// Unordered-access registers (`u#`) are shifted past the other bindings
pub const UNORDERED_ACCESS_SHIFT: u32 = 8;

const DXC_NAMES: &[&str] = &["dxc", "dxc.exe"];
const SPIRV_CROSS_NAMES: &[&str] = &["spirv-cross", "spirv-cross.exe"];

fn compilation_failed(message: String) -> Error {
    engine_error!(SOURCE, "{}", message);
    Error::CompilationFailed(message)
}

// ============================================================================
// ARGUMENTS
// ============================================================================

/// Shader model 6.0 profile for dxc
pub fn dxc_profile(pipeline: PipelineType) -> &'static str {
    match pipeline {
        PipelineType::Compute => "cs_6_0",
        PipelineType::Vertex => "vs_6_0",
        PipelineType::Geometry => "gs_6_0",
        PipelineType::Pixel => "ps_6_0",
    }
}

/// File name stem for a program name (anything but `[A-Za-z0-9_-]` becomes `_`)
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "program".to_string()
    } else {
        stem
    }
}

pub fn dxc_arguments(pipeline: PipelineType, entry_point: &str, input: &Path, output: &Path) -> Vec<OsString> {
    let shift = UNORDERED_ACCESS_SHIFT.to_string();
    vec![
        "-spirv".into(),
        "-T".into(),
        dxc_profile(pipeline).into(),
        "-E".into(),
        entry_point.into(),
        "-fvk-u-shift".into(),
        shift.into(),
        "all".into(),
        "-Fo".into(),
        output.as_os_str().to_owned(),
        input.as_os_str().to_owned(),
    ]
}

pub fn spirv_cross_arguments(pipeline: PipelineType, input: &Path, output: &Path) -> Vec<OsString> {
    let mut arguments: Vec<OsString> = vec![
        input.as_os_str().to_owned(),
        "--version".into(),
        "450".into(),
        "--no-es".into(),
        "--combined-samplers-inherit-bindings".into(),
    ];
    if pipeline == PipelineType::Vertex {
        arguments.push("--fixup-clipspace".into());
    }
    arguments.push("--output".into());
    arguments.push(output.as_os_str().to_owned());
    arguments
}

// ============================================================================
// TOOLS
// ============================================================================

/// Locate a tool: the configured path, then each candidate name on `PATH`
pub fn resolve_tool(configured: Option<&Path>, candidates: &[&str]) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }
    candidates.iter().find_map(|candidate| which::which(candidate).ok())
}

fn format_output(output: &Output) -> String {
    let mut message = format!("status: {}", output.status);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    // dxc prints diagnostics on stderr, spirv-cross on either
    for (label, text) in [("stderr", stderr.trim()), ("stdout", stdout.trim())] {
        if !text.is_empty() {
            message.push_str(&format!("\n{}:\n{}", label, text));
        }
    }
    message
}

fn run_tool(tool: &Path, arguments: &[OsString], directory: &Path, program: &str) -> Result<()> {
    engine_debug!(SOURCE, "Running {} for '{}'", tool.display(), program);
    let output = Command::new(tool)
        .args(arguments)
        .current_dir(directory)
        .output()
        .map_err(|error| {
            compilation_failed(format!("Unable to run {} for '{}': {}", tool.display(), program, error))
        })?;
    if !output.status.success() {
        return Err(compilation_failed(format!(
            "{} failed on '{}'\n{}",
            tool.display(),
            program,
            format_output(&output)
        )));
    }
    Ok(())
}

fn read_output(path: &Path, tool: &str, program: &str) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|error| {
        compilation_failed(format!("{} produced no output for '{}': {}", tool, program, error))
    })?;
    if bytes.is_empty() {
        return Err(compilation_failed(format!("{} produced an empty file for '{}'", tool, program)));
    }
    Ok(bytes)
}

// ============================================================================
// REFLECTION
// ============================================================================

/// SPIR-V descriptor class, as far as the GL binding model cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorClass {
    UniformBuffer,
    /// `StructuredBuffer` / `ByteAddressBuffer` on a `t#` register
    ReadOnlyStorageBuffer,
    /// `RW*Buffer` on a `u#` register
    StorageBuffer,
    SampledImage,
    StorageImage,
    Sampler,
}

/// Engine binding kind and slot of a SPIR-V binding
///
/// Writable storage buffers and images came from `u#` registers and sit
/// `UNORDERED_ACCESS_SHIFT` past their slot.
pub fn classify_binding(class: DescriptorClass, binding: u32) -> (BindingKind, u32) {
    match class {
        DescriptorClass::UniformBuffer => (BindingKind::ConstantBuffer, binding),
        DescriptorClass::ReadOnlyStorageBuffer | DescriptorClass::SampledImage => (BindingKind::Resource, binding),
        DescriptorClass::Sampler => (BindingKind::Sampler, binding),
        DescriptorClass::StorageBuffer | DescriptorClass::StorageImage => (
            BindingKind::UnorderedAccess,
            binding.saturating_sub(UNORDERED_ACCESS_SHIFT),
        ),
    }
}

/// Read-only storage buffers share GL's storage-buffer bindings with the
/// shifted unordered-access range, so they must stay below it
pub fn check_storage_binding(class: DescriptorClass, binding: u32, program: &str) -> Result<()> {
    if class == DescriptorClass::ReadOnlyStorageBuffer && binding >= UNORDERED_ACCESS_SHIFT {
        return Err(compilation_failed(format!(
            "Structured buffer on t{} in '{}' overlaps u{}; buffer resources must use t0..t{}",
            binding,
            program,
            binding - UNORDERED_ACCESS_SHIFT,
            UNORDERED_ACCESS_SHIFT - 1
        )));
    }
    Ok(())
}

fn descriptor_class(desc_ty: &spirq::ty::DescriptorType) -> Option<DescriptorClass> {
    use spirq::ty::{AccessType, DescriptorType};
    match desc_ty {
        DescriptorType::UniformBuffer(..) => Some(DescriptorClass::UniformBuffer),
        DescriptorType::StorageBuffer(AccessType::ReadOnly) => Some(DescriptorClass::ReadOnlyStorageBuffer),
        DescriptorType::StorageBuffer(..) => Some(DescriptorClass::StorageBuffer),
        DescriptorType::SampledImage(..)
        | DescriptorType::CombinedImageSampler(..)
        | DescriptorType::UniformTexelBuffer(..) => Some(DescriptorClass::SampledImage),
        DescriptorType::StorageImage(..) | DescriptorType::StorageTexelBuffer(..) => {
            Some(DescriptorClass::StorageImage)
        }
        DescriptorType::Sampler(..) => Some(DescriptorClass::Sampler),
        _ => None,
    }
}

fn spirv_words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect()
}

/// Reflect the descriptor bindings of a SPIR-V module
pub fn reflect_bindings(spirv: &[u8], program: &str) -> Result<Vec<ProgramBinding>> {
    let words = spirv_words(spirv);
    let entry_points = spirq::ReflectConfig::new()
        .spv(words.as_slice())
        .ref_all_rscs(true)
        .reflect()
        .map_err(|error| compilation_failed(format!("SPIR-V reflection of '{}' failed: {:?}", program, error)))?;

    let mut bindings = Vec::new();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::Descriptor { name, desc_bind, desc_ty, .. } = var {
                let Some(class) = descriptor_class(desc_ty) else {
                    continue;
                };
                check_storage_binding(class, desc_bind.bind(), program)?;
                let (kind, slot) = classify_binding(class, desc_bind.bind());
                let binding = ProgramBinding {
                    name: name.clone().unwrap_or_default(),
                    kind,
                    slot,
                };
                if !bindings.contains(&binding) {
                    bindings.push(binding);
                }
            }
        }
    }
    Ok(bindings)
}

// ============================================================================
// COMPILER
// ============================================================================

/// Runs the dxc / spirv-cross chain
#[derive(Debug, Clone)]
pub struct ShaderCompiler {
    tools: ShaderToolConfig,
}

impl ShaderCompiler {
    /// Explicit paths from `tools`, then the environment, then `PATH`
    pub fn new(tools: &ShaderToolConfig) -> Self {
        Self {
            tools: tools.clone().or(ShaderToolConfig::from_env()),
        }
    }

    fn tool(&self, configured: Option<&Path>, names: &[&str], variable: &str) -> Result<PathBuf> {
        resolve_tool(configured, names).ok_or_else(|| {
            compilation_failed(format!(
                "{} not found; set {} or add it to PATH",
                names[0], variable
            ))
        })
    }

    pub fn compile(
        &self,
        pipeline: PipelineType,
        name: &str,
        source: &str,
        entry_point: &str,
    ) -> Result<CompiledProgram> {
        let dxc = self.tool(self.tools.dxc.as_deref(), DXC_NAMES, gek_engine::gek::config::DXC_ENV)?;
        let spirv_cross = self.tool(
            self.tools.spirv_cross.as_deref(),
            SPIRV_CROSS_NAMES,
            gek_engine::gek::config::SPIRV_CROSS_ENV,
        )?;

        let directory = tempfile::tempdir()
            .map_err(|error| compilation_failed(format!("Unable to create a work directory: {}", error)))?;
        let stem = file_stem(name);
        let hlsl = directory.path().join(format!("{}.hlsl", stem));
        let spv = directory.path().join(format!("{}.spv", stem));
        let glsl = directory.path().join(format!("{}.glsl", stem));

        std::fs::write(&hlsl, source)
            .map_err(|error| compilation_failed(format!("Unable to write '{}': {}", hlsl.display(), error)))?;

        run_tool(&dxc, &dxc_arguments(pipeline, entry_point, &hlsl, &spv), directory.path(), name)?;
        let spirv = read_output(&spv, "dxc", name)?;
        let bindings = reflect_bindings(&spirv, name)?;

        run_tool(&spirv_cross, &spirv_cross_arguments(pipeline, &spv, &glsl), directory.path(), name)?;
        let bytecode = read_output(&glsl, "spirv-cross", name)?;

        engine_debug!(
            SOURCE,
            "Compiled {} program '{}' ({} bytes of GLSL, {} bindings)",
            pipeline, name, bytecode.len(), bindings.len()
        );
        Ok(CompiledProgram {
            pipeline,
            name: name.to_string(),
            entry_point: entry_point.to_string(),
            language: ShaderLanguage::Glsl,
            bytecode,
            bindings,
        })
    }
}

#[cfg(test)]
#[path = "opengl_shader_compiler_tests.rs"]
mod tests;
