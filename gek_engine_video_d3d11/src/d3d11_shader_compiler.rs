/// HLSL compilation through `D3DCompile`
///
/// Shader model 5.0 profiles; the output is a DXBC blob. Compiler errors
/// never abort: the error text comes back as `Error::CompilationFailed`.

use gek_engine::gek::video::PipelineType;

pub const D3DCOMPILE_DEBUG: u32 = 1 << 0;
pub const D3DCOMPILE_SKIP_OPTIMIZATION: u32 = 1 << 2;
pub const D3DCOMPILE_ENABLE_STRICTNESS: u32 = 1 << 11;
pub const D3DCOMPILE_OPTIMIZATION_LEVEL3: u32 = 1 << 15;

/// Target profile of a pipeline stage
pub fn shader_profile(pipeline: PipelineType) -> &'static str {
    match pipeline {
        PipelineType::Compute => "cs_5_0",
        PipelineType::Vertex => "vs_5_0",
        PipelineType::Geometry => "gs_5_0",
        PipelineType::Pixel => "ps_5_0",
    }
}

/// `D3DCompile` flags
pub fn compile_flags(debug: bool) -> u32 {
    if debug {
        D3DCOMPILE_ENABLE_STRICTNESS | D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        D3DCOMPILE_ENABLE_STRICTNESS | D3DCOMPILE_OPTIMIZATION_LEVEL3
    }
}

/// Compiler messages as text, without the trailing NUL
pub fn message_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\0').trim_end().to_string()
}

#[cfg(windows)]
pub use native::compile;

#[cfg(windows)]
mod native {
    use std::ffi::CString;

    use windows::core::PCSTR;
    use windows::Win32::Graphics::Direct3D::Fxc::D3DCompile;
    use windows::Win32::Graphics::Direct3D::ID3DBlob;

    use gek_engine::gek::video::{CompiledProgram, PipelineType, ShaderLanguage};
    use gek_engine::gek::{Error, Result};
    use gek_engine::{engine_bail_invalid, engine_debug, engine_error, engine_warn};

    use super::{compile_flags, message_text, shader_profile};

    const SOURCE: &str = "gek::video::d3d11::ShaderCompiler";

    fn blob_bytes(blob: &ID3DBlob) -> Vec<u8> {
        unsafe { std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize()).to_vec() }
    }

    fn c_string(value: &str, what: &str) -> Result<CString> {
        match CString::new(value) {
            Ok(value) => Ok(value),
            Err(_) => engine_bail_invalid!(SOURCE, "{} '{}' contains a NUL byte", what, value),
        }
    }

    /// Compile `source` into a DXBC program
    pub fn compile(
        pipeline: PipelineType,
        name: &str,
        source: &str,
        entry_point: &str,
        debug: bool,
    ) -> Result<CompiledProgram> {
        let source_name = c_string(name, "Program name")?;
        let entry = c_string(entry_point, "Entry point")?;
        let profile = c_string(shader_profile(pipeline), "Profile")?;

        let mut code: Option<ID3DBlob> = None;
        let mut errors: Option<ID3DBlob> = None;
        let result = unsafe {
            D3DCompile(
                source.as_ptr().cast(),
                source.len(),
                PCSTR(source_name.as_ptr().cast()),
                None,
                None,
                PCSTR(entry.as_ptr().cast()),
                PCSTR(profile.as_ptr().cast()),
                compile_flags(debug),
                0,
                &mut code,
                Some(&mut errors),
            )
        };
        let messages = errors.as_ref().map(|blob| message_text(&blob_bytes(blob))).unwrap_or_default();

        let bytecode = match (result, code) {
            (Ok(()), Some(code)) => blob_bytes(&code),
            (Ok(()), None) => Vec::new(),
            (Err(error), _) => {
                let text = if messages.is_empty() { error.message() } else { messages };
                engine_error!(SOURCE, "Unable to compile {} program '{}':\n{}", pipeline, name, text);
                return Err(Error::CompilationFailed(text));
            }
        };
        if bytecode.is_empty() {
            let message = format!("D3DCompile produced no bytecode for '{}'", name);
            engine_error!(SOURCE, "{}", message);
            return Err(Error::CompilationFailed(message));
        }
        if !messages.is_empty() {
            engine_warn!(SOURCE, "Program '{}' compiled with warnings:\n{}", name, messages);
        }

        engine_debug!(SOURCE, "Compiled {} program '{}' ({} bytes)", pipeline, name, bytecode.len());
        Ok(CompiledProgram {
            pipeline,
            name: name.to_string(),
            entry_point: entry_point.to_string(),
            language: ShaderLanguage::Dxbc,
            bytecode,
            bindings: Vec::new(),
        })
    }
}

#[cfg(test)]
#[path = "d3d11_shader_compiler_tests.rs"]
mod tests;
