//! Unit tests for the dxc / spirv-cross chain
//!
//! Argument building and binding classification are pure. Failure paths
//! run stand-in tools, so dxc and spirv-cross need not be installed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use gek_engine::gek::config::ShaderToolConfig;
use gek_engine::gek::video::{BindingKind, PipelineType};
use gek_engine::gek::Error;

use crate::opengl_shader_compiler::*;

fn strings(arguments: &[OsString]) -> Vec<String> {
    arguments.iter().map(|argument| argument.to_string_lossy().into_owned()).collect()
}

// ============================================================================
// ARGUMENTS
// ============================================================================

#[test]
fn test_dxc_profiles() {
    assert_eq!(dxc_profile(PipelineType::Vertex), "vs_6_0");
    assert_eq!(dxc_profile(PipelineType::Geometry), "gs_6_0");
    assert_eq!(dxc_profile(PipelineType::Pixel), "ps_6_0");
    assert_eq!(dxc_profile(PipelineType::Compute), "cs_6_0");
}

#[test]
fn test_dxc_arguments() {
    let arguments = dxc_arguments(
        PipelineType::Pixel,
        "mainPixelProgram",
        Path::new("lighting.hlsl"),
        Path::new("lighting.spv"),
    );
    assert_eq!(
        strings(&arguments),
        vec![
            "-spirv", "-T", "ps_6_0", "-E", "mainPixelProgram", "-fvk-u-shift", "8", "all", "-Fo",
            "lighting.spv", "lighting.hlsl",
        ]
    );
}

#[test]
fn test_spirv_cross_fixes_clip_space_for_vertex_only() {
    let vertex = strings(&spirv_cross_arguments(
        PipelineType::Vertex,
        Path::new("a.spv"),
        Path::new("a.glsl"),
    ));
    assert_eq!(
        vertex,
        vec![
            "a.spv",
            "--version",
            "450",
            "--no-es",
            "--combined-samplers-inherit-bindings",
            "--fixup-clipspace",
            "--output",
            "a.glsl",
        ]
    );

    let pixel = strings(&spirv_cross_arguments(PipelineType::Pixel, Path::new("a.spv"), Path::new("a.glsl")));
    assert!(!pixel.contains(&"--fixup-clipspace".to_string()));
    assert_eq!(pixel.last().map(String::as_str), Some("a.glsl"));
}

#[test]
fn test_file_stem() {
    assert_eq!(file_stem("deferred/lighting pass"), "deferred_lighting_pass");
    assert_eq!(file_stem("blur-x_2"), "blur-x_2");
    assert_eq!(file_stem(""), "program");
}

// ============================================================================
// BINDINGS
// ============================================================================

#[test]
fn test_classify_binding() {
    assert_eq!(classify_binding(DescriptorClass::UniformBuffer, 1), (BindingKind::ConstantBuffer, 1));
    assert_eq!(classify_binding(DescriptorClass::SampledImage, 3), (BindingKind::Resource, 3));
    assert_eq!(classify_binding(DescriptorClass::Sampler, 0), (BindingKind::Sampler, 0));
    assert_eq!(classify_binding(DescriptorClass::StorageImage, 9), (BindingKind::UnorderedAccess, 1));
}

#[test]
fn test_storage_buffers_split_on_access() {
    // StructuredBuffer<T> on t2 stays a resource, RWStructuredBuffer<T> on u0 lands at 8
    assert_eq!(classify_binding(DescriptorClass::ReadOnlyStorageBuffer, 2), (BindingKind::Resource, 2));
    assert_eq!(
        classify_binding(DescriptorClass::StorageBuffer, UNORDERED_ACCESS_SHIFT),
        (BindingKind::UnorderedAccess, 0)
    );
    // A read-only buffer is a resource whatever its binding number
    assert_eq!(
        classify_binding(DescriptorClass::ReadOnlyStorageBuffer, UNORDERED_ACCESS_SHIFT),
        (BindingKind::Resource, UNORDERED_ACCESS_SHIFT)
    );
}

#[test]
fn test_structured_buffer_past_the_shift_is_rejected() {
    assert!(check_storage_binding(DescriptorClass::ReadOnlyStorageBuffer, UNORDERED_ACCESS_SHIFT - 1, "lights").is_ok());
    assert!(check_storage_binding(DescriptorClass::StorageBuffer, UNORDERED_ACCESS_SHIFT, "lights").is_ok());
    assert!(check_storage_binding(DescriptorClass::SampledImage, 40, "lights").is_ok());

    match check_storage_binding(DescriptorClass::ReadOnlyStorageBuffer, UNORDERED_ACCESS_SHIFT, "lights") {
        Err(Error::CompilationFailed(message)) => {
            assert!(message.contains("t8"));
            assert!(message.contains("u0"));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

// ============================================================================
// TOOLS
// ============================================================================

#[test]
fn test_resolve_tool_prefers_configured_path() {
    let configured = PathBuf::from("/opt/dxc/bin/dxc");
    assert_eq!(resolve_tool(Some(&configured), &["dxc"]), Some(configured));
}

#[test]
fn test_resolve_tool_missing() {
    assert_eq!(resolve_tool(None, &["gek-no-such-shader-tool"]), None);
}

#[test]
fn test_unrunnable_tool_is_compilation_failure() {
    let directory = tempfile::tempdir().unwrap();
    let compiler = ShaderCompiler::new(&ShaderToolConfig {
        dxc: Some(directory.path().join("missing-dxc")),
        spirv_cross: Some(directory.path().join("missing-spirv-cross")),
    });

    let result = compiler.compile(PipelineType::Vertex, "quad", "float4 main() : SV_Position { return 0; }", "main");
    match result {
        Err(Error::CompilationFailed(message)) => assert!(message.contains("quad")),
        other => panic!("expected CompilationFailed, got {:?}", other.map(|program| program.name)),
    }
}

#[cfg(unix)]
fn script(directory: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = directory.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_tool_stderr_is_carried() {
    let directory = tempfile::tempdir().unwrap();
    let dxc = script(
        directory.path(),
        "dxc",
        "echo \"quad.hlsl:1:1: error: unknown type name 'flaot4'\" >&2\nexit 1",
    );
    let compiler = ShaderCompiler::new(&ShaderToolConfig {
        dxc: Some(dxc),
        spirv_cross: Some(directory.path().join("spirv-cross")),
    });

    match compiler.compile(PipelineType::Pixel, "quad", "flaot4 main() {}", "main") {
        Err(Error::CompilationFailed(message)) => {
            assert!(message.contains("unknown type name 'flaot4'"), "{}", message);
            assert!(message.contains("status"));
        }
        other => panic!("expected CompilationFailed, got {:?}", other.map(|program| program.name)),
    }
}

#[cfg(unix)]
#[test]
fn test_missing_output_is_compilation_failure() {
    let directory = tempfile::tempdir().unwrap();
    // Exits cleanly without writing the -Fo file
    let dxc = script(directory.path(), "dxc", "exit 0");
    let compiler = ShaderCompiler::new(&ShaderToolConfig {
        dxc: Some(dxc),
        spirv_cross: Some(directory.path().join("spirv-cross")),
    });

    match compiler.compile(PipelineType::Compute, "cull", "[numthreads(64,1,1)] void main() {}", "main") {
        Err(Error::CompilationFailed(message)) => assert!(message.contains("dxc produced no output")),
        other => panic!("expected CompilationFailed, got {:?}", other.map(|program| program.name)),
    }
}
