//! Integration tests for the OpenGL backend
//!
//! No GL context required. The compiler test needs `dxc` and
//! `spirv-cross` and returns early when either is missing.
//!
//! Run with: cargo test --test opengl_integration_tests

use gek_engine::gek::config::ShaderToolConfig;
use gek_engine::gek::video::{BindingKind, PipelineType, ShaderLanguage};
use gek_engine::gek::{Engine, Error};
use gek_engine_video_opengl::{ShaderCompiler, BACKEND_NAME};
use serial_test::serial;

const PIXEL_SOURCE: &str = r#"
cbuffer Material : register(b0)
{
    float4 tint;
};

Texture2D albedo : register(t0);
SamplerState linearSampler : register(s0);

float4 mainPixelProgram(float4 position : SV_Position, float2 texCoord : TEXCOORD0) : SV_Target0
{
    return albedo.Sample(linearSampler, texCoord) * tint;
}
"#;

fn tools_available() -> bool {
    let tools = ShaderToolConfig::from_env();
    let found = |configured: Option<std::path::PathBuf>, name: &str| {
        configured.map_or(false, |path| path.exists()) || which::which(name).is_ok()
    };
    found(tools.dxc, "dxc") && found(tools.spirv_cross, "spirv-cross")
}

#[test]
#[serial]
fn test_integration_register_adds_opengl_plugin() {
    Engine::initialize().unwrap();
    gek_engine_video_opengl::register().unwrap();

    let plugins = Engine::device_plugins().unwrap();
    assert!(plugins.iter().any(|name| name == BACKEND_NAME));

    // Registering again keeps a single entry
    gek_engine_video_opengl::register().unwrap();
    let plugins = Engine::device_plugins().unwrap();
    assert_eq!(plugins.iter().filter(|name| *name == BACKEND_NAME).count(), 1);
}

#[test]
fn test_integration_compile_pixel_program() {
    if !tools_available() {
        eprintln!("dxc or spirv-cross not found, skipping");
        return;
    }

    let compiler = ShaderCompiler::new(&ShaderToolConfig::default());
    let program = compiler
        .compile(PipelineType::Pixel, "textured.hlsl", PIXEL_SOURCE, "mainPixelProgram")
        .unwrap();

    assert_eq!(program.language, ShaderLanguage::Glsl);
    assert_eq!(program.pipeline, PipelineType::Pixel);
    let glsl = String::from_utf8(program.bytecode.clone()).unwrap();
    assert!(glsl.starts_with("#version"));

    let kinds: Vec<BindingKind> = program.bindings.iter().map(|binding| binding.kind).collect();
    assert!(kinds.contains(&BindingKind::ConstantBuffer));
    assert!(kinds.contains(&BindingKind::Resource));
}

#[test]
fn test_integration_compile_error_is_reported() {
    if !tools_available() {
        eprintln!("dxc or spirv-cross not found, skipping");
        return;
    }

    let compiler = ShaderCompiler::new(&ShaderToolConfig::default());
    let result = compiler.compile(PipelineType::Pixel, "broken.hlsl", "float4 main( {", "main");
    assert!(matches!(result, Err(Error::CompilationFailed(_))));
}
