//! Integration tests for the Direct3D 11 backend
//!
//! No window required. On Windows the plugin registers; elsewhere
//! `register()` reports the backend as unavailable.
//!
//! Run with: cargo test --test d3d11_integration_tests

use gek_engine::gek::Engine;
use gek_engine_video_d3d11::BACKEND_NAME;
use serial_test::serial;

#[test]
fn test_integration_backend_name() {
    assert_eq!(BACKEND_NAME, "d3d11");
}

#[cfg(windows)]
#[test]
#[serial]
fn test_integration_register_adds_d3d11_plugin() {
    Engine::initialize().unwrap();
    gek_engine_video_d3d11::register().unwrap();

    let plugins = Engine::device_plugins().unwrap();
    assert!(plugins.iter().any(|name| name == BACKEND_NAME));
}

#[cfg(not(windows))]
#[test]
#[serial]
fn test_integration_register_fails_off_windows() {
    use gek_engine::gek::Error;

    Engine::initialize().unwrap();
    let result = gek_engine_video_d3d11::register();
    assert!(matches!(result, Err(Error::InitializationFailed(_))));

    let plugins = Engine::device_plugins().unwrap();
    assert!(!plugins.iter().any(|name| name == BACKEND_NAME));
}
