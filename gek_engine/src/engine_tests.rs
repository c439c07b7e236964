//! Unit tests for Engine
//!
//! ENGINE_STATE, LOGGER and the plugin registry are process-wide, so every
//! test here is #[serial].

use std::sync::{Arc, Mutex};

use serial_test::serial;

use crate::config::DeviceConfig;
use crate::gek::log::{LogEntry, LogSeverity, Logger};
use crate::gek::{Engine, Error};
use crate::video::mock_device::{HeadlessWindow, MockDevice};
use crate::video::registry;
use crate::video::Device;

// ============================================================================
// TEST HELPERS
// ============================================================================

/// Captures entries from the engine source only
struct TestLogger {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        if entry.source == "gek::Engine" {
            let mut entries = self.entries.lock().unwrap();
            entries.push(format!("{:?}: {}", entry.severity, entry.message));
        }
    }
}

fn setup() {
    Engine::reset_for_testing();
    let _ = Engine::initialize();
}

fn register_mock(name: &str) {
    Engine::register_device_plugin(name, |window, config| {
        Ok(Box::new(MockDevice::new(window, config)?) as Box<dyn Device>)
    })
    .unwrap();
}

// ============================================================================
// INITIALIZATION
// ============================================================================

#[test]
#[serial]
fn test_engine_initialize_is_idempotent() {
    setup();
    assert!(Engine::initialize().is_ok());
    assert!(Engine::initialize().is_ok());
}

#[test]
#[serial]
fn test_shutdown_clears_active_backend() {
    setup();
    register_mock("engine_shutdown");

    let _device = Engine::create_device(
        "engine_shutdown",
        Arc::new(HeadlessWindow::new(320, 240)),
        DeviceConfig::default(),
    )
    .unwrap();
    assert_eq!(Engine::active_backend().unwrap().as_deref(), Some("engine_shutdown"));

    Engine::shutdown();
    assert_eq!(Engine::active_backend().unwrap(), None);

    registry::unregister_device_plugin("engine_shutdown").unwrap();
}

// ============================================================================
// DEVICE CREATION
// ============================================================================

#[test]
#[serial]
fn test_create_device_through_plugin() {
    setup();
    register_mock("engine_create");

    let device = Engine::create_device(
        "engine_create",
        Arc::new(HeadlessWindow::new(640, 480)),
        DeviceConfig::default(),
    )
    .unwrap();
    assert_eq!(device.backend_name(), "mock");
    let state = device.swap_chain_state();
    assert_eq!((state.width, state.height), (640, 480));
    assert!(Engine::device_plugins().unwrap().contains(&"engine_create".to_string()));

    registry::unregister_device_plugin("engine_create").unwrap();
}

#[test]
#[serial]
fn test_create_device_unknown_plugin() {
    setup();
    let result = Engine::create_device(
        "no_such_backend",
        Arc::new(HeadlessWindow::new(64, 64)),
        DeviceConfig::default(),
    );
    match result {
        Err(Error::InitializationFailed(message)) => assert!(message.contains("no_such_backend")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("device created for an unknown plugin"),
    }
}

#[test]
#[serial]
fn test_create_device_forwards_backend_failure() {
    setup();
    register_mock("engine_failure");

    // Zero-sized client area cannot back a swap chain
    let result = Engine::create_device(
        "engine_failure",
        Arc::new(HeadlessWindow::new(0, 0)),
        DeviceConfig::default(),
    );
    assert!(matches!(result, Err(Error::InitializationFailed(_))));

    registry::unregister_device_plugin("engine_failure").unwrap();
}

// ============================================================================
// LOGGING
// ============================================================================

#[test]
#[serial]
fn test_set_logger_receives_engine_logs() {
    setup();
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    Engine::log(LogSeverity::Info, "gek::Engine", "hello".to_string());
    Engine::log_detailed(LogSeverity::Error, "gek::Engine", "broken".to_string(), file!(), line!());
    Engine::log(LogSeverity::Info, "gek::Other", "ignored".to_string());

    {
        let entries = entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "Info: hello");
        assert_eq!(entries[1], "Error: broken");
    }

    Engine::reset_logger();
    Engine::log(LogSeverity::Info, "gek::Engine", "after reset".to_string());
    assert_eq!(entries.lock().unwrap().len(), 2);
}

#[test]
#[serial]
fn test_create_device_logs_backend() {
    setup();
    register_mock("engine_logging");
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });

    let _device = Engine::create_device(
        "engine_logging",
        Arc::new(HeadlessWindow::new(128, 128)),
        DeviceConfig::default(),
    )
    .unwrap();

    let logged = entries.lock().unwrap().clone();
    Engine::reset_logger();
    registry::unregister_device_plugin("engine_logging").unwrap();

    assert!(logged.iter().any(|line| line.contains("Creating 'engine_logging' device for a 128x128 window")));
    assert!(logged.iter().any(|line| line.contains("Device created on backend 'mock'")));
}
