//! Unit tests for the device plugin registry

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serial_test::serial;

use crate::config::DeviceConfig;
use crate::gek::Error;
use crate::video::mock_device::{HeadlessWindow, MockDevice};
use crate::video::registry::{create_device, device_plugins, register_device_plugin, unregister_device_plugin};
use crate::video::Device;

fn mock_factory(
    window: Arc<dyn crate::window::WindowTarget>,
    config: DeviceConfig,
) -> crate::gek::Result<Box<dyn Device>> {
    Ok(Box::new(MockDevice::new(window, config)?))
}

#[test]
#[serial]
fn test_register_and_list_sorted() {
    register_device_plugin("registry_zeta", mock_factory).unwrap();
    register_device_plugin("registry_alpha", mock_factory).unwrap();

    let names = device_plugins().unwrap();
    let ours: Vec<_> = names.iter().filter(|name| name.starts_with("registry_")).collect();
    assert_eq!(ours, vec!["registry_alpha", "registry_zeta"]);

    assert!(unregister_device_plugin("registry_zeta").unwrap());
    assert!(unregister_device_plugin("registry_alpha").unwrap());
    assert!(!unregister_device_plugin("registry_alpha").unwrap());
}

#[test]
#[serial]
fn test_create_device_passes_window_and_config() {
    register_device_plugin("registry_create", mock_factory).unwrap();

    let config = DeviceConfig {
        depth_format: None,
        ..Default::default()
    };
    let device = create_device("registry_create", Arc::new(HeadlessWindow::new(200, 100)), config).unwrap();
    let state = device.swap_chain_state();
    assert_eq!((state.width, state.height), (200, 100));
    assert!(device.depth_buffer().is_none());

    unregister_device_plugin("registry_create").unwrap();
}

#[test]
#[serial]
fn test_latest_registration_wins() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let counter = first.clone();
    register_device_plugin("registry_twice", move |window, config| {
        counter.fetch_add(1, Ordering::SeqCst);
        mock_factory(window, config)
    })
    .unwrap();
    let counter = second.clone();
    register_device_plugin("registry_twice", move |window, config| {
        counter.fetch_add(1, Ordering::SeqCst);
        mock_factory(window, config)
    })
    .unwrap();

    create_device("registry_twice", Arc::new(HeadlessWindow::new(8, 8)), DeviceConfig::default()).unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);

    unregister_device_plugin("registry_twice").unwrap();
}

#[test]
#[serial]
fn test_unknown_plugin_lists_available() {
    register_device_plugin("registry_known", mock_factory).unwrap();

    let result = create_device("registry_unknown", Arc::new(HeadlessWindow::new(8, 8)), DeviceConfig::default());
    match result {
        Err(Error::InitializationFailed(message)) => {
            assert!(message.contains("registry_unknown"));
            assert!(message.contains("registry_known"));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("unknown plugin created a device"),
    }

    unregister_device_plugin("registry_known").unwrap();
}
