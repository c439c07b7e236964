/// Named device-factory registry
///
/// Backend crates register a factory under their name ("opengl", "d3d11");
/// applications create devices by name without linking a backend type.

use std::sync::{Arc, OnceLock, RwLock};

use rustc_hash::FxHashMap;

use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::video::Device;
use crate::window::WindowTarget;

const SOURCE: &str = "gek::video::Registry";

/// Builds a device bound to a window
pub type DeviceFactory =
    dyn Fn(Arc<dyn WindowTarget>, DeviceConfig) -> Result<Box<dyn Device>> + Send + Sync;

static REGISTRY: OnceLock<RwLock<FxHashMap<String, Arc<DeviceFactory>>>> = OnceLock::new();

fn registry() -> &'static RwLock<FxHashMap<String, Arc<DeviceFactory>>> {
    REGISTRY.get_or_init(|| RwLock::new(FxHashMap::default()))
}

fn poisoned() -> Error {
    crate::engine_err!(SOURCE, "Device registry lock poisoned")
}

/// Register `factory` under `name`, replacing any previous registration
pub fn register_device_plugin<F>(name: &str, factory: F) -> Result<()>
where
    F: Fn(Arc<dyn WindowTarget>, DeviceConfig) -> Result<Box<dyn Device>> + Send + Sync + 'static,
{
    let mut plugins = registry().write().map_err(|_| poisoned())?;
    if plugins.insert(name.to_string(), Arc::new(factory)).is_some() {
        crate::engine_warn!(SOURCE, "Device plugin '{}' registered twice, keeping the latest", name);
    } else {
        crate::engine_debug!(SOURCE, "Registered device plugin '{}'", name);
    }
    Ok(())
}

/// Remove a registration; returns whether `name` was registered
pub fn unregister_device_plugin(name: &str) -> Result<bool> {
    let mut plugins = registry().write().map_err(|_| poisoned())?;
    Ok(plugins.remove(name).is_some())
}

/// Names of every registered plugin, sorted
pub fn device_plugins() -> Result<Vec<String>> {
    let plugins = registry().read().map_err(|_| poisoned())?;
    let mut names: Vec<String> = plugins.keys().cloned().collect();
    names.sort();
    Ok(names)
}

/// Create a device with the plugin registered under `name`
pub fn create_device(name: &str, window: Arc<dyn WindowTarget>, config: DeviceConfig) -> Result<Box<dyn Device>> {
    // Clone the factory out so the lock is not held while the device initializes
    let factory = {
        let plugins = registry().read().map_err(|_| poisoned())?;
        plugins.get(name).cloned()
    };

    match factory {
        Some(factory) => factory(window, config),
        None => {
            let available = device_plugins()?.join(", ");
            let message = format!("No device plugin named '{}' (available: [{}])", name, available);
            crate::engine_error!(SOURCE, "{}", message);
            Err(Error::InitializationFailed(message))
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
