/// GEK Engine - global entry point for logging and device creation
///
/// Holds the process-wide logger and the engine state. Devices are not
/// singletons: `create_device` builds one through the plugin registry and
/// hands ownership to the caller, and the engine only remembers which
/// backend served the last request.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::SystemTime;

use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::video::registry;
use crate::video::Device;
use crate::window::WindowTarget;

const SOURCE: &str = "gek::Engine";

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

struct EngineState {
    /// Plugin name of the most recently created device
    active_backend: RwLock<Option<String>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            active_backend: RwLock::new(None),
        }
    }
}

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

// ===== PUBLIC API =====

/// Engine entry point
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use gek_engine::gek::{Engine, config::DeviceConfig};
/// # fn window() -> Arc<dyn gek_engine::gek::window::WindowTarget> { unimplemented!() }
///
/// Engine::initialize()?;
/// let device = Engine::create_device("opengl", window(), DeviceConfig::default())?;
/// println!("running on {}", device.backend_name());
/// Engine::shutdown();
/// # Ok::<(), gek_engine::gek::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Log an engine-level error before handing it back
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!(SOURCE, "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!(SOURCE, "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!(SOURCE, "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })
    }

    /// Initialize the engine
    ///
    /// Idempotent. Must run before `create_device`.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Forget the active backend
    ///
    /// Devices already handed out stay valid until their owners drop them.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut backend) = state.active_backend.write() {
                if let Some(name) = backend.take() {
                    crate::engine_info!(SOURCE, "Shut down (last backend: {})", name);
                }
            }
        }
    }

    /// Reset engine state for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut backend) = state.active_backend.write() {
                *backend = None;
            }
        }
    }

    // ===== DEVICE API =====

    /// Register a backend factory under `name`
    ///
    /// Backend crates call this from their `register()` function.
    pub fn register_device_plugin<F>(name: &str, factory: F) -> Result<()>
    where
        F: Fn(Arc<dyn WindowTarget>, DeviceConfig) -> Result<Box<dyn Device>> + Send + Sync + 'static,
    {
        registry::register_device_plugin(name, factory)
    }

    /// Names of every registered backend, sorted
    pub fn device_plugins() -> Result<Vec<String>> {
        registry::device_plugins()
    }

    /// Create a device with the backend registered under `name`
    ///
    /// # Errors
    ///
    /// - `InitializationFailed` if the engine is not initialized, no plugin
    ///   has that name, or the backend cannot create its device
    pub fn create_device(
        name: &str,
        window: Arc<dyn WindowTarget>,
        config: DeviceConfig,
    ) -> Result<Box<dyn Device>> {
        let state = Self::state()?;

        let (width, height) = window.client_size();
        crate::engine_info!(
            SOURCE,
            "Creating '{}' device for a {}x{} window ({})",
            name, width, height, config.application_name
        );

        let device = registry::create_device(name, window, config)?;

        let mut backend = state
            .active_backend
            .write()
            .map_err(|_| Self::log_and_return_error(Error::BackendError("Engine state lock poisoned".to_string())))?;
        *backend = Some(name.to_string());

        crate::engine_info!(SOURCE, "Device created on backend '{}'", device.backend_name());
        Ok(device)
    }

    /// Plugin name of the most recently created device
    pub fn active_backend() -> Result<Option<String>> {
        let state = Self::state()?;
        let backend = state
            .active_backend
            .read()
            .map_err(|_| Self::log_and_return_error(Error::BackendError("Engine state lock poisoned".to_string())))?;
        Ok(backend.clone())
    }

    // ===== LOGGING API =====

    /// Replace the logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gek_engine::gek::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Restore the default console logger
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Log without a source location
    ///
    /// Used by `engine_info!`, `engine_warn!` and friends.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line, used by `engine_error!` and the error macros
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
