//! Configuration for a device instance.
//!
//! [`SessionConfig`] and [`BehaviorConfig`] are owned by the surrounding test
//! run and outlive every device instance; the orchestrator only reads them.
//! [`DeviceConfig`] describes the target application binary on one device.

use serde::{Deserialize, Serialize};

/// Connection parameters of the surrounding test session, injected verbatim
/// into every composed launch payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Server URL the launched app connects back to (e.g. `ws://localhost:8099`).
    pub server: String,
    /// Session identifier shared between the app and the test run.
    pub session_id: String,
}

/// How the engine should make the app visible.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// Actively trigger the process start through the driver.
    #[default]
    Auto,
    /// Only announce the intended launch parameters and wait for external
    /// test instrumentation to report readiness.
    Manual,
}

/// Behavior configuration for a device instance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BehaviorConfig {
    /// Launch mode for `launch_app`/`relaunch_app`.
    #[serde(default)]
    pub launch_app: LaunchMode,
}

/// Description of the target application on one device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Device flavor as understood by the backend (e.g. `ios.simulator`).
    pub device_type: String,
    /// Path to the application binary to install and resolve the bundle id from.
    pub binary_path: String,
    /// Path to the companion test binary, when the backend needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_binary_path: Option<String>,
    /// Auxiliary utility binaries to install alongside the app.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub util_binary_paths: Vec<String>,
}

/// Process-wide runtime flags consulted by the engine.
///
/// Only the reinstall decision reads these; everything else is per-call
/// request state or immutable configuration.
pub trait RuntimeFlags: Send + Sync {
    /// When true, installed binaries are reused across runs and relaunching
    /// skips the uninstall/install round-trip unless a request forces it.
    fn reuse_installed_binaries(&self) -> bool;
}

/// Fixed flag values, for wiring from parsed CLI/config state or tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFlags {
    pub reuse_installed_binaries: bool,
}

impl RuntimeFlags for StaticFlags {
    fn reuse_installed_binaries(&self) -> bool {
        self.reuse_installed_binaries
    }
}
