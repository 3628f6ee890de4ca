//! The [`DeviceDriver`] trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use testrig_types::{
    BundleId, DeliveryPayload, DeviceId, DriverError, LanguageAndLocale, LaunchPayload, ProcessId,
};

/// Capability surface of one device backend.
///
/// All operations are keyed by the acquired [`DeviceId`] (and [`BundleId`]
/// where the target app matters). Failures are opaque to the caller and are
/// never retried by the control core.
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// Human-readable name of the backing device.
    fn name(&self) -> &str {
        "unnamed device"
    }

    /// Platform identifier (e.g. `ios`, `android`).
    fn platform(&self) -> &str {
        "unspecified"
    }

    /// Acquire a free device from the backend, returning its id.
    async fn acquire_free_device(&self) -> Result<DeviceId, DriverError> {
        Err(DriverError::not_supported("acquire_free_device"))
    }

    /// Install the application binary (and companion test binary, if any).
    async fn install_app(
        &self,
        _device_id: &DeviceId,
        _binary_path: &str,
        _test_binary_path: Option<&str>,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("install_app"))
    }

    /// Uninstall the application.
    async fn uninstall_app(
        &self,
        _device_id: &DeviceId,
        _bundle_id: &BundleId,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("uninstall_app"))
    }

    /// Install auxiliary utility binaries.
    async fn install_util_binaries(
        &self,
        _device_id: &DeviceId,
        _paths: &[String],
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("install_util_binaries"))
    }

    /// Resolve the bundle id of the application from its binary.
    async fn bundle_id_from_binary(&self, _binary_path: &str) -> Result<BundleId, DriverError> {
        Err(DriverError::not_supported("bundle_id_from_binary"))
    }

    /// Start a new application process with the composed payload, returning
    /// the new process id.
    async fn launch_app(
        &self,
        _device_id: &DeviceId,
        _bundle_id: &BundleId,
        _payload: &LaunchPayload,
        _language_and_locale: Option<&LanguageAndLocale>,
    ) -> Result<ProcessId, DriverError> {
        Err(DriverError::not_supported("launch_app"))
    }

    /// Announce the intended launch parameters and block until external test
    /// instrumentation reports the app ready (manual launch mode).
    async fn wait_for_app_launch(
        &self,
        _device_id: &DeviceId,
        _bundle_id: &BundleId,
        _payload: &LaunchPayload,
        _language_and_locale: Option<&LanguageAndLocale>,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("wait_for_app_launch"))
    }

    /// Terminate the running application process.
    async fn terminate(
        &self,
        _device_id: &DeviceId,
        _bundle_id: &BundleId,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("terminate"))
    }

    /// Hand a payload to an already-running process.
    async fn deliver_payload(
        &self,
        _delivery: &DeliveryPayload,
        _device_id: &DeviceId,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("deliver_payload"))
    }

    /// Serialize opaque payload data to a file the app can read, returning
    /// its URL.
    async fn create_payload_file(&self, _data: &Value) -> Result<String, DriverError> {
        Err(DriverError::not_supported("create_payload_file"))
    }

    /// Apply permission overrides for the app. Must be called before the
    /// process starts for the permissions to affect its first frame.
    async fn set_permissions(
        &self,
        _device_id: &DeviceId,
        _bundle_id: &BundleId,
        _permissions: &BTreeMap<String, String>,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("set_permissions"))
    }

    /// Send the app to the home screen.
    async fn send_to_home(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("send_to_home"))
    }

    /// Toggle biometric enrollment; `yes_no` is the backend's literal
    /// `"YES"`/`"NO"` switch.
    async fn set_biometric_enrollment(
        &self,
        _device_id: &DeviceId,
        _yes_no: &str,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("set_biometric_enrollment"))
    }

    /// Simulate a matching face scan.
    async fn match_face(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("match_face"))
    }

    /// Simulate a non-matching face scan.
    async fn unmatch_face(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("unmatch_face"))
    }

    /// Simulate a matching fingerprint scan.
    async fn match_finger(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("match_finger"))
    }

    /// Simulate a non-matching fingerprint scan.
    async fn unmatch_finger(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("unmatch_finger"))
    }

    /// Override the status bar appearance.
    async fn set_status_bar(
        &self,
        _device_id: &DeviceId,
        _params: &Value,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("set_status_bar"))
    }

    /// Reset the status bar to its real state.
    async fn reset_status_bar(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("reset_status_bar"))
    }

    /// Shake the device.
    async fn shake(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("shake"))
    }

    /// Override the device location. Coordinates arrive as decimal strings.
    async fn set_location(
        &self,
        _device_id: &DeviceId,
        _latitude: &str,
        _longitude: &str,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("set_location"))
    }

    /// Rotate the device to the given orientation.
    async fn set_orientation(
        &self,
        _device_id: &DeviceId,
        _orientation: &str,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("set_orientation"))
    }

    /// Reverse a TCP port from the device to the host.
    async fn reverse_tcp_port(&self, _device_id: &DeviceId, _port: u16) -> Result<(), DriverError> {
        Err(DriverError::not_supported("reverse_tcp_port"))
    }

    /// Remove a previously reversed TCP port.
    async fn unreverse_tcp_port(
        &self,
        _device_id: &DeviceId,
        _port: u16,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("unreverse_tcp_port"))
    }

    /// Exempt URLs from the synchronization idle-wait.
    async fn set_url_blacklist(
        &self,
        _device_id: &DeviceId,
        _urls: &[String],
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("set_url_blacklist"))
    }

    /// Enable idle-wait synchronization with the app.
    async fn enable_synchronization(&self) -> Result<(), DriverError> {
        Err(DriverError::not_supported("enable_synchronization"))
    }

    /// Disable idle-wait synchronization with the app.
    async fn disable_synchronization(&self) -> Result<(), DriverError> {
        Err(DriverError::not_supported("disable_synchronization"))
    }

    /// Wipe the device back to factory content and settings.
    async fn reset_content_and_settings(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("reset_content_and_settings"))
    }

    /// Capture a screenshot, returning the artifact path.
    async fn take_screenshot(
        &self,
        _device_id: &DeviceId,
        _name: &str,
    ) -> Result<String, DriverError> {
        Err(DriverError::not_supported("take_screenshot"))
    }

    /// Capture the view hierarchy, returning the artifact path.
    async fn capture_view_hierarchy(
        &self,
        _device_id: &DeviceId,
        _name: &str,
    ) -> Result<String, DriverError> {
        Err(DriverError::not_supported("capture_view_hierarchy"))
    }

    /// Press the hardware back button.
    async fn press_back(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("press_back"))
    }

    /// Clear the app's keychain.
    async fn clear_keychain(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("clear_keychain"))
    }

    /// Shut the device down.
    async fn shutdown(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        Err(DriverError::not_supported("shutdown"))
    }

    /// Release backend resources for this device instance at teardown.
    /// The bundle id is absent when nothing was ever resolved or launched.
    async fn cleanup(
        &self,
        _device_id: &DeviceId,
        _bundle_id: Option<&BundleId>,
    ) -> Result<(), DriverError> {
        Err(DriverError::not_supported("cleanup"))
    }
}
