//! The device orchestrator.
//!
//! One [`Device`] represents one target application instance on one acquired
//! device. Its launch entry points decide between a cold process launch, a
//! warm delivery to the running process, and a manual wait, while enforcing
//! reinstall and validation policy. All mutable per-instance state lives
//! behind a single `tokio::sync::Mutex`, so operations on one instance form
//! a strict FIFO queue; distinct instances share nothing and run freely in
//! parallel.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use testrig_driver::DeviceDriver;
use testrig_types::launch::keys;
use testrig_types::{
    BehaviorConfig, BundleId, DeliveryPayload, DeviceConfig, DeviceError, DeviceId, LaunchMode,
    LaunchPayload, LaunchRequest, RuntimeFlags, SessionConfig,
};

use crate::composer;
use crate::events::{DeviceEvent, EventPublisher};
use crate::launch_args::LaunchArgsStore;
use crate::tracker::{ProcessState, ProcessTracker};

/// Construction parameters for a [`Device`].
pub struct DeviceParams {
    pub driver: Arc<dyn DeviceDriver>,
    pub session_config: SessionConfig,
    pub behavior_config: BehaviorConfig,
    pub device_config: DeviceConfig,
    pub flags: Arc<dyn RuntimeFlags>,
}

/// Mutable per-instance state, guarded by the operation lock.
struct DeviceInner {
    device_id: Option<DeviceId>,
    bundle_id: Option<BundleId>,
    launch_args: LaunchArgsStore,
    tracker: ProcessTracker,
}

/// A single target application instance on a single device.
pub struct Device {
    driver: Arc<dyn DeviceDriver>,
    publisher: EventPublisher,
    session_config: SessionConfig,
    behavior: BehaviorConfig,
    device_config: DeviceConfig,
    flags: Arc<dyn RuntimeFlags>,
    inner: Mutex<DeviceInner>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("session_config", &self.session_config)
            .field("behavior", &self.behavior)
            .field("device_config", &self.device_config)
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Create a device instance. Fails if the configured binary path is
    /// empty, since both installation and bundle-id resolution need it.
    pub fn new(params: DeviceParams) -> Result<Self, DeviceError> {
        if params.device_config.binary_path.is_empty() {
            return Err(DeviceError::invalid_argument(
                "device config binary_path is missing",
            ));
        }
        Ok(Self {
            driver: params.driver,
            publisher: EventPublisher::new(),
            session_config: params.session_config,
            behavior: params.behavior_config,
            device_config: params.device_config,
            flags: params.flags,
            inner: Mutex::new(DeviceInner {
                device_id: None,
                bundle_id: None,
                launch_args: LaunchArgsStore::new(),
                tracker: ProcessTracker::new(),
            }),
        })
    }

    /// Acquire a device from the backend. Idempotent: the id is assigned
    /// once and later calls are no-ops.
    pub async fn prepare(&self) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        if inner.device_id.is_none() {
            let device_id = self.driver.acquire_free_device().await?;
            info!(device = %device_id, "device acquired");
            inner.device_id = Some(device_id);
        }
        Ok(())
    }

    /// The acquired device id, or `None` before [`prepare`](Self::prepare).
    pub async fn id(&self) -> Option<DeviceId> {
        self.inner.lock().await.device_id.clone()
    }

    /// Human-readable device name, as reported by the driver.
    pub fn name(&self) -> &str {
        self.driver.name()
    }

    /// Device flavor from the configuration (e.g. `ios.simulator`).
    pub fn device_type(&self) -> &str {
        &self.device_config.device_type
    }

    /// Platform identifier, as reported by the driver.
    pub fn platform(&self) -> &str {
        self.driver.platform()
    }

    /// Subscribe to this instance's lifecycle events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DeviceEvent> {
        self.publisher.subscribe()
    }

    /// Store a prebaked launch argument for every subsequent launch.
    /// `None` clears the key.
    pub async fn set_launch_arg(&self, key: impl Into<String>, value: Option<Value>) {
        self.inner.lock().await.launch_args.set(key, value);
    }

    /// Remove a prebaked launch argument.
    pub async fn clear_launch_arg(&self, key: &str) {
        self.inner.lock().await.launch_args.clear(key);
    }

    // -----------------------------------------------------------------------
    // Launch / relaunch
    // -----------------------------------------------------------------------

    /// Make the app visible and in the requested state.
    ///
    /// Re-entrant: with a process already running (and `new_instance` not
    /// forced), a deep link / notification / activity is delivered warm and
    /// anything else is a no-op. Otherwise a new process is cold-launched
    /// and an `AppReady` event is published.
    pub async fn launch_app(&self, request: &LaunchRequest) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        self.launch_locked(&mut inner, request, request.new_instance).await
    }

    /// Restart-oriented launch. Defaults `new_instance` to `true`, so the
    /// running process (if any) is terminated first; the reinstall decision
    /// combines the request's `delete` with the process-wide reuse flag.
    pub async fn relaunch_app(&self, request: &LaunchRequest) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        composer::validate(request)?;
        let device_id = Self::require_device_id(&inner)?;
        let new_instance = request.new_instance.unwrap_or(true);

        if new_instance {
            if let ProcessState::Started { bundle_id, .. } = inner.tracker.current() {
                let bundle_id = bundle_id.clone();
                debug!(device = %device_id, bundle = %bundle_id, "terminating before relaunch");
                self.driver.terminate(&device_id, &bundle_id).await?;
                inner.tracker.clear();
            }
        }

        let reinstall = request.delete == Some(true)
            || (request.delete != Some(false) && !self.flags.reuse_installed_binaries());
        if reinstall {
            let bundle_id = self.resolve_bundle_id(&mut inner).await?;
            debug!(device = %device_id, bundle = %bundle_id, "reinstalling app binaries");
            self.driver.uninstall_app(&device_id, &bundle_id).await?;
            self.driver
                .install_app(
                    &device_id,
                    &self.device_config.binary_path,
                    self.device_config.test_binary_path.as_deref(),
                )
                .await?;
        }

        self.launch_locked(&mut inner, request, Some(new_instance)).await
    }

    /// The launch state machine, run under the operation lock.
    ///
    /// `new_instance` is the effective value: the request's own for
    /// `launch_app`, the `true`-defaulted one for `relaunch_app`.
    async fn launch_locked(
        &self,
        inner: &mut DeviceInner,
        request: &LaunchRequest,
        new_instance: Option<bool>,
    ) -> Result<(), DeviceError> {
        composer::validate(request)?;
        let device_id = Self::require_device_id(inner)?;
        let bundle_id = self.resolve_bundle_id(inner).await?;

        let payload = composer::compose(
            &self.session_config,
            inner.launch_args.snapshot(),
            request,
            self.driver.as_ref(),
        )
        .await?;

        if self.behavior.launch_app == LaunchMode::Manual {
            info!(device = %device_id, bundle = %bundle_id, "announcing launch, waiting for external readiness");
            self.driver
                .wait_for_app_launch(
                    &device_id,
                    &bundle_id,
                    &payload,
                    request.language_and_locale.as_ref(),
                )
                .await?;
            return Ok(());
        }

        // Warm path: the recorded process keeps its pid and no event fires.
        if inner.tracker.is_running(&bundle_id) && new_instance != Some(true) {
            match Self::warm_delivery(request, &payload) {
                Some(delivery) => {
                    debug!(device = %device_id, bundle = %bundle_id, "delivering payload to running process");
                    self.driver.deliver_payload(&delivery, &device_id).await?;
                }
                None => {
                    debug!(device = %device_id, bundle = %bundle_id, "process already running, nothing to deliver");
                }
            }
            return Ok(());
        }

        // Cold launch. Permissions must land before the first frame renders.
        if let Some(permissions) = &request.permissions {
            self.driver
                .set_permissions(&device_id, &bundle_id, permissions)
                .await?;
        }

        let pid = self
            .driver
            .launch_app(
                &device_id,
                &bundle_id,
                &payload,
                request.language_and_locale.as_ref(),
            )
            .await?;
        inner.tracker.record(pid, bundle_id.clone());
        info!(device = %device_id, bundle = %bundle_id, pid = pid.0, "app process started");
        self.publisher.publish(DeviceEvent::AppReady {
            device_id,
            bundle_id,
            pid,
        });
        Ok(())
    }

    /// Build the warm-delivery object for a request, if it carries one of
    /// the payload parameters. Data-file URLs come from the composed payload
    /// so the file is created exactly once per call.
    fn warm_delivery(request: &LaunchRequest, payload: &LaunchPayload) -> Option<DeliveryPayload> {
        if let Some(url) = &request.url {
            return Some(
                DeliveryPayload::open_url(url.clone(), request.source_app.clone()).delayed(),
            );
        }
        if request.user_notification.is_some() {
            let data_url = payload.get(keys::USER_NOTIFICATION_DATA_URL)?.as_str()?;
            return Some(DeliveryPayload::user_notification(data_url).delayed());
        }
        if request.user_activity.is_some() {
            let data_url = payload.get(keys::USER_ACTIVITY_DATA_URL)?.as_str()?;
            return Some(DeliveryPayload::user_activity(data_url).delayed());
        }
        None
    }

    // -----------------------------------------------------------------------
    // App binary management
    // -----------------------------------------------------------------------

    /// Install the app binary, defaulting both paths from the device config.
    pub async fn install_app(
        &self,
        binary_path: Option<&str>,
        test_binary_path: Option<&str>,
    ) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let binary = binary_path.unwrap_or(&self.device_config.binary_path);
        let test_binary = test_binary_path.or(self.device_config.test_binary_path.as_deref());
        self.driver.install_app(&device_id, binary, test_binary).await?;
        Ok(())
    }

    /// Uninstall the app, defaulting to the resolved bundle id.
    pub async fn uninstall_app(&self, bundle_id: Option<&BundleId>) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let bundle_id = match bundle_id {
            Some(bundle_id) => bundle_id.clone(),
            None => self.resolve_bundle_id(&mut inner).await?,
        };
        self.driver.uninstall_app(&device_id, &bundle_id).await?;
        Ok(())
    }

    /// Install the configured utility binaries; no-op when none are
    /// configured.
    pub async fn install_util_binaries(&self) -> Result<(), DeviceError> {
        let paths = &self.device_config.util_binary_paths;
        if paths.is_empty() {
            return Ok(());
        }
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.install_util_binaries(&device_id, paths).await?;
        Ok(())
    }

    /// Terminate the running process and reset the tracker.
    pub async fn terminate_app(&self) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let bundle_id = self.resolve_bundle_id(&mut inner).await?;
        self.driver.terminate(&device_id, &bundle_id).await?;
        inner.tracker.clear();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Payload delivery to a foregrounded app
    // -----------------------------------------------------------------------

    /// Open a deep-link URL in the running app.
    pub async fn open_url(&self, url: &str, source_app: Option<&str>) -> Result<(), DeviceError> {
        if url.is_empty() {
            return Err(DeviceError::invalid_argument("open_url requires a url"));
        }
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let delivery = DeliveryPayload::open_url(url, source_app.map(str::to_owned));
        self.driver.deliver_payload(&delivery, &device_id).await?;
        Ok(())
    }

    /// Send a user notification to the running app.
    pub async fn send_user_notification(&self, payload: &Value) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let data_url = self.driver.create_payload_file(payload).await?;
        let delivery = DeliveryPayload::user_notification(data_url);
        self.driver.deliver_payload(&delivery, &device_id).await?;
        Ok(())
    }

    /// Send a user activity to the running app.
    pub async fn send_user_activity(&self, payload: &Value) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let data_url = self.driver.create_payload_file(payload).await?;
        let delivery = DeliveryPayload::user_activity(data_url);
        self.driver.deliver_payload(&delivery, &device_id).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Feature toggles forwarded to the driver
    // -----------------------------------------------------------------------

    /// Send the app to the home screen.
    pub async fn send_to_home(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.send_to_home(&device_id).await?;
        Ok(())
    }

    /// Toggle biometric enrollment.
    pub async fn set_biometric_enrollment(&self, enrolled: bool) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let yes_no = if enrolled { "YES" } else { "NO" };
        self.driver.set_biometric_enrollment(&device_id, yes_no).await?;
        Ok(())
    }

    /// Simulate a matching face scan.
    pub async fn match_face(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.match_face(&device_id).await?;
        Ok(())
    }

    /// Simulate a non-matching face scan.
    pub async fn unmatch_face(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.unmatch_face(&device_id).await?;
        Ok(())
    }

    /// Simulate a matching fingerprint scan.
    pub async fn match_finger(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.match_finger(&device_id).await?;
        Ok(())
    }

    /// Simulate a non-matching fingerprint scan.
    pub async fn unmatch_finger(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.unmatch_finger(&device_id).await?;
        Ok(())
    }

    /// Override the status bar appearance.
    pub async fn set_status_bar(&self, params: &Value) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.set_status_bar(&device_id, params).await?;
        Ok(())
    }

    /// Reset the status bar to its real state.
    pub async fn reset_status_bar(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.reset_status_bar(&device_id).await?;
        Ok(())
    }

    /// Shake the device.
    pub async fn shake(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.shake(&device_id).await?;
        Ok(())
    }

    /// Override the device location.
    pub async fn set_location(&self, latitude: f64, longitude: f64) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver
            .set_location(&device_id, &latitude.to_string(), &longitude.to_string())
            .await?;
        Ok(())
    }

    /// Rotate the device.
    pub async fn set_orientation(&self, orientation: &str) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.set_orientation(&device_id, orientation).await?;
        Ok(())
    }

    /// Press the hardware back button.
    pub async fn press_back(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.press_back(&device_id).await?;
        Ok(())
    }

    /// Clear the app's keychain.
    pub async fn clear_keychain(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.clear_keychain(&device_id).await?;
        Ok(())
    }

    /// Reverse a TCP port from the device to the host.
    pub async fn reverse_tcp_port(&self, port: u16) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.reverse_tcp_port(&device_id, port).await?;
        Ok(())
    }

    /// Remove a previously reversed TCP port.
    pub async fn unreverse_tcp_port(&self, port: u16) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.unreverse_tcp_port(&device_id, port).await?;
        Ok(())
    }

    /// Exempt URLs from the synchronization idle-wait.
    pub async fn set_url_blacklist(&self, urls: &[String]) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.set_url_blacklist(&device_id, urls).await?;
        Ok(())
    }

    /// Enable idle-wait synchronization with the app.
    pub async fn enable_synchronization(&self) -> Result<(), DeviceError> {
        let _inner = self.inner.lock().await;
        self.driver.enable_synchronization().await?;
        Ok(())
    }

    /// Disable idle-wait synchronization with the app.
    pub async fn disable_synchronization(&self) -> Result<(), DeviceError> {
        let _inner = self.inner.lock().await;
        self.driver.disable_synchronization().await?;
        Ok(())
    }

    /// Wipe the device back to factory content and settings.
    pub async fn reset_content_and_settings(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.reset_content_and_settings(&device_id).await?;
        Ok(())
    }

    /// Capture a screenshot under the given (non-empty) name.
    pub async fn take_screenshot(&self, name: &str) -> Result<String, DeviceError> {
        if name.is_empty() {
            return Err(DeviceError::invalid_argument(
                "cannot take a screenshot with an empty name",
            ));
        }
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let path = self.driver.take_screenshot(&device_id, name).await?;
        Ok(path)
    }

    /// Capture the view hierarchy; the artifact name defaults to `capture`.
    pub async fn capture_view_hierarchy(&self, name: Option<&str>) -> Result<String, DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        let name = name.unwrap_or("capture");
        let path = self.driver.capture_view_hierarchy(&device_id, name).await?;
        Ok(path)
    }

    /// Shut the device down.
    pub async fn shutdown(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let device_id = Self::require_device_id(&inner)?;
        self.driver.shutdown(&device_id).await?;
        Ok(())
    }

    /// Release backend resources at teardown. A no-op when no device was
    /// ever acquired.
    pub async fn cleanup(&self) -> Result<(), DeviceError> {
        let inner = self.inner.lock().await;
        let Some(device_id) = inner.device_id.clone() else {
            return Ok(());
        };
        self.driver.cleanup(&device_id, inner.bundle_id.as_ref()).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_device_id(inner: &DeviceInner) -> Result<DeviceId, DeviceError> {
        inner.device_id.clone().ok_or_else(|| {
            DeviceError::invalid_argument("device has not been prepared, call prepare() first")
        })
    }

    /// Resolve the bundle id from the configured binary, caching it for the
    /// instance's lifetime.
    async fn resolve_bundle_id(&self, inner: &mut DeviceInner) -> Result<BundleId, DeviceError> {
        if let Some(bundle_id) = &inner.bundle_id {
            return Ok(bundle_id.clone());
        }
        let bundle_id = self
            .driver
            .bundle_id_from_binary(&self.device_config.binary_path)
            .await?;
        debug!(bundle = %bundle_id, "bundle id resolved from binary");
        inner.bundle_id = Some(bundle_id.clone());
        Ok(bundle_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use testrig_types::{DriverError, StaticFlags};

    #[derive(Default)]
    struct CountingDriver {
        acquisitions: AtomicUsize,
    }

    #[async_trait]
    impl DeviceDriver for CountingDriver {
        async fn acquire_free_device(&self) -> Result<DeviceId, DriverError> {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
            Ok(DeviceId::new("counted-device"))
        }
    }

    fn device_with(driver: Arc<dyn DeviceDriver>) -> Device {
        Device::new(DeviceParams {
            driver,
            session_config: SessionConfig {
                server: "ws://localhost:8099".into(),
                session_id: "test".into(),
            },
            behavior_config: BehaviorConfig::default(),
            device_config: DeviceConfig {
                device_type: "ios.simulator".into(),
                binary_path: "/tmp/app.app".into(),
                test_binary_path: None,
                util_binary_paths: Vec::new(),
            },
            flags: Arc::new(StaticFlags::default()),
        })
        .unwrap()
    }

    #[test]
    fn construction_rejects_missing_binary_path() {
        let err = Device::new(DeviceParams {
            driver: Arc::new(CountingDriver::default()),
            session_config: SessionConfig {
                server: "ws://localhost:8099".into(),
                session_id: "test".into(),
            },
            behavior_config: BehaviorConfig::default(),
            device_config: DeviceConfig {
                device_type: "ios.simulator".into(),
                binary_path: String::new(),
                test_binary_path: None,
                util_binary_paths: Vec::new(),
            },
            flags: Arc::new(StaticFlags::default()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("binary_path is missing"));
    }

    #[tokio::test]
    async fn id_is_none_until_prepared() {
        let driver = Arc::new(CountingDriver::default());
        let device = device_with(driver.clone());

        assert_eq!(device.id().await, None);
        device.prepare().await.unwrap();
        assert_eq!(device.id().await, Some(DeviceId::new("counted-device")));
    }

    #[tokio::test]
    async fn prepare_is_idempotent() {
        let driver = Arc::new(CountingDriver::default());
        let device = device_with(driver.clone());

        device.prepare().await.unwrap();
        device.prepare().await.unwrap();
        assert_eq!(driver.acquisitions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn launching_unprepared_fails_without_driver_calls() {
        let device = device_with(Arc::new(CountingDriver::default()));
        let err = device.launch_app(&LaunchRequest::default()).await.unwrap_err();
        assert!(matches!(err, DeviceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn cleanup_before_prepare_is_a_noop() {
        let device = device_with(Arc::new(CountingDriver::default()));
        device.cleanup().await.unwrap();
    }
}
