//! A recording mock of the device-driver capability surface.
//!
//! [`MockDriver`] records every call with its arguments, returns
//! configurable values, and can inject failures and latency per capability.
//! Thread-safe via `Arc<Mutex<_>>`, so it can be cloned into a device
//! instance and inspected from the test afterwards.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use testrig_driver::DeviceDriver;
use testrig_types::{
    BundleId, DeliveryPayload, DeviceId, DriverError, LanguageAndLocale, LaunchPayload, ProcessId,
};

/// Arguments of one `launch_app`/`wait_for_app_launch` call.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchAppCall {
    pub device_id: DeviceId,
    pub bundle_id: BundleId,
    pub payload: LaunchPayload,
    pub language_and_locale: Option<LanguageAndLocale>,
}

/// One recorded driver call, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    AcquireFreeDevice,
    InstallApp {
        binary_path: String,
        test_binary_path: Option<String>,
    },
    UninstallApp {
        bundle_id: BundleId,
    },
    InstallUtilBinaries {
        paths: Vec<String>,
    },
    BundleIdFromBinary {
        binary_path: String,
    },
    LaunchApp(LaunchAppCall),
    WaitForAppLaunch(LaunchAppCall),
    Terminate {
        bundle_id: BundleId,
    },
    DeliverPayload {
        delivery: DeliveryPayload,
        device_id: DeviceId,
    },
    CreatePayloadFile {
        data: Value,
    },
    SetPermissions {
        permissions: BTreeMap<String, String>,
    },
    SendToHome,
    SetBiometricEnrollment {
        yes_no: String,
    },
    MatchFace,
    UnmatchFace,
    MatchFinger,
    UnmatchFinger,
    SetStatusBar {
        params: Value,
    },
    ResetStatusBar,
    Shake,
    SetLocation {
        latitude: String,
        longitude: String,
    },
    SetOrientation {
        orientation: String,
    },
    ReverseTcpPort {
        port: u16,
    },
    UnreverseTcpPort {
        port: u16,
    },
    SetUrlBlacklist {
        urls: Vec<String>,
    },
    EnableSynchronization,
    DisableSynchronization,
    ResetContentAndSettings,
    TakeScreenshot {
        name: String,
    },
    CaptureViewHierarchy {
        name: String,
    },
    PressBack,
    ClearKeychain,
    Shutdown,
    Cleanup {
        bundle_id: Option<BundleId>,
    },
}

impl DriverCall {
    /// Stable capability name of this call, matching the trait method.
    pub fn name(&self) -> &'static str {
        match self {
            DriverCall::AcquireFreeDevice => "acquire_free_device",
            DriverCall::InstallApp { .. } => "install_app",
            DriverCall::UninstallApp { .. } => "uninstall_app",
            DriverCall::InstallUtilBinaries { .. } => "install_util_binaries",
            DriverCall::BundleIdFromBinary { .. } => "bundle_id_from_binary",
            DriverCall::LaunchApp(_) => "launch_app",
            DriverCall::WaitForAppLaunch(_) => "wait_for_app_launch",
            DriverCall::Terminate { .. } => "terminate",
            DriverCall::DeliverPayload { .. } => "deliver_payload",
            DriverCall::CreatePayloadFile { .. } => "create_payload_file",
            DriverCall::SetPermissions { .. } => "set_permissions",
            DriverCall::SendToHome => "send_to_home",
            DriverCall::SetBiometricEnrollment { .. } => "set_biometric_enrollment",
            DriverCall::MatchFace => "match_face",
            DriverCall::UnmatchFace => "unmatch_face",
            DriverCall::MatchFinger => "match_finger",
            DriverCall::UnmatchFinger => "unmatch_finger",
            DriverCall::SetStatusBar { .. } => "set_status_bar",
            DriverCall::ResetStatusBar => "reset_status_bar",
            DriverCall::Shake => "shake",
            DriverCall::SetLocation { .. } => "set_location",
            DriverCall::SetOrientation { .. } => "set_orientation",
            DriverCall::ReverseTcpPort { .. } => "reverse_tcp_port",
            DriverCall::UnreverseTcpPort { .. } => "unreverse_tcp_port",
            DriverCall::SetUrlBlacklist { .. } => "set_url_blacklist",
            DriverCall::EnableSynchronization => "enable_synchronization",
            DriverCall::DisableSynchronization => "disable_synchronization",
            DriverCall::ResetContentAndSettings => "reset_content_and_settings",
            DriverCall::TakeScreenshot { .. } => "take_screenshot",
            DriverCall::CaptureViewHierarchy { .. } => "capture_view_hierarchy",
            DriverCall::PressBack => "press_back",
            DriverCall::ClearKeychain => "clear_keychain",
            DriverCall::Shutdown => "shutdown",
            DriverCall::Cleanup { .. } => "cleanup",
        }
    }
}

/// Thread-safe inner state for [`MockDriver`].
#[derive(Debug)]
struct MockDriverInner {
    calls: Vec<DriverCall>,
    device_id: DeviceId,
    bundle_id: BundleId,
    /// Pids returned by successive `launch_app` calls; when exhausted, an
    /// auto-incrementing counter takes over.
    launch_pids: VecDeque<ProcessId>,
    next_pid: i32,
    payload_file_url: String,
    failures: HashMap<&'static str, String>,
    latency: Option<Duration>,
}

/// A test-friendly device driver recording every capability call.
///
/// # Example
///
/// ```
/// use testrig_harness::mocks::MockDriverBuilder;
///
/// let driver = MockDriverBuilder::new()
///     .bundle_id("test.bundle")
///     .launch_pids([1, 2])
///     .build();
/// assert_eq!(driver.calls().len(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockDriver {
    inner: Arc<Mutex<MockDriverInner>>,
}

impl MockDriver {
    /// A mock with default identities and no scripted behavior.
    pub fn new() -> Self {
        MockDriverBuilder::new().build()
    }

    /// Snapshot of all recorded calls, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Capability names of all recorded calls, in order.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.lock().calls.iter().map(DriverCall::name).collect()
    }

    /// Number of recorded calls to the named capability.
    pub fn count(&self, capability: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.name() == capability)
            .count()
    }

    /// All recorded `launch_app` calls.
    pub fn launch_app_calls(&self) -> Vec<LaunchAppCall> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::LaunchApp(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    /// All recorded `wait_for_app_launch` calls.
    pub fn wait_for_app_launch_calls(&self) -> Vec<LaunchAppCall> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::WaitForAppLaunch(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    /// All recorded `deliver_payload` calls.
    pub fn deliver_payload_calls(&self) -> Vec<(DeliveryPayload, DeviceId)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                DriverCall::DeliverPayload {
                    delivery,
                    device_id,
                } => Some((delivery.clone(), device_id.clone())),
                _ => None,
            })
            .collect()
    }

    /// Configure a persistent failure for the named capability.
    pub fn fail(&self, capability: &'static str, message: impl Into<String>) {
        self.lock().failures.insert(capability, message.into());
    }

    /// Remove an injected failure, letting the capability succeed again.
    pub fn clear_failure(&self, capability: &str) {
        self.lock().failures.remove(capability);
    }

    /// Clear all recorded calls (scripted behavior is kept).
    pub fn reset(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockDriverInner> {
        self.inner.lock().expect("mock driver lock poisoned")
    }

    /// Apply configured latency, record the call, then fail it if a failure
    /// is scripted. Failing calls stay in the record, like any real attempt.
    async fn observe(&self, call: DriverCall) -> Result<(), DriverError> {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let mut inner = self.lock();
        let name = call.name();
        inner.calls.push(call);
        if let Some(message) = inner.failures.get(name) {
            return Err(DriverError::capability(message.clone()));
        }
        Ok(())
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent builder for [`MockDriver`].
#[derive(Debug)]
pub struct MockDriverBuilder {
    device_id: DeviceId,
    bundle_id: BundleId,
    launch_pids: VecDeque<ProcessId>,
    payload_file_url: String,
    latency: Option<Duration>,
}

impl MockDriverBuilder {
    pub fn new() -> Self {
        Self {
            device_id: DeviceId::new("mock-device"),
            bundle_id: BundleId::new("com.example.mock"),
            launch_pids: VecDeque::new(),
            payload_file_url: "mock://payload".into(),
            latency: None,
        }
    }

    /// Device id returned by `acquire_free_device`.
    pub fn device_id(mut self, id: &str) -> Self {
        self.device_id = DeviceId::from(id);
        self
    }

    /// Bundle id returned by `bundle_id_from_binary`.
    pub fn bundle_id(mut self, id: &str) -> Self {
        self.bundle_id = BundleId::from(id);
        self
    }

    /// Pids returned by successive `launch_app` calls.
    pub fn launch_pids(mut self, pids: impl IntoIterator<Item = i32>) -> Self {
        self.launch_pids = pids.into_iter().map(ProcessId).collect();
        self
    }

    /// URL returned by `create_payload_file`.
    pub fn payload_file_url(mut self, url: impl Into<String>) -> Self {
        self.payload_file_url = url.into();
        self
    }

    /// Latency injected before every capability call, for serialization
    /// tests.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn build(self) -> MockDriver {
        MockDriver {
            inner: Arc::new(Mutex::new(MockDriverInner {
                calls: Vec::new(),
                device_id: self.device_id,
                bundle_id: self.bundle_id,
                launch_pids: self.launch_pids,
                next_pid: 1,
                payload_file_url: self.payload_file_url,
                failures: HashMap::new(),
                latency: self.latency,
            })),
        }
    }
}

impl Default for MockDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceDriver for MockDriver {
    fn name(&self) -> &str {
        "mock device"
    }

    fn platform(&self) -> &str {
        "mock"
    }

    async fn acquire_free_device(&self) -> Result<DeviceId, DriverError> {
        self.observe(DriverCall::AcquireFreeDevice).await?;
        Ok(self.lock().device_id.clone())
    }

    async fn install_app(
        &self,
        _device_id: &DeviceId,
        binary_path: &str,
        test_binary_path: Option<&str>,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::InstallApp {
            binary_path: binary_path.into(),
            test_binary_path: test_binary_path.map(str::to_owned),
        })
        .await
    }

    async fn uninstall_app(
        &self,
        _device_id: &DeviceId,
        bundle_id: &BundleId,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::UninstallApp {
            bundle_id: bundle_id.clone(),
        })
        .await
    }

    async fn install_util_binaries(
        &self,
        _device_id: &DeviceId,
        paths: &[String],
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::InstallUtilBinaries {
            paths: paths.to_vec(),
        })
        .await
    }

    async fn bundle_id_from_binary(&self, binary_path: &str) -> Result<BundleId, DriverError> {
        self.observe(DriverCall::BundleIdFromBinary {
            binary_path: binary_path.into(),
        })
        .await?;
        Ok(self.lock().bundle_id.clone())
    }

    async fn launch_app(
        &self,
        device_id: &DeviceId,
        bundle_id: &BundleId,
        payload: &LaunchPayload,
        language_and_locale: Option<&LanguageAndLocale>,
    ) -> Result<ProcessId, DriverError> {
        self.observe(DriverCall::LaunchApp(LaunchAppCall {
            device_id: device_id.clone(),
            bundle_id: bundle_id.clone(),
            payload: payload.clone(),
            language_and_locale: language_and_locale.cloned(),
        }))
        .await?;
        let mut inner = self.lock();
        let pid = match inner.launch_pids.pop_front() {
            Some(pid) => pid,
            None => {
                let pid = ProcessId(inner.next_pid);
                inner.next_pid += 1;
                pid
            }
        };
        Ok(pid)
    }

    async fn wait_for_app_launch(
        &self,
        device_id: &DeviceId,
        bundle_id: &BundleId,
        payload: &LaunchPayload,
        language_and_locale: Option<&LanguageAndLocale>,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::WaitForAppLaunch(LaunchAppCall {
            device_id: device_id.clone(),
            bundle_id: bundle_id.clone(),
            payload: payload.clone(),
            language_and_locale: language_and_locale.cloned(),
        }))
        .await
    }

    async fn terminate(
        &self,
        _device_id: &DeviceId,
        bundle_id: &BundleId,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::Terminate {
            bundle_id: bundle_id.clone(),
        })
        .await
    }

    async fn deliver_payload(
        &self,
        delivery: &DeliveryPayload,
        device_id: &DeviceId,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::DeliverPayload {
            delivery: delivery.clone(),
            device_id: device_id.clone(),
        })
        .await
    }

    async fn create_payload_file(&self, data: &Value) -> Result<String, DriverError> {
        self.observe(DriverCall::CreatePayloadFile { data: data.clone() })
            .await?;
        Ok(self.lock().payload_file_url.clone())
    }

    async fn set_permissions(
        &self,
        _device_id: &DeviceId,
        _bundle_id: &BundleId,
        permissions: &BTreeMap<String, String>,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::SetPermissions {
            permissions: permissions.clone(),
        })
        .await
    }

    async fn send_to_home(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::SendToHome).await
    }

    async fn set_biometric_enrollment(
        &self,
        _device_id: &DeviceId,
        yes_no: &str,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::SetBiometricEnrollment {
            yes_no: yes_no.into(),
        })
        .await
    }

    async fn match_face(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::MatchFace).await
    }

    async fn unmatch_face(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::UnmatchFace).await
    }

    async fn match_finger(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::MatchFinger).await
    }

    async fn unmatch_finger(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::UnmatchFinger).await
    }

    async fn set_status_bar(
        &self,
        _device_id: &DeviceId,
        params: &Value,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::SetStatusBar {
            params: params.clone(),
        })
        .await
    }

    async fn reset_status_bar(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::ResetStatusBar).await
    }

    async fn shake(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::Shake).await
    }

    async fn set_location(
        &self,
        _device_id: &DeviceId,
        latitude: &str,
        longitude: &str,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::SetLocation {
            latitude: latitude.into(),
            longitude: longitude.into(),
        })
        .await
    }

    async fn set_orientation(
        &self,
        _device_id: &DeviceId,
        orientation: &str,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::SetOrientation {
            orientation: orientation.into(),
        })
        .await
    }

    async fn reverse_tcp_port(&self, _device_id: &DeviceId, port: u16) -> Result<(), DriverError> {
        self.observe(DriverCall::ReverseTcpPort { port }).await
    }

    async fn unreverse_tcp_port(
        &self,
        _device_id: &DeviceId,
        port: u16,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::UnreverseTcpPort { port }).await
    }

    async fn set_url_blacklist(
        &self,
        _device_id: &DeviceId,
        urls: &[String],
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::SetUrlBlacklist {
            urls: urls.to_vec(),
        })
        .await
    }

    async fn enable_synchronization(&self) -> Result<(), DriverError> {
        self.observe(DriverCall::EnableSynchronization).await
    }

    async fn disable_synchronization(&self) -> Result<(), DriverError> {
        self.observe(DriverCall::DisableSynchronization).await
    }

    async fn reset_content_and_settings(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::ResetContentAndSettings).await
    }

    async fn take_screenshot(
        &self,
        _device_id: &DeviceId,
        name: &str,
    ) -> Result<String, DriverError> {
        self.observe(DriverCall::TakeScreenshot { name: name.into() })
            .await?;
        Ok(format!("/artifacts/{name}.png"))
    }

    async fn capture_view_hierarchy(
        &self,
        _device_id: &DeviceId,
        name: &str,
    ) -> Result<String, DriverError> {
        self.observe(DriverCall::CaptureViewHierarchy { name: name.into() })
            .await?;
        Ok(format!("/artifacts/{name}.viewhierarchy"))
    }

    async fn press_back(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::PressBack).await
    }

    async fn clear_keychain(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::ClearKeychain).await
    }

    async fn shutdown(&self, _device_id: &DeviceId) -> Result<(), DriverError> {
        self.observe(DriverCall::Shutdown).await
    }

    async fn cleanup(
        &self,
        _device_id: &DeviceId,
        bundle_id: Option<&BundleId>,
    ) -> Result<(), DriverError> {
        self.observe(DriverCall::Cleanup {
            bundle_id: bundle_id.cloned(),
        })
        .await
    }
}
