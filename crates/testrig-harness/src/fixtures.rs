//! Fixture builders for device tests.
//!
//! [`DeviceFixture`] wires a [`Device`] to a recording [`MockDriver`] with
//! sensible defaults so tests only state what they care about.

use std::sync::Arc;

use testrig_device::{Device, DeviceParams};
use testrig_types::{
    BehaviorConfig, DeviceConfig, LaunchMode, SessionConfig, StaticFlags,
};

use crate::mocks::{MockDriver, MockDriverBuilder};

/// The session configuration used across fixtures.
pub fn session_config() -> SessionConfig {
    SessionConfig {
        server: "ws://localhost:8099".into(),
        session_id: "test".into(),
    }
}

/// A simulator-flavored device configuration.
pub fn device_config() -> DeviceConfig {
    DeviceConfig {
        device_type: "ios.simulator".into(),
        binary_path: "/tmp/apps/example.app".into(),
        test_binary_path: Some("/tmp/apps/example-test.app".into()),
        util_binary_paths: Vec::new(),
    }
}

/// A device wired to a recording mock driver.
pub struct DeviceFixture {
    pub device: Device,
    pub driver: MockDriver,
}

/// Fluent setup for [`DeviceFixture`].
///
/// # Example
///
/// ```
/// use testrig_harness::fixtures::DeviceFixtureBuilder;
///
/// let fixture = DeviceFixtureBuilder::new().reuse(true).build();
/// assert_eq!(fixture.device.name(), "mock device");
/// ```
pub struct DeviceFixtureBuilder {
    driver: MockDriver,
    behavior: BehaviorConfig,
    flags: StaticFlags,
    device_config: DeviceConfig,
    session_config: SessionConfig,
}

impl DeviceFixtureBuilder {
    pub fn new() -> Self {
        Self {
            driver: MockDriverBuilder::new().bundle_id("test.bundle").build(),
            behavior: BehaviorConfig::default(),
            flags: StaticFlags::default(),
            device_config: device_config(),
            session_config: session_config(),
        }
    }

    /// Use a pre-configured mock driver instead of the default one.
    pub fn driver(mut self, driver: MockDriver) -> Self {
        self.driver = driver;
        self
    }

    /// Switch the launch mode to manual.
    pub fn manual_launch(mut self) -> Self {
        self.behavior.launch_app = LaunchMode::Manual;
        self
    }

    /// Set the process-wide "reuse installed binaries" flag.
    pub fn reuse(mut self, reuse: bool) -> Self {
        self.flags.reuse_installed_binaries = reuse;
        self
    }

    /// Override the device configuration.
    pub fn device_config(mut self, config: DeviceConfig) -> Self {
        self.device_config = config;
        self
    }

    /// Override the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Build the fixture without preparing the device.
    pub fn build(self) -> DeviceFixture {
        let driver = self.driver.clone();
        let device = Device::new(DeviceParams {
            driver: Arc::new(self.driver),
            session_config: self.session_config,
            behavior_config: self.behavior,
            device_config: self.device_config,
            flags: Arc::new(self.flags),
        })
        .expect("fixture device config should be valid");
        DeviceFixture { device, driver }
    }

    /// Build the fixture, prepare the device, and clear the acquisition
    /// call from the record so tests start from a clean slate.
    pub async fn prepared(self) -> DeviceFixture {
        let fixture = self.build();
        fixture.device.prepare().await.expect("prepare should succeed");
        fixture.driver.reset();
        fixture
    }
}

impl Default for DeviceFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
