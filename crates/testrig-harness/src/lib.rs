//! Test doubles and fixtures for the testrig control core.
//!
//! Provides lightweight, thread-safe test infrastructure:
//! - [`MockDriver`]: records every driver capability call, returns
//!   configurable values, injects failures and latency
//! - [`DeviceFixtureBuilder`]: fluent setup wiring a device to the mock
//!
//! All mocks use `Arc<Mutex<_>>` for thread-safe interior mutability, so
//! they can be shared across async tasks safely.

pub mod fixtures;
pub mod mocks;

pub use fixtures::{device_config, session_config, DeviceFixture, DeviceFixtureBuilder};
pub use mocks::{DriverCall, LaunchAppCall, MockDriver, MockDriverBuilder};
