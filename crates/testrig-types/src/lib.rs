//! Core types shared across all testrig crates.
//!
//! Defines strongly-typed identifiers, session/behavior/device configuration,
//! the launch-request data model, and the error taxonomy used by the driver
//! surface and the device orchestrator.

pub mod config;
pub mod error;
pub mod ids;
pub mod launch;

pub use config::{
    BehaviorConfig, DeviceConfig, LaunchMode, RuntimeFlags, SessionConfig, StaticFlags,
};
pub use error::{DeviceError, DriverError};
pub use ids::{BundleId, DeviceId, ProcessId};
pub use launch::{DeliveryPayload, LanguageAndLocale, LaunchPayload, LaunchRequest};
