//! Launch/relaunch decision engine for one app instance on one device.
//!
//! The [`Device`] orchestrator composes launch payloads, tracks process
//! identity across calls, and chooses among cold launch, warm delivery, and
//! manual wait, while enforcing reinstall and validation policy. It drives
//! a [`testrig_driver::DeviceDriver`] backend and publishes lifecycle
//! events on successful cold launches.
//!
//! # Architecture
//!
//! - [`LaunchArgsStore`]: prebaked key/value launch-arg overrides
//! - [`composer`]: merges config + store + call-site params into the payload
//! - [`ProcessTracker`]: remembers the last successfully started process
//! - [`Device`]: the state machine consuming the three above and the driver
//!
//! All state is in-memory for the lifetime of the instance. Operations on
//! one instance are serialized behind a single async lock; instances are
//! fully independent of each other.

pub mod composer;
pub mod device;
pub mod events;
pub mod launch_args;
pub mod tracker;

pub use device::{Device, DeviceParams};
pub use events::{DeviceEvent, EventPublisher};
pub use launch_args::LaunchArgsStore;
pub use tracker::{ProcessState, ProcessTracker};
