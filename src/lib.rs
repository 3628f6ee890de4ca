//! Control core of a mobile-app test-automation harness.
//!
//! A [`Device`] represents one target application instance on one device and
//! decides, for every "make the app visible and in the right state" request,
//! whether to cold-launch a new process, warm-deliver a payload to the
//! running one, or announce parameters and wait for external instrumentation.
//!
//! The backend itself (simulators, emulators, attached hardware) stays
//! behind the [`DeviceDriver`] capability trait; this crate never branches
//! on which backend it is driving.

pub use testrig_device::{
    Device, DeviceEvent, DeviceParams, EventPublisher, LaunchArgsStore, ProcessState,
    ProcessTracker,
};
pub use testrig_driver::DeviceDriver;
pub use testrig_types::{
    BehaviorConfig, BundleId, DeliveryPayload, DeviceConfig, DeviceError, DeviceId, DriverError,
    LanguageAndLocale, LaunchMode, LaunchPayload, LaunchRequest, ProcessId, RuntimeFlags,
    SessionConfig, StaticFlags,
};

/// Well-known launch payload keys.
pub use testrig_types::launch::keys;
