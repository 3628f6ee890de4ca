//! Device-backend capability surface.
//!
//! [`DeviceDriver`] is the single interface the control core consumes. One
//! concrete implementation exists per backend flavor (simulator, emulator,
//! attached hardware); the core never branches on which one it holds.
//!
//! Every method has a default body returning [`DriverError::NotSupported`],
//! so a backend implements only the capabilities it actually has and the
//! core gets a uniform error for the rest.

pub mod driver;

pub use driver::DeviceDriver;
pub use testrig_types::DriverError;
