//! Error types shared across all testrig crates.

/// Failure surfaced by a device backend.
///
/// Opaque to the control core: never interpreted, translated, or retried.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DriverError {
    /// The backend does not implement this capability.
    #[error("{capability} is not supported by this device driver")]
    NotSupported {
        /// Name of the unimplemented capability.
        capability: &'static str,
    },

    /// The backend attempted the capability and failed.
    #[error("device driver failure: {0}")]
    Capability(String),
}

impl DriverError {
    /// A backend failure with the given message.
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability(message.into())
    }

    /// Marker for a capability the backend does not implement.
    pub fn not_supported(capability: &'static str) -> Self {
        Self::NotSupported { capability }
    }
}

/// Errors surfaced by device operations.
///
/// Validation errors are synchronous and side-effect-free; driver errors
/// propagate unchanged and leave state as of the last fully-committed step.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// More than one of `url`, `user_notification`, `user_activity` was set.
    #[error("conflicting launch parameters, at most one may be set: {params}")]
    ConflictingLaunchParams {
        /// Comma-separated names of the colliding parameters.
        params: String,
    },

    /// Malformed input to a public operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failure from the device backend, propagated unchanged.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl DeviceError {
    /// Build a conflict error naming the colliding parameters.
    pub fn conflicting_params(params: &[&str]) -> Self {
        Self::ConflictingLaunchParams {
            params: params.join(", "),
        }
    }

    /// Build an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
