use std::fmt;

use thiserror::Error;

/// Failure reported by a capture backend, stream or session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} - {message}")]
pub struct DeviceError {
    /// Failure category.
    pub kind: DeviceErrorKind,
    /// Backend-provided description.
    pub message: String,
}

impl DeviceError {
    /// Build an error of the given kind.
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The user or platform refused access to the input device.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::PermissionDenied, message)
    }

    /// No matching input device exists.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::NotFound, message)
    }

    /// The operation is not valid in the current session state.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::InvalidState, message)
    }

    /// The requested encoding or option is not supported.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::NotSupported, message)
    }

    /// Anything else.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::Other, message)
    }
}

/// Device failure categories, mirroring the names platforms report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceErrorKind {
    /// Access to the device was refused.
    PermissionDenied,
    /// No device matched the request.
    NotFound,
    /// Call not valid in the current state.
    InvalidState,
    /// Encoding or option not supported.
    NotSupported,
    /// Uncategorised failure.
    Other,
}

impl fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceErrorKind::PermissionDenied => "NotAllowedError",
            DeviceErrorKind::NotFound => "NotFoundError",
            DeviceErrorKind::InvalidState => "InvalidStateError",
            DeviceErrorKind::NotSupported => "NotSupportedError",
            DeviceErrorKind::Other => "UnknownError",
        };
        f.write_str(name)
    }
}
