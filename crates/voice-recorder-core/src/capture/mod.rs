//! Capture capabilities consumed by the recording controller.
//!
//! The controller never touches a platform API directly. A [`CaptureBackend`]
//! supplies streams and builds sessions on them, which keeps the controller
//! testable against a scripted backend.

mod device_error;
mod traits;

pub use {
    device_error::{DeviceError, DeviceErrorKind},
    traits::{
        AudioConstraints, AudioStream, CaptureBackend, CaptureSession, DataHandler, ErrorHandler,
        SessionHandlers, SessionState, StopHandler,
    },
};

/// Encodings tried in order when constructing the first session of an attempt.
pub const MIME_PREFERENCES: [&str; 5] = [
    "audio/webm",
    "audio/webm;codecs=opus",
    "audio/mp4",
    "audio/ogg;codecs=opus",
    "audio/wav",
];

/// First entry of [`MIME_PREFERENCES`] the backend reports as supported.
pub fn preferred_mime_type<B: CaptureBackend + ?Sized>(backend: &B) -> Option<&'static str> {
    MIME_PREFERENCES
        .iter()
        .copied()
        .find(|mime| backend.is_type_supported(mime))
}
