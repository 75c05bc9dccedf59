//! Voice Recorder Core Library
//!
//! A recording controller that drives an audio capture session through
//! start, pause, resume and stop, buffers the encoded chunks, and publishes
//! the finished recording under a revocable url. Capture devices are
//! injected through [`CaptureBackend`]; [`CpalBackend`] records from the
//! host's input devices.
//!
//! # Example
//!
//! ```no_run
//! use voice_recorder_core::{CpalBackend, ObjectUrlRegistry, RecordingController};
//!
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() {
//!     let urls = Arc::new(ObjectUrlRegistry::new());
//!     let controller = RecordingController::new(CpalBackend::default(), urls);
//!
//!     controller.start_recording().await;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     controller.stop_recording();
//!
//!     match (controller.audio_url(), controller.error()) {
//!         (Some(url), _) => println!("Recorded: {}", url),
//!         (None, Some(error)) => eprintln!("Recording failed: {}", error),
//!         (None, None) => eprintln!("Nothing recorded"),
//!     }
//! }
//! ```

mod artifact;
mod backend;
mod capture;
mod controller;
mod error;

pub use {
    artifact::{
        Artifact, AudioBlob, DEFAULT_ARTIFACT_MIME_TYPE, ObjectUrlRegistry, extension_for_mime,
        url_id,
    },
    backend::{CpalBackend, CpalCaptureSession, CpalInputStream, WAV_MIME_TYPE},
    capture::{
        AudioConstraints, AudioStream, CaptureBackend, CaptureSession, DataHandler, DeviceError,
        DeviceErrorKind, ErrorHandler, MIME_PREFERENCES, SessionHandlers, SessionState,
        StopHandler, preferred_mime_type,
    },
    controller::{
        RecorderSnapshot, RecordingController, START_SETTLE_DELAY, STOP_SETTLE_DELAY, TIMESLICE,
    },
    error::{ErrorKind, ErrorState, RecorderError, Result as CoreResult},
};

#[cfg(test)]
mod tests;
