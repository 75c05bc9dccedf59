//! Capture backend for the host's audio input devices via CPAL.

mod cpal_session;
mod cpal_stream;

pub use {
    cpal_session::CpalCaptureSession,
    cpal_stream::{CpalBackend, CpalInputStream},
};

/// The only encoding CPAL sessions produce.
pub const WAV_MIME_TYPE: &str = "audio/wav";

#[cfg(test)]
pub(crate) use cpal_session::{MAX_SESSION_SAMPLES, append_mono, encode_wav, is_fatal};
