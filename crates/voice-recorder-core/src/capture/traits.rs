//! Capture trait definitions
//!
//! Platform-agnostic traits for audio capture sources.

use crate::capture::DeviceError;

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;

/// Audio processing requested when opening a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConstraints {
    /// Cancel speaker echo picked up by the microphone.
    pub echo_cancellation: bool,
    /// Suppress steady background noise.
    pub noise_suppression: bool,
    /// Normalise input level automatically.
    pub auto_gain_control: bool,
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Lifecycle state reported by a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Not capturing. Initial and terminal state.
    Inactive,
    /// Capturing and delivering data.
    Recording,
    /// Capture suspended; resumable.
    Paused,
    /// The device failed; the session is unusable.
    Errored,
}

impl SessionState {
    /// `true` for [`SessionState::Recording`] and [`SessionState::Paused`].
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Inactive => "inactive",
            SessionState::Recording => "recording",
            SessionState::Paused => "paused",
            SessionState::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Receives one encoded fragment. Fragments may be empty.
pub type DataHandler = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// Fired once after the session finished flushing data on stop.
pub type StopHandler = Arc<dyn Fn() + Send + Sync>;

/// Fired when the device fails asynchronously.
pub type ErrorHandler = Arc<dyn Fn(DeviceError) + Send + Sync>;

/// Notification callbacks registered on a session.
///
/// Sessions may invoke these from any thread, including synchronously from
/// inside [`CaptureSession::stop`], but never concurrently with each other.
#[derive(Clone)]
pub struct SessionHandlers {
    /// Data fragment available.
    pub on_data: DataHandler,
    /// Session stopped.
    pub on_stop: StopHandler,
    /// Session failed.
    pub on_error: ErrorHandler,
}

impl fmt::Debug for SessionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandlers").finish_non_exhaustive()
    }
}

/// A live audio input stream.
///
/// Cloning yields another handle to the same stream.
pub trait AudioStream: Clone + Send + Sync + 'static {
    /// Whether the stream is still delivering audio.
    fn is_active(&self) -> bool;

    /// Whether the stream has at least one audio track in the live state.
    fn has_live_audio_track(&self) -> bool;

    /// Stop every track, releasing the device.
    fn stop_tracks(&self);

    /// Active with a live audio track.
    fn is_live(&self) -> bool {
        self.is_active() && self.has_live_audio_track()
    }
}

/// Turns a stream into encoded chunks.
pub trait CaptureSession: Send + Sync + 'static {
    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Encoding in use. Empty when the platform has not decided yet.
    fn mime_type(&self) -> String;

    /// Replace the notification callbacks.
    fn set_handlers(&self, handlers: SessionHandlers);

    /// Begin capture. With a timeslice, data is flushed periodically.
    fn start(&self, timeslice: Option<Duration>) -> Result<(), DeviceError>;

    /// Suspend capture.
    fn pause(&self) -> Result<(), DeviceError>;

    /// Continue a paused capture.
    fn resume(&self) -> Result<(), DeviceError>;

    /// End capture; remaining data and then the stop notification follow.
    fn stop(&self) -> Result<(), DeviceError>;
}

/// Capture device provider and session constructor.
#[async_trait]
pub trait CaptureBackend: Send + Sync + 'static {
    /// Stream handle type.
    type Stream: AudioStream;
    /// Session type built on [`Self::Stream`].
    type Session: CaptureSession;

    /// Open a new input stream.
    async fn request_stream(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<Self::Stream, DeviceError>;

    /// Whether sessions can encode to `mime_type`.
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Build an inactive session. `None` selects the platform default encoding.
    fn create_session(
        &self,
        stream: &Self::Stream,
        mime_type: Option<&str>,
    ) -> Result<Self::Session, DeviceError>;
}
