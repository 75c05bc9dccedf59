use std::fmt;

use error_location::ErrorLocation;
use thiserror::Error;

/// Recording controller failures with source location tracking.
///
/// None of these escape the controller: each one is logged and folded into
/// the published [`ErrorState`].
#[derive(Error, Debug)]
pub enum RecorderError {
    /// The capture device provider refused or failed to supply a stream.
    #[error("Microphone access denied: {reason} {location}")]
    MicrophoneAccessDenied {
        /// Underlying provider failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The supplied stream is inactive or has no live audio track.
    #[error("Audio stream unavailable: {reason} {location}")]
    StreamUnavailable {
        /// Why the stream was rejected.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No capture session could be constructed on the stream.
    #[error("Failed to create capture session: {reason} {location}")]
    SessionCreateFailed {
        /// Underlying construction failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The new session or its stream was not ready immediately before start.
    #[error("Cannot start: {reason} {location}")]
    InvalidPreStartState {
        /// Observed session or stream condition.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Both the plain and the timesliced start calls failed.
    #[error("Failed to start capture session: {reason} {location}")]
    StartFailed {
        /// Device error kind and message of the last start call.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Same-stream and fresh-stream recovery both failed.
    #[error("Capture session failed to start after all recovery attempts. Final error: {reason} {location}")]
    RecoveryExhausted {
        /// Last underlying failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The session rejected a stop request.
    #[error("Failed to stop recording: {reason} {location}")]
    StopFailed {
        /// Underlying device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The session rejected a pause request.
    #[error("Failed to pause recording: {reason} {location}")]
    PauseFailed {
        /// Underlying device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The session rejected a resume request.
    #[error("Failed to resume recording: {reason} {location}")]
    ResumeFailed {
        /// Underlying device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Pause requested while the session is not recording.
    #[error("Cannot pause: recorder is {reason} {location}")]
    CannotPause {
        /// Session state at the time of the request.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Resume requested while the session is not paused.
    #[error("Cannot resume: recorder is {reason} {location}")]
    CannotResume {
        /// Session state at the time of the request.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The capture session reported an asynchronous failure.
    #[error("Recording error: {reason} {location}")]
    SessionError {
        /// Message delivered with the error notification.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl RecorderError {
    /// Category of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecorderError::MicrophoneAccessDenied { .. } => ErrorKind::MicrophoneAccessDenied,
            RecorderError::StreamUnavailable { .. } => ErrorKind::StreamUnavailable,
            RecorderError::SessionCreateFailed { .. } => ErrorKind::SessionCreateFailed,
            RecorderError::InvalidPreStartState { .. } => ErrorKind::InvalidPreStartState,
            RecorderError::StartFailed { .. } => ErrorKind::StartFailed,
            RecorderError::RecoveryExhausted { .. } => ErrorKind::RecoveryExhausted,
            RecorderError::StopFailed { .. } => ErrorKind::StopFailed,
            RecorderError::PauseFailed { .. } => ErrorKind::PauseFailed,
            RecorderError::ResumeFailed { .. } => ErrorKind::ResumeFailed,
            RecorderError::CannotPause { .. } => ErrorKind::CannotPause,
            RecorderError::CannotResume { .. } => ErrorKind::CannotResume,
            RecorderError::SessionError { .. } => ErrorKind::SessionError,
        }
    }

    /// Detail text without the source location.
    pub fn reason(&self) -> &str {
        match self {
            RecorderError::MicrophoneAccessDenied { reason, .. }
            | RecorderError::StreamUnavailable { reason, .. }
            | RecorderError::SessionCreateFailed { reason, .. }
            | RecorderError::InvalidPreStartState { reason, .. }
            | RecorderError::StartFailed { reason, .. }
            | RecorderError::RecoveryExhausted { reason, .. }
            | RecorderError::StopFailed { reason, .. }
            | RecorderError::PauseFailed { reason, .. }
            | RecorderError::ResumeFailed { reason, .. }
            | RecorderError::CannotPause { reason, .. }
            | RecorderError::CannotResume { reason, .. }
            | RecorderError::SessionError { reason, .. } => reason,
        }
    }
}

/// Failure categories surfaced to the presentation layer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`RecorderError::MicrophoneAccessDenied`].
    #[error("Microphone access denied")]
    MicrophoneAccessDenied,
    /// See [`RecorderError::StreamUnavailable`].
    #[error("Audio stream unavailable")]
    StreamUnavailable,
    /// See [`RecorderError::SessionCreateFailed`].
    #[error("Failed to create capture session")]
    SessionCreateFailed,
    /// See [`RecorderError::InvalidPreStartState`].
    #[error("Cannot start")]
    InvalidPreStartState,
    /// See [`RecorderError::StartFailed`].
    #[error("Failed to start capture session")]
    StartFailed,
    /// See [`RecorderError::RecoveryExhausted`].
    #[error("Capture session failed to start after all recovery attempts")]
    RecoveryExhausted,
    /// See [`RecorderError::StopFailed`].
    #[error("Failed to stop recording")]
    StopFailed,
    /// See [`RecorderError::PauseFailed`].
    #[error("Failed to pause recording")]
    PauseFailed,
    /// See [`RecorderError::ResumeFailed`].
    #[error("Failed to resume recording")]
    ResumeFailed,
    /// See [`RecorderError::CannotPause`].
    #[error("Cannot pause")]
    CannotPause,
    /// See [`RecorderError::CannotResume`].
    #[error("Cannot resume")]
    CannotResume,
    /// See [`RecorderError::SessionError`].
    #[error("Recording error")]
    SessionError,
}

/// Last failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorState {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl From<&RecorderError> for ErrorState {
    fn from(error: &RecorderError) -> Self {
        Self {
            kind: error.kind(),
            message: format!("{}: {}", error.kind(), error.reason()),
        }
    }
}

impl fmt::Display for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result type alias using [`RecorderError`].
pub type Result<T> = std::result::Result<T, RecorderError>;
