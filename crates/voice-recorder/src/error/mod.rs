use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Application-level errors for the voice-recorder binary.
///
/// All variants include `ErrorLocation` for call-site tracking. Recording
/// failures never appear here: the controller publishes those as state.
#[derive(Error, Debug)]
pub enum AppError {
    /// Input line did not match any command.
    #[error("Unknown command '{input}' {location}")]
    UnknownCommand {
        /// The line as typed.
        input: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Save requested with no finished recording.
    #[error("No recording to save {location}")]
    NoRecording {
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Writing the recording to disk failed.
    #[error("Failed to save recording: {reason} {location}")]
    SaveFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The embedded HTTP server could not start or stopped with an error.
    #[error("Server error: {reason} {location}")]
    ServerError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to send message through async channel.
    #[error("Channel send failed: {message} {location}")]
    ChannelSendFailed {
        /// Human-readable error message.
        message: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Configuration loading or saving error.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    IoError {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::IoError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
