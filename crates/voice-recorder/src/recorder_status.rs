use std::fmt;

use serde::Serialize;
use voice_recorder_core::RecorderSnapshot;

/// What the recorder is doing, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderStatus {
    /// Nothing recorded.
    Idle,
    /// Capturing audio.
    Recording,
    /// Capture suspended.
    Paused,
    /// A finished recording is available.
    Completed,
    /// The last operation failed.
    Error,
}

impl RecorderStatus {
    /// Derive the status, checking error, paused, recording and a finished
    /// recording in that order.
    pub fn from_snapshot(snapshot: &RecorderSnapshot) -> Self {
        if snapshot.error.is_some() {
            RecorderStatus::Error
        } else if snapshot.is_recording && snapshot.is_paused {
            RecorderStatus::Paused
        } else if snapshot.is_recording {
            RecorderStatus::Recording
        } else if snapshot.audio_url.is_some() {
            RecorderStatus::Completed
        } else {
            RecorderStatus::Idle
        }
    }
}

impl fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecorderStatus::Idle => "idle",
            RecorderStatus::Recording => "recording",
            RecorderStatus::Paused => "paused",
            RecorderStatus::Completed => "completed",
            RecorderStatus::Error => "error",
        })
    }
}
