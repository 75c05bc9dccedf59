use crate::config::default_audio_processing;

use serde::{Deserialize, Serialize};
use voice_recorder_core::AudioConstraints;

/// Audio device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Selected input device name or index (None = default device).
    #[serde(default)]
    pub selected_device: Option<String>,

    /// Request echo cancellation on the input stream.
    #[serde(default = "default_audio_processing")]
    pub echo_cancellation: bool,

    /// Request noise suppression on the input stream.
    #[serde(default = "default_audio_processing")]
    pub noise_suppression: bool,

    /// Request automatic gain control on the input stream.
    #[serde(default = "default_audio_processing")]
    pub auto_gain_control: bool,
}

impl AudioConfig {
    /// Stream constraints requested on every start.
    pub fn constraints(&self) -> AudioConstraints {
        AudioConstraints {
            echo_cancellation: self.echo_cancellation,
            noise_suppression: self.noise_suppression,
            auto_gain_control: self.auto_gain_control,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            selected_device: None,
            echo_cancellation: default_audio_processing(),
            noise_suppression: default_audio_processing(),
            auto_gain_control: default_audio_processing(),
        }
    }
}
