mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod output_config;
mod server_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    output_config::OutputConfig, server_config::ServerConfig,
};

use std::path::PathBuf;

use directories::ProjectDirs;

pub(crate) const DEFAULT_AUDIO_PROCESSING: bool = true;
pub(crate) const DEFAULT_MAX_DURATION_SECS: u64 = 0;
pub(crate) const DEFAULT_DISABLED: bool = false;
pub(crate) const DEFAULT_DOWNLOAD_FILE_NAME: &str = "recording";
pub(crate) const DEFAULT_SERVER_ENABLED: bool = true;
pub(crate) const DEFAULT_PORT: u16 = 7878;

pub(crate) fn default_audio_processing() -> bool {
    DEFAULT_AUDIO_PROCESSING
}

pub(crate) fn default_max_duration_secs() -> u64 {
    DEFAULT_MAX_DURATION_SECS
}

pub(crate) fn default_disabled() -> bool {
    DEFAULT_DISABLED
}

pub(crate) fn default_download_file_name() -> String {
    DEFAULT_DOWNLOAD_FILE_NAME.to_string()
}

/// `recordings/` under the platform data directory, or under the working
/// directory when the platform has none.
pub(crate) fn default_output_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("recordings"))
        .unwrap_or_else(|| PathBuf::from("recordings"))
}

pub(crate) fn default_server_enabled() -> bool {
    DEFAULT_SERVER_ENABLED
}

pub(crate) fn default_port() -> u16 {
    DEFAULT_PORT
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "voice-recorder", "Voice-Recorder")
}
