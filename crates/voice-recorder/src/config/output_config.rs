use crate::config::{default_download_file_name, default_output_dir};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where saved recordings go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File name, without extension, used when `save` is given no name.
    #[serde(default = "default_download_file_name")]
    pub download_file_name: String,

    /// Directory recordings are saved to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_file_name: default_download_file_name(),
            output_dir: default_output_dir(),
        }
    }
}
