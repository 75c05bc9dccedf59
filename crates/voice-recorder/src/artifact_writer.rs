//! Saving finished recordings to disk.
//!
//! Files are named `<name>.<ext>` where the extension follows the recording's
//! MIME type, and are written through a temporary file so a crash never
//! leaves a truncated recording under the final name.

use crate::{AppError, AppResult};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{info, instrument};
use voice_recorder_core::AudioBlob;

/// Writes recordings into one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    pub(crate) output_dir: PathBuf,
    pub(crate) default_name: String,
}

impl ArtifactWriter {
    /// Save into `output_dir`, naming files `default_name` unless told
    /// otherwise.
    pub fn new(output_dir: impl Into<PathBuf>, default_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            default_name: default_name.into(),
        }
    }

    /// File name for `blob`. Only the last path component of `name` is used,
    /// so a name cannot escape the output directory.
    pub fn file_name(&self, name: Option<&str>, blob: &AudioBlob) -> String {
        let stem = name
            .and_then(|n| Path::new(n.trim()).file_name())
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(self.default_name.as_str());

        format!("{}.{}", stem, blob.extension())
    }

    /// Write `blob` and return the final path.
    #[track_caller]
    #[instrument(skip(self, blob), fields(size = blob.len(), mime_type = blob.mime_type()))]
    pub fn save(&self, blob: &AudioBlob, name: Option<&str>) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(self.file_name(name, blob));
        let temp_path = path.with_extension(format!("{}.tmp", blob.extension()));

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::SaveFailed {
            reason: format!("Failed to create {}: {}", temp_path.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(blob.bytes())
            .and_then(|()| temp_file.sync_all())
            .map_err(|e| AppError::SaveFailed {
                reason: format!("Failed to write {}: {}", temp_path.display(), e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        fs::rename(&temp_path, &path).map_err(|e| AppError::SaveFailed {
            reason: format!("Failed to rename to {}: {}", path.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(path = ?path, "Recording saved (atomic write)");

        Ok(path)
    }
}
