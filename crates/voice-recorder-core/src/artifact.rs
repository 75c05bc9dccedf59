//! Finished recordings and the revocable urls that reference them.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::{debug, warn};
use uuid::Uuid;

/// MIME type used when the session did not report one.
pub const DEFAULT_ARTIFACT_MIME_TYPE: &str = "audio/webm";

const URL_PREFIX: &str = "blob:voice-recorder/";

/// Encoded audio bytes with their MIME type. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl AudioBlob {
    /// Concatenate fragments into one blob.
    pub fn from_chunks(chunks: &[Vec<u8>], mime_type: impl Into<String>) -> Self {
        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(chunk);
        }

        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Raw encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob holds no data.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type, e.g. `audio/webm`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// File extension suited for saving this blob.
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

/// A finished recording and the url it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Recorded audio.
    pub blob: AudioBlob,
    /// Revocable reference issued by an [`ObjectUrlRegistry`].
    pub url: String,
}

/// Issues, resolves and revokes `blob:` urls for recorded audio.
///
/// Every url stays resolvable until revoked; holders are responsible for
/// revoking urls they no longer publish.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: Mutex<HashMap<String, AudioBlob>>,
}

impl ObjectUrlRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `blob` under a fresh url.
    pub fn create(&self, blob: AudioBlob) -> String {
        let url = format!("{URL_PREFIX}{}", Uuid::new_v4());
        debug!(url = %url, size = blob.len(), mime_type = blob.mime_type(), "Object url issued");
        self.lock().insert(url.clone(), blob);
        url
    }

    /// Forget `url`. Returns whether it was live.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.lock().remove(url).is_some();
        if removed {
            debug!(url = %url, "Object url revoked");
        } else {
            warn!(url = %url, "Revoking unknown object url");
        }
        removed
    }

    /// Blob behind a live url.
    pub fn resolve(&self, url: &str) -> Option<AudioBlob> {
        self.lock().get(url).cloned()
    }

    /// Blob behind a live url, looked up by the id part only.
    pub fn resolve_id(&self, id: &str) -> Option<AudioBlob> {
        self.resolve(&format!("{URL_PREFIX}{id}"))
    }

    /// Number of urls not yet revoked.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AudioBlob>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The id part of a url issued by [`ObjectUrlRegistry::create`].
pub fn url_id(url: &str) -> Option<&str> {
    url.strip_prefix(URL_PREFIX)
}

/// File extension for a recorded MIME type. Anything unrecognised is saved
/// as `mp4`.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "audio/webm" | "video/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        _ => "mp4",
    }
}
