//! Embedded HTTP server exposing recorder status and recordings.
//!
//! - `GET /status` returns a [`StatusResponse`] as JSON
//! - `GET /recording` returns the current recording's bytes
//! - `GET /blob/{id}` returns any recording whose url is still live

use crate::{AppError, AppResult, RecorderStatus, config::ServerConfig, recording_timer::format_hms};

use std::{net::SocketAddr, panic::Location, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use error_location::ErrorLocation;
use serde::Serialize;
use tokio::{net::TcpListener, sync::watch};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, instrument};
use voice_recorder_core::{AudioBlob, CpalBackend, RecorderSnapshot, RecordingController};

/// State shared with every request handler.
#[derive(Clone)]
pub struct ServerState {
    pub(crate) controller: Arc<RecordingController<CpalBackend>>,
    pub(crate) elapsed_rx: watch::Receiver<u64>,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    /// Derived recorder status.
    pub status: RecorderStatus,
    /// A session is recording or paused.
    pub is_recording: bool,
    /// The session is paused.
    pub is_paused: bool,
    /// Url of the finished recording.
    pub audio_url: Option<String>,
    /// MIME type of the finished recording.
    pub mime_type: Option<String>,
    /// Size of the finished recording in bytes.
    pub size: Option<usize>,
    /// Message of the last failure.
    pub error: Option<String>,
    /// Recorded seconds.
    pub elapsed_secs: u64,
    /// Recorded time as `HH:MM:SS`.
    pub elapsed: String,
}

impl StatusResponse {
    /// Build from a controller snapshot and the timer reading.
    pub fn new(snapshot: &RecorderSnapshot, elapsed_secs: u64) -> Self {
        Self {
            status: RecorderStatus::from_snapshot(snapshot),
            is_recording: snapshot.is_recording,
            is_paused: snapshot.is_paused,
            audio_url: snapshot.audio_url.clone(),
            mime_type: snapshot
                .audio_blob
                .as_ref()
                .map(|b| b.mime_type().to_string()),
            size: snapshot.audio_blob.as_ref().map(AudioBlob::len),
            error: snapshot.error.as_ref().map(|e| e.message.clone()),
            elapsed_secs,
            elapsed: format_hms(elapsed_secs),
        }
    }
}

/// Routes with permissive CORS so a page on another origin can poll status.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/recording", get(recording))
        .route("/blob/{id}", get(blob))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on `127.0.0.1:<port>` until shutdown is signalled. Returns at once
/// when the server is disabled.
#[instrument(skip_all, fields(port = config.port))]
pub async fn serve(
    config: &ServerConfig,
    state: ServerState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> AppResult<()> {
    if !config.enabled {
        info!("Embedded server disabled");
        return Ok(());
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::ServerError {
            reason: format!("Failed to bind {}: {}", addr, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!(%addr, "Embedded server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
        .map_err(|e| AppError::ServerError {
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Embedded server stopped");

    Ok(())
}

async fn status(State(state): State<ServerState>) -> Json<StatusResponse> {
    let elapsed_secs = *state.elapsed_rx.borrow();
    Json(StatusResponse::new(&state.controller.snapshot(), elapsed_secs))
}

async fn recording(State(state): State<ServerState>) -> Response {
    match state.controller.audio_blob() {
        Some(blob) => blob_response(&blob),
        None => (StatusCode::NOT_FOUND, "No recording available").into_response(),
    }
}

async fn blob(State(state): State<ServerState>, Path(id): Path<String>) -> Response {
    match state.controller.url_registry().resolve_id(&id) {
        Some(blob) => blob_response(&blob),
        None => {
            debug!(id = %id, "Unknown or revoked blob requested");
            (StatusCode::NOT_FOUND, "Unknown or revoked recording").into_response()
        }
    }
}

fn blob_response(blob: &AudioBlob) -> Response {
    (
        [(header::CONTENT_TYPE, blob.mime_type().to_string())],
        Bytes::copy_from_slice(blob.bytes()),
    )
        .into_response()
}
