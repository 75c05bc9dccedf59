//! Voice Recorder: record from the microphone with terminal commands and
//! fetch the result over HTTP.

mod app;
mod app_command;
mod artifact_writer;
mod config;
mod error;
mod input_handler;
mod recorder_status;
mod recording_timer;
mod server;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    artifact_writer::ArtifactWriter,
    error::{AppError, Result as AppResult},
    input_handler::InputHandler,
    recorder_status::RecorderStatus,
    recording_timer::RecordingTimer,
};

use crate::{config::Config, server::ServerState};

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::error;
use tracing_subscriber::EnvFilter;
use voice_recorder_core::{CpalBackend, ObjectUrlRegistry, RecordingController};

const DEFAULT_LOG_FILTER: &str = "voice_recorder=info,voice_recorder_core=info";

/// Application entry point.
#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let backend = CpalBackend::new(config.audio.selected_device.clone());
    let controller = Arc::new(RecordingController::with_constraints(
        backend,
        Arc::new(ObjectUrlRegistry::new()),
        config.audio.constraints(),
    ));

    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (elapsed_tx, elapsed_rx) = watch::channel(0_u64);

    let server_state = ServerState {
        controller: Arc::clone(&controller),
        elapsed_rx,
    };
    let server_config = config.server.clone();

    let input_handler = InputHandler::new(command_tx);
    let app = App::new(controller, config, command_rx, shutdown_tx, elapsed_tx);

    tokio::join!(
        async {
            if let Err(e) = input_handler.run(shutdown_rx.clone()).await {
                error!(error = ?e, "Input handler error");
            }
        },
        async {
            if let Err(e) = server::serve(&server_config, server_state, shutdown_rx.clone()).await {
                error!(error = ?e, "Server error");
            }
        },
        async {
            if let Err(e) = app.run().await {
                error!(error = ?e, "App error");
            }
        }
    );
}
