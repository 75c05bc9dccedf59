//! Line-based command input.
//!
//! Reads commands from stdin and forwards them to the main application over
//! an async channel.

use crate::{AppCommand, AppError, AppResult};

use std::{io::BufRead, panic::Location};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Turns input lines into [`AppCommand`]s.
pub struct InputHandler {
    command_tx: mpsc::Sender<AppCommand>,
}

impl InputHandler {
    /// Create a handler sending to `command_tx`.
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Run until shutdown is signalled or stdin closes. Closing stdin
    /// requests shutdown.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let (line_tx, mut line_rx) = mpsc::channel::<String>(32);

        // Stdin reads block with no way to cancel them. The reader lives on
        // a detached thread so a pending read never holds up shutdown; it
        // ends on the first send after `line_rx` is dropped.
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Input handler shutting down");
                    break;
                }
                line = line_rx.recv() => match line {
                    Some(line) => self.handle_line(&line).await?,
                    None => {
                        info!("Input closed, requesting shutdown");
                        self.send(AppCommand::Shutdown).await?;
                        break;
                    }
                },
            }
        }

        Ok(())
    }

    /// Parse and forward one line. Blank lines are skipped and unknown
    /// commands are reported without stopping the handler.
    pub async fn handle_line(&self, line: &str) -> AppResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        match line.parse::<AppCommand>() {
            Ok(command) => {
                debug!(?command, "Command received");
                self.send(command).await
            }
            Err(e) => {
                warn!(error = %e, "Ignoring input");
                println!("Unknown command: {} (type 'help')", line.trim());
                Ok(())
            }
        }
    }

    #[track_caller]
    fn send_error(e: mpsc::error::SendError<AppCommand>) -> AppError {
        AppError::ChannelSendFailed {
            message: format!("Failed to send {:?}", e.0),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(Self::send_error)
    }
}
