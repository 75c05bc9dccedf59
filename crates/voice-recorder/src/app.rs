use crate::{
    AppCommand, AppError, AppResult, ArtifactWriter, RecorderStatus, RecordingTimer,
    app_command::HELP_TEXT, config::Config,
};

use std::{ops::ControlFlow, panic::Location, path::PathBuf, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    sync::{mpsc, watch},
    time::MissedTickBehavior,
};
use tracing::{error, info, instrument, warn};
use voice_recorder_core::{CpalBackend, ErrorState, RecorderSnapshot, RecordingController};

const TIMER_TICK: Duration = Duration::from_secs(1);

/// Main application state.
///
/// Owns the command loop: commands from the input handler drive the
/// controller, controller snapshots drive status reporting and the timer.
pub struct App {
    pub(crate) controller: Arc<RecordingController<CpalBackend>>,
    pub(crate) writer: ArtifactWriter,
    pub(crate) config: Config,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) elapsed_tx: watch::Sender<u64>,
    pub(crate) timer: RecordingTimer,
    pub(crate) timer_running: bool,
    status: RecorderStatus,
    last_url: Option<String>,
    last_error: Option<ErrorState>,
}

impl App {
    /// Create the application around an existing controller.
    pub fn new(
        controller: Arc<RecordingController<CpalBackend>>,
        config: Config,
        command_rx: mpsc::Receiver<AppCommand>,
        shutdown_tx: watch::Sender<bool>,
        elapsed_tx: watch::Sender<u64>,
    ) -> Self {
        let writer = ArtifactWriter::new(
            config.output.output_dir.clone(),
            config.output.download_file_name.clone(),
        );
        let timer = RecordingTimer::new(config.behavior.max_duration_secs);
        let status = RecorderStatus::from_snapshot(&controller.snapshot());

        Self {
            controller,
            writer,
            config,
            command_rx,
            shutdown_tx,
            elapsed_tx,
            timer,
            timer_running: false,
            status,
            last_url: None,
            last_error: None,
        }
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!(
            disabled = self.config.behavior.disabled,
            max_duration_secs = self.config.behavior.max_duration_secs,
            "Voice Recorder starting"
        );
        println!("{}", HELP_TEXT);

        let mut snapshots = self.controller.subscribe();
        let mut ticker = tokio::time::interval(TIMER_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    if self.handle_command(command).await.is_break() {
                        info!("Shutdown requested");
                        break;
                    }
                }

                Ok(()) = snapshots.changed() => {
                    let snapshot = snapshots.borrow_and_update().clone();
                    if self.observe(&snapshot) {
                        // First tick one full second after (re)starting.
                        ticker.reset();
                    }
                }

                _ = ticker.tick(), if self.timer_running => {
                    self.on_tick();
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.controller.teardown();

        let _ = self.shutdown_tx.send(true);
        info!("Voice Recorder shut down successfully");

        Ok(())
    }

    /// Apply one command. Breaks on shutdown.
    #[instrument(skip(self))]
    pub(crate) async fn handle_command(&mut self, command: AppCommand) -> ControlFlow<()> {
        if self.config.behavior.disabled && command.is_recorder_action() {
            warn!(?command, "Recorder disabled, command ignored");
            println!("Recorder is disabled");
            return ControlFlow::Continue(());
        }

        match command {
            AppCommand::Start => {
                self.controller.start_recording().await;
                if self.controller.is_recording() {
                    self.notify("Recording started");
                }
            }
            AppCommand::Stop => {
                let was_recording = self.controller.is_recording();
                self.controller.stop_recording();
                if was_recording {
                    self.notify("Recording stopped");
                }
            }
            AppCommand::Pause => self.pause(),
            AppCommand::Resume => self.resume(),
            AppCommand::Toggle => {
                if self.controller.is_paused() {
                    self.resume();
                } else if self.controller.is_recording() {
                    self.pause();
                } else {
                    println!("Not recording");
                }
            }
            AppCommand::Clear => {
                self.controller.clear_recording();
                self.reset_timer();
                println!("Recording cleared");
            }
            AppCommand::Save { name } => match self.save(name.as_deref()) {
                Ok(path) => println!("Saved {}", path.display()),
                Err(e) => {
                    error!(error = %e, "Failed to save recording");
                    println!("Save failed: {}", e);
                }
            },
            AppCommand::Status => self.print_status(),
            AppCommand::Help => println!("{}", HELP_TEXT),
            AppCommand::Shutdown => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }

    /// React to a published snapshot. Returns `true` when the timer has just
    /// started running.
    pub(crate) fn observe(&mut self, snapshot: &RecorderSnapshot) -> bool {
        let status = RecorderStatus::from_snapshot(snapshot);
        if status != self.status {
            info!(from = %self.status, to = %status, "Status changed");
            println!("Status: {}", status);
            self.status = status;
        }

        if snapshot.error != self.last_error {
            if let Some(error) = &snapshot.error {
                println!("Error: {}", error);
            }
            self.last_error = snapshot.error.clone();
        }

        if snapshot.audio_url != self.last_url {
            if let Some(url) = &snapshot.audio_url {
                info!(url = %url, "Recording available");
                println!("Recording available: {}", url);
                if self.config.server.enabled {
                    println!("  {}/recording", self.config.server_url());
                }
            }
            self.last_url = snapshot.audio_url.clone();
        }

        if !snapshot.is_recording && snapshot.audio_url.is_none() {
            self.reset_timer();
        }

        let running = snapshot.is_recording && !snapshot.is_paused;
        let started = running && !self.timer_running;
        self.timer_running = running;
        started
    }

    /// One timer second. Stops the recording at the configured limit.
    pub(crate) fn on_tick(&mut self) {
        let limit_reached = self.timer.tick();
        let _ = self.elapsed_tx.send_replace(self.timer.elapsed_secs());

        if limit_reached {
            info!(
                max_duration_secs = self.config.behavior.max_duration_secs,
                "Maximum duration reached, stopping"
            );
            self.controller.stop_recording();
            self.notify("Recording stopped (maximum duration reached)");
        }
    }

    #[track_caller]
    pub(crate) fn save(&self, name: Option<&str>) -> AppResult<PathBuf> {
        let blob = self
            .controller
            .audio_blob()
            .ok_or_else(|| AppError::NoRecording {
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.writer.save(&blob, name)
    }

    fn pause(&self) {
        self.controller.pause_recording();
        if self.controller.is_paused() {
            self.notify("Recording paused");
        }
    }

    fn resume(&self) {
        let was_paused = self.controller.is_paused();
        self.controller.resume_recording();
        if was_paused && !self.controller.is_paused() && self.controller.is_recording() {
            self.notify("Recording resumed");
        }
    }

    fn reset_timer(&mut self) {
        self.timer.reset();
        let _ = self.elapsed_tx.send_replace(0);
    }

    fn notify(&self, event: &str) {
        info!(event, "Lifecycle event");
        println!("{}", event);
    }

    fn print_status(&self) {
        let snapshot = self.controller.snapshot();
        println!(
            "{} {}",
            RecorderStatus::from_snapshot(&snapshot),
            self.timer.formatted()
        );
        if let Some(url) = &snapshot.audio_url {
            println!("  recording: {}", url);
        }
        if let Some(error) = &snapshot.error {
            println!("  error: {}", error);
        }
    }
}
