use crate::AppError;

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Commands sent from the input handler to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start a new recording.
    Start,
    /// Stop the current recording.
    Stop,
    /// Pause the current recording.
    Pause,
    /// Resume a paused recording.
    Resume,
    /// Pause when recording, resume when paused.
    Toggle,
    /// Discard the finished recording.
    Clear,
    /// Write the finished recording to disk.
    Save {
        /// File name without extension; the configured name when `None`.
        name: Option<String>,
    },
    /// Print the current status.
    Status,
    /// Print the command list.
    Help,
    /// Request application shutdown.
    Shutdown,
}

impl AppCommand {
    /// Commands that act on the recorder and are refused while disabled.
    pub fn is_recorder_action(&self) -> bool {
        matches!(
            self,
            AppCommand::Start
                | AppCommand::Stop
                | AppCommand::Pause
                | AppCommand::Resume
                | AppCommand::Toggle
                | AppCommand::Clear
                | AppCommand::Save { .. }
        )
    }
}

/// One line per command, printed by `help`.
pub const HELP_TEXT: &str = "\
Commands:
  start          start recording
  stop           stop and keep the recording
  pause          pause recording
  resume         resume a paused recording
  toggle         pause or resume
  clear          discard the recording
  save [name]    save the recording to the output directory
  status         show the current status
  help           show this list
  quit           exit";

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word.to_ascii_lowercase().as_str(), rest.is_empty()) {
            ("start" | "record", true) => AppCommand::Start,
            ("stop", true) => AppCommand::Stop,
            ("pause", true) => AppCommand::Pause,
            ("resume", true) => AppCommand::Resume,
            ("toggle", true) => AppCommand::Toggle,
            ("clear", true) => AppCommand::Clear,
            ("save" | "download", _) => AppCommand::Save {
                name: (!rest.is_empty()).then(|| rest.to_string()),
            },
            ("status", true) => AppCommand::Status,
            ("help" | "?", true) => AppCommand::Help,
            ("quit" | "exit", true) => AppCommand::Shutdown,
            _ => {
                return Err(AppError::UnknownCommand {
                    input: line.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        Ok(command)
    }
}
