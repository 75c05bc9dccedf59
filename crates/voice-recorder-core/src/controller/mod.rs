mod recorder;
mod shared;
mod start;
mod start_guard;
mod state;

pub use {recorder::RecordingController, state::RecorderSnapshot};

use std::time::Duration;

/// Wait after a start before trusting the session's reported state.
///
/// Empirical: long enough for the device to report a failed transition,
/// short enough not to be noticed by the user.
pub const START_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Best-effort wait after stopping a previous session before opening a new
/// stream.
pub const STOP_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Delivery interval requested when a plain start is rejected.
pub const TIMESLICE: Duration = Duration::from_millis(1000);
