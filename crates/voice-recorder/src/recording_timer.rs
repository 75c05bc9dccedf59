/// Elapsed recording time in whole seconds.
///
/// Driven by a one-second tick that only runs while recording and not
/// paused. Pausing keeps the count; it resets when the recorder is idle
/// with nothing recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingTimer {
    elapsed_secs: u64,
    max_duration_secs: u64,
}

impl RecordingTimer {
    /// A timer that reports the limit after `max_duration_secs` ticks
    /// (0 = unlimited).
    pub fn new(max_duration_secs: u64) -> Self {
        Self {
            elapsed_secs: 0,
            max_duration_secs,
        }
    }

    /// Count one second. Returns `true` once the limit is reached.
    pub fn tick(&mut self) -> bool {
        self.elapsed_secs += 1;
        self.max_duration_secs > 0 && self.elapsed_secs >= self.max_duration_secs
    }

    /// Back to zero.
    pub fn reset(&mut self) {
        self.elapsed_secs = 0;
    }

    /// Seconds counted so far.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// `HH:MM:SS`.
    pub fn formatted(&self) -> String {
        format_hms(self.elapsed_secs)
    }
}

/// Format seconds as zero-padded `HH:MM:SS`. Hours keep growing past 99.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
