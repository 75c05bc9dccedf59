use crate::{
    ErrorState,
    artifact::{Artifact, AudioBlob},
};

/// Recording phase mirrored from the capture session.
///
/// The presentation flags are projections of this single value, so
/// `is_paused` can never be observed without `is_recording`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Phase {
    /// No capture in progress.
    #[default]
    Inactive,
    /// Capturing.
    Recording,
    /// Capture suspended.
    Paused,
}

/// Everything the presentation layer can observe about the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderSnapshot {
    /// Url of the finished recording, if any.
    pub audio_url: Option<String>,
    /// Finished recording, if any.
    pub audio_blob: Option<AudioBlob>,
    /// A session is recording or paused.
    pub is_recording: bool,
    /// The session is paused.
    pub is_paused: bool,
    /// Last failure since the most recent start attempt.
    pub error: Option<ErrorState>,
}

/// State transitions. The only way [`RecorderState`] changes.
#[derive(Debug)]
pub(crate) enum Transition {
    /// A start attempt begins: error cleared, artifact dropped, phase reset.
    AttemptStarted,
    /// The session was asked to record.
    Started,
    /// The session is paused.
    Paused,
    /// The session is recording again.
    Resumed,
    /// A replacement session was adopted after a failed start; failures
    /// reported by the abandoned session no longer apply.
    Recovered,
    /// The session ended or was abandoned.
    Stopped,
    /// An attempt or the session failed; capture is over.
    Failed(ErrorState),
    /// A failure that leaves the phase as it is.
    Reported(ErrorState),
    /// A recording finished.
    ArtifactReady(Artifact),
    /// The recording was discarded.
    ArtifactCleared,
}

/// Phase, error and artifact as one record.
#[derive(Debug, Default)]
pub(crate) struct RecorderState {
    phase: Phase,
    error: Option<ErrorState>,
    artifact: Option<Artifact>,
}

impl RecorderState {
    /// Apply `transition`, returning an artifact it displaced. The caller must
    /// revoke the displaced artifact's url.
    #[must_use]
    pub(crate) fn apply(&mut self, transition: Transition) -> Option<Artifact> {
        match transition {
            Transition::AttemptStarted => {
                self.error = None;
                self.phase = Phase::Inactive;
                self.artifact.take()
            }
            Transition::Started | Transition::Resumed => {
                self.phase = Phase::Recording;
                None
            }
            Transition::Recovered => {
                self.error = None;
                self.phase = Phase::Recording;
                None
            }
            Transition::Paused => {
                self.phase = Phase::Paused;
                None
            }
            Transition::Stopped => {
                self.phase = Phase::Inactive;
                None
            }
            Transition::Failed(error) => {
                self.error = Some(error);
                self.phase = Phase::Inactive;
                None
            }
            Transition::Reported(error) => {
                self.error = Some(error);
                None
            }
            Transition::ArtifactReady(artifact) => self.artifact.replace(artifact),
            Transition::ArtifactCleared => self.artifact.take(),
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn snapshot(&self) -> RecorderSnapshot {
        RecorderSnapshot {
            audio_url: self.artifact.as_ref().map(|a| a.url.clone()),
            audio_blob: self.artifact.as_ref().map(|a| a.blob.clone()),
            is_recording: self.phase != Phase::Inactive,
            is_paused: self.phase == Phase::Paused,
            error: self.error.clone(),
        }
    }
}
