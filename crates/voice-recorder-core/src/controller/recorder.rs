use crate::{
    ErrorState, RecorderError,
    artifact::{AudioBlob, ObjectUrlRegistry},
    capture::{AudioConstraints, CaptureBackend, CaptureSession, SessionState},
    controller::{
        shared::{Shared, TrackedSession},
        state::{Phase, RecorderSnapshot, Transition},
    },
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Drives a capture session through its lifecycle and publishes the result.
///
/// All failures are caught here and surfaced through [`Self::error`]; no
/// operation returns an error or panics. State changes are published to
/// [`Self::subscribe`] receivers.
///
/// # Thread Safety
///
/// The controller is `Send + Sync`, but operations are meant to be driven
/// from one task at a time. Overlapping [`Self::start_recording`] calls are
/// rejected: the second call returns immediately without touching state.
pub struct RecordingController<B: CaptureBackend> {
    pub(crate) backend: B,
    pub(crate) constraints: AudioConstraints,
    pub(crate) shared: Arc<Shared<B>>,
    pub(crate) starting: AtomicBool,
    torn_down: AtomicBool,
}

impl<B: CaptureBackend> RecordingController<B> {
    /// Create a controller requesting echo cancellation, noise suppression
    /// and auto gain on every stream.
    pub fn new(backend: B, urls: Arc<ObjectUrlRegistry>) -> Self {
        Self::with_constraints(backend, urls, AudioConstraints::default())
    }

    /// Create a controller with explicit stream constraints.
    pub fn with_constraints(
        backend: B,
        urls: Arc<ObjectUrlRegistry>,
        constraints: AudioConstraints,
    ) -> Self {
        info!(?constraints, "RecordingController initialized");

        Self {
            backend,
            constraints,
            shared: Arc::new(Shared::new(urls)),
            starting: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
        }
    }

    /// The injected capture backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Registry that issued [`Self::audio_url`].
    pub fn url_registry(&self) -> &Arc<ObjectUrlRegistry> {
        &self.shared.urls
    }

    /// Current observable state.
    pub fn snapshot(&self) -> RecorderSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<RecorderSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Url of the finished recording.
    pub fn audio_url(&self) -> Option<String> {
        self.shared.snapshot_tx.borrow().audio_url.clone()
    }

    /// The finished recording.
    pub fn audio_blob(&self) -> Option<AudioBlob> {
        self.shared.snapshot_tx.borrow().audio_blob.clone()
    }

    /// A session is recording or paused.
    pub fn is_recording(&self) -> bool {
        self.shared.snapshot_tx.borrow().is_recording
    }

    /// The session is paused.
    pub fn is_paused(&self) -> bool {
        self.shared.snapshot_tx.borrow().is_paused
    }

    /// Last failure since the most recent start attempt.
    pub fn error(&self) -> Option<ErrorState> {
        self.shared.snapshot_tx.borrow().error.clone()
    }

    /// Ask the session to stop. The finished recording is published once
    /// the session delivers its stop notification.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop_recording(&self) {
        let session = self.shared.read(|inner| {
            (inner.state.phase() != Phase::Inactive).then(|| inner.session.clone())
        });

        let Some(session) = session else {
            debug!("Not recording, stop ignored");
            return;
        };

        self.shared.note_stop_request();

        // Between recovery attempts no session is current yet.
        let Some(session) = session else {
            self.shared.retire(|inner| inner.transition(Transition::Stopped));
            info!("Recording stop requested during start");
            return;
        };

        if !session.handle.state().is_active() {
            self.shared.retire(|inner| inner.transition(Transition::Stopped));
            info!(session_id = %session.id, "Recording stop requested on an ended session");
            return;
        }

        match session.handle.stop() {
            Ok(()) => {
                self.shared.update(|inner| inner.transition(Transition::Stopped));
                info!(session_id = %session.id, "Recording stop requested");
            }
            Err(e) => {
                let error = RecorderError::StopFailed {
                    reason: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                };
                error!(session_id = %session.id, error = %error, "Error stopping recording");
                let state = ErrorState::from(&error);
                self.shared.retire(|inner| inner.transition(Transition::Failed(state)));
            }
        }
    }

    /// Suspend capture. Pausing a paused session is a no-op.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn pause_recording(&self) {
        let Some(session) = self.current_session() else {
            warn!("No capture session available");
            return;
        };

        match session.handle.state() {
            SessionState::Recording => match session.handle.pause() {
                Ok(()) => {
                    self.shared.update(|inner| inner.transition(Transition::Paused));
                    info!(session_id = %session.id, "Recording paused");
                }
                Err(e) => self.report_platform_failure(
                    &session,
                    RecorderError::PauseFailed {
                        reason: e.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    },
                ),
            },
            SessionState::Paused => {
                self.shared.update(|inner| inner.transition(Transition::Paused));
            }
            state @ (SessionState::Inactive | SessionState::Errored) => self.report_refusal(
                state,
                RecorderError::CannotPause {
                    reason: state.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                },
            ),
        }
    }

    /// Continue a paused capture. Resuming a recording session is a no-op.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn resume_recording(&self) {
        let Some(session) = self.current_session() else {
            warn!("No capture session available");
            return;
        };

        match session.handle.state() {
            SessionState::Paused => match session.handle.resume() {
                Ok(()) => {
                    self.shared.update(|inner| inner.transition(Transition::Resumed));
                    info!(session_id = %session.id, "Recording resumed");
                }
                Err(e) => self.report_platform_failure(
                    &session,
                    RecorderError::ResumeFailed {
                        reason: e.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    },
                ),
            },
            SessionState::Recording => {
                self.shared.update(|inner| inner.transition(Transition::Resumed));
            }
            state @ (SessionState::Inactive | SessionState::Errored) => self.report_refusal(
                state,
                RecorderError::CannotResume {
                    reason: state.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                },
            ),
        }
    }

    /// Discard the finished recording and any buffered chunks. A running
    /// session is left alone.
    #[instrument(skip(self))]
    pub fn clear_recording(&self) {
        self.shared.update(|inner| {
            inner.transition(Transition::ArtifactCleared);
            inner.chunks.clear();
        });
        debug!("Recording cleared");
    }

    /// Stop capture and release every resource. Runs once; later calls and
    /// the eventual drop are no-ops.
    #[instrument(skip(self))]
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }

        self.shared.retire(|inner| {
            inner.stop_requests += 1;
            inner.transition(Transition::ArtifactCleared);
            inner.transition(Transition::Stopped);
        });

        info!("RecordingController torn down");
    }

    pub(crate) fn current_session(&self) -> Option<TrackedSession<B::Session>> {
        self.shared.read(|inner| inner.session.clone())
    }

    /// A failed pause or resume. A session that ended underneath the call
    /// is released.
    fn report_platform_failure(&self, session: &TrackedSession<B::Session>, error: RecorderError) {
        error!(session_id = %session.id, error = %error, "Capture session call failed");

        let state = ErrorState::from(&error);
        if session.handle.state() == SessionState::Inactive {
            self.shared.retire(|inner| inner.transition(Transition::Failed(state)));
        } else {
            self.shared.update(|inner| inner.transition(Transition::Reported(state)));
        }
    }

    fn report_refusal(&self, state: SessionState, error: RecorderError) {
        warn!(state = %state, error = %error, "Capture session in wrong state");

        let error_state = ErrorState::from(&error);
        if state == SessionState::Inactive {
            self.shared.retire(|inner| inner.transition(Transition::Failed(error_state)));
        } else {
            self.shared.update(|inner| inner.transition(Transition::Reported(error_state)));
        }
    }
}

impl<B: CaptureBackend> Drop for RecordingController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
