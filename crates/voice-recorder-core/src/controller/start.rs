//! Start-up sequence and the recovery protocol.
//!
//! A capture session can accept `start()` and then fail to enter the
//! recording state without reporting anything. After every start the
//! controller waits [`START_SETTLE_DELAY`] and re-reads the state. When the
//! session is not recording it retries once on the same stream and once on
//! a freshly requested stream before giving up.
//!
//! A stop or teardown during any of those waits ends the attempt quietly.

use crate::{
    ErrorState, RecorderError,
    capture::{AudioStream, CaptureBackend, CaptureSession, SessionState, preferred_mime_type},
    controller::{
        START_SETTLE_DELAY, STOP_SETTLE_DELAY, TIMESLICE,
        recorder::RecordingController,
        shared::TrackedSession,
        start_guard::StartGuard,
        state::Transition,
    },
    error::Result,
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// How a start sequence ended without error.
enum StartOutcome {
    /// The session is confirmed recording.
    Recording(Uuid),
    /// A stop or teardown arrived first.
    Stopped,
}

impl<B: CaptureBackend> RecordingController<B> {
    /// Open a stream and start recording.
    ///
    /// Resolves once the session is confirmed recording or the attempt has
    /// failed; failures are published through [`Self::error`]. A no-op when
    /// already recording or when another start is in flight.
    #[instrument(skip(self))]
    pub async fn start_recording(&self) {
        let current = self.current_session().map(|s| s.handle.state());
        if current == Some(SessionState::Recording) {
            debug!("Already recording, start ignored");
            return;
        }

        let Some(_guard) = StartGuard::acquire(&self.starting) else {
            warn!("Start already in progress, call ignored");
            return;
        };

        self.retire_previous_session().await;

        let generation = self.shared.update(|inner| {
            inner.transition(Transition::AttemptStarted);
            inner.chunks.clear();
            inner.stop_requests
        });

        match self.run_start(generation).await {
            Ok(StartOutcome::Recording(session_id)) => {
                info!(session_id = %session_id, "Recording started")
            }
            Ok(StartOutcome::Stopped) => self.wind_down(),
            Err(error) if self.stop_requested_since(generation) => {
                debug!(error = %error, "Start failed after stop was requested");
                self.wind_down();
            }
            Err(error) => self.abandon_attempt(error),
        }
    }

    async fn run_start(&self, generation: u64) -> Result<StartOutcome> {
        let stream = self.acquire_stream().await?;
        if !self.hold_stream(&stream, generation) {
            stream.stop_tracks();
            return Ok(StartOutcome::Stopped);
        }

        let session = self.create_preferred_session(&stream)?;
        let tracked = self.register(session);
        self.shared.update(|inner| inner.session = Some(tracked.clone()));

        verify_ready(tracked.handle.as_ref(), &stream)?;
        start_with_fallback(tracked.handle.as_ref())?;

        self.shared.update(|inner| inner.transition(Transition::Started));

        sleep(START_SETTLE_DELAY).await;

        if self.stop_requested_since(generation) {
            debug!(session_id = %tracked.id, "Stop requested while starting");
            return Ok(StartOutcome::Stopped);
        }

        let observed = tracked.handle.state();
        if observed == SessionState::Recording {
            return Ok(StartOutcome::Recording(tracked.id));
        }

        warn!(
            session_id = %tracked.id,
            state = %observed,
            "Capture session did not enter recording after start, recovering"
        );

        self.recover(stream, generation).await
    }

    /// Detach and stop the session of a previous attempt and release its
    /// stream. Stop failures are ignored.
    async fn retire_previous_session(&self) {
        let (session, stream) = self
            .shared
            .update(|inner| (inner.session.take(), inner.stream.take()));

        if let Some(session) = session {
            if session.handle.state().is_active() {
                session.stop_quietly();
                sleep(STOP_SETTLE_DELAY).await;
            }
        }

        if let Some(stream) = stream {
            stream.stop_tracks();
        }
    }

    async fn acquire_stream(&self) -> Result<B::Stream> {
        let stream = self
            .backend
            .request_stream(&self.constraints)
            .await
            .map_err(|e| RecorderError::MicrophoneAccessDenied {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        validate_stream(stream)
    }

    /// Build a session with the first supported preferred encoding, falling
    /// back to the platform default.
    #[track_caller]
    fn create_preferred_session(&self, stream: &B::Stream) -> Result<B::Session> {
        if let Some(mime_type) = preferred_mime_type(&self.backend) {
            match self.backend.create_session(stream, Some(mime_type)) {
                Ok(session) => {
                    debug!(mime_type, "Capture session created");
                    return Ok(session);
                }
                Err(e) => warn!(
                    mime_type,
                    error = %e,
                    "Failed to create capture session with preferred encoding, using platform default"
                ),
            }
        }

        self.create_default_session(stream)
    }

    #[track_caller]
    fn create_default_session(&self, stream: &B::Stream) -> Result<B::Session> {
        self.backend
            .create_session(stream, None)
            .map_err(|e| RecorderError::SessionCreateFailed {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Tag `session` and register the three notification handlers on it.
    /// The session is not current until adopted.
    fn register(&self, session: B::Session) -> TrackedSession<B::Session> {
        let tracked = TrackedSession {
            id: Uuid::new_v4(),
            handle: Arc::new(session),
        };
        tracked
            .handle
            .set_handlers(self.shared.handlers(tracked.id));
        tracked
    }

    async fn recover(&self, stream: B::Stream, generation: u64) -> Result<StartOutcome> {
        if stream.is_live() {
            self.discard_session();

            match self.attempt_on_stream(&stream, generation).await {
                Ok(Some(tracked)) => {
                    info!(session_id = %tracked.id, "Recovered on the original stream");
                    return Ok(StartOutcome::Recording(self.adopt(tracked)));
                }
                Ok(None) => return Ok(StartOutcome::Stopped),
                Err(e) => warn!(error = %e, "Recovery on the original stream failed"),
            }
        } else {
            warn!("Original stream is no longer live");
        }

        self.discard_session();
        if let Some(tracked_stream) = self.shared.update(|inner| inner.stream.take()) {
            tracked_stream.stop_tracks();
        }
        stream.stop_tracks();

        match self.recover_on_fresh_stream(generation).await {
            Ok(StartOutcome::Recording(session_id)) => {
                info!(session_id = %session_id, "Recovered on a fresh stream");
                Ok(StartOutcome::Recording(session_id))
            }
            Ok(StartOutcome::Stopped) => Ok(StartOutcome::Stopped),
            Err(e) => Err(RecorderError::RecoveryExhausted {
                reason: e.reason().to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    async fn recover_on_fresh_stream(&self, generation: u64) -> Result<StartOutcome> {
        let fresh = self.acquire_stream().await?;
        if !self.hold_stream(&fresh, generation) {
            fresh.stop_tracks();
            return Ok(StartOutcome::Stopped);
        }

        Ok(match self.attempt_on_stream(&fresh, generation).await? {
            Some(tracked) => StartOutcome::Recording(self.adopt(tracked)),
            None => StartOutcome::Stopped,
        })
    }

    /// One complete start on a default-encoding session, including the
    /// settle check. The session is stopped again on failure, and `None` is
    /// returned when a stop was requested during the settle wait.
    async fn attempt_on_stream(
        &self,
        stream: &B::Stream,
        generation: u64,
    ) -> Result<Option<TrackedSession<B::Session>>> {
        let tracked = self.register(self.create_default_session(stream)?);

        if let Err(e) = verify_ready(tracked.handle.as_ref(), stream)
            .and_then(|()| start_with_fallback(tracked.handle.as_ref()))
        {
            tracked.stop_quietly();
            return Err(e);
        }

        sleep(START_SETTLE_DELAY).await;

        if self.stop_requested_since(generation) {
            debug!(session_id = %tracked.id, "Stop requested while recovering");
            tracked.stop_quietly();
            return Ok(None);
        }

        let state = tracked.handle.state();
        if state == SessionState::Recording {
            Ok(Some(tracked))
        } else {
            tracked.stop_quietly();
            Err(RecorderError::StartFailed {
                reason: format!("capture session is '{state}' after start"),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }

    /// Make a recovered session current. Data it delivered before adoption
    /// was dropped, so the buffer starts empty, and errors raised by the
    /// abandoned session are cleared.
    fn adopt(&self, tracked: TrackedSession<B::Session>) -> Uuid {
        let session_id = tracked.id;
        self.shared.update(|inner| {
            inner.session = Some(tracked);
            inner.chunks.clear();
            inner.transition(Transition::Recovered);
        });
        session_id
    }

    /// Keep `stream` as the current stream unless a stop arrived since the
    /// attempt began.
    fn hold_stream(&self, stream: &B::Stream, generation: u64) -> bool {
        self.shared.update(|inner| {
            let held = inner.stop_requests == generation;
            if held {
                inner.stream = Some(stream.clone());
            }
            held
        })
    }

    fn stop_requested_since(&self, generation: u64) -> bool {
        self.shared.read(|inner| inner.stop_requests != generation)
    }

    /// End an attempt that was stopped while starting, keeping any
    /// recording the stop produced.
    fn wind_down(&self) {
        info!("Start abandoned after stop request");
        self.shared.retire(|inner| inner.transition(Transition::Stopped));
    }

    fn discard_session(&self) {
        if let Some(session) = self.shared.update(|inner| inner.session.take()) {
            session.stop_quietly();
        }
    }

    /// Publish `error` and leave the controller idle with nothing held.
    fn abandon_attempt(&self, error: RecorderError) {
        error!(error = %error, "Failed to start recording");

        let state = ErrorState::from(&error);
        self.shared.retire(|inner| inner.transition(Transition::Failed(state)));
    }
}

/// Reject streams that are inactive or lack a live audio track, releasing
/// them.
#[track_caller]
fn validate_stream<S: AudioStream>(stream: S) -> Result<S> {
    let reason = if !stream.is_active() {
        "stream is not active"
    } else if !stream.has_live_audio_track() {
        "audio track is not live"
    } else {
        return Ok(stream);
    };

    stream.stop_tracks();
    Err(RecorderError::StreamUnavailable {
        reason: reason.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// The session must be inactive and its stream live right before start.
#[track_caller]
fn verify_ready<S: CaptureSession, T: AudioStream>(session: &S, stream: &T) -> Result<()> {
    let state = session.state();
    if state != SessionState::Inactive {
        return Err(RecorderError::InvalidPreStartState {
            reason: format!("capture session is in '{state}' state"),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if !stream.is_live() {
        return Err(RecorderError::InvalidPreStartState {
            reason: "stream is not active".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(())
}

/// Start without a timeslice, retrying once with periodic delivery.
#[track_caller]
fn start_with_fallback<S: CaptureSession>(session: &S) -> Result<()> {
    if let Err(e) = session.start(None) {
        debug!(error = %e, "Start failed, retrying with timeslice");

        session
            .start(Some(TIMESLICE))
            .map_err(|e| RecorderError::StartFailed {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;
    }

    Ok(())
}
