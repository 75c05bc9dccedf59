use crate::{
    ErrorState, RecorderError,
    artifact::{Artifact, AudioBlob, DEFAULT_ARTIFACT_MIME_TYPE, ObjectUrlRegistry},
    capture::{AudioStream, CaptureBackend, CaptureSession, DeviceError, SessionHandlers},
    controller::state::{RecorderSnapshot, RecorderState, Transition},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard},
};

use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A session together with the id its notifications are tagged with.
pub(crate) struct TrackedSession<S> {
    pub(crate) id: Uuid,
    pub(crate) handle: Arc<S>,
}

impl<S> Clone for TrackedSession<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<S: CaptureSession> TrackedSession<S> {
    /// Stop the session if it is still capturing, ignoring failures.
    pub(crate) fn stop_quietly(&self) {
        if self.handle.state().is_active() {
            if let Err(e) = self.handle.stop() {
                debug!(session_id = %self.id, error = %e, "Ignoring stop failure on retired session");
            }
        }
    }
}

pub(crate) struct Inner<B: CaptureBackend> {
    pub(crate) state: RecorderState,
    pub(crate) session: Option<TrackedSession<B::Session>>,
    pub(crate) stream: Option<B::Stream>,
    pub(crate) chunks: Vec<Vec<u8>>,
    /// Bumped by every stop and teardown. A start sequence compares it
    /// with the value it began with after each wait.
    pub(crate) stop_requests: u64,
    revocations: Vec<String>,
}

impl<B: CaptureBackend> Inner<B> {
    pub(crate) fn transition(&mut self, transition: Transition) {
        if let Some(displaced) = self.state.apply(transition) {
            self.revocations.push(displaced.url);
        }
    }

    pub(crate) fn is_current(&self, session_id: Uuid) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == session_id)
    }
}

/// State shared between the controller and the notification handlers it
/// registers on sessions.
///
/// The lock is never held across an `.await` or across a call that may fire
/// a session notification.
pub(crate) struct Shared<B: CaptureBackend> {
    inner: Mutex<Inner<B>>,
    pub(crate) urls: Arc<ObjectUrlRegistry>,
    pub(crate) snapshot_tx: watch::Sender<RecorderSnapshot>,
}

impl<B: CaptureBackend> Shared<B> {
    pub(crate) fn new(urls: Arc<ObjectUrlRegistry>) -> Self {
        let (snapshot_tx, _) = watch::channel(RecorderSnapshot::default());

        Self {
            inner: Mutex::new(Inner {
                state: RecorderState::default(),
                session: None,
                stream: None,
                chunks: Vec::new(),
                stop_requests: 0,
                revocations: Vec::new(),
            }),
            urls,
            snapshot_tx,
        }
    }

    /// Mutate under the lock, then revoke displaced urls and publish.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Inner<B>) -> R) -> R {
        let mut inner = self.lock();
        let result = f(&mut inner);

        for url in inner.revocations.drain(..) {
            self.urls.revoke(&url);
        }
        let _ = self.snapshot_tx.send_replace(inner.state.snapshot());

        result
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&Inner<B>) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate with `f`, detach the session and stream, then stop both
    /// outside the lock. Stop failures are ignored.
    pub(crate) fn retire(&self, f: impl FnOnce(&mut Inner<B>)) {
        let (session, stream) = self.update(|inner| {
            f(inner);
            (inner.session.take(), inner.stream.take())
        });
        release(session, stream);
    }

    /// Record a stop request without publishing.
    pub(crate) fn note_stop_request(&self) {
        self.lock().stop_requests += 1;
    }

    fn lock(&self) -> MutexGuard<'_, Inner<B>> {
        // Every mutation completes before the guard drops; a poisoned lock
        // still holds consistent state.
        self.inner.lock().unwrap_or_else(|e| {
            error!("Recorder state lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    /// Notification callbacks for the session tagged `session_id`.
    ///
    /// Callbacks hold a weak reference so a session outliving its controller
    /// does not keep the controller state alive.
    pub(crate) fn handlers(self: &Arc<Self>, session_id: Uuid) -> SessionHandlers {
        let on_data = {
            let shared = Arc::downgrade(self);
            Arc::new(move |chunk: Vec<u8>| {
                if let Some(shared) = shared.upgrade() {
                    shared.on_data(session_id, chunk);
                }
            })
        };
        let on_stop = {
            let shared = Arc::downgrade(self);
            Arc::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.on_stop(session_id);
                }
            })
        };
        let on_error = {
            let shared = Arc::downgrade(self);
            Arc::new(move |error: DeviceError| {
                if let Some(shared) = shared.upgrade() {
                    shared.on_error(session_id, error);
                }
            })
        };

        SessionHandlers {
            on_data,
            on_stop,
            on_error,
        }
    }

    fn on_data(&self, session_id: Uuid, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }

        let mut inner = self.lock();
        if inner.is_current(session_id) {
            inner.chunks.push(chunk);
        } else {
            debug!(session_id = %session_id, "Dropping data from retired session");
        }
    }

    fn on_stop(&self, session_id: Uuid) {
        let released = self.update(|inner| {
            if !inner.is_current(session_id) {
                debug!(session_id = %session_id, "Ignoring stop from retired session");
                return None;
            }

            let session = inner.session.take();

            if inner.chunks.is_empty() {
                warn!(session_id = %session_id, "Session stopped without delivering data");
            } else {
                let mime_type = session
                    .as_ref()
                    .map(|s| s.handle.mime_type())
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_ARTIFACT_MIME_TYPE.to_string());

                let blob = AudioBlob::from_chunks(&inner.chunks, mime_type);
                let url = self.urls.create(blob.clone());

                info!(
                    session_id = %session_id,
                    chunk_count = inner.chunks.len(),
                    size = blob.len(),
                    mime_type = blob.mime_type(),
                    "Recording finalized"
                );

                inner.transition(Transition::ArtifactReady(Artifact { blob, url }));
            }

            inner.transition(Transition::Stopped);
            inner.stream.take()
        });

        if let Some(stream) = released {
            stream.stop_tracks();
        }
    }

    /// Publish the error. A session still recording or paused is detached
    /// and stopped; its stop notification is then ignored.
    fn on_error(&self, session_id: Uuid, device_error: DeviceError) {
        let error = RecorderError::SessionError {
            reason: device_error.message.clone(),
            location: ErrorLocation::from(Location::caller()),
        };
        let error_state = ErrorState::from(&error);

        let detached = self.update(|inner| {
            let Some(active) = inner
                .session
                .as_ref()
                .filter(|s| s.id == session_id)
                .map(|s| s.handle.state().is_active())
            else {
                debug!(session_id = %session_id, error = %device_error, "Ignoring error from retired session");
                return None;
            };

            error!(session_id = %session_id, error = %error, active, "Capture session error");

            if active {
                inner.transition(Transition::Failed(error_state));
                Some((inner.session.take(), inner.stream.take()))
            } else {
                inner.transition(Transition::Reported(error_state));
                None
            }
        });

        if let Some((session, stream)) = detached {
            release(session, stream);
        }
    }
}

fn release<S: CaptureSession, T: AudioStream>(
    session: Option<TrackedSession<S>>,
    stream: Option<T>,
) {
    if let Some(session) = session {
        session.stop_quietly();
    }
    if let Some(stream) = stream {
        stream.stop_tracks();
    }
}
