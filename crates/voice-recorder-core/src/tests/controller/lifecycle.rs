use crate::{
    DEFAULT_ARTIFACT_MIME_TYPE, ErrorKind, RecorderSnapshot, SessionState,
    tests::{
        controller::{assert_flags_consistent, controller_with},
        fake_backend::{FakeBackend, SessionPlan},
    },
};

use std::sync::Arc;

/// WHAT: Stopping builds the recording from exactly the delivered chunks
/// WHY: The artifact must contain what was captured, nothing more or less
#[tokio::test(start_paused = true)]
async fn given_chunks_delivered_when_stopping_then_artifact_concatenates_them() {
    // Given: A recording session that delivered three chunks, one empty
    let backend = FakeBackend::new().supporting(&["audio/ogg;codecs=opus"]);
    let controller = controller_with(&backend);
    controller.start_recording().await;
    let session = backend.session(0);
    session.emit_data(b"abc");
    session.emit_data(b"");
    session.emit_data(b"def");

    // When: Stopping
    controller.stop_recording();

    // Then: One artifact with the concatenated bytes and the session's type
    let blob = controller.audio_blob().unwrap();
    assert_eq!(blob.bytes(), b"abcdef");
    assert_eq!(blob.mime_type(), "audio/ogg;codecs=opus");
    assert_eq!(blob.extension(), "ogg");

    let url = controller.audio_url().unwrap();
    assert_eq!(controller.url_registry().resolve(&url), Some(blob));

    assert!(!controller.is_recording());
    assert!(!controller.is_paused());
    assert!(controller.error().is_none());
    assert!(backend.stream(0).tracks_stopped());
}

/// WHAT: A session without a reported type yields a webm recording
/// WHY: Some platforms leave the type empty on default sessions
#[tokio::test(start_paused = true)]
async fn given_default_session_when_stopping_then_default_mime_type_used() {
    // Given: A default-encoding session with data
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).emit_data(b"x");

    // When: Stopping
    controller.stop_recording();

    // Then: The fallback type is applied
    assert_eq!(
        controller.audio_blob().map(|b| b.mime_type().to_string()),
        Some(DEFAULT_ARTIFACT_MIME_TYPE.to_string())
    );
}

/// WHAT: Stopping with no data publishes no recording
/// WHY: An empty file is not a recording
#[tokio::test(start_paused = true)]
async fn given_no_chunks_when_stopping_then_no_artifact_and_resources_released() {
    // Given: A recording session that delivered nothing
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;

    // When: Stopping
    controller.stop_recording();

    // Then: Idle, no artifact, stream released
    assert!(controller.audio_url().is_none());
    assert!(controller.audio_blob().is_none());
    assert!(!controller.is_recording());
    assert!(backend.stream(0).tracks_stopped());
    assert_eq!(controller.url_registry().live_count(), 0);
}

/// WHAT: Each start to stop cycle yields its own url
/// WHY: A replaced recording's url must not stay resolvable
#[tokio::test(start_paused = true)]
async fn given_two_cycles_when_stopping_then_distinct_urls_and_one_live() {
    // Given: A first completed recording
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).emit_data(b"first");
    controller.stop_recording();
    let first_url = controller.audio_url().unwrap();

    // When: Recording again
    controller.start_recording().await;
    backend.session(1).emit_data(b"second");
    controller.stop_recording();

    // Then: A new url, only it resolvable
    let second_url = controller.audio_url().unwrap();
    assert_ne!(first_url, second_url);
    assert!(controller.url_registry().resolve(&first_url).is_none());
    assert_eq!(
        controller
            .url_registry()
            .resolve(&second_url)
            .map(|b| b.bytes().to_vec()),
        Some(b"second".to_vec())
    );
    assert_eq!(controller.url_registry().live_count(), 1);
}

/// WHAT: Stopping when idle does nothing
/// WHY: Stop can be pressed at any time
#[tokio::test(start_paused = true)]
async fn given_idle_when_stopping_then_no_effect() {
    // Given: A fresh controller
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);

    // When: Stopping
    controller.stop_recording();

    // Then: Nothing changed
    assert_eq!(controller.snapshot(), RecorderSnapshot::default());
    assert_eq!(backend.stream_requests(), 0);
}

/// WHAT: A rejected stop is reported and the controller goes idle
/// WHY: The user must be able to start over
#[tokio::test(start_paused = true)]
async fn given_stop_rejected_when_stopping_then_stop_failed() {
    // Given: A session whose stop fails
    let backend = FakeBackend::new().with_sessions([SessionPlan {
        stop_fails: true,
        ..SessionPlan::default()
    }]);
    let controller = controller_with(&backend);
    controller.start_recording().await;

    // When: Stopping
    controller.stop_recording();

    // Then: StopFailed, flags cleared, microphone released
    assert_eq!(controller.error().map(|e| e.kind), Some(ErrorKind::StopFailed));
    assert!(!controller.is_recording());
    assert!(!controller.is_paused());
    assert!(backend.stream(0).tracks_stopped());
}

/// WHAT: After a rejected stop the next start begins from nothing held
/// WHY: The failed session must not linger as the current one
#[tokio::test(start_paused = true)]
async fn given_stop_rejected_when_starting_again_then_fresh_stream_and_session() {
    // Given: A session whose stop failed
    let backend = FakeBackend::new().with_sessions([
        SessionPlan {
            stop_fails: true,
            ..SessionPlan::default()
        },
        SessionPlan::default(),
    ]);
    let controller = controller_with(&backend);
    controller.start_recording().await;
    controller.stop_recording();

    // When: Starting again
    controller.start_recording().await;

    // Then: Recording on a second stream, error cleared
    assert!(controller.is_recording());
    assert!(controller.error().is_none());
    assert_eq!(backend.stream_requests(), 2);
    assert_eq!(backend.sessions().len(), 2);
    assert!(!backend.stream(1).tracks_stopped());
}

/// WHAT: Pausing twice issues one platform pause
/// WHY: Pause is idempotent on a paused session
#[tokio::test(start_paused = true)]
async fn given_paused_when_pausing_again_then_single_platform_call() {
    // Given: A recording session
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;

    // When: Pausing twice
    controller.pause_recording();
    controller.pause_recording();

    // Then: One pause call, paused and still recording
    assert_eq!(backend.session(0).pause_calls(), 1);
    assert!(controller.is_paused());
    assert!(controller.is_recording());
    assert!(controller.error().is_none());
}

/// WHAT: Resume continues a paused session; resuming again is a no-op
/// WHY: Resume is idempotent on a recording session
#[tokio::test(start_paused = true)]
async fn given_paused_when_resuming_twice_then_single_platform_call() {
    // Given: A paused session
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    controller.pause_recording();

    // When: Resuming twice
    controller.resume_recording();
    controller.resume_recording();

    // Then: One resume call, recording and not paused
    assert_eq!(backend.session(0).resume_calls(), 1);
    assert!(!controller.is_paused());
    assert!(controller.is_recording());
    assert!(controller.error().is_none());
}

/// WHAT: Stopping a paused session publishes its recording
/// WHY: Users often pause before deciding to finish
#[tokio::test(start_paused = true)]
async fn given_paused_when_stopping_then_artifact_published() {
    // Given: A paused session with data
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).emit_data(b"before pause");
    controller.pause_recording();

    // When: Stopping
    controller.stop_recording();

    // Then: Artifact published, flags cleared together
    assert!(controller.audio_url().is_some());
    assert!(!controller.is_paused());
    assert!(!controller.is_recording());
}

/// WHAT: Pause and resume without a session do nothing
/// WHY: The buttons can be pressed before any recording exists
#[tokio::test(start_paused = true)]
async fn given_no_session_when_pausing_or_resuming_then_ignored() {
    // Given: A fresh controller
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);

    // When: Pausing and resuming
    controller.pause_recording();
    controller.resume_recording();

    // Then: No error, no state change
    assert_eq!(controller.snapshot(), RecorderSnapshot::default());
}

/// WHAT: Pausing a session that went inactive reports CannotPause and goes idle
/// WHY: The flags must follow the session, not the last command
#[tokio::test(start_paused = true)]
async fn given_session_went_inactive_when_pausing_then_cannot_pause_and_idle() {
    // Given: A recording whose session silently stopped
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).set_state(SessionState::Inactive);

    // When: Pausing
    controller.pause_recording();

    // Then: CannotPause, both flags cleared, microphone released
    let error = controller.error().unwrap();
    assert_eq!(error.kind, ErrorKind::CannotPause);
    assert!(error.message.contains("inactive"));
    assert_eq!(backend.session(0).pause_calls(), 0);
    assert!(!controller.is_recording());
    assert!(!controller.is_paused());
    assert!(backend.stream(0).tracks_stopped());

    // And: The ended session is no longer current
    controller.pause_recording();
    assert_eq!(backend.session(0).pause_calls(), 0);
}

/// WHAT: Resuming a session that is not paused or recording reports CannotResume
/// WHY: Resume cannot revive a finished session
#[tokio::test(start_paused = true)]
async fn given_session_went_inactive_when_resuming_then_cannot_resume() {
    // Given: A paused recording whose session silently stopped
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    controller.pause_recording();
    backend.session(0).set_state(SessionState::Inactive);

    // When: Resuming
    controller.resume_recording();

    // Then: CannotResume, idle
    assert_eq!(
        controller.error().map(|e| e.kind),
        Some(ErrorKind::CannotResume)
    );
    assert_eq!(backend.session(0).resume_calls(), 0);
    assert!(!controller.is_recording());
    assert!(!controller.is_paused());
    assert!(backend.stream(0).tracks_stopped());
}

/// WHAT: A rejected pause is reported while the session keeps recording
/// WHY: The flags stay true to what the session is doing
#[tokio::test(start_paused = true)]
async fn given_pause_rejected_when_pausing_then_pause_failed_and_still_recording() {
    // Given: A session whose pause fails
    let backend = FakeBackend::new().with_sessions([SessionPlan {
        pause_fails: true,
        ..SessionPlan::default()
    }]);
    let controller = controller_with(&backend);
    controller.start_recording().await;

    // When: Pausing
    controller.pause_recording();

    // Then: PauseFailed, still recording, not paused
    assert_eq!(controller.error().map(|e| e.kind), Some(ErrorKind::PauseFailed));
    assert!(controller.is_recording());
    assert!(!controller.is_paused());
}

/// WHAT: A rejected resume is reported while the session stays paused
/// WHY: The flags stay true to what the session is doing
#[tokio::test(start_paused = true)]
async fn given_resume_rejected_when_resuming_then_resume_failed_and_still_paused() {
    // Given: A paused session whose resume fails
    let backend = FakeBackend::new().with_sessions([SessionPlan {
        resume_fails: true,
        ..SessionPlan::default()
    }]);
    let controller = controller_with(&backend);
    controller.start_recording().await;
    controller.pause_recording();

    // When: Resuming
    controller.resume_recording();

    // Then: ResumeFailed, still paused
    assert_eq!(
        controller.error().map(|e| e.kind),
        Some(ErrorKind::ResumeFailed)
    );
    assert!(controller.is_paused());
    assert!(controller.is_recording());
}

/// WHAT: Paused is never observable without recording
/// WHY: The presentation layer derives its status from both flags
#[tokio::test(start_paused = true)]
async fn given_any_operation_sequence_when_observing_then_paused_implies_recording() {
    // Given: A controller and an observer of every published snapshot
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);

    // When/Then: Walking through every operation
    controller.pause_recording();
    assert_flags_consistent(&controller);
    controller.start_recording().await;
    assert_flags_consistent(&controller);
    controller.pause_recording();
    assert_flags_consistent(&controller);
    backend.session(0).emit_data(b"a");
    controller.stop_recording();
    assert_flags_consistent(&controller);
    controller.resume_recording();
    assert_flags_consistent(&controller);
    controller.start_recording().await;
    controller.pause_recording();
    backend.session(1).set_state(SessionState::Inactive);
    controller.resume_recording();
    assert_flags_consistent(&controller);
    controller.clear_recording();
    assert_flags_consistent(&controller);
    controller.teardown();
    assert_flags_consistent(&controller);
}

/// WHAT: Clearing drops the recording and revokes its url
/// WHY: A cleared recording must not stay downloadable
#[tokio::test(start_paused = true)]
async fn given_artifact_when_clearing_then_blob_and_url_gone() {
    // Given: A finished recording
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).emit_data(b"keep?");
    controller.stop_recording();
    let url = controller.audio_url().unwrap();

    // When: Clearing
    controller.clear_recording();

    // Then: Nothing published, url no longer resolves
    assert!(controller.audio_url().is_none());
    assert!(controller.audio_blob().is_none());
    assert!(controller.url_registry().resolve(&url).is_none());
    assert_eq!(controller.url_registry().live_count(), 0);
}

/// WHAT: Clearing mid-recording discards earlier chunks but keeps recording
/// WHY: The session is not touched by clear
#[tokio::test(start_paused = true)]
async fn given_recording_when_clearing_then_only_later_chunks_kept() {
    // Given: A recording with buffered data
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).emit_data(b"discarded");

    // When: Clearing, then capturing more and stopping
    controller.clear_recording();
    assert!(controller.is_recording());
    backend.session(0).emit_data(b"kept");
    controller.stop_recording();

    // Then: Only the later data forms the recording
    assert_eq!(controller.audio_blob().unwrap().bytes(), b"kept");
}

/// WHAT: Teardown stops the session and releases the stream
/// WHY: The microphone must not stay open after the controller goes away
#[tokio::test(start_paused = true)]
async fn given_recording_when_tearing_down_then_resources_released() {
    // Given: A recording with data
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).emit_data(b"unfinished");

    // When: Tearing down
    controller.teardown();

    // Then: Session stopped, stream released, nothing published
    assert_eq!(backend.session(0).stop_calls(), 1);
    assert!(backend.stream(0).tracks_stopped());
    assert!(controller.audio_url().is_none());
    assert!(!controller.is_recording());
    assert_eq!(controller.url_registry().live_count(), 0);
}

/// WHAT: Teardown revokes a published url
/// WHY: Urls must not outlive the controller that issued them
#[tokio::test(start_paused = true)]
async fn given_published_artifact_when_tearing_down_then_url_revoked() {
    // Given: A finished recording
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).emit_data(b"done");
    controller.stop_recording();
    let urls = Arc::clone(controller.url_registry());
    let url = controller.audio_url().unwrap();

    // When: Dropping the controller
    drop(controller);

    // Then: The url is gone
    assert!(urls.resolve(&url).is_none());
}

/// WHAT: Teardown runs once
/// WHY: Explicit teardown followed by drop must not stop twice
#[tokio::test(start_paused = true)]
async fn given_torn_down_when_tearing_down_again_then_no_effect() {
    // Given: A torn-down controller
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    controller.teardown();

    // When: Tearing down again and dropping
    controller.teardown();
    drop(controller);

    // Then: A single stop call
    assert_eq!(backend.session(0).stop_calls(), 1);
}
