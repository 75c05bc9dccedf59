use crate::{
    ErrorKind, START_SETTLE_DELAY, STOP_SETTLE_DELAY, SessionState, TIMESLICE,
    tests::{
        controller::controller_with,
        fake_backend::{FakeBackend, SessionPlan, StreamPlan},
    },
};

/// WHAT: A healthy start leaves the controller recording with no error
/// WHY: The common path must not trip the recovery protocol
#[tokio::test(start_paused = true)]
async fn given_live_stream_when_starting_then_recording_without_error() {
    // Given: A backend with a live stream and a well-behaved session
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: Recording on one stream with one session
    assert!(controller.is_recording());
    assert!(!controller.is_paused());
    assert!(controller.error().is_none());
    assert_eq!(backend.stream_requests(), 1);
    assert_eq!(backend.sessions().len(), 1);
    assert_eq!(backend.session(0).start_calls(), vec![None]);
    assert!(backend.session(0).has_handlers());
}

/// WHAT: The first supported preferred encoding is requested
/// WHY: Sessions should use the best container the platform offers
#[tokio::test(start_paused = true)]
async fn given_supported_encodings_when_starting_then_first_preference_requested() {
    // Given: mp4 and ogg supported, webm not
    let backend = FakeBackend::new().supporting(&["audio/ogg;codecs=opus", "audio/mp4"]);
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: mp4 wins because it comes first in the preference order
    assert_eq!(
        backend.session(0).requested_mime_type.as_deref(),
        Some("audio/mp4")
    );
    assert!(controller.is_recording());
}

/// WHAT: A rejected preferred encoding falls back to the platform default
/// WHY: Some platforms advertise encodings they then refuse to construct
#[tokio::test(start_paused = true)]
async fn given_preferred_encoding_rejected_when_starting_then_default_session_used() {
    // Given: webm advertised but its construction fails
    let backend = FakeBackend::new()
        .supporting(&["audio/webm"])
        .failing_preferred_create();
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: A default-encoding session records
    assert_eq!(backend.sessions().len(), 1);
    assert_eq!(backend.session(0).requested_mime_type, None);
    assert!(controller.is_recording());
    assert!(controller.error().is_none());
}

/// WHAT: Denied microphone access surfaces as MicrophoneAccessDenied
/// WHY: The user needs to know why nothing is recording
#[tokio::test(start_paused = true)]
async fn given_access_denied_when_starting_then_microphone_access_denied() {
    // Given: The provider refuses the stream
    let backend = FakeBackend::new().with_streams([StreamPlan::Denied]);
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: Error published, nothing constructed
    let error = controller.error().unwrap();
    assert_eq!(error.kind, ErrorKind::MicrophoneAccessDenied);
    assert!(error.message.contains("Permission denied"));
    assert!(!controller.is_recording());
    assert!(backend.sessions().is_empty());
}

/// WHAT: An inactive stream is rejected and released
/// WHY: Starting a session on a dead stream never produces audio
#[tokio::test(start_paused = true)]
async fn given_inactive_stream_when_starting_then_stream_unavailable_and_released() {
    // Given: The provider hands out an inactive stream
    let backend = FakeBackend::new().with_streams([StreamPlan::Inactive]);
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: StreamUnavailable, tracks stopped, no session
    assert_eq!(
        controller.error().map(|e| e.kind),
        Some(ErrorKind::StreamUnavailable)
    );
    assert!(backend.stream(0).tracks_stopped());
    assert!(backend.sessions().is_empty());
    assert!(!controller.is_recording());
}

/// WHAT: A stream whose audio track has ended is rejected
/// WHY: An active stream can still carry no live audio
#[tokio::test(start_paused = true)]
async fn given_stream_without_live_track_when_starting_then_stream_unavailable() {
    // Given: Active stream, ended track
    let backend = FakeBackend::new().with_streams([StreamPlan::NoLiveTrack]);
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: StreamUnavailable
    assert_eq!(
        controller.error().map(|e| e.kind),
        Some(ErrorKind::StreamUnavailable)
    );
    assert!(backend.stream(0).tracks_stopped());
}

/// WHAT: Session construction failure is reported and the stream released
/// WHY: A half-started attempt must not keep the microphone open
#[tokio::test(start_paused = true)]
async fn given_session_construction_fails_when_starting_then_session_create_failed() {
    // Given: Default session construction fails
    let backend = FakeBackend::new().with_sessions([SessionPlan {
        create_fails: true,
        ..SessionPlan::default()
    }]);
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: SessionCreateFailed, stream released
    assert_eq!(
        controller.error().map(|e| e.kind),
        Some(ErrorKind::SessionCreateFailed)
    );
    assert!(backend.stream(0).tracks_stopped());
    assert!(!controller.is_recording());
}

/// WHAT: A session that is not inactive before start is refused and stopped
/// WHY: Calling start on a running session is a platform error
#[tokio::test(start_paused = true)]
async fn given_session_not_inactive_when_starting_then_invalid_pre_start_state() {
    // Given: The new session already reports recording
    let backend = FakeBackend::new().with_sessions([SessionPlan {
        initial_state: SessionState::Recording,
        ..SessionPlan::default()
    }]);
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: InvalidPreStartState, session stopped, stream released
    assert_eq!(
        controller.error().map(|e| e.kind),
        Some(ErrorKind::InvalidPreStartState)
    );
    assert!(backend.session(0).start_calls().is_empty());
    assert_eq!(backend.session(0).stop_calls(), 1);
    assert!(backend.stream(0).tracks_stopped());
    assert!(!controller.is_recording());
    assert!(controller.audio_url().is_none());
}

/// WHAT: A rejected plain start is retried with a timeslice
/// WHY: Some platforms only accept periodic delivery
#[tokio::test(start_paused = true)]
async fn given_plain_start_rejected_when_starting_then_timeslice_start_used() {
    // Given: Plain start fails, timesliced start succeeds
    let backend = FakeBackend::new().with_sessions([SessionPlan {
        plain_start_fails: true,
        ..SessionPlan::default()
    }]);
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: Two start calls, the second with the one-second timeslice
    assert_eq!(backend.session(0).start_calls(), vec![None, Some(TIMESLICE)]);
    assert!(controller.is_recording());
    assert!(controller.error().is_none());
}

/// WHAT: Both start variants failing yields StartFailed
/// WHY: The error must carry the platform's last failure
#[tokio::test(start_paused = true)]
async fn given_both_starts_rejected_when_starting_then_start_failed() {
    // Given: Every start call fails
    let backend = FakeBackend::new().with_sessions([SessionPlan {
        plain_start_fails: true,
        timeslice_start_fails: true,
        ..SessionPlan::default()
    }]);
    let controller = controller_with(&backend);

    // When: Starting
    controller.start_recording().await;

    // Then: StartFailed with the device error text, resources released
    let error = controller.error().unwrap();
    assert_eq!(error.kind, ErrorKind::StartFailed);
    assert!(error.message.contains("InvalidStateError - Start rejected"));
    assert!(!controller.is_recording());
    assert!(backend.stream(0).tracks_stopped());
}

/// WHAT: Starting while already recording does nothing
/// WHY: A second press of the record button must not restart the capture
#[tokio::test(start_paused = true)]
async fn given_recording_when_starting_again_then_ignored() {
    // Given: A recording controller
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;

    // When: Starting again
    controller.start_recording().await;

    // Then: No second stream or session
    assert_eq!(backend.stream_requests(), 1);
    assert_eq!(backend.sessions().len(), 1);
    assert!(controller.is_recording());
}

/// WHAT: A start issued while another is in flight is rejected
/// WHY: Two attempts racing would orphan a stream
#[tokio::test(start_paused = true)]
async fn given_start_in_flight_when_starting_again_then_second_call_rejected() {
    // Given: Stream requests block until released
    let backend = FakeBackend::new().gated();
    let controller = controller_with(&backend);

    // When: A second start arrives while the first waits for its stream
    tokio::join!(controller.start_recording(), async {
        tokio::task::yield_now().await;
        controller.start_recording().await;
        backend.open_gate();
    });

    // Then: Only the first attempt ran
    assert_eq!(backend.stream_requests(), 1);
    assert_eq!(backend.sessions().len(), 1);
    assert!(controller.is_recording());
}

/// WHAT: A new start revokes the previous recording
/// WHY: Each url must be revoked exactly when its recording is replaced
#[tokio::test(start_paused = true)]
async fn given_previous_recording_when_starting_then_url_revoked() {
    // Given: A finished recording
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    backend.session(0).emit_data(b"take one");
    controller.stop_recording();
    let old_url = controller.audio_url().unwrap();

    // When: Starting again
    controller.start_recording().await;

    // Then: Old url revoked, no artifact while recording
    assert!(controller.url_registry().resolve(&old_url).is_none());
    assert_eq!(controller.url_registry().live_count(), 0);
    assert!(controller.audio_url().is_none());
    assert!(controller.audio_blob().is_none());
    assert!(controller.is_recording());
}

/// WHAT: A successful start clears the error of a failed one
/// WHY: Errors describe the most recent attempt only
#[tokio::test(start_paused = true)]
async fn given_failed_attempt_when_starting_again_then_error_cleared() {
    // Given: A denied first attempt
    let backend = FakeBackend::new().with_streams([StreamPlan::Denied]);
    let controller = controller_with(&backend);
    controller.start_recording().await;
    assert!(controller.error().is_some());

    // When: Starting again with access granted
    controller.start_recording().await;

    // Then: Recording with no error
    assert!(controller.error().is_none());
    assert!(controller.is_recording());
    assert_eq!(backend.stream_requests(), 2);
}

/// WHAT: Subscribers observe the transition to recording
/// WHY: The presentation layer renders from the published snapshot
#[tokio::test(start_paused = true)]
async fn given_subscriber_when_starting_then_change_observed() {
    // Given: A subscriber that has seen the initial state
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    let mut rx = controller.subscribe();

    // When: Starting
    controller.start_recording().await;

    // Then: The receiver is marked changed and shows recording
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_recording);
}

/// WHAT: Starting while paused stops the paused session and records anew
/// WHY: A paused session still holds the microphone
#[tokio::test(start_paused = true)]
async fn given_paused_session_when_starting_then_old_session_retired_before_new_one() {
    // Given: A paused recording
    let backend = FakeBackend::new();
    let controller = controller_with(&backend);
    controller.start_recording().await;
    controller.pause_recording();
    assert!(controller.is_paused());
    let before = tokio::time::Instant::now();

    // When: Starting again
    controller.start_recording().await;

    // Then: Old session stopped once after the stop settle wait, stream released
    assert_eq!(backend.session(0).stop_calls(), 1);
    assert!(backend.stream(0).tracks_stopped());
    assert!(before.elapsed() >= STOP_SETTLE_DELAY + START_SETTLE_DELAY);
    assert_eq!(backend.sessions().len(), 2);
    assert_eq!(backend.stream_requests(), 2);

    // And: Recording on the new session, not paused
    assert!(controller.is_recording());
    assert!(!controller.is_paused());
    assert_eq!(backend.session(1).state(), SessionState::Recording);
}
