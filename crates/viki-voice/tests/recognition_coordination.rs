//! Integration tests for recognition / synthesis mutual exclusion.
//!
//! A bare [`SpeakingGate`] stands in for the orchestrator so each test can
//! raise and lower the speaking flag exactly when it wants.

mod common;

use std::time::Duration;

use common::{FakeRecognizer, drain, settle};
use viki_voice::{
    RecognitionCoordinator, RecognitionErrorKind, RecognitionEvent, RecognitionOptions,
    SpeakingGate,
};

const RESUME_MS: u64 = 1_500;

fn options() -> RecognitionOptions {
    RecognitionOptions {
        language: "ro-RO".parse().unwrap(),
        resume_delay: Duration::from_millis(RESUME_MS),
        restart_delay: Duration::from_millis(500),
    }
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Raise the flag for a fresh request and return a way to lower it.
fn start_speaking(gate: &SpeakingGate) -> impl Fn() + '_ {
    let id = gate.begin_request();
    gate.mark_speaking(id);
    move || {
        gate.mark_finished(id);
    }
}

#[tokio::test(start_paused = true)]
async fn listening_starts_and_reports_state() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, mut events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;
    assert_eq!(recognizer.start_languages(), vec!["ro-RO"]);

    recognizer.session().started();
    settle().await;
    assert!(coordinator.is_listening());
    assert_eq!(drain(&mut events), vec![RecognitionEvent::ListeningChanged(true)]);
}

#[tokio::test(start_paused = true)]
async fn speaking_suspends_and_resumes_after_delay() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, _events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;
    recognizer.session().started();

    let finish = start_speaking(&gate);
    settle().await;
    assert_eq!(recognizer.stops(), 1);
    assert!(!coordinator.is_listening());

    // The suspended session reports its end; no auto-restart while speaking.
    recognizer.session().ended();
    advance(1_000).await;
    assert_eq!(recognizer.starts(), 1);

    finish();
    settle().await;
    advance(RESUME_MS - 10).await;
    assert_eq!(recognizer.starts(), 1, "still inside the quiet period");

    advance(20).await;
    assert_eq!(recognizer.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn new_speech_cancels_pending_resume() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, _events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;

    let finish = start_speaking(&gate);
    settle().await;
    finish();
    settle().await;

    advance(1_000).await;
    let finish = start_speaking(&gate);
    settle().await;
    advance(1_000).await;
    assert_eq!(recognizer.starts(), 1, "first resume was cancelled");

    finish();
    settle().await;
    advance(RESUME_MS + 10).await;
    assert_eq!(recognizer.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn start_while_speaking_is_deferred() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, _events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    let finish = start_speaking(&gate);
    settle().await;
    coordinator.start_listening();
    settle().await;
    assert_eq!(recognizer.starts(), 0);

    finish();
    advance(RESUME_MS + 10).await;
    assert_eq!(recognizer.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn ended_session_restarts_while_listening() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, _events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;
    recognizer.session().started();
    recognizer.session().ended();
    settle().await;
    assert!(!coordinator.is_listening());

    advance(510).await;
    assert_eq!(recognizer.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn manual_stop_prevents_restart() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, _events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;
    recognizer.session().started();

    coordinator.stop_listening();
    settle().await;
    assert_eq!(recognizer.stops(), 1);
    recognizer.session().ended();
    advance(2_000).await;
    assert_eq!(recognizer.starts(), 1);

    // Speech ending does not bring it back either.
    let finish = start_speaking(&gate);
    settle().await;
    finish();
    advance(RESUME_MS + 10).await;
    assert_eq!(recognizer.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn force_stop_aborts_and_stays_stopped() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, _events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());
    let mut listening = coordinator.watch_listening();

    coordinator.start_listening();
    settle().await;
    let session = recognizer.session();
    session.started();
    settle().await;
    assert!(*listening.borrow_and_update());

    coordinator.force_stop();
    settle().await;
    assert_eq!(recognizer.aborts(), 1);
    assert_eq!(recognizer.stops(), 0);
    assert!(!*listening.borrow_and_update());

    session.ended();
    let finish = start_speaking(&gate);
    settle().await;
    finish();
    advance(RESUME_MS + 10).await;
    assert_eq!(recognizer.starts(), 1, "neither the end nor speech brings it back");
    assert!(!coordinator.is_listening());
}

#[tokio::test(start_paused = true)]
async fn fatal_errors_stop_for_good_and_no_speech_does_not() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, mut events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;
    recognizer.session().started();
    recognizer.session().error(RecognitionErrorKind::NoSpeech);
    recognizer.session().ended();
    advance(510).await;
    assert_eq!(recognizer.starts(), 2, "no-speech keeps the session going");

    recognizer.session().started();
    recognizer
        .session()
        .error(RecognitionErrorKind::from_code("not-allowed"));
    recognizer.session().ended();
    advance(2_000).await;
    assert_eq!(recognizer.starts(), 2);
    assert!(!coordinator.is_listening());

    let events = drain(&mut events);
    assert!(events.contains(&RecognitionEvent::Error(RecognitionErrorKind::NotAllowed)));
    assert!(!events.contains(&RecognitionEvent::Error(RecognitionErrorKind::NoSpeech)));

    // The user can try again.
    coordinator.start_listening();
    settle().await;
    assert_eq!(recognizer.starts(), 3);
}

#[tokio::test(start_paused = true)]
async fn transcripts_captured_while_speaking_are_dropped() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, mut events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;
    let first = recognizer.session();
    first.started();

    let finish = start_speaking(&gate);
    settle().await;
    first.result("Salut! Sistemul neural", true);
    settle().await;
    assert_eq!(coordinator.transcript().final_text, "");

    finish();
    advance(RESUME_MS + 10).await;
    let second = recognizer.session();
    second.started();
    second.result("ce", false);
    second.result("ce mai", false);
    settle().await;
    assert_eq!(coordinator.transcript().interim, "ce mai");

    second.result("ce mai faci ", true);
    second.result("azi", true);
    settle().await;
    let transcript = coordinator.transcript();
    assert_eq!(transcript.final_text, "ce mai faci azi");
    assert_eq!(transcript.interim, "");

    let finals: Vec<String> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            RecognitionEvent::Transcript { text, is_final: true } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(finals, vec!["ce mai faci ", "azi"]);

    coordinator.reset_transcript();
    settle().await;
    assert_eq!(coordinator.transcript().final_text, "");
}

#[tokio::test(start_paused = true)]
async fn events_from_old_sessions_are_ignored() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, _events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;
    let old = recognizer.session();
    old.started();

    let finish = start_speaking(&gate);
    settle().await;
    finish();
    advance(RESUME_MS + 10).await;
    let current = recognizer.session();
    current.started();
    settle().await;

    // The first session's end arrives very late.
    old.ended();
    advance(1_000).await;
    assert!(coordinator.is_listening());
    assert_eq!(recognizer.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn language_change_restarts_session() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, _events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    coordinator.start_listening();
    settle().await;
    recognizer.session().started();

    coordinator.set_language("en-GB".parse().unwrap());
    settle().await;
    assert_eq!(recognizer.aborts(), 1);

    advance(510).await;
    assert_eq!(recognizer.start_languages(), vec!["ro-RO", "en-GB"]);
}

#[tokio::test(start_paused = true)]
async fn start_failure_is_reported() {
    let recognizer = FakeRecognizer::new();
    let gate = SpeakingGate::new();
    let (coordinator, mut events) =
        RecognitionCoordinator::spawn(recognizer.clone(), gate.subscribe(), options());

    recognizer.fail_next_start();
    coordinator.start_listening();
    settle().await;

    assert_eq!(recognizer.starts(), 0);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        RecognitionEvent::Error(RecognitionErrorKind::Other(message))
            if message.contains("microphone busy")
    )));
}
