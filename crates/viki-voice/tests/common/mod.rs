//! Scripted platform fakes shared by the integration tests.
//!
//! The fakes never call back on their own: each test drives the engine and
//! recognizer callbacks explicitly, so every interleaving is deterministic.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use viki_core::{LanguageTag, VoiceDescriptor};
use viki_voice::{
    RecognitionCallbacks, SpeechEngine, SpeechRecognizer, Utterance, UtteranceCallbacks,
    VoiceError, VoiceProvider,
};

/// Let spawned tasks run without advancing past any settling delay.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Drain all pending events from a receiver.
pub fn drain<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ── Engine ─────────────────────────────────────────────────────────

#[derive(Default)]
struct EngineLog {
    utterances: Vec<(Utterance, UtteranceCallbacks)>,
    cancels: usize,
    pauses: usize,
    resumes: usize,
}

/// Records utterances and hands their callbacks to the test.
#[derive(Default)]
pub struct FakeEngine {
    log: Mutex<EngineLog>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn texts(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .utterances
            .iter()
            .map(|(u, _)| u.text.clone())
            .collect()
    }

    pub fn utterance(&self, index: usize) -> Utterance {
        self.log.lock().unwrap().utterances[index].0.clone()
    }

    pub fn callbacks(&self, index: usize) -> UtteranceCallbacks {
        self.log.lock().unwrap().utterances[index].1.clone()
    }

    pub fn count(&self) -> usize {
        self.log.lock().unwrap().utterances.len()
    }

    pub fn cancels(&self) -> usize {
        self.log.lock().unwrap().cancels
    }

    pub fn pauses(&self) -> usize {
        self.log.lock().unwrap().pauses
    }

    pub fn resumes(&self) -> usize {
        self.log.lock().unwrap().resumes
    }
}

impl SpeechEngine for FakeEngine {
    fn enqueue_utterance(&self, utterance: Utterance, callbacks: UtteranceCallbacks) {
        self.log.lock().unwrap().utterances.push((utterance, callbacks));
    }

    fn cancel_all(&self) {
        self.log.lock().unwrap().cancels += 1;
    }

    fn pause(&self) {
        self.log.lock().unwrap().pauses += 1;
    }

    fn resume(&self) {
        self.log.lock().unwrap().resumes += 1;
    }
}

// ── Voice provider ─────────────────────────────────────────────────

/// A voice list the test can swap out, as a platform does while loading.
#[derive(Default)]
pub struct FakeProvider {
    voices: Mutex<Vec<VoiceDescriptor>>,
}

impl FakeProvider {
    pub fn new(voices: Vec<VoiceDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            voices: Mutex::new(voices),
        })
    }

    pub fn set(&self, voices: Vec<VoiceDescriptor>) {
        *self.voices.lock().unwrap() = voices;
    }
}

#[async_trait]
impl VoiceProvider for FakeProvider {
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, VoiceError> {
        Ok(self.voices.lock().unwrap().clone())
    }
}

pub fn standard_voices() -> Vec<VoiceDescriptor> {
    vec![
        VoiceDescriptor::new("Microsoft Hazel - English (United Kingdom)", "en-GB", true, true),
        VoiceDescriptor::new("Microsoft Andrei - Romanian (Romania)", "ro-RO", true, false),
    ]
}

// ── Recognizer ─────────────────────────────────────────────────────

#[derive(Default)]
struct RecognizerLog {
    starts: Vec<LanguageTag>,
    stops: usize,
    aborts: usize,
    sessions: Vec<RecognitionCallbacks>,
    fail_next_start: bool,
}

/// Records start/stop/abort calls and keeps each session's callbacks.
#[derive(Default)]
pub struct FakeRecognizer {
    log: Mutex<RecognizerLog>,
}

impl FakeRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn starts(&self) -> usize {
        self.log.lock().unwrap().starts.len()
    }

    pub fn start_languages(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .starts
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }

    pub fn aborts(&self) -> usize {
        self.log.lock().unwrap().aborts
    }

    /// Callbacks of the most recent session.
    pub fn session(&self) -> RecognitionCallbacks {
        self.log
            .lock()
            .unwrap()
            .sessions
            .last()
            .cloned()
            .expect("no session started")
    }

    pub fn fail_next_start(&self) {
        self.log.lock().unwrap().fail_next_start = true;
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(
        &self,
        language: &LanguageTag,
        callbacks: RecognitionCallbacks,
    ) -> Result<(), VoiceError> {
        let mut log = self.log.lock().unwrap();
        if std::mem::take(&mut log.fail_next_start) {
            return Err(VoiceError::RecognitionStart("microphone busy".into()));
        }
        log.starts.push(language.clone());
        log.sessions.push(callbacks);
        Ok(())
    }

    fn stop(&self) {
        self.log.lock().unwrap().stops += 1;
    }

    fn abort(&self) {
        self.log.lock().unwrap().aborts += 1;
    }
}
