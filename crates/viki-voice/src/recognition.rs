//! Speech recognition coordination.
//!
//! Continuous recognition and speech output must never overlap, or the
//! assistant transcribes its own voice. The coordinator watches the
//! orchestrator's speaking flag: recognition is stopped as soon as the flag
//! goes up and restarted once it has been down for a settling period. A new
//! speaking period cancels a pending restart.
//!
//! It also keeps a continuous session alive: platform recognizers end a
//! session after silence, and the coordinator restarts it shortly after
//! unless the user stopped listening or a fatal error occurred.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use viki_core::{LanguageTag, PlaybackTuning, SpeechConfig};

use crate::error::VoiceError;

/// Pause before restarting a session that ended on its own.
pub const RESTART_DELAY: Duration = Duration::from_millis(500);

// ── Recognizer port ────────────────────────────────────────────────

/// Recognition error categories that change behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// Silence timeout; the session carries on.
    NoSpeech,
    /// No usable microphone. Listening stops for good.
    AudioCapture,
    /// Microphone permission denied. Listening stops for good.
    NotAllowed,
    Other(String),
}

impl RecognitionErrorKind {
    /// Map a platform error code (`"no-speech"`, `"not-allowed"`, …).
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "not-allowed" | "service-not-allowed" => Self::NotAllowed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether listening must stop until the user starts it again.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::AudioCapture | Self::NotAllowed)
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpeech => f.write_str("no-speech"),
            Self::AudioCapture => f.write_str("audio-capture"),
            Self::NotAllowed => f.write_str("not-allowed"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RecognizerEvent {
    Started,
    Ended,
    Result { text: String, is_final: bool },
    Error(RecognitionErrorKind),
}

/// Event sink for one recognition session.
#[derive(Debug, Clone)]
pub struct RecognitionCallbacks {
    session: u64,
    tx: mpsc::UnboundedSender<Internal>,
}

impl RecognitionCallbacks {
    pub fn started(&self) {
        self.send(RecognizerEvent::Started);
    }

    pub fn ended(&self) {
        self.send(RecognizerEvent::Ended);
    }

    /// A recognition result. Final results are appended to the transcript,
    /// interim ones replace the previous interim text.
    pub fn result(&self, text: impl Into<String>, is_final: bool) {
        self.send(RecognizerEvent::Result {
            text: text.into(),
            is_final,
        });
    }

    pub fn error(&self, kind: RecognitionErrorKind) {
        self.send(RecognizerEvent::Error(kind));
    }

    fn send(&self, event: RecognizerEvent) {
        let _ = self.tx.send(Internal::Recognizer {
            session: self.session,
            event,
        });
    }
}

/// Platform continuous speech recognition.
pub trait SpeechRecognizer: Send + Sync {
    /// Start a session. Events for it arrive through `callbacks`.
    fn start(
        &self,
        language: &LanguageTag,
        callbacks: RecognitionCallbacks,
    ) -> Result<(), VoiceError>;

    /// Stop gracefully, delivering any pending result.
    fn stop(&self);

    /// Stop immediately, discarding pending results.
    fn abort(&self);
}

// ── Coordinator ────────────────────────────────────────────────────

/// Accumulated recognition output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub final_text: String,
    pub interim: String,
}

/// Events emitted by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    ListeningChanged(bool),
    /// A transcript fragment accepted while not speaking.
    Transcript { text: String, is_final: bool },
    Error(RecognitionErrorKind),
}

/// Coordinator settings.
#[derive(Debug, Clone)]
pub struct RecognitionOptions {
    pub language: LanguageTag,
    /// Quiet period after speech ends before listening resumes.
    pub resume_delay: Duration,
    pub restart_delay: Duration,
}

impl RecognitionOptions {
    #[must_use]
    pub fn from_config(config: &SpeechConfig, tuning: &PlaybackTuning) -> Self {
        Self {
            language: config.language.clone(),
            resume_delay: tuning.recognition_resume_delay(),
            restart_delay: RESTART_DELAY,
        }
    }
}

#[derive(Debug)]
enum Command {
    Start,
    Stop,
    ForceStop,
    ResetTranscript,
    SetLanguage(LanguageTag),
}

#[derive(Debug)]
enum Internal {
    Recognizer { session: u64, event: RecognizerEvent },
    Wake { epoch: u64 },
}

/// Handle to a running recognition coordinator.
#[derive(Debug, Clone)]
pub struct RecognitionCoordinator {
    commands: mpsc::UnboundedSender<Command>,
    listening: watch::Receiver<bool>,
    transcript: watch::Receiver<Transcript>,
}

impl RecognitionCoordinator {
    /// Start coordinating `recognizer` against the `speaking` flag.
    pub fn spawn(
        recognizer: Arc<dyn SpeechRecognizer>,
        speaking: watch::Receiver<bool>,
        options: RecognitionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<RecognitionEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (listening_tx, listening_rx) = watch::channel(false);
        let (transcript_tx, transcript_rx) = watch::channel(Transcript::default());

        let actor = Coordinator {
            recognizer,
            options,
            internal_tx,
            events: event_tx,
            listening: listening_tx,
            transcript: transcript_tx,
            should_listen: false,
            manually_stopped: false,
            session: 0,
            session_active: false,
            epoch: 0,
        };
        tokio::spawn(actor.run(command_rx, internal_rx, speaking));

        let handle = Self {
            commands: command_tx,
            listening: listening_rx,
            transcript: transcript_rx,
        };
        (handle, event_rx)
    }

    /// Begin listening, clearing the transcript. Deferred while speaking.
    pub fn start_listening(&self) {
        self.send(Command::Start);
    }

    /// Stop listening gracefully.
    pub fn stop_listening(&self) {
        self.send(Command::Stop);
    }

    /// Abort the session immediately.
    pub fn force_stop(&self) {
        self.send(Command::ForceStop);
    }

    pub fn reset_transcript(&self) {
        self.send(Command::ResetTranscript);
    }

    /// Change the recognition language, restarting an active session.
    pub fn set_language(&self, language: LanguageTag) {
        self.send(Command::SetLanguage(language));
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        *self.listening.borrow()
    }

    #[must_use]
    pub fn watch_listening(&self) -> watch::Receiver<bool> {
        self.listening.clone()
    }

    #[must_use]
    pub fn transcript(&self) -> Transcript {
        self.transcript.borrow().clone()
    }

    #[must_use]
    pub fn watch_transcript(&self) -> watch::Receiver<Transcript> {
        self.transcript.clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Recognition coordinator is not running");
        }
    }
}

struct Coordinator {
    recognizer: Arc<dyn SpeechRecognizer>,
    options: RecognitionOptions,
    internal_tx: mpsc::UnboundedSender<Internal>,
    events: mpsc::UnboundedSender<RecognitionEvent>,
    listening: watch::Sender<bool>,
    transcript: watch::Sender<Transcript>,

    /// The user wants to listen.
    should_listen: bool,
    /// Stopped by the user or a fatal error; no auto-restart.
    manually_stopped: bool,
    /// Id of the most recent session; events from older ones are ignored.
    session: u64,
    session_active: bool,
    /// Bumped to cancel a pending restart.
    epoch: u64,
}

impl Coordinator {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
        mut speaking: watch::Receiver<bool>,
    ) {
        let mut speaking_open = true;
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command, *speaking.borrow()),
                    None => break,
                },
                changed = speaking.changed(), if speaking_open => {
                    if changed.is_err() {
                        // Orchestrator gone: nothing will speak again.
                        speaking_open = false;
                        continue;
                    }
                    let is_speaking = *speaking.borrow_and_update();
                    self.speaking_changed(is_speaking);
                }
                Some(message) = internal.recv() => {
                    self.handle_internal(message, *speaking.borrow());
                }
            }
        }

        if self.session_active {
            self.recognizer.abort();
        }
        tracing::debug!("Recognition coordinator stopped");
    }

    fn handle_command(&mut self, command: Command, is_speaking: bool) {
        match command {
            Command::Start => {
                self.update_transcript(|t| *t = Transcript::default());
                self.should_listen = true;
                self.manually_stopped = false;
                if is_speaking {
                    tracing::debug!("Listening deferred until speech ends");
                } else {
                    self.try_start();
                }
            }
            Command::Stop => {
                self.give_up();
                if self.session_active {
                    self.recognizer.stop();
                }
            }
            Command::ForceStop => {
                self.give_up();
                self.recognizer.abort();
                self.end_session();
            }
            Command::ResetTranscript => self.update_transcript(|t| *t = Transcript::default()),
            Command::SetLanguage(language) => {
                tracing::debug!(%language, "Recognition language changed");
                self.options.language = language;
                if self.session_active {
                    self.recognizer.abort();
                    self.end_session();
                    self.schedule_wake(self.options.restart_delay);
                }
            }
        }
    }

    fn speaking_changed(&mut self, is_speaking: bool) {
        // Any pending restart belongs to the previous speaking period.
        self.epoch += 1;
        if is_speaking {
            if self.session_active {
                tracing::debug!("Speech started, suspending recognition");
                self.recognizer.stop();
                self.end_session();
            }
        } else if self.wants_session() {
            tracing::debug!(
                delay = ?self.options.resume_delay,
                "Speech ended, resuming recognition soon"
            );
            self.schedule_wake(self.options.resume_delay);
        }
    }

    fn handle_internal(&mut self, message: Internal, is_speaking: bool) {
        match message {
            Internal::Wake { epoch } => {
                if epoch == self.epoch && !is_speaking && self.wants_session() {
                    self.try_start();
                }
            }
            Internal::Recognizer { session, event } => {
                if session != self.session {
                    tracing::trace!(
                        session,
                        current = self.session,
                        "Ignoring event from old session"
                    );
                    return;
                }
                self.recognizer_event(event, is_speaking);
            }
        }
    }

    fn recognizer_event(&mut self, event: RecognizerEvent, is_speaking: bool) {
        match event {
            // A session suspended before it reported starting stays down.
            RecognizerEvent::Started if self.session_active => self.set_listening(true),
            RecognizerEvent::Started => {}
            RecognizerEvent::Ended => {
                let was_active = self.session_active;
                self.end_session();
                if was_active && !is_speaking && self.wants_session() {
                    tracing::debug!("Recognition session ended, restarting");
                    self.epoch += 1;
                    self.schedule_wake(self.options.restart_delay);
                }
            }
            RecognizerEvent::Result { text, is_final } => {
                if is_final {
                    if is_speaking {
                        tracing::debug!(
                            chars = text.len(),
                            "Dropping transcript captured while speaking"
                        );
                        return;
                    }
                    self.update_transcript(|t| {
                        t.final_text.push_str(&text);
                        t.interim.clear();
                    });
                } else {
                    self.update_transcript(|t| t.interim.clone_from(&text));
                }
                self.emit(RecognitionEvent::Transcript { text, is_final });
            }
            RecognizerEvent::Error(kind) => self.recognizer_error(kind),
        }
    }

    fn recognizer_error(&mut self, kind: RecognitionErrorKind) {
        match kind {
            RecognitionErrorKind::NoSpeech => {
                tracing::debug!("No speech detected, continuing");
                return;
            }
            ref fatal if fatal.is_fatal() => {
                tracing::error!(error = %fatal, "Microphone unavailable, listening stopped");
                self.give_up();
                self.end_session();
            }
            ref other => tracing::warn!(error = %other, "Speech recognition error"),
        }
        self.emit(RecognitionEvent::Error(kind));
    }

    // ── Session management ─────────────────────────────────────────

    const fn wants_session(&self) -> bool {
        self.should_listen && !self.manually_stopped
    }

    fn give_up(&mut self) {
        self.should_listen = false;
        self.manually_stopped = true;
        self.epoch += 1;
    }

    fn try_start(&mut self) {
        if self.session_active {
            return;
        }
        self.session += 1;
        let callbacks = RecognitionCallbacks {
            session: self.session,
            tx: self.internal_tx.clone(),
        };
        match self.recognizer.start(&self.options.language, callbacks) {
            Ok(()) => {
                self.session_active = true;
                tracing::debug!(
                    session = self.session,
                    language = %self.options.language,
                    "Recognition started"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start speech recognition");
                self.emit(RecognitionEvent::Error(RecognitionErrorKind::Other(e.to_string())));
            }
        }
    }

    fn end_session(&mut self) {
        self.session_active = false;
        self.set_listening(false);
    }

    fn schedule_wake(&self, delay: Duration) {
        let tx = self.internal_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Internal::Wake { epoch });
        });
    }

    fn set_listening(&self, value: bool) {
        let changed = self.listening.send_if_modified(|listening| {
            let changed = *listening != value;
            *listening = value;
            changed
        });
        if changed {
            self.emit(RecognitionEvent::ListeningChanged(value));
        }
    }

    fn update_transcript(&self, update: impl FnOnce(&mut Transcript)) {
        self.transcript.send_modify(update);
    }

    fn emit(&self, event: RecognitionEvent) {
        let _ = self.events.send(event);
    }
}
