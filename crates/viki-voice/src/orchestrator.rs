//! Speech output orchestrator: detect, select a voice, play chunk by chunk.
//!
//! [`SpeechOrchestrator`] is a cheap, cloneable handle. The queue itself
//! lives in a background task that owns the voice cache and the active
//! [`SpeechRequest`] and is the only place that advances playback:
//!
//! ```text
//!   speak(text) ──► Detecting ──► Playing(0) ──► … ──► Playing(n-1) ──► Idle
//!                       │              │ ended: chunk delay
//!                       │              │ failed: error delay, skip forward
//!                       └── stop / newer speak ──────────────────────► Idle
//! ```
//!
//! Every `speak` takes a fresh [`RequestId`] from the [`SpeakingGate`] on
//! the caller's side, so a request is superseded the instant a newer one is
//! issued. Engine callbacks and settling timers carry the id they were
//! created for and are dropped once it is no longer current.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use viki_core::{
    LanguageProfiles, LanguageTag, PlaybackTuning, SpeechConfig, SpeechConfigUpdate,
    VoiceDescriptor, VoicePreferences, validate_speech_config, validate_tuning,
};

use crate::detect::detect_language;
use crate::engine::{EngineEvent, SpeechEngine, UtteranceCallbacks, UtteranceTag, VoiceProvider};
use crate::error::VoiceError;
use crate::gate::{RequestId, SpeakingGate};
use crate::queue::{ChunkOutcome, QueueState, SpeechRequest, Step};
use crate::select::{log_voice_catalogue, select_voice};
use crate::text_utils::split_into_chunks;

// ── Events emitted by the orchestrator ─────────────────────────────

/// Events emitted to the UI / application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The voice catalogue was re-fetched.
    VoicesRefreshed { count: usize },

    /// A request was accepted and split into chunks.
    RequestStarted {
        request_id: RequestId,
        language: LanguageTag,
        /// `None` when the engine default voice is used.
        voice: Option<String>,
        chunks: usize,
    },

    /// The engine started speaking a chunk.
    ChunkStarted { request_id: RequestId, chunk: usize },

    /// A chunk failed and was skipped.
    ChunkFailed {
        request_id: RequestId,
        chunk: usize,
        error: String,
    },

    /// Every chunk was attempted.
    RequestFinished {
        request_id: RequestId,
        chunks: usize,
        failed: usize,
    },

    /// The request was stopped or superseded before finishing.
    RequestCancelled { request_id: RequestId },
}

// ── Options ────────────────────────────────────────────────────────

/// Construction options for [`SpeechOrchestrator::spawn`].
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    pub profiles: LanguageProfiles,
    pub tuning: PlaybackTuning,
    pub config: SpeechConfig,
    pub preferences: VoicePreferences,
}

// ── Messages ───────────────────────────────────────────────────────

#[derive(Debug)]
enum Command {
    Speak {
        id: RequestId,
        text: String,
        /// Skip detection and speak in this language.
        language: Option<LanguageTag>,
    },
    Stop,
    VoicesChanged,
}

/// Messages the actor sends itself: engine callbacks and settling timers.
#[derive(Debug)]
pub(crate) enum Internal {
    Engine(EngineEvent),
    Advance { request_id: RequestId, chunk: usize },
}

/// State read by both the handle and the actor.
#[derive(Debug)]
struct Shared {
    config: Mutex<SpeechConfig>,
    preferences: Mutex<VoicePreferences>,
    voices: Mutex<Vec<VoiceDescriptor>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Handle ─────────────────────────────────────────────────────────

/// Handle to a running speech orchestrator.
///
/// Clones share the same queue. The background task ends when the last
/// handle is dropped, cancelling anything still playing.
#[derive(Clone)]
pub struct SpeechOrchestrator {
    commands: mpsc::UnboundedSender<Command>,
    gate: SpeakingGate,
    engine: Arc<dyn SpeechEngine>,
    profiles: Arc<LanguageProfiles>,
    shared: Arc<Shared>,
    state: watch::Receiver<QueueState>,
}

impl SpeechOrchestrator {
    /// Validate the options and start the orchestrator task.
    ///
    /// The voice catalogue is fetched once on startup. Must be called from
    /// within a Tokio runtime.
    pub fn spawn(
        engine: Arc<dyn SpeechEngine>,
        provider: Arc<dyn VoiceProvider>,
        options: OrchestratorOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SpeechEvent>), VoiceError> {
        validate_tuning(&options.tuning)?;
        validate_speech_config(&options.config)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(QueueState::Idle);

        let gate = SpeakingGate::new();
        let profiles = Arc::new(options.profiles);
        let shared = Arc::new(Shared {
            config: Mutex::new(options.config),
            preferences: Mutex::new(options.preferences),
            voices: Mutex::new(Vec::new()),
        });

        let actor = Actor {
            engine: Arc::clone(&engine),
            provider,
            profiles: Arc::clone(&profiles),
            tuning: options.tuning,
            gate: gate.clone(),
            shared: Arc::clone(&shared),
            internal_tx,
            events: event_tx,
            state: state_tx,
            voices: Vec::new(),
            active: None,
            restart_pending: false,
        };
        tokio::spawn(actor.run(command_rx, internal_rx));

        let handle = Self {
            commands: command_tx,
            gate,
            engine,
            profiles,
            shared,
            state: state_rx,
        };
        Ok((handle, event_rx))
    }

    // ── Playback control ───────────────────────────────────────────

    /// Speak `text`, superseding whatever is playing.
    ///
    /// Returns immediately. Whitespace-only text is ignored and does not
    /// interrupt current speech; otherwise the new request's id is
    /// returned for correlating [`SpeechEvent`]s.
    pub fn speak(&self, text: impl Into<String>) -> Option<RequestId> {
        let text = text.into();
        if text.trim().is_empty() {
            tracing::debug!("Ignoring empty speak request");
            return None;
        }
        Some(self.submit(text, None))
    }

    /// Speak the sample phrase of `language` in that language.
    pub fn test_voice(&self, language: &LanguageTag) -> Result<RequestId, VoiceError> {
        let profile = self
            .profiles
            .get(language)
            .filter(|p| !p.sample_phrase.trim().is_empty())
            .ok_or_else(|| VoiceError::UnsupportedLanguage(language.clone()))?;
        Ok(self.submit(profile.sample_phrase.clone(), Some(profile.tag.clone())))
    }

    fn submit(&self, text: String, language: Option<LanguageTag>) -> RequestId {
        let id = self.gate.begin_request();
        tracing::debug!(request_id = %id, chars = text.chars().count(), "Speak requested");
        self.send(Command::Speak { id, text, language });
        id
    }

    /// Stop speaking. The flag is cleared before this returns.
    pub fn stop(&self) {
        self.gate.invalidate();
        self.engine.cancel_all();
        self.send(Command::Stop);
    }

    /// Pause the engine. No queue bookkeeping.
    pub fn pause(&self) {
        self.engine.pause();
    }

    /// Resume the engine. No queue bookkeeping.
    pub fn resume(&self) {
        self.engine.resume();
    }

    /// Tell the orchestrator the platform's voice list changed.
    pub fn voices_changed(&self) {
        self.send(Command::VoicesChanged);
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Speech orchestrator task is not running");
        }
    }

    // ── Observation ────────────────────────────────────────────────

    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.gate.is_speaking()
    }

    /// Subscribe to the "is speaking" flag.
    #[must_use]
    pub fn speaking(&self) -> watch::Receiver<bool> {
        self.gate.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> QueueState {
        *self.state.borrow()
    }

    /// Subscribe to queue state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<QueueState> {
        self.state.clone()
    }

    /// The cached voice catalogue.
    #[must_use]
    pub fn voices(&self) -> Vec<VoiceDescriptor> {
        lock(&self.shared.voices).clone()
    }

    #[must_use]
    pub fn profiles(&self) -> &LanguageProfiles {
        &self.profiles
    }

    // ── Settings ───────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> SpeechConfig {
        lock(&self.shared.config).clone()
    }

    /// Replace the speech settings; applies from the next `speak`.
    pub fn set_config(&self, config: SpeechConfig) -> Result<(), VoiceError> {
        validate_speech_config(&config)?;
        *lock(&self.shared.config) = config;
        Ok(())
    }

    /// Apply a partial update. Out-of-range values are clamped and
    /// non-finite ones ignored.
    pub fn update_config(&self, update: &SpeechConfigUpdate) -> SpeechConfig {
        let mut config = lock(&self.shared.config);
        config.merge(update);
        config.clone()
    }

    pub fn set_preferences(&self, preferences: VoicePreferences) {
        *lock(&self.shared.preferences) = preferences;
    }
}

// ── Actor ──────────────────────────────────────────────────────────

struct Actor {
    engine: Arc<dyn SpeechEngine>,
    provider: Arc<dyn VoiceProvider>,
    profiles: Arc<LanguageProfiles>,
    tuning: PlaybackTuning,
    gate: SpeakingGate,
    shared: Arc<Shared>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    events: mpsc::UnboundedSender<SpeechEvent>,
    state: watch::Sender<QueueState>,
    voices: Vec<VoiceDescriptor>,
    active: Option<SpeechRequest>,
    /// A superseding `speak` cancelled the engine and no request has
    /// waited out the restart delay since.
    restart_pending: bool,
}

impl Actor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
    ) {
        self.refresh_voices().await;

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(message) = internal.recv() => self.handle_internal(message),
            }
        }

        if let Some(request) = self.active.take() {
            self.gate.invalidate();
            self.engine.cancel_all();
            tracing::debug!(request_id = %request.id, "Cancelled on shutdown");
        }
        tracing::debug!("Speech orchestrator stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Speak { id, text, language } => self.start_request(id, text, language).await,
            Command::Stop => {
                self.cancel_active();
                self.restart_pending = false;
                self.set_state(QueueState::Idle);
            }
            Command::VoicesChanged => self.refresh_voices().await,
        }
    }

    fn handle_internal(&mut self, message: Internal) {
        match message {
            Internal::Advance { request_id, chunk } => self.play_chunk(request_id, chunk),
            Internal::Engine(EngineEvent::Started(tag)) => self.chunk_started(tag),
            Internal::Engine(EngineEvent::Ended(tag)) => {
                self.chunk_done(tag, ChunkOutcome::Completed, None);
            }
            Internal::Engine(EngineEvent::Failed { tag, error }) => {
                self.chunk_done(tag, ChunkOutcome::Failed, Some(error));
            }
        }
    }

    // ── Request lifecycle ──────────────────────────────────────────

    async fn start_request(&mut self, id: RequestId, text: String, language: Option<LanguageTag>) {
        if self.cancel_active() {
            self.restart_pending = true;
        }

        // A stale request leaves `restart_pending` for the one that superseded it.
        if !self.gate.is_current(id) {
            tracing::trace!(request_id = %id, "Request superseded before it started");
            return;
        }
        self.set_state(QueueState::Detecting);

        if self.voices.is_empty() {
            self.refresh_voices().await;
            if !self.gate.is_current(id) {
                return;
            }
        }

        let config = lock(&self.shared.config).clone();
        let preferences = *lock(&self.shared.preferences);

        let language = language.unwrap_or_else(|| detect_language(&text, &self.profiles));
        let voice = select_voice(&self.voices, &language, &preferences, &self.profiles);
        let chunks = split_into_chunks(&text, self.tuning.max_chunk_chars);

        tracing::info!(
            request_id = %id,
            %language,
            voice = voice.as_ref().map_or("(engine default)", |v| v.name.as_str()),
            chunks = chunks.len(),
            "Speaking"
        );
        self.emit(SpeechEvent::RequestStarted {
            request_id: id,
            language: language.clone(),
            voice: voice.as_ref().map(|v| v.name.clone()),
            chunks: chunks.len(),
        });

        self.active = Some(SpeechRequest::new(id, text, language, chunks, voice, config));
        self.set_state(QueueState::Playing { chunk: 0 });

        if std::mem::take(&mut self.restart_pending) {
            self.schedule(id, 0, self.tuning.restart_delay());
        } else {
            self.play_chunk(id, 0);
        }
    }

    /// Drop the active request, if any. The caller has already moved the
    /// gate on; this only cancels the engine and reports it.
    fn cancel_active(&mut self) -> bool {
        let Some(previous) = self.active.take() else {
            return false;
        };
        self.engine.cancel_all();
        tracing::debug!(request_id = %previous.id, "Request cancelled");
        self.emit(SpeechEvent::RequestCancelled {
            request_id: previous.id,
        });
        true
    }

    fn play_chunk(&mut self, id: RequestId, chunk: usize) {
        if !self.gate.is_current(id) {
            tracing::trace!(request_id = %id, chunk, "Dropping stale advance");
            return;
        }
        let Some((utterance, tag)) = self
            .active
            .as_mut()
            .filter(|r| r.id == id)
            .and_then(|r| r.begin_chunk(chunk))
        else {
            tracing::trace!(request_id = %id, chunk, "Chunk not due, ignoring advance");
            return;
        };

        tracing::debug!(
            request_id = %id,
            chunk,
            chars = utterance.text.chars().count(),
            "Enqueuing chunk"
        );
        self.set_state(QueueState::Playing { chunk });
        self.engine
            .enqueue_utterance(utterance, UtteranceCallbacks::new(tag, self.internal_tx.clone()));
    }

    fn chunk_started(&mut self, tag: UtteranceTag) {
        let in_flight = self
            .active
            .as_ref()
            .is_some_and(|r| r.id == tag.request_id && r.is_in_flight(tag.chunk));
        if !in_flight || !self.gate.mark_speaking(tag.request_id) {
            tracing::trace!(
                request_id = %tag.request_id,
                chunk = tag.chunk,
                "Ignoring stale chunk start"
            );
            return;
        }
        self.emit(SpeechEvent::ChunkStarted {
            request_id: tag.request_id,
            chunk: tag.chunk,
        });
    }

    fn chunk_done(&mut self, tag: UtteranceTag, outcome: ChunkOutcome, error: Option<String>) {
        let id = tag.request_id;
        if !self.gate.is_current(id) {
            tracing::trace!(request_id = %id, chunk = tag.chunk, "Ignoring stale chunk completion");
            return;
        }
        let Some(step) = self
            .active
            .as_mut()
            .filter(|r| r.id == id)
            .and_then(|r| r.complete_chunk(tag.chunk, outcome))
        else {
            tracing::trace!(
                request_id = %id,
                chunk = tag.chunk,
                "Ignoring duplicate chunk completion"
            );
            return;
        };

        let delay = match outcome {
            ChunkOutcome::Completed => self.tuning.chunk_delay(),
            ChunkOutcome::Failed => {
                let error = error.unwrap_or_default();
                tracing::warn!(
                    request_id = %id,
                    chunk = tag.chunk,
                    %error,
                    "Chunk synthesis failed, skipping"
                );
                self.emit(SpeechEvent::ChunkFailed {
                    request_id: id,
                    chunk: tag.chunk,
                    error,
                });
                self.tuning.error_delay()
            }
        };

        match step {
            Step::Next(next) => {
                self.set_state(QueueState::Playing { chunk: next });
                self.schedule(id, next, delay);
            }
            Step::Finished => self.finish(id),
        }
    }

    fn finish(&mut self, id: RequestId) {
        let Some(request) = self.active.take() else {
            return;
        };
        self.gate.mark_finished(id);
        self.set_state(QueueState::Idle);

        tracing::info!(
            request_id = %id,
            chunks = request.chunk_count(),
            failed = request.failed_chunks,
            "Finished speaking"
        );
        self.emit(SpeechEvent::RequestFinished {
            request_id: id,
            chunks: request.chunk_count(),
            failed: request.failed_chunks,
        });
    }

    /// Post an advance to `chunk` after `delay`.
    fn schedule(&self, request_id: RequestId, chunk: usize, delay: Duration) {
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Internal::Advance { request_id, chunk });
        });
    }

    // ── Voices ─────────────────────────────────────────────────────

    async fn refresh_voices(&mut self) {
        match self.provider.list_voices().await {
            Ok(voices) => {
                log_voice_catalogue(&voices);
                lock(&self.shared.voices).clone_from(&voices);
                let count = voices.len();
                self.voices = voices;
                self.emit(SpeechEvent::VoicesRefreshed { count });
            }
            Err(e) => {
                tracing::warn!(error = %e, cached = self.voices.len(), "Failed to list voices");
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn set_state(&self, new_state: QueueState) {
        self.state.send_if_modified(|state| {
            if *state == new_state {
                return false;
            }
            tracing::debug!(old = ?*state, new = ?new_state, "Queue state transition");
            *state = new_state;
            true
        });
    }

    /// Best-effort; nobody may be listening.
    fn emit(&self, event: SpeechEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("Speech event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MockVoiceProvider, Utterance};

    #[derive(Default)]
    struct SilentEngine {
        cancels: Mutex<usize>,
        utterances: Mutex<Vec<Utterance>>,
    }

    impl SpeechEngine for SilentEngine {
        fn enqueue_utterance(&self, utterance: Utterance, _callbacks: UtteranceCallbacks) {
            lock(&self.utterances).push(utterance);
        }
        fn cancel_all(&self) {
            *lock(&self.cancels) += 1;
        }
        fn pause(&self) {}
        fn resume(&self) {}
    }

    fn provider_with(voices: Vec<VoiceDescriptor>) -> Arc<MockVoiceProvider> {
        let mut provider = MockVoiceProvider::new();
        provider
            .expect_list_voices()
            .returning(move || Ok(voices.clone()));
        Arc::new(provider)
    }

    #[tokio::test]
    async fn rejects_invalid_options() {
        let options = OrchestratorOptions {
            tuning: PlaybackTuning {
                max_chunk_chars: 3,
                ..PlaybackTuning::default()
            },
            ..OrchestratorOptions::default()
        };
        let result = SpeechOrchestrator::spawn(
            Arc::new(SilentEngine::default()),
            provider_with(Vec::new()),
            options,
        );
        assert!(matches!(result, Err(VoiceError::Settings(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_is_ignored() {
        let engine = Arc::new(SilentEngine::default());
        let (orchestrator, _events) = SpeechOrchestrator::spawn(
            engine.clone(),
            provider_with(Vec::new()),
            OrchestratorOptions::default(),
        )
        .unwrap();

        assert!(orchestrator.speak("   \n").is_none());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(lock(&engine.utterances).is_empty());
        assert_eq!(orchestrator.state(), QueueState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn utterance_uses_detected_language_voice_and_config() {
        let engine = Arc::new(SilentEngine::default());
        let voices = vec![
            VoiceDescriptor::new("Ioana", "ro-RO", true, false),
            VoiceDescriptor::new("Hazel", "en-GB", true, true),
        ];
        let (orchestrator, _events) = SpeechOrchestrator::spawn(
            engine.clone(),
            provider_with(voices),
            OrchestratorOptions::default(),
        )
        .unwrap();

        orchestrator.set_config(SpeechConfig {
            rate: 1.25,
            ..SpeechConfig::default()
        })
        .unwrap();
        orchestrator.speak("Bună ziua, ce mai faci?");
        tokio::time::sleep(Duration::from_millis(10)).await;

        let utterances = lock(&engine.utterances).clone();
        assert_eq!(utterances.len(), 1);
        assert_eq!(utterances[0].language.as_str(), "ro-RO");
        assert_eq!(utterances[0].voice.as_ref().map(|v| v.name.as_str()), Some("Ioana"));
        assert!((utterances[0].rate - 1.25).abs() < f32::EPSILON);
        assert_eq!(orchestrator.state(), QueueState::Playing { chunk: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_forces_language() {
        let engine = Arc::new(SilentEngine::default());
        let (orchestrator, _events) = SpeechOrchestrator::spawn(
            engine.clone(),
            provider_with(Vec::new()),
            OrchestratorOptions::default(),
        )
        .unwrap();

        orchestrator
            .test_voice(&LanguageTag::parse("en-GB").unwrap())
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let utterances = lock(&engine.utterances).clone();
        assert_eq!(utterances[0].language.as_str(), "en-GB");
        assert!(utterances[0].voice.is_none());

        let unsupported = orchestrator.test_voice(&LanguageTag::parse("fr-FR").unwrap());
        assert!(matches!(unsupported, Err(VoiceError::UnsupportedLanguage(_))));
    }

    #[tokio::test]
    async fn update_config_clamps() {
        let (orchestrator, _events) = SpeechOrchestrator::spawn(
            Arc::new(SilentEngine::default()),
            provider_with(Vec::new()),
            OrchestratorOptions::default(),
        )
        .unwrap();

        let updated = orchestrator.update_config(&SpeechConfigUpdate {
            volume: Some(4.0),
            ..SpeechConfigUpdate::default()
        });
        assert!((updated.volume - 1.0).abs() < f32::EPSILON);

        let updated = orchestrator.update_config(&SpeechConfigUpdate {
            rate: Some(f32::NAN),
            ..SpeechConfigUpdate::default()
        });
        assert!((updated.rate - SpeechConfig::default().rate).abs() < f32::EPSILON);
        assert!(validate_speech_config(&orchestrator.config()).is_ok());

        assert!(orchestrator
            .set_config(SpeechConfig {
                pitch: 0.1,
                ..SpeechConfig::default()
            })
            .is_err());
    }
}
