//! Platform ports: the speech-synthesis engine and the voice catalogue.
//!
//! The orchestrator drives an engine it does not own through
//! [`SpeechEngine`] and learns about voices through [`VoiceProvider`].
//! Both are trait objects so a browser bridge, a native engine or a test
//! fake can be dropped in without touching the queue logic.
//!
//! Engines report progress through [`UtteranceCallbacks`]. Each utterance
//! gets its own callbacks value tagged with the request and chunk it was
//! issued for; calling them after the request was superseded is harmless.

use tokio::sync::mpsc;
use viki_core::{LanguageTag, VoiceDescriptor};

use crate::error::VoiceError;
use crate::gate::RequestId;
use crate::orchestrator::Internal;

/// One platform-level synthesis call for a single chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,

    /// `None` lets the engine pick its own default voice.
    pub voice: Option<VoiceDescriptor>,

    pub language: LanguageTag,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

/// Identity of an utterance: which request, which chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceTag {
    pub request_id: RequestId,
    pub chunk: usize,
}

/// Progress reported by the engine for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Started(UtteranceTag),
    Ended(UtteranceTag),
    Failed { tag: UtteranceTag, error: String },
}

/// Completion handles for one utterance.
///
/// The engine is expected to call `started` then `ended`, or `started`
/// then `failed`, or just `failed`. Extra or late calls are ignored by the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct UtteranceCallbacks {
    tag: UtteranceTag,
    tx: mpsc::UnboundedSender<Internal>,
}

impl UtteranceCallbacks {
    pub(crate) const fn new(tag: UtteranceTag, tx: mpsc::UnboundedSender<Internal>) -> Self {
        Self { tag, tx }
    }

    #[must_use]
    pub const fn tag(&self) -> UtteranceTag {
        self.tag
    }

    pub fn started(&self) {
        self.send(EngineEvent::Started(self.tag));
    }

    pub fn ended(&self) {
        self.send(EngineEvent::Ended(self.tag));
    }

    pub fn failed(&self, error: impl Into<String>) {
        self.send(EngineEvent::Failed {
            tag: self.tag,
            error: error.into(),
        });
    }

    fn send(&self, event: EngineEvent) {
        // The orchestrator may already be gone; nothing to report to.
        if self.tx.send(Internal::Engine(event)).is_err() {
            tracing::trace!(request_id = %self.tag.request_id, "Engine callback after shutdown");
        }
    }
}

/// Platform speech-synthesis primitives.
///
/// All methods are fire-and-forget and must not block: progress comes back
/// through the callbacks.
pub trait SpeechEngine: Send + Sync {
    /// Queue one utterance for playback.
    fn enqueue_utterance(&self, utterance: Utterance, callbacks: UtteranceCallbacks);

    /// Best-effort immediate stop of anything playing or queued.
    fn cancel_all(&self);

    fn pause(&self);

    fn resume(&self);
}

/// Source of the platform's voice catalogue.
///
/// The list may be empty while the platform is still loading; callers
/// re-fetch when told the voices changed.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VoiceProvider: Send + Sync {
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, VoiceError>;
}

/// A fixed voice catalogue, for platforms that enumerate voices up front.
#[derive(Debug, Clone, Default)]
pub struct StaticVoiceProvider {
    voices: Vec<VoiceDescriptor>,
}

impl StaticVoiceProvider {
    #[must_use]
    pub const fn new(voices: Vec<VoiceDescriptor>) -> Self {
        Self { voices }
    }
}

#[async_trait::async_trait]
impl VoiceProvider for StaticVoiceProvider {
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, VoiceError> {
        Ok(self.voices.clone())
    }
}
