//! Speech output orchestration for VIKI.
//!
//! `speak(text)` detects the language of `text`, picks the best platform
//! voice for it, splits it into chunks the engine can synthesise reliably
//! and plays them one after another. A newer `speak` or a `stop`
//! supersedes whatever is playing; stale engine callbacks are ignored.
//!
//! The platform is reached only through the [`SpeechEngine`],
//! [`VoiceProvider`] and [`SpeechRecognizer`] traits.

#![deny(unused_crate_dependencies)]

pub mod detect;
pub mod engine;
pub mod error;
pub mod gate;
pub mod narrator;
pub mod orchestrator;
pub mod queue;
pub mod recognition;
pub mod select;
pub mod text_utils;

// Re-export key types for convenience
pub use detect::{Detection, DetectionReason, detect_language, detect_with_reason};
pub use engine::{
    EngineEvent, SpeechEngine, StaticVoiceProvider, Utterance, UtteranceCallbacks, UtteranceTag,
    VoiceProvider,
};
pub use error::VoiceError;
pub use gate::{RequestId, SpeakingGate};
pub use narrator::{AutoNarrator, ChatMessage, MessageRole, NarrationDecision};
pub use orchestrator::{OrchestratorOptions, SpeechEvent, SpeechOrchestrator};
pub use queue::QueueState;
pub use recognition::{
    RecognitionCallbacks, RecognitionCoordinator, RecognitionErrorKind, RecognitionEvent,
    RecognitionOptions, SpeechRecognizer, Transcript,
};
pub use select::{ScoredVoice, group_voices_by_language, rank_voices, score_voice, select_voice};
