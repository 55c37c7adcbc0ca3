//! Core domain types for the VIKI speech orchestrator.
//!
//! Pure data and validation: language tags, voice descriptors, speech
//! settings and the language-profile tables that drive detection and voice
//! scoring. No async runtime and no platform bindings live here.

#![deny(unused_crate_dependencies)]

pub mod language;
pub mod profiles;
pub mod settings;
pub mod voice;

// Re-export commonly used types for convenience
pub use language::{InvalidLanguageTag, LanguageTag};
pub use profiles::{LanguageProfile, LanguageProfiles, ProfileError, ScoringWeights};
pub use settings::{
    DEFAULT_MAX_CHUNK_CHARS, PlaybackTuning, SettingsError, SpeechConfig, SpeechConfigUpdate,
    validate_speech_config, validate_tuning,
};
pub use voice::{Gender, VoiceDescriptor, VoicePreferences};
