//! Voice orchestration error types.
//!
//! Speaking itself never fails from the caller's point of view: chunk
//! failures are skipped and a request that fails completely just ends.
//! These errors only surface at configuration and platform seams.

use viki_core::{LanguageTag, SettingsError};

/// Errors that can occur while configuring or wiring the voice subsystem.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// The platform could not enumerate its voices.
    #[error("Voice list unavailable: {0}")]
    VoiceListUnavailable(String),

    /// No profile (or no sample phrase) for the requested language.
    #[error("Language {0} is not supported")]
    UnsupportedLanguage(LanguageTag),

    /// Speech recognition refused to start.
    #[error("Speech recognition failed to start: {0}")]
    RecognitionStart(String),

    /// Invalid speech settings.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
