//! Speech settings domain types and validation.
//!
//! `SpeechConfig` is owned by the UI layer and read by the orchestrator at
//! the start of every `speak` call. `PlaybackTuning` holds the settling
//! delays and chunk budget, which are tuning constants rather than
//! correctness-critical timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::language::LanguageTag;

/// Inclusive bounds for speech rate and pitch.
pub const RATE_RANGE: (f32, f32) = (0.5, 2.0);

/// Inclusive bounds for volume.
pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

/// Default maximum characters per spoken chunk.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 180;

/// User-adjustable synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    /// Language the user selected; recognition listens in it. Spoken
    /// output follows the detected language instead.
    pub language: LanguageTag,

    /// Speaking rate multiplier (0.5–2.0).
    pub rate: f32,

    /// Pitch multiplier (0.5–2.0).
    pub pitch: f32,

    /// Output volume (0–1).
    pub volume: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: LanguageTag::new_unchecked("ro-RO"),
            rate: 0.8,
            pitch: 1.0,
            volume: 0.9,
        }
    }
}

impl SpeechConfig {
    /// Set the rate, clamped to [`RATE_RANGE`]. Non-finite values are ignored.
    pub fn set_rate(&mut self, rate: f32) {
        if let Some(rate) = clamp_finite("rate", rate, RATE_RANGE) {
            self.rate = rate;
        }
    }

    /// Set the pitch, clamped to [`RATE_RANGE`]. Non-finite values are ignored.
    pub fn set_pitch(&mut self, pitch: f32) {
        if let Some(pitch) = clamp_finite("pitch", pitch, RATE_RANGE) {
            self.pitch = pitch;
        }
    }

    /// Set the volume, clamped to [`VOLUME_RANGE`]. Non-finite values are ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if let Some(volume) = clamp_finite("volume", volume, VOLUME_RANGE) {
            self.volume = volume;
        }
    }

    /// Apply a partial update, only touching fields that are `Some`.
    pub fn merge(&mut self, update: &SpeechConfigUpdate) {
        if let Some(ref language) = update.language {
            self.language.clone_from(language);
        }
        if let Some(rate) = update.rate {
            self.set_rate(rate);
        }
        if let Some(pitch) = update.pitch {
            self.set_pitch(pitch);
        }
        if let Some(volume) = update.volume {
            self.set_volume(volume);
        }
    }
}

fn clamp_finite(field: &str, value: f32, (min, max): (f32, f32)) -> Option<f32> {
    if value.is_finite() {
        Some(value.clamp(min, max))
    } else {
        tracing::warn!(field, value = ?value, "Ignoring non-finite speech setting");
        None
    }
}

/// Partial speech config update, as sent by a settings panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfigUpdate {
    pub language: Option<LanguageTag>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
}

/// Timing and sizing constants for chunked playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackTuning {
    /// Maximum characters per chunk.
    pub max_chunk_chars: usize,

    /// Pause between cancelling the engine and starting a new request.
    pub restart_delay_ms: u64,

    /// Pause between a finished chunk and the next one.
    pub chunk_delay_ms: u64,

    /// Pause after a failed chunk before moving on.
    pub error_delay_ms: u64,

    /// Quiet period after speech ends before recognition resumes.
    pub recognition_resume_delay_ms: u64,
}

impl Default for PlaybackTuning {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            restart_delay_ms: 250,
            chunk_delay_ms: 100,
            error_delay_ms: 500,
            recognition_resume_delay_ms: 1_500,
        }
    }
}

impl PlaybackTuning {
    #[must_use]
    pub const fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    #[must_use]
    pub const fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    #[must_use]
    pub const fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }

    #[must_use]
    pub const fn recognition_resume_delay(&self) -> Duration {
        Duration::from_millis(self.recognition_resume_delay_ms)
    }

    /// Tuning with every delay set to zero, for tests and batch tools.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            restart_delay_ms: 0,
            chunk_delay_ms: 0,
            error_delay_ms: 0,
            recognition_resume_delay_ms: 0,
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Speech rate must be between 0.5 and 2.0, got {0}")]
    InvalidRate(f32),

    #[error("Speech pitch must be between 0.5 and 2.0, got {0}")]
    InvalidPitch(f32),

    #[error("Speech volume must be between 0 and 1, got {0}")]
    InvalidVolume(f32),

    #[error("Chunk budget must be at least 20 characters, got {0}")]
    InvalidChunkBudget(usize),
}

/// Validate a speech config.
pub fn validate_speech_config(config: &SpeechConfig) -> Result<(), SettingsError> {
    if !(RATE_RANGE.0..=RATE_RANGE.1).contains(&config.rate) {
        return Err(SettingsError::InvalidRate(config.rate));
    }
    if !(RATE_RANGE.0..=RATE_RANGE.1).contains(&config.pitch) {
        return Err(SettingsError::InvalidPitch(config.pitch));
    }
    if !(VOLUME_RANGE.0..=VOLUME_RANGE.1).contains(&config.volume) {
        return Err(SettingsError::InvalidVolume(config.volume));
    }
    Ok(())
}

/// Validate playback tuning.
pub const fn validate_tuning(tuning: &PlaybackTuning) -> Result<(), SettingsError> {
    if tuning.max_chunk_chars < 20 {
        return Err(SettingsError::InvalidChunkBudget(tuning.max_chunk_chars));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpeechConfig::default();
        assert_eq!(config.language.as_str(), "ro-RO");
        assert!((config.rate - 0.8).abs() < f32::EPSILON);
        assert!((config.volume - 0.9).abs() < f32::EPSILON);
        assert!(validate_speech_config(&config).is_ok());
    }

    #[test]
    fn test_validate_rate_out_of_range() {
        let config = SpeechConfig {
            rate: 3.0,
            ..SpeechConfig::default()
        };
        assert!(matches!(
            validate_speech_config(&config),
            Err(SettingsError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_validate_nan_volume() {
        let config = SpeechConfig {
            volume: f32::NAN,
            ..SpeechConfig::default()
        };
        assert!(matches!(
            validate_speech_config(&config),
            Err(SettingsError::InvalidVolume(_))
        ));
    }

    #[test]
    fn test_merge_clamps_and_keeps_untouched_fields() {
        let mut config = SpeechConfig::default();
        let update = SpeechConfigUpdate {
            language: Some(LanguageTag::parse("en-GB").unwrap()),
            rate: Some(5.0),
            ..Default::default()
        };
        config.merge(&update);

        assert_eq!(config.language.as_str(), "en-GB");
        assert!((config.rate - 2.0).abs() < f32::EPSILON);
        assert!((config.pitch - 1.0).abs() < f32::EPSILON); // Unchanged
    }

    #[test]
    fn test_merge_ignores_non_finite_values() {
        let mut config = SpeechConfig::default();
        config.merge(&SpeechConfigUpdate {
            rate: Some(f32::NAN),
            pitch: Some(f32::INFINITY),
            volume: Some(f32::NEG_INFINITY),
            ..Default::default()
        });

        assert_eq!(config, SpeechConfig::default());
        assert!(validate_speech_config(&config).is_ok());

        config.set_rate(1.2);
        config.set_rate(f32::NAN);
        assert!((config.rate - 1.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tuning_deserialises_partial_json() {
        let tuning: PlaybackTuning = serde_json::from_str(r#"{"chunkDelayMs": 40}"#).unwrap();
        assert_eq!(tuning.chunk_delay(), Duration::from_millis(40));
        assert_eq!(tuning.max_chunk_chars, DEFAULT_MAX_CHUNK_CHARS);
    }

    #[test]
    fn test_tuning_budget_floor() {
        let tuning = PlaybackTuning {
            max_chunk_chars: 5,
            ..PlaybackTuning::default()
        };
        assert_eq!(
            validate_tuning(&tuning),
            Err(SettingsError::InvalidChunkBudget(5))
        );
    }
}
