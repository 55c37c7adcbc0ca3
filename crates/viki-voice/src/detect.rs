//! Language detection for text about to be spoken.
//!
//! A deliberately small heuristic: marker characters first (a Romanian
//! `ș` is a near-certain signal), then function-word overlap. The result
//! is always one of the supported tags; anything inconclusive falls back to
//! the table's default language. Mixed-language text gets one label for
//! the whole string.

use viki_core::{LanguageProfiles, LanguageTag};

/// Why a particular language was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionReason {
    /// Input was empty or whitespace only.
    EmptyInput,
    /// A marker character unique to the language was present.
    Diacritic(char),
    /// The language had the strictly highest function-word count.
    WordScore(usize),
    /// No signal, or a tie between languages.
    Fallback,
}

/// Outcome of [`detect_with_reason`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub language: LanguageTag,
    pub reason: DetectionReason,
}

/// Classify `text` as one of the supported languages.
#[must_use]
pub fn detect_language(text: &str, profiles: &LanguageProfiles) -> LanguageTag {
    detect_with_reason(text, profiles).language
}

/// Classify `text`, also reporting what decided it.
#[must_use]
pub fn detect_with_reason(text: &str, profiles: &LanguageProfiles) -> Detection {
    let fallback = |reason| Detection {
        language: profiles.default_tag().clone(),
        reason,
    };

    if text.trim().is_empty() {
        return fallback(DetectionReason::EmptyInput);
    }

    // Marker characters are checked on the raw text, before any scoring.
    for profile in profiles.profiles() {
        if let Some(marker) = text.chars().find(|&c| profile.has_diacritic(c)) {
            tracing::debug!(language = %profile.tag, %marker, "Detected language from diacritic");
            return Detection {
                language: profile.tag.clone(),
                reason: DetectionReason::Diacritic(marker),
            };
        }
    }

    let words = normalise_words(text);
    let scores: Vec<usize> = profiles
        .profiles()
        .iter()
        .map(|profile| {
            words
                .iter()
                .filter(|w| profile.function_words.iter().any(|f| f == *w))
                .count()
        })
        .collect();

    let best = scores.iter().copied().max().unwrap_or(0);
    let leaders: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == best)
        .map(|(i, _)| i)
        .collect();

    if best == 0 || leaders.len() != 1 {
        tracing::debug!(
            best_score = best,
            tied = leaders.len(),
            "No clear language detected, using default"
        );
        return fallback(DetectionReason::Fallback);
    }

    let winner = &profiles.profiles()[leaders[0]];
    tracing::debug!(language = %winner.tag, score = best, "Detected language from word score");
    Detection {
        language: winner.tag.clone(),
        reason: DetectionReason::WordScore(best),
    }
}

/// Lower-case words with punctuation removed.
fn normalise_words(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
