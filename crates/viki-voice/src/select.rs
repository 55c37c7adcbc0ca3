//! Voice selection.
//!
//! Platforms expose only a name, a language tag and two booleans per voice,
//! so selection is an additive point system over those fields plus
//! keyword matches against the display name. All weights and keyword lists
//! come from [`LanguageProfiles`]; this module only adds them up.

use std::collections::BTreeMap;

use viki_core::{
    Gender, LanguageProfile, LanguageProfiles, LanguageTag, VoiceDescriptor, VoicePreferences,
};

/// Number of ranked candidates written to the debug log.
const LOGGED_CANDIDATES: usize = 5;

/// A voice together with its total score for one target language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredVoice<'a> {
    pub voice: &'a VoiceDescriptor,
    pub score: i32,
}

/// Score one voice for `target`.
///
/// Returns `None` when the voice is excluded outright: its language tag is
/// unparseable, or strict mode is on and its base language differs.
#[must_use]
pub fn score_voice(
    voice: &VoiceDescriptor,
    target: &LanguageTag,
    preferences: &VoicePreferences,
    profiles: &LanguageProfiles,
) -> Option<i32> {
    let weights = profiles.weights();
    let language = voice.language()?;

    let mut score = if &language == target {
        weights.exact_match
    } else if language.same_base(target) {
        weights.base_language_match
    } else if weights.strict_language {
        return None;
    } else {
        0
    };

    if voice.is_local {
        score += weights.local_bonus;
    }
    if voice.is_default {
        score += weights.default_bonus;
    }
    if language.same_base(target)
        && language.region().is_some()
        && language.region() == target.region()
    {
        score += weights.region_bonus;
    }

    let name = voice.name.to_lowercase();
    if let Some(profile) = profiles.get(target) {
        score += keyword_score(&name, profile, profiles);
        if let Some(gender) = preferences.preferred_gender {
            score += gender_score(&name, gender, profile, profiles);
        }
    }

    Some(score)
}

fn keyword_score(name: &str, profile: &LanguageProfile, profiles: &LanguageProfiles) -> i32 {
    let weights = profiles.weights();
    let mut score = 0;
    if contains_any(name, &profile.region_keywords) {
        score += weights.region_keyword_bonus;
    }
    if contains_any(name, &profile.preferred_voice_keywords) {
        score += weights.preferred_keyword_bonus;
    }
    if contains_any(name, &profile.disallowed_voice_keywords) {
        score -= weights.disallowed_penalty;
    }
    score
}

/// Gender is matched on whole words so that "female" never counts as "male".
fn gender_score(
    name: &str,
    preferred: Gender,
    profile: &LanguageProfile,
    profiles: &LanguageProfiles,
) -> i32 {
    let weights = profiles.weights();
    let words: Vec<&str> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let matches = |gender: Gender| {
        words.iter().any(|w| {
            profile.names_for(gender).iter().any(|n| n == w)
                || profiles.gender_keywords(gender).iter().any(|k| k == w)
        })
    };

    if matches(preferred) {
        weights.gender_match_bonus
    } else if matches(preferred.opposite()) {
        -weights.gender_mismatch_penalty
    } else {
        0
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

/// Score every eligible voice and sort best first.
///
/// The sort is stable, so equal scores keep platform order.
#[must_use]
pub fn rank_voices<'a>(
    voices: &'a [VoiceDescriptor],
    target: &LanguageTag,
    preferences: &VoicePreferences,
    profiles: &LanguageProfiles,
) -> Vec<ScoredVoice<'a>> {
    let mut ranked: Vec<ScoredVoice<'a>> = voices
        .iter()
        .filter_map(|voice| {
            score_voice(voice, target, preferences, profiles)
                .map(|score| ScoredVoice { voice, score })
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// Pick the best voice for `target`, or `None` if nothing scores above
/// the acceptance threshold (the engine then uses its own default).
#[must_use]
pub fn select_voice(
    voices: &[VoiceDescriptor],
    target: &LanguageTag,
    preferences: &VoicePreferences,
    profiles: &LanguageProfiles,
) -> Option<VoiceDescriptor> {
    let ranked = rank_voices(voices, target, preferences, profiles);

    for candidate in ranked.iter().take(LOGGED_CANDIDATES) {
        tracing::debug!(
            language = %target,
            voice = %candidate.voice.name,
            score = candidate.score,
            "Voice candidate"
        );
    }

    let threshold = profiles.weights().acceptance_threshold;
    match ranked.first() {
        Some(best) if best.score > threshold => {
            tracing::info!(
                language = %target,
                voice = %best.voice.name,
                score = best.score,
                "Selected voice"
            );
            Some(best.voice.clone())
        }
        _ => {
            tracing::info!(
                language = %target,
                candidates = ranked.len(),
                "No suitable voice, using engine default"
            );
            None
        }
    }
}

/// Group voices by base language code. Unparseable tags go under `"unknown"`.
#[must_use]
pub fn group_voices_by_language(
    voices: &[VoiceDescriptor],
) -> BTreeMap<String, Vec<&VoiceDescriptor>> {
    let mut groups: BTreeMap<String, Vec<&VoiceDescriptor>> = BTreeMap::new();
    for voice in voices {
        let key = voice
            .language()
            .map_or_else(|| "unknown".to_string(), |tag| tag.base().to_string());
        groups.entry(key).or_default().push(voice);
    }
    groups
}

/// Log the catalogue grouped by language.
pub fn log_voice_catalogue(voices: &[VoiceDescriptor]) {
    let groups = group_voices_by_language(voices);
    tracing::info!(total = voices.len(), languages = groups.len(), "Voice catalogue refreshed");
    for (language, group) in &groups {
        let names: Vec<&str> = group.iter().map(|v| v.name.as_str()).collect();
        tracing::debug!(%language, count = group.len(), voices = ?names, "Voices for language");
    }
}
