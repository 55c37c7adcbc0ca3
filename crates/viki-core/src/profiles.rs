//! Language profiles and voice-scoring weights.
//!
//! Keyword lists and weights are data, not logic: they are fragile by
//! nature (voice catalogues vary per platform and browser) and need to be
//! corrected without touching the detector or selector. The built-in table
//! covers the two languages the product ships with; a replacement table
//! can be loaded from JSON at startup.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::language::LanguageTag;
use crate::voice::Gender;

/// The embedded default table.
const BUILTIN_PROFILES: &str = include_str!("../data/profiles.json");

/// Errors loading a profile table.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Failed to read language profiles from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid language profile table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Language profile table is empty")]
    Empty,

    #[error("Default language {0} has no profile")]
    UnknownDefault(LanguageTag),

    #[error("Language {0} is defined more than once")]
    DuplicateTag(LanguageTag),
}

/// Per-language heuristics used by detection and voice selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageProfile {
    /// Tag returned by detection and used as the voice target.
    pub tag: LanguageTag,

    /// Human-readable name.
    pub name: String,

    /// Flag emoji for selectors.
    #[serde(default)]
    pub flag: String,

    /// Characters that, when present, identify this language outright.
    #[serde(default)]
    pub diacritics: String,

    /// High-frequency function words, lower-case.
    #[serde(default)]
    pub function_words: Vec<String>,

    /// Voice-name fragments that indicate a good native voice.
    #[serde(default)]
    pub preferred_voice_keywords: Vec<String>,

    /// Voice-name fragments that indicate the wrong accent.
    #[serde(default)]
    pub disallowed_voice_keywords: Vec<String>,

    /// Voice-name fragments that indicate the right region.
    #[serde(default)]
    pub region_keywords: Vec<String>,

    /// First names of female voices in this language.
    #[serde(default)]
    pub female_names: Vec<String>,

    /// First names of male voices in this language.
    #[serde(default)]
    pub male_names: Vec<String>,

    /// Phrase spoken by "test voice".
    #[serde(default)]
    pub sample_phrase: String,
}

impl LanguageProfile {
    /// Whether `c` is one of this language's marker characters.
    #[must_use]
    pub fn has_diacritic(&self, c: char) -> bool {
        self.diacritics.contains(c)
    }

    /// Curated first names for `gender`.
    #[must_use]
    pub fn names_for(&self, gender: Gender) -> &[String] {
        match gender {
            Gender::Female => &self.female_names,
            Gender::Male => &self.male_names,
        }
    }
}

/// Additive weights for voice scoring. Penalties are stored positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    pub exact_match: i32,
    pub base_language_match: i32,
    pub local_bonus: i32,
    pub default_bonus: i32,
    pub region_bonus: i32,
    pub region_keyword_bonus: i32,
    pub preferred_keyword_bonus: i32,
    pub disallowed_penalty: i32,
    pub gender_match_bonus: i32,
    pub gender_mismatch_penalty: i32,

    /// A voice must score strictly above this to be selected.
    pub acceptance_threshold: i32,

    /// Exclude voices whose base language differs from the target.
    pub strict_language: bool,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_match: 100,
            base_language_match: 50,
            local_bonus: 30,
            default_bonus: 20,
            region_bonus: 15,
            region_keyword_bonus: 25,
            preferred_keyword_bonus: 50,
            disallowed_penalty: 200,
            gender_match_bonus: 80,
            gender_mismatch_penalty: 80,
            acceptance_threshold: 0,
            strict_language: true,
        }
    }
}

/// Wire shape of a profile table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileTable {
    default_tag: LanguageTag,
    #[serde(default)]
    weights: ScoringWeights,
    #[serde(default)]
    female_keywords: Vec<String>,
    #[serde(default)]
    male_keywords: Vec<String>,
    profiles: Vec<LanguageProfile>,
}

/// The set of supported languages plus scoring configuration.
///
/// Profile order matters: diacritic checks run in table order, so a
/// character shared by two languages resolves to the first one listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfiles {
    default_tag: LanguageTag,
    weights: ScoringWeights,
    female_keywords: Vec<String>,
    male_keywords: Vec<String>,
    profiles: Vec<LanguageProfile>,
}

impl LanguageProfiles {
    /// The built-in table (English UK + Romanian).
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_PROFILES).expect("embedded language profiles are valid")
    }

    /// Parse and validate a table from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let table: ProfileTable = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    /// Load and validate a table from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let profiles = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            languages = profiles.profiles.len(),
            "Loaded language profiles"
        );
        Ok(profiles)
    }

    fn from_table(table: ProfileTable) -> Result<Self, ProfileError> {
        if table.profiles.is_empty() {
            return Err(ProfileError::Empty);
        }

        let mut seen = HashSet::new();
        for profile in &table.profiles {
            if !seen.insert(profile.tag.clone()) {
                return Err(ProfileError::DuplicateTag(profile.tag.clone()));
            }
        }
        if !seen.contains(&table.default_tag) {
            return Err(ProfileError::UnknownDefault(table.default_tag));
        }

        Ok(Self {
            default_tag: table.default_tag,
            weights: table.weights,
            female_keywords: lowercase_all(table.female_keywords),
            male_keywords: lowercase_all(table.male_keywords),
            profiles: table
                .profiles
                .into_iter()
                .map(LanguageProfile::normalised)
                .collect(),
        })
    }

    /// Keep only the listed languages. The default must survive.
    pub fn restrict_to(&self, tags: &[LanguageTag]) -> Result<Self, ProfileError> {
        if !tags.contains(&self.default_tag) {
            return Err(ProfileError::UnknownDefault(self.default_tag.clone()));
        }
        let mut restricted = self.clone();
        restricted.profiles.retain(|p| tags.contains(&p.tag));
        Ok(restricted)
    }

    /// Tag returned when detection is inconclusive.
    #[must_use]
    pub const fn default_tag(&self) -> &LanguageTag {
        &self.default_tag
    }

    #[must_use]
    pub const fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Replace the scoring weights.
    #[must_use]
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// All supported profiles in table order.
    #[must_use]
    pub fn profiles(&self) -> &[LanguageProfile] {
        &self.profiles
    }

    /// Whether `tag` is one of the supported languages.
    #[must_use]
    pub fn is_supported(&self, tag: &LanguageTag) -> bool {
        self.profiles.iter().any(|p| &p.tag == tag)
    }

    /// Profile for `tag`: exact tag first, then any profile sharing the
    /// base language.
    #[must_use]
    pub fn get(&self, tag: &LanguageTag) -> Option<&LanguageProfile> {
        self.profiles
            .iter()
            .find(|p| &p.tag == tag)
            .or_else(|| self.profiles.iter().find(|p| p.tag.same_base(tag)))
    }

    /// Generic gender words (`"female"`, `"male"`), language-independent.
    #[must_use]
    pub fn gender_keywords(&self, gender: Gender) -> &[String] {
        match gender {
            Gender::Female => &self.female_keywords,
            Gender::Male => &self.male_keywords,
        }
    }
}

impl Default for LanguageProfiles {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageProfile {
    /// Lower-case every keyword list so matching can compare directly.
    fn normalised(mut self) -> Self {
        for list in [
            &mut self.function_words,
            &mut self.preferred_voice_keywords,
            &mut self.disallowed_voice_keywords,
            &mut self.region_keywords,
            &mut self.female_names,
            &mut self.male_names,
        ] {
            *list = lowercase_all(std::mem::take(list));
        }
        self
    }
}

fn lowercase_all(words: Vec<String>) -> Vec<String> {
    words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::parse(s).unwrap()
    }

    #[test]
    fn builtin_table_has_english_and_romanian() {
        let profiles = LanguageProfiles::builtin();
        assert_eq!(profiles.default_tag(), &tag("en-GB"));
        let tags: Vec<_> = profiles.profiles().iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags, vec!["en-GB", "ro-RO"]);
        assert!(profiles.get(&tag("ro-RO")).unwrap().has_diacritic('ș'));
        assert_eq!(profiles.weights(), &ScoringWeights::default());
    }

    #[test]
    fn get_falls_back_to_base_language() {
        let profiles = LanguageProfiles::builtin();
        assert_eq!(profiles.get(&tag("en-US")).unwrap().tag, tag("en-GB"));
        assert!(profiles.get(&tag("fr-FR")).is_none());
    }

    #[test]
    fn rejects_unknown_default() {
        let json = r#"{"defaultTag":"de-DE","profiles":[{"tag":"en-GB","name":"English"}]}"#;
        assert!(matches!(
            LanguageProfiles::from_json_str(json),
            Err(ProfileError::UnknownDefault(_))
        ));
    }

    #[test]
    fn rejects_duplicate_tags() {
        let json = r#"{"defaultTag":"en-GB","profiles":[
            {"tag":"en-GB","name":"English"},
            {"tag":"en_gb","name":"English again"}
        ]}"#;
        assert!(matches!(
            LanguageProfiles::from_json_str(json),
            Err(ProfileError::DuplicateTag(_))
        ));
    }

    #[test]
    fn keywords_are_lowercased_on_load() {
        let json = r#"{"defaultTag":"en-GB","profiles":[
            {"tag":"en-GB","name":"English","femaleNames":["Hazel"," "]}
        ]}"#;
        let profiles = LanguageProfiles::from_json_str(json).unwrap();
        assert_eq!(profiles.profiles()[0].female_names, vec!["hazel"]);
    }

    #[test]
    fn restrict_keeps_default() {
        let profiles = LanguageProfiles::builtin();
        let english_only = profiles.restrict_to(&[tag("en-GB")]).unwrap();
        assert_eq!(english_only.profiles().len(), 1);
        assert!(profiles.restrict_to(&[tag("ro-RO")]).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, BUILTIN_PROFILES).unwrap();
        let loaded = LanguageProfiles::from_path(&path).unwrap();
        assert_eq!(loaded, LanguageProfiles::builtin());

        let missing = LanguageProfiles::from_path(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(ProfileError::Io { .. })));
    }
}
