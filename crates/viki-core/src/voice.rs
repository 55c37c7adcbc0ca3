//! Synthetic voice descriptors as reported by a speech platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::language::LanguageTag;

/// A voice offered by the platform's speech engine.
///
/// Platforms expose no structured gender or accent metadata; everything
/// beyond these four fields has to be inferred from `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    /// Display name (e.g. `"Microsoft Hazel - English (United Kingdom)"`).
    pub name: String,

    /// Raw language tag as reported by the platform.
    #[serde(alias = "lang")]
    pub language_tag: String,

    /// Whether the voice is installed locally (no network round-trip).
    #[serde(default, alias = "localService")]
    pub is_local: bool,

    /// Whether the platform marks this voice as its default.
    #[serde(default, alias = "default")]
    pub is_default: bool,
}

impl VoiceDescriptor {
    /// Convenience constructor, mostly for tests and fixtures.
    pub fn new(
        name: impl Into<String>,
        language_tag: impl Into<String>,
        is_local: bool,
        is_default: bool,
    ) -> Self {
        Self {
            name: name.into(),
            language_tag: language_tag.into(),
            is_local,
            is_default,
        }
    }

    /// Parsed language tag, or `None` if the platform reported something
    /// unparseable (some engines report an empty string).
    #[must_use]
    pub fn language(&self) -> Option<LanguageTag> {
        LanguageTag::parse(&self.language_tag).ok()
    }
}

/// Preferred voice gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// The other gender, used to penalise mismatches.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Female => Self::Male,
            Self::Male => Self::Female,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Female => f.write_str("female"),
            Self::Male => f.write_str("male"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Ok(Self::Female),
            "male" | "m" => Ok(Self::Male),
            other => Err(format!("unknown gender '{other}' (expected female or male)")),
        }
    }
}

/// Caller preferences applied on top of language matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicePreferences {
    /// Preferred gender, if any.
    #[serde(default)]
    pub preferred_gender: Option<Gender>,
}
