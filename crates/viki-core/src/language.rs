//! BCP-47 language tags.
//!
//! Only the subset of BCP-47 that speech platforms actually report is
//! modelled: a primary language subtag optionally followed by further
//! subtags (`en`, `en-GB`, `ro-RO`, `zh-Hant-TW`). Platforms disagree on
//! separators and casing (`en_GB`, `EN-gb`), so parsing normalises both.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string that could not be parsed as a language tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid language tag: {0:?}")]
pub struct InvalidLanguageTag(pub String);

/// A normalised language tag such as `en-GB`.
///
/// The primary subtag is lower-cased, a two-letter region subtag is
/// upper-cased and `_` separators become `-`. Comparison is therefore
/// plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Parse and normalise a tag.
    pub fn parse(raw: &str) -> Result<Self, InvalidLanguageTag> {
        let trimmed = raw.trim();
        let mut normalised = String::with_capacity(trimmed.len());

        for (i, subtag) in trimmed.split(['-', '_']).enumerate() {
            let min_len = if i == 0 { 2 } else { 1 };
            if !(min_len..=8).contains(&subtag.len())
                || !subtag.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(InvalidLanguageTag(raw.to_string()));
            }
            if i == 0 {
                if !subtag.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(InvalidLanguageTag(raw.to_string()));
                }
                normalised.push_str(&subtag.to_ascii_lowercase());
                continue;
            }

            normalised.push('-');
            if subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()) {
                normalised.push_str(&subtag.to_ascii_uppercase());
            } else {
                normalised.push_str(subtag);
            }
        }

        Ok(Self(normalised))
    }

    /// Wrap an already-normalised literal. Only for crate-internal defaults.
    pub(crate) fn new_unchecked(tag: &str) -> Self {
        Self(tag.to_string())
    }

    /// The full normalised tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag (`en` for `en-GB`).
    #[must_use]
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Region subtag, if any (`GB` for `en-GB`).
    ///
    /// Script subtags (`Hant`) are skipped; the first two-letter or
    /// three-digit subtag after the primary one is the region.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.0.split('-').skip(1).find(|s| {
            (s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()))
                || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit()))
        })
    }

    /// Whether both tags name the same primary language.
    #[must_use]
    pub fn same_base(&self, other: &Self) -> bool {
        self.base() == other.base()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageTag {
    type Err = InvalidLanguageTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageTag {
    type Error = InvalidLanguageTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageTag> for String {
    fn from(tag: LanguageTag) -> Self {
        tag.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalises_case_and_separator() {
        let tag = LanguageTag::parse("EN_gb").unwrap();
        assert_eq!(tag.as_str(), "en-GB");
        assert_eq!(tag.base(), "en");
        assert_eq!(tag.region(), Some("GB"));
    }

    #[test]
    fn bare_language_has_no_region() {
        let tag: LanguageTag = "ro".parse().unwrap();
        assert_eq!(tag.base(), "ro");
        assert_eq!(tag.region(), None);
    }

    #[test]
    fn script_subtag_is_not_a_region() {
        let tag = LanguageTag::parse("zh-Hant-TW").unwrap();
        assert_eq!(tag.region(), Some("TW"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(LanguageTag::parse("").is_err());
        assert!(LanguageTag::parse("e").is_err());
        assert!(LanguageTag::parse("en--GB").is_err());
        assert!(LanguageTag::parse("12-GB").is_err());
        assert!(LanguageTag::parse("en GB").is_err());
    }

    #[test]
    fn same_base_ignores_region() {
        let gb = LanguageTag::parse("en-GB").unwrap();
        let us = LanguageTag::parse("en-US").unwrap();
        let ro = LanguageTag::parse("ro-RO").unwrap();
        assert!(gb.same_base(&us));
        assert!(!gb.same_base(&ro));
    }

    #[test]
    fn serde_round_trips_through_string() {
        let tag: LanguageTag = serde_json::from_str("\"ro_ro\"").unwrap();
        assert_eq!(tag.as_str(), "ro-RO");
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"ro-RO\"");
        assert!(serde_json::from_str::<LanguageTag>("\"\"").is_err());
    }
}
