//! Composition root: resolves language profiles and voice catalogues
//! for the handlers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use viki_core::{LanguageProfiles, VoiceDescriptor};

/// Inputs gathered from global CLI options.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Replacement language-profile table, if any.
    pub profiles_path: Option<PathBuf>,
}

/// Everything a handler needs.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub profiles: LanguageProfiles,
}

/// Build the handler context.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext> {
    let profiles = match &config.profiles_path {
        Some(path) => LanguageProfiles::from_path(path)?,
        None => LanguageProfiles::builtin(),
    };
    tracing::debug!(
        languages = profiles.profiles().len(),
        default = %profiles.default_tag(),
        "Language profiles loaded"
    );
    Ok(CliContext { profiles })
}

/// Read a voice list from a JSON array, or return the demo catalogue.
pub fn load_voices(path: Option<&Path>) -> Result<Vec<VoiceDescriptor>> {
    let Some(path) = path else {
        return Ok(demo_voices());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read voice list {}", path.display()))?;
    let voices: Vec<VoiceDescriptor> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid voice list {}", path.display()))?;
    tracing::debug!(count = voices.len(), path = %path.display(), "Voice list loaded");
    Ok(voices)
}

/// A catalogue shaped like a typical desktop browser's.
pub fn demo_voices() -> Vec<VoiceDescriptor> {
    vec![
        VoiceDescriptor::new("Microsoft David - English (United States)", "en-US", true, true),
        VoiceDescriptor::new("Microsoft Zira - English (United States)", "en-US", true, false),
        VoiceDescriptor::new("Microsoft Hazel - English (United Kingdom)", "en-GB", true, false),
        VoiceDescriptor::new("Microsoft George - English (United Kingdom)", "en-GB", true, false),
        VoiceDescriptor::new("Microsoft Heera - English (India)", "en-IN", true, false),
        VoiceDescriptor::new("Microsoft Andrei - Romanian (Romania)", "ro-RO", true, false),
        VoiceDescriptor::new("Google UK English Female", "en-GB", false, false),
        VoiceDescriptor::new("Google UK English Male", "en-GB", false, false),
        VoiceDescriptor::new("Google română", "ro-RO", false, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_profiles_without_path() {
        let ctx = bootstrap(&CliConfig::default()).unwrap();
        assert_eq!(ctx.profiles.default_tag().as_str(), "en-GB");
    }

    #[test]
    fn test_missing_profiles_file_is_an_error() {
        let config = CliConfig {
            profiles_path: Some(PathBuf::from("/nonexistent/viki/profiles.json")),
        };
        assert!(bootstrap(&config).is_err());
    }

    #[test]
    fn test_load_voices_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "Ioana", "lang": "ro-RO", "localService": true, "default": false}}]"#
        )
        .unwrap();

        let voices = load_voices(Some(file.path())).unwrap();
        assert_eq!(voices, vec![VoiceDescriptor::new("Ioana", "ro-RO", true, false)]);
    }

    #[test]
    fn test_load_voices_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_voices(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Invalid voice list"));
    }

    #[test]
    fn test_demo_catalogue_without_path() {
        let voices = load_voices(None).unwrap();
        assert!(voices.iter().any(|v| v.language_tag == "ro-RO"));
    }
}
