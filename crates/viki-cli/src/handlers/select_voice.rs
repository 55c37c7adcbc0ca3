//! `select-voice` handler.

use std::path::Path;

use anyhow::Result;
use viki_core::{Gender, LanguageTag, VoicePreferences};
use viki_voice::{rank_voices, select_voice};

use crate::bootstrap::{CliContext, load_voices};
use crate::presentation::print_separator;

/// Show the ranked candidates for `language` and the voice that would be used.
pub fn execute(
    ctx: &CliContext,
    language: &LanguageTag,
    voices_path: Option<&Path>,
    gender: Option<Gender>,
    limit: usize,
) -> Result<()> {
    let voices = load_voices(voices_path)?;
    let preferences = VoicePreferences {
        preferred_gender: gender,
    };

    let ranked = rank_voices(&voices, language, &preferences, &ctx.profiles);
    println!("{:>6}  {:<48} TAG", "SCORE", "VOICE");
    print_separator(64);
    for candidate in ranked.iter().take(limit) {
        println!(
            "{:>6}  {:<48} {}",
            candidate.score, candidate.voice.name, candidate.voice.language_tag
        );
    }
    if ranked.len() > limit {
        println!("  ... {} more", ranked.len() - limit);
    }
    println!();

    match select_voice(&voices, language, &preferences, &ctx.profiles) {
        Some(voice) => println!("Selected: {}", voice.name),
        None => println!("Selected: engine default (no voice scored above the threshold)"),
    }
    Ok(())
}
