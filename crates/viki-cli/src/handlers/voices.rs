//! `voices` handler.

use std::path::Path;

use anyhow::Result;
use viki_voice::group_voices_by_language;

use crate::bootstrap::load_voices;

/// Print the catalogue grouped by base language.
pub fn execute(voices_path: Option<&Path>) -> Result<()> {
    let voices = load_voices(voices_path)?;
    let groups = group_voices_by_language(&voices);

    println!("{} voice(s) in {} language(s)", voices.len(), groups.len());
    for (language, group) in &groups {
        println!();
        println!("{language} ({})", group.len());
        for voice in group {
            let mut flags = Vec::new();
            if voice.is_local {
                flags.push("local");
            }
            if voice.is_default {
                flags.push("default");
            }
            println!("  {:<48} {:<8} {}", voice.name, voice.language_tag, flags.join(", "));
        }
    }
    Ok(())
}
