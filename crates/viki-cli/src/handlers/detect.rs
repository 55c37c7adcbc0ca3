//! `detect` handler.

use anyhow::Result;
use viki_voice::{DetectionReason, detect_with_reason};

use crate::bootstrap::CliContext;
use crate::handlers::resolve_text;

/// Print the detected language tag, optionally with the deciding rule.
pub fn execute(ctx: &CliContext, text: Option<String>, explain: bool) -> Result<()> {
    let text = resolve_text(text)?;
    let detection = detect_with_reason(&text, &ctx.profiles);

    if !explain {
        println!("{}", detection.language);
        return Ok(());
    }

    let why = match detection.reason {
        DetectionReason::EmptyInput => "empty input, using the default language".to_string(),
        DetectionReason::Diacritic(c) => format!("found the marker character '{c}'"),
        DetectionReason::WordScore(n) => format!("{n} common word(s) matched"),
        DetectionReason::Fallback => "no clear signal, using the default language".to_string(),
    };
    println!("{}: {why}", detection.language);
    Ok(())
}
