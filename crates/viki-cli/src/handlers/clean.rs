//! `clean` handler.

use anyhow::Result;
use viki_voice::text_utils::clean_for_speech;

use crate::handlers::resolve_text;

/// Print the text as narration would speak it.
pub fn execute(text: Option<String>) -> Result<()> {
    let text = resolve_text(text)?;
    println!("{}", clean_for_speech(&text));
    Ok(())
}
