//! `chunks` handler.

use anyhow::{Result, bail};
use viki_core::{PlaybackTuning, validate_tuning};
use viki_voice::text_utils::split_into_chunks;

use crate::handlers::resolve_text;

/// Print the chunks playback would speak, one per line.
pub fn execute(text: Option<String>, max_chars: usize) -> Result<()> {
    validate_tuning(&PlaybackTuning {
        max_chunk_chars: max_chars,
        ..PlaybackTuning::default()
    })?;

    let text = resolve_text(text)?;
    let chunks = split_into_chunks(&text, max_chars);
    if chunks.is_empty() {
        bail!("Nothing to split: the text is empty");
    }

    for (i, chunk) in chunks.iter().enumerate() {
        println!("{:>3} ({:>3} chars) {chunk}", i + 1, chunk.chars().count());
    }
    Ok(())
}
