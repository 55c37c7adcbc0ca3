//! Command handlers.
//!
//! Each handler is a thin wrapper: resolve its input, call into
//! `viki-voice`, format the result for the terminal.

use std::io::{self, Read};

use anyhow::{Context, Result};

pub mod chunks;
pub mod clean;
pub mod detect;
pub mod languages;
pub mod select_voice;
pub mod speak;
pub mod test_voice;
pub mod voices;

/// Use `text` as given, or read standard input when it is absent or `-`.
pub(crate) fn resolve_text(text: Option<String>) -> Result<String> {
    match text {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from standard input")?;
            Ok(buffer)
        }
    }
}
