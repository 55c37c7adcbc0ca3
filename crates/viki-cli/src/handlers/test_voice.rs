//! `test-voice` handler.

use anyhow::Result;
use viki_core::LanguageTag;

use crate::bootstrap::CliContext;
use crate::commands::PlaybackArgs;
use crate::handlers::speak::{follow, start_session};

/// Speak the sample phrase of `language`.
pub async fn execute(
    ctx: &CliContext,
    language: &LanguageTag,
    playback: &PlaybackArgs,
) -> Result<()> {
    let (speech, mut events) = start_session(ctx, playback)?;
    let id = speech.test_voice(language)?;
    follow(&speech, &mut events, id).await
}
