//! `speak` handler, plus the playback session shared with `test-voice`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc::UnboundedReceiver;
use viki_core::{PlaybackTuning, SpeechConfigUpdate, VoicePreferences};
use viki_voice::{
    OrchestratorOptions, RequestId, SpeechEvent, SpeechOrchestrator, StaticVoiceProvider,
    text_utils::clean_for_speech,
};

use crate::bootstrap::{CliContext, load_voices};
use crate::commands::{PlaybackArgs, SpeakArgs};
use crate::console_engine::ConsoleEngine;
use crate::handlers::resolve_text;
use crate::presentation::format_event;

/// Speak text through the console engine and wait until it is done.
pub async fn execute(ctx: &CliContext, args: SpeakArgs) -> Result<()> {
    let mut text = resolve_text(args.text)?;
    if args.clean {
        text = clean_for_speech(&text);
    }

    let (speech, mut events) = start_session(ctx, &args.playback)?;
    let Some(id) = speech.speak(text) else {
        println!("Nothing to say.");
        return Ok(());
    };
    follow(&speech, &mut events, id).await
}

/// Spawn an orchestrator over the console engine for one command.
pub(crate) fn start_session(
    ctx: &CliContext,
    args: &PlaybackArgs,
) -> Result<(SpeechOrchestrator, UnboundedReceiver<SpeechEvent>)> {
    let voices = load_voices(args.voices.as_deref())?;

    let mut engine = ConsoleEngine::new(Duration::from_millis(args.pace_ms));
    if let Some(n) = args.fail_every {
        engine = engine.failing_every(n);
    }

    let options = OrchestratorOptions {
        profiles: ctx.profiles.clone(),
        tuning: PlaybackTuning {
            max_chunk_chars: args.max_chars,
            ..PlaybackTuning::default()
        },
        preferences: VoicePreferences {
            preferred_gender: args.gender,
        },
        ..OrchestratorOptions::default()
    };
    let (speech, events) = SpeechOrchestrator::spawn(
        Arc::new(engine),
        Arc::new(StaticVoiceProvider::new(voices)),
        options,
    )?;

    let config = speech.update_config(&SpeechConfigUpdate {
        language: None,
        rate: args.rate,
        pitch: args.pitch,
        volume: args.volume,
    });
    tracing::debug!(
        rate = config.rate,
        pitch = config.pitch,
        volume = config.volume,
        "Speech settings"
    );

    Ok((speech, events))
}

/// Print events for `id` until it finishes. Ctrl-C stops playback.
pub(crate) async fn follow(
    speech: &SpeechOrchestrator,
    events: &mut UnboundedReceiver<SpeechEvent>,
    id: RequestId,
) -> Result<()> {
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    bail!("Speech orchestrator stopped unexpectedly");
                };
                println!("{}", format_event(&event));
                match event {
                    SpeechEvent::RequestFinished { request_id, .. }
                    | SpeechEvent::RequestCancelled { request_id }
                        if request_id == id =>
                    {
                        return Ok(());
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                speech.stop();
                println!("Stopped.");
                return Ok(());
            }
        }
    }
}
