//! Terminal formatting for handler output.

use viki_voice::SpeechEvent;

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// One-line rendering of a playback event.
pub fn format_event(event: &SpeechEvent) -> String {
    match event {
        SpeechEvent::VoicesRefreshed { count } => format!("voices refreshed ({count} available)"),
        SpeechEvent::RequestStarted {
            request_id,
            language,
            voice,
            chunks,
        } => format!(
            "{request_id} speaking {language} with {} in {chunks} chunk(s)",
            voice.as_deref().unwrap_or("the engine default voice")
        ),
        SpeechEvent::ChunkStarted { request_id, chunk } => {
            format!("{request_id} chunk {}", chunk + 1)
        }
        SpeechEvent::ChunkFailed {
            request_id,
            chunk,
            error,
        } => format!("{request_id} chunk {} failed ({error}), skipping", chunk + 1),
        SpeechEvent::RequestFinished {
            request_id,
            chunks,
            failed,
        } => {
            if *failed == 0 {
                format!("{request_id} finished ({chunks} chunk(s))")
            } else {
                format!("{request_id} finished ({chunks} chunk(s), {failed} failed)")
            }
        }
        SpeechEvent::RequestCancelled { request_id } => format!("{request_id} cancelled"),
    }
}
