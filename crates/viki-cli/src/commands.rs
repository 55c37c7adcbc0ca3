//! Subcommands of the `viki` binary.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use viki_core::{DEFAULT_MAX_CHUNK_CHARS, Gender, LanguageTag};

/// Available commands.
///
/// Commands that take text read it from standard input when the argument
/// is omitted or is `-`.
#[derive(Subcommand)]
pub enum Commands {
    /// List the supported languages
    Languages,

    /// Detect the language of a piece of text
    Detect {
        /// Text to analyse
        text: Option<String>,
        /// Show which rule decided the result
        #[arg(long)]
        explain: bool,
    },

    /// Show a voice catalogue grouped by base language
    Voices {
        /// JSON file with the platform's voice list (defaults to a demo catalogue)
        #[arg(long)]
        voices: Option<PathBuf>,
    },

    /// Rank the voices for a language and show the one that would be used
    SelectVoice {
        /// Target language tag (e.g. "ro-RO")
        language: LanguageTag,
        /// JSON file with the platform's voice list (defaults to a demo catalogue)
        #[arg(long)]
        voices: Option<PathBuf>,
        /// Preferred voice gender ("female" or "male")
        #[arg(short, long)]
        gender: Option<Gender>,
        /// Number of ranked candidates to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Split text into the chunks playback would use
    Chunks {
        /// Text to split
        text: Option<String>,
        /// Maximum characters per chunk
        #[arg(long = "max-chars", default_value_t = DEFAULT_MAX_CHUNK_CHARS)]
        max_chars: usize,
    },

    /// Strip markdown, reasoning blocks and emoji the way narration does
    Clean {
        /// Text to clean
        text: Option<String>,
    },

    /// Speak text through the console engine
    Speak(SpeakArgs),

    /// Speak a language's sample phrase through the console engine
    TestVoice {
        /// Language whose sample phrase to speak
        language: LanguageTag,
        #[command(flatten)]
        playback: PlaybackArgs,
    },
}

/// Arguments for `speak`.
#[derive(Args)]
pub struct SpeakArgs {
    /// Text to speak
    pub text: Option<String>,

    /// Clean the text for narration before speaking it
    #[arg(long)]
    pub clean: bool,

    #[command(flatten)]
    pub playback: PlaybackArgs,
}

/// Options shared by the commands that play speech.
#[derive(Args, Clone)]
pub struct PlaybackArgs {
    /// JSON file with the platform's voice list (defaults to a demo catalogue)
    #[arg(long)]
    pub voices: Option<PathBuf>,

    /// Preferred voice gender ("female" or "male")
    #[arg(short, long)]
    pub gender: Option<Gender>,

    /// Speaking rate (clamped to 0.5-2.0)
    #[arg(long)]
    pub rate: Option<f32>,

    /// Pitch (clamped to 0.5-2.0)
    #[arg(long)]
    pub pitch: Option<f32>,

    /// Volume (clamped to 0-1)
    #[arg(long)]
    pub volume: Option<f32>,

    /// Maximum characters per chunk
    #[arg(long = "max-chars", default_value_t = DEFAULT_MAX_CHUNK_CHARS)]
    pub max_chars: usize,

    /// Make every Nth chunk fail, to watch the queue skip over errors
    #[arg(long = "fail-every")]
    pub fail_every: Option<usize>,

    /// Simulated speaking time per character, in milliseconds
    #[arg(long = "pace-ms", default_value = "20")]
    pub pace_ms: u64,
}
