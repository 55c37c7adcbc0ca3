//! Chunked playback queue: per-request bookkeeping and the observable
//! queue state.
//!
//! ```text
//!   Idle → Detecting → Playing(0) → Playing(1) → … → Idle
//!     ▲        │            │                         │
//!     └────────┴── stop / supersede ──────────────────┘
//! ```
//!
//! A [`SpeechRequest`] only records where it is; the orchestrator decides
//! when to move it. Chunks advance strictly in order and a chunk is only
//! ever completed once, whatever the engine reports.

use serde::Serialize;
use viki_core::{LanguageTag, SpeechConfig, VoiceDescriptor};

use crate::engine::{Utterance, UtteranceTag};
use crate::gate::RequestId;

/// Observable state of the playback queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum QueueState {
    #[default]
    Idle,

    /// A request was accepted; language and voice are being chosen.
    Detecting,

    /// The given chunk is playing, or waiting out the settling delay
    /// before it starts.
    Playing { chunk: usize },
}

/// How a chunk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Completed,
    Failed,
}

/// What the orchestrator should do after a chunk completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Play this chunk next, after the settling delay.
    Next(usize),
    /// Every chunk has been attempted.
    Finished,
}

/// One accepted `speak` call.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub id: RequestId,
    pub original_text: String,
    pub detected_language: LanguageTag,
    pub chunks: Vec<String>,
    pub current_chunk_index: usize,

    /// Voice chosen for every chunk; `None` means the engine default.
    pub voice: Option<VoiceDescriptor>,

    /// Settings snapshot taken when the request was accepted.
    pub config: SpeechConfig,

    pub failed_chunks: usize,

    /// Chunk handed to the engine and not yet completed.
    in_flight: Option<usize>,
}

impl SpeechRequest {
    #[must_use]
    pub const fn new(
        id: RequestId,
        original_text: String,
        detected_language: LanguageTag,
        chunks: Vec<String>,
        voice: Option<VoiceDescriptor>,
        config: SpeechConfig,
    ) -> Self {
        Self {
            id,
            original_text,
            detected_language,
            chunks,
            current_chunk_index: 0,
            voice,
            config,
            failed_chunks: 0,
            in_flight: None,
        }
    }

    /// Hand out the utterance for `chunk`, if it is the next one due and
    /// nothing is in flight.
    pub fn begin_chunk(&mut self, chunk: usize) -> Option<(Utterance, UtteranceTag)> {
        if self.in_flight.is_some() || chunk != self.current_chunk_index {
            return None;
        }
        let text = self.chunks.get(chunk)?.clone();
        self.in_flight = Some(chunk);

        let utterance = Utterance {
            text,
            voice: self.voice.clone(),
            language: self.detected_language.clone(),
            rate: self.config.rate,
            pitch: self.config.pitch,
            volume: self.config.volume,
        };
        let tag = UtteranceTag {
            request_id: self.id,
            chunk,
        };
        Some((utterance, tag))
    }

    /// Whether `chunk` is the one currently with the engine.
    #[must_use]
    pub fn is_in_flight(&self, chunk: usize) -> bool {
        self.in_flight == Some(chunk)
    }

    /// Record the end of `chunk`. Returns `None` if it was not in flight
    /// (a duplicate or stray callback).
    pub fn complete_chunk(&mut self, chunk: usize, outcome: ChunkOutcome) -> Option<Step> {
        if !self.is_in_flight(chunk) {
            return None;
        }
        self.in_flight = None;
        if outcome == ChunkOutcome::Failed {
            self.failed_chunks += 1;
        }
        self.current_chunk_index = chunk + 1;

        if self.current_chunk_index < self.chunks.len() {
            Some(Step::Next(self.current_chunk_index))
        } else {
            Some(Step::Finished)
        }
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}
