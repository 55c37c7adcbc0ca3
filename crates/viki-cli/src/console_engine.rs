//! A [`SpeechEngine`] that prints utterances instead of synthesising them.
//!
//! Each utterance "speaks" for a time proportional to its length and rate,
//! so supersession, settling delays and error skipping behave as they do
//! against a real platform engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use viki_voice::{SpeechEngine, Utterance, UtteranceCallbacks};

/// Error text reported for simulated failures.
pub const SIMULATED_FAILURE: &str = "synthesis-failed";

/// Console-backed speech engine.
#[derive(Debug)]
pub struct ConsoleEngine {
    /// Bumped by `cancel_all`; utterances from an older generation go quiet.
    generation: Arc<AtomicU64>,
    enqueued: AtomicUsize,
    fail_every: Option<usize>,
    pace: Duration,
}

impl ConsoleEngine {
    pub fn new(pace: Duration) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            enqueued: AtomicUsize::new(0),
            fail_every: None,
            pace,
        }
    }

    /// Fail every `n`th utterance. `0` disables failures.
    #[must_use]
    pub fn failing_every(mut self, n: usize) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    fn speaking_time(&self, utterance: &Utterance) -> Duration {
        let chars = u32::try_from(utterance.text.chars().count()).unwrap_or(u32::MAX);
        let rate = f64::from(utterance.rate).max(0.1);
        self.pace.mul_f64(f64::from(chars) / rate)
    }
}

impl SpeechEngine for ConsoleEngine {
    fn enqueue_utterance(&self, utterance: Utterance, callbacks: UtteranceCallbacks) {
        let count = self.enqueued.fetch_add(1, Ordering::SeqCst) + 1;
        let fails = self.fail_every.is_some_and(|n| count % n == 0);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            callbacks.failed("no runtime to play on");
            return;
        };

        let generation = Arc::clone(&self.generation);
        let mine = generation.load(Ordering::SeqCst);
        let duration = self.speaking_time(&utterance);

        runtime.spawn(async move {
            if generation.load(Ordering::SeqCst) != mine {
                return;
            }
            if fails {
                tracing::debug!(tag = ?callbacks.tag(), "Simulating synthesis failure");
                callbacks.failed(SIMULATED_FAILURE);
                return;
            }

            callbacks.started();
            let voice = utterance
                .voice
                .as_ref()
                .map_or("engine default", |v| v.name.as_str());
            println!("  🔊 [{} | {voice}] {}", utterance.language, utterance.text);

            tokio::time::sleep(duration).await;
            if generation.load(Ordering::SeqCst) != mine {
                tracing::trace!(tag = ?callbacks.tag(), "Utterance cut off");
                return;
            }
            callbacks.ended();
        });
    }

    fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Console engine cancelled");
    }

    fn pause(&self) {
        tracing::info!("Console engine paused");
    }

    fn resume(&self) {
        tracing::info!("Console engine resumed");
    }
}
