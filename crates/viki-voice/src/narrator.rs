//! Automatic narration of assistant replies.
//!
//! Each new assistant message is cleaned and spoken once, after a short
//! settling delay. A user message interrupts any narration in progress.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::orchestrator::SpeechOrchestrator;
use crate::text_utils::clean_for_speech;

/// Delay between a reply arriving and narration starting.
pub const NARRATION_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A chat message as seen by the narrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
}

/// What the narrator did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationDecision {
    /// Cleaned text will be spoken after the settling delay.
    Scheduled(String),
    /// Already spoken.
    Duplicate,
    /// Nothing speakable left after cleaning.
    Empty,
    /// A user message; current speech was stopped.
    StoppedForUser,
}

/// Speaks assistant replies exactly once.
pub struct AutoNarrator {
    orchestrator: SpeechOrchestrator,
    delay: Duration,
    last_spoken: Option<String>,
    /// Bumped to cancel a pending delayed `speak`.
    epoch: Arc<AtomicU64>,
}

impl AutoNarrator {
    #[must_use]
    pub fn new(orchestrator: SpeechOrchestrator) -> Self {
        Self::with_delay(orchestrator, NARRATION_DELAY)
    }

    #[must_use]
    pub fn with_delay(orchestrator: SpeechOrchestrator, delay: Duration) -> Self {
        Self {
            orchestrator,
            delay,
            last_spoken: None,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// React to a message appended to the conversation.
    pub fn on_message(&mut self, message: &ChatMessage) -> NarrationDecision {
        if message.role == MessageRole::User {
            self.cancel_pending();
            self.orchestrator.stop();
            return NarrationDecision::StoppedForUser;
        }

        if self.last_spoken.as_deref() == Some(message.id.as_str()) {
            return NarrationDecision::Duplicate;
        }

        let text = clean_for_speech(&message.content);
        if text.is_empty() {
            tracing::debug!(message_id = %message.id, "Nothing to narrate");
            return NarrationDecision::Empty;
        }

        self.orchestrator.stop();
        self.last_spoken = Some(message.id.clone());
        let epoch = self.cancel_pending();

        let orchestrator = self.orchestrator.clone();
        let current = Arc::clone(&self.epoch);
        let delay = self.delay;
        let spoken = text.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if current.load(Ordering::SeqCst) == epoch {
                orchestrator.speak(spoken);
            }
        });

        tracing::debug!(
            message_id = %message.id,
            chars = text.chars().count(),
            "Narration scheduled"
        );
        NarrationDecision::Scheduled(text)
    }

    /// Forget the conversation, e.g. when it is cleared.
    pub fn clear(&mut self) {
        self.last_spoken = None;
        self.cancel_pending();
    }

    #[must_use]
    pub fn last_spoken(&self) -> Option<&str> {
        self.last_spoken.as_deref()
    }

    /// Invalidate any pending narration and return the new epoch.
    fn cancel_pending(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }
}
