//! Domain events emitted by the session manager, so callers (UI, analytics)
//! can react without the manager knowing who is listening.

use std::sync::{Arc, Mutex};

use lingua_core::model::{KeywordId, LearningMode, SessionEndReason, SessionId, StoryId, UserId};

/// Something noteworthy that happened during learning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningEvent {
    SessionStarted {
        session_id: SessionId,
        user_id: UserId,
        story_id: StoryId,
        mode: LearningMode,
    },
    SessionEnded {
        session_id: SessionId,
        user_id: UserId,
        reason: SessionEndReason,
    },
    /// The learner's accuracy on a keyword crossed the mastery threshold.
    KeywordMastered {
        user_id: UserId,
        story_id: StoryId,
        keyword_id: KeywordId,
    },
}

/// Receiver for learning events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LearningEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: LearningEvent) {}
}

/// Sink that records events in memory; used by tests and prototypes.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    events: Arc<Mutex<Vec<LearningEvent>>>,
}

impl MemoryEventSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event emitted so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<LearningEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, event: LearningEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
