use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{KeywordId, StoryId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum KeywordProgressError {
    #[error("accuracy {0} is outside [0, 1]")]
    AccuracyOutOfRange(f64),

    #[error("unlocked keyword has no recorded attempts")]
    UnlockedWithoutAttempts,

    #[error("keyword with attempts has no last-reviewed timestamp")]
    MissingLastReviewed,
}

//
// ─── ATTEMPT OUTCOME ───────────────────────────────────────────────────────────
//

/// What a single recorded attempt changed, for callers that emit events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptOutcome {
    pub accuracy: f64,
    pub newly_mastered: bool,
}

//
// ─── KEYWORD PROGRESS ──────────────────────────────────────────────────────────
//

/// Per-learner progress on a single keyword of a story.
///
/// Records are created lazily on the first attempt and never deleted.
/// Accuracy is the arithmetic mean of the boolean correctness of every
/// attempt so far; `mastered` tracks whether that mean currently sits at or
/// above the mastery threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordProgress {
    keyword_id: KeywordId,
    story_id: StoryId,
    unlocked: bool,
    mastered: bool,
    accuracy: f64,
    attempts: u32,
    total_time_secs: u64,
    last_reviewed_at: Option<DateTime<Utc>>,
    next_review_at: Option<DateTime<Utc>>,
}

impl KeywordProgress {
    /// Creates a fresh record for a keyword the learner has never attempted.
    #[must_use]
    pub fn new(keyword_id: KeywordId, story_id: StoryId) -> Self {
        Self {
            keyword_id,
            story_id,
            unlocked: false,
            mastered: false,
            accuracy: 0.0,
            attempts: 0,
            total_time_secs: 0,
            last_reviewed_at: None,
            next_review_at: None,
        }
    }

    /// Rehydrates a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `KeywordProgressError` if accuracy leaves [0, 1], or the
    /// unlocked/attempt/timestamp fields disagree with each other.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        keyword_id: KeywordId,
        story_id: StoryId,
        unlocked: bool,
        mastered: bool,
        accuracy: f64,
        attempts: u32,
        total_time_secs: u64,
        last_reviewed_at: Option<DateTime<Utc>>,
        next_review_at: Option<DateTime<Utc>>,
    ) -> Result<Self, KeywordProgressError> {
        if !(0.0..=1.0).contains(&accuracy) {
            return Err(KeywordProgressError::AccuracyOutOfRange(accuracy));
        }
        if unlocked && attempts == 0 {
            return Err(KeywordProgressError::UnlockedWithoutAttempts);
        }
        if attempts > 0 && last_reviewed_at.is_none() {
            return Err(KeywordProgressError::MissingLastReviewed);
        }

        Ok(Self {
            keyword_id,
            story_id,
            unlocked,
            mastered,
            accuracy,
            attempts,
            total_time_secs,
            last_reviewed_at,
            next_review_at,
        })
    }

    /// Folds one answer into the running state.
    ///
    /// The running average is arithmetic over all attempts:
    /// `(accuracy * attempts + correct) / (attempts + 1)`. The first attempt
    /// unlocks the keyword; mastery is recomputed against `mastery_threshold`
    /// on every attempt, so exactly hitting the threshold masters.
    pub fn record_attempt(
        &mut self,
        is_correct: bool,
        time_spent_secs: u32,
        now: DateTime<Utc>,
        mastery_threshold: f64,
        review_window: Duration,
    ) -> AttemptOutcome {
        let correct = if is_correct { 1.0 } else { 0.0 };
        let attempts = f64::from(self.attempts);
        let accuracy = (self.accuracy * attempts + correct) / (attempts + 1.0);

        self.accuracy = accuracy.clamp(0.0, 1.0);
        self.attempts = self.attempts.saturating_add(1);
        self.total_time_secs = self.total_time_secs.saturating_add(u64::from(time_spent_secs));
        self.unlocked = true;
        self.last_reviewed_at = Some(now);
        self.next_review_at = Some(now + review_window);

        let was_mastered = self.mastered;
        self.mastered = self.accuracy >= mastery_threshold;

        AttemptOutcome {
            accuracy: self.accuracy,
            newly_mastered: self.mastered && !was_mastered,
        }
    }

    /// True when this keyword should appear in the review due-list.
    ///
    /// A keyword is due when it is unlocked but not mastered and either has
    /// not been reviewed within the review window or its accuracy sits below
    /// the threshold. Mastered keywords are never due.
    #[must_use]
    pub fn is_due_for_review(
        &self,
        now: DateTime<Utc>,
        review_window: Duration,
        accuracy_threshold: f64,
    ) -> bool {
        if !self.unlocked || self.mastered {
            return false;
        }
        let stale = match self.last_reviewed_at {
            Some(at) => now.signed_duration_since(at) > review_window,
            None => true,
        };
        stale || self.accuracy < accuracy_threshold
    }

    #[must_use]
    pub fn keyword_id(&self) -> KeywordId {
        self.keyword_id
    }

    #[must_use]
    pub fn story_id(&self) -> StoryId {
        self.story_id
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    #[must_use]
    pub fn is_mastered(&self) -> bool {
        self.mastered
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn total_time_secs(&self) -> u64 {
        self.total_time_secs
    }

    #[must_use]
    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at
    }

    #[must_use]
    pub fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.next_review_at
    }
}
