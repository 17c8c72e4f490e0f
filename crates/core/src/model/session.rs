use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{SessionId, StoryId, ThemeId, UserId};

//
// ─── MODE & END REASON ─────────────────────────────────────────────────────────
//

/// What kind of practice a session delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
    /// Working through a story's keywords in order.
    Story,
    /// Revisiting keywords that fell due for review.
    Review,
    /// Listening-comprehension pass over already-seen material.
    Listening,
}

impl LearningMode {
    /// Storage representation; must stay consistent with `parse`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningMode::Story => "story",
            LearningMode::Review => "review",
            LearningMode::Listening => "listening",
        }
    }

    /// Parses the storage representation back into a mode.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "story" => Some(LearningMode::Story),
            "review" => Some(LearningMode::Review),
            "listening" => Some(LearningMode::Listening),
            _ => None,
        }
    }
}

/// Why a session stopped being active.
///
/// `Interrupted` is never chosen by a live session; it is assigned at the
/// next startup when a resumable snapshot is found and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    Completed,
    UserExit,
    Interrupted,
}

impl SessionEndReason {
    /// Storage representation; must stay consistent with `parse`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEndReason::Completed => "completed",
            SessionEndReason::UserExit => "user_exit",
            SessionEndReason::Interrupted => "interrupted",
        }
    }

    /// Parses the storage representation back into a reason.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(SessionEndReason::Completed),
            "user_exit" => Some(SessionEndReason::UserExit),
            "interrupted" => Some(SessionEndReason::Interrupted),
            _ => None,
        }
    }
}

/// Terminal state of a session: why and when it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnd {
    pub reason: SessionEndReason,
    pub at: DateTime<Utc>,
}

//
// ─── LEARNING SESSION ──────────────────────────────────────────────────────────
//

/// One sitting of practice on a story.
///
/// At most one session is active per learner at any time; the session
/// manager enforces that. A session only tallies how the sitting went —
/// per-keyword state lives in `KeywordProgress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSession {
    id: SessionId,
    user_id: UserId,
    story_id: StoryId,
    theme_id: ThemeId,
    mode: LearningMode,
    started_at: DateTime<Utc>,
    answered: u32,
    correct: u32,
    end: Option<SessionEnd>,
}

impl LearningSession {
    /// Starts a new session with a freshly minted ID.
    #[must_use]
    pub fn start(
        user_id: UserId,
        story_id: StoryId,
        theme_id: ThemeId,
        mode: LearningMode,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            user_id,
            story_id,
            theme_id,
            mode,
            started_at,
            answered: 0,
            correct: 0,
            end: None,
        }
    }

    /// Rehydrates a session from a recovery snapshot or storage row.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        story_id: StoryId,
        theme_id: ThemeId,
        mode: LearningMode,
        started_at: DateTime<Utc>,
        answered: u32,
        correct: u32,
        end: Option<SessionEnd>,
    ) -> Self {
        Self {
            id,
            user_id,
            story_id,
            theme_id,
            mode,
            started_at,
            answered,
            correct,
            end,
        }
    }

    /// Tallies one answered keyword.
    pub fn note_answer(&mut self, is_correct: bool) {
        self.answered = self.answered.saturating_add(1);
        if is_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Marks the session ended. Returns false if it had already ended —
    /// ending twice is a no-op, not an error.
    pub fn end(&mut self, reason: SessionEndReason, at: DateTime<Utc>) -> bool {
        if self.end.is_some() {
            return false;
        }
        self.end = Some(SessionEnd { reason, at });
        true
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn story_id(&self) -> StoryId {
        self.story_id
    }

    #[must_use]
    pub fn theme_id(&self) -> ThemeId {
        self.theme_id
    }

    #[must_use]
    pub fn mode(&self) -> LearningMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn answered(&self) -> u32 {
        self.answered
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn session_end(&self) -> Option<SessionEnd> {
        self.end
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    /// Share of answers in this sitting that were correct; 0 before any answer.
    #[must_use]
    pub fn session_accuracy(&self) -> f64 {
        if self.answered == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.answered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build_session() -> LearningSession {
        LearningSession::start(
            UserId::new(1),
            StoryId::new(10),
            ThemeId::new(2),
            LearningMode::Story,
            fixed_now(),
        )
    }

    #[test]
    fn new_session_is_active_and_empty() {
        let session = build_session();
        assert!(session.is_active());
        assert_eq!(session.answered(), 0);
        assert_eq!(session.session_accuracy(), 0.0);
    }

    #[test]
    fn answers_accumulate() {
        let mut session = build_session();
        session.note_answer(true);
        session.note_answer(false);
        session.note_answer(true);
        assert_eq!(session.answered(), 3);
        assert_eq!(session.correct(), 2);
        assert!((session.session_accuracy() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn ending_twice_is_a_no_op() {
        let mut session = build_session();
        assert!(session.end(SessionEndReason::Completed, fixed_now()));
        assert!(!session.end(SessionEndReason::UserExit, fixed_now()));

        let end = session.session_end().unwrap();
        assert_eq!(end.reason, SessionEndReason::Completed);
        assert!(!session.is_active());
    }

    #[test]
    fn mode_and_reason_roundtrip_storage_form() {
        for mode in [
            LearningMode::Story,
            LearningMode::Review,
            LearningMode::Listening,
        ] {
            assert_eq!(LearningMode::parse(mode.as_str()), Some(mode));
        }
        for reason in [
            SessionEndReason::Completed,
            SessionEndReason::UserExit,
            SessionEndReason::Interrupted,
        ] {
            assert_eq!(SessionEndReason::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(LearningMode::parse("karaoke"), None);
    }
}
