use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::session::LearningSession;

/// Point-in-time copy of the active session, written on every mutation.
///
/// The snapshot is the only evidence of an interrupted session: if the app
/// dies without `end_session`, the next startup finds a snapshot with
/// `can_recover = true` and no matching end record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySnapshot {
    session: LearningSession,
    saved_at: DateTime<Utc>,
    can_recover: bool,
}

impl RecoverySnapshot {
    /// Captures the current session state.
    #[must_use]
    pub fn capture(session: &LearningSession, saved_at: DateTime<Utc>) -> Self {
        Self {
            session: session.clone(),
            saved_at,
            can_recover: true,
        }
    }

    /// Rehydrates a snapshot from storage.
    #[must_use]
    pub fn from_persisted(
        session: LearningSession,
        saved_at: DateTime<Utc>,
        can_recover: bool,
    ) -> Self {
        Self {
            session,
            saved_at,
            can_recover,
        }
    }

    #[must_use]
    pub fn session(&self) -> &LearningSession {
        &self.session
    }

    #[must_use]
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    #[must_use]
    pub fn can_recover(&self) -> bool {
        self.can_recover
    }

    /// Marks the snapshot consumed so it is never offered again.
    pub fn invalidate(&mut self) {
        self.can_recover = false;
    }

    /// True when the snapshot is older than the staleness window.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.saved_at) > window
    }
}

/// Startup classification of whatever snapshot storage holds.
///
/// Computed once when the app mounts, instead of sprinkling
/// presence/staleness checks through the call sites.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryState {
    /// No snapshot, or one already consumed.
    None,
    /// A fresh snapshot the learner may resume.
    Resumable(RecoverySnapshot),
    /// A snapshot past the staleness window; only good for discarding.
    Expired(RecoverySnapshot),
}

impl RecoveryState {
    /// Classifies a loaded snapshot against the staleness window.
    #[must_use]
    pub fn classify(
        snapshot: Option<RecoverySnapshot>,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Self {
        match snapshot {
            None => RecoveryState::None,
            Some(snap) if !snap.can_recover() => RecoveryState::None,
            Some(snap) if snap.is_stale(now, window) => RecoveryState::Expired(snap),
            Some(snap) => RecoveryState::Resumable(snap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LearningMode, StoryId, ThemeId, UserId};
    use crate::time::fixed_now;

    fn snapshot_saved_at(saved_at: DateTime<Utc>) -> RecoverySnapshot {
        let session = LearningSession::start(
            UserId::new(1),
            StoryId::new(3),
            ThemeId::new(1),
            LearningMode::Story,
            saved_at,
        );
        RecoverySnapshot::capture(&session, saved_at)
    }

    #[test]
    fn fresh_snapshot_is_resumable() {
        let snap = snapshot_saved_at(fixed_now() - Duration::hours(1));
        let state = RecoveryState::classify(Some(snap.clone()), fixed_now(), Duration::hours(24));
        assert_eq!(state, RecoveryState::Resumable(snap));
    }

    #[test]
    fn stale_snapshot_is_expired() {
        let snap = snapshot_saved_at(fixed_now() - Duration::hours(25));
        let state = RecoveryState::classify(Some(snap.clone()), fixed_now(), Duration::hours(24));
        assert_eq!(state, RecoveryState::Expired(snap));
    }

    #[test]
    fn consumed_snapshot_classifies_as_none() {
        let mut snap = snapshot_saved_at(fixed_now());
        snap.invalidate();
        let state = RecoveryState::classify(Some(snap), fixed_now(), Duration::hours(24));
        assert_eq!(state, RecoveryState::None);
    }

    #[test]
    fn missing_snapshot_classifies_as_none() {
        let state = RecoveryState::classify(None, fixed_now(), Duration::hours(24));
        assert_eq!(state, RecoveryState::None);
    }
}
