use std::sync::Arc;

use lingua_core::model::{
    AttemptOutcome, KeywordId, KeywordProgress, LearningMode, LearningSession, RecoverySnapshot,
    RecoveryState, SessionEndReason, SessionId, StoryId, ThemeId, UserId,
};
use lingua_core::settings::ProgressSettings;
use lingua_core::time::Clock;
use storage::repository::{
    KeywordProgressRepository, RecoveryRepository, Storage, StudyLogEntry, StudyLogRepository,
};

use crate::error::SessionError;
use crate::events::{EventSink, LearningEvent};
use crate::progress::ProgressCache;
use crate::sync::RemoteProgress;

/// Owns the single active session and everything that must happen around it:
/// snapshot writes, keyword updates, study-log entries, events, and the
/// best-effort remote push.
///
/// At most one session is active per manager; starting a second one is a
/// conflict. The manager is single-owner state, not shared — wrap it in the
/// caller's own synchronization if it must cross tasks.
pub struct SessionManager {
    clock: Clock,
    settings: ProgressSettings,
    keywords: Arc<dyn KeywordProgressRepository>,
    recovery: Arc<dyn RecoveryRepository>,
    study_log: Arc<dyn StudyLogRepository>,
    events: Arc<dyn EventSink>,
    cache: ProgressCache,
    remote: Option<Arc<dyn RemoteProgress>>,
    active: Option<LearningSession>,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: ProgressSettings,
        storage: &Storage,
        cache: ProgressCache,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            clock,
            settings,
            keywords: storage.keywords.clone(),
            recovery: storage.recovery.clone(),
            study_log: storage.study_log.clone(),
            events,
            cache,
            remote: None,
            active: None,
        }
    }

    /// Attaches a remote endpoint for the per-answer push. Without one, the
    /// manager works fully offline.
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteProgress>) -> Self {
        self.remote = Some(remote);
        self
    }

    #[must_use]
    pub fn active_session(&self) -> Option<&LearningSession> {
        self.active.as_ref()
    }

    /// Starts a new session and writes its first recovery snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyActive` if a session is already running,
    /// or a storage error if the snapshot cannot be written.
    pub async fn start_session(
        &mut self,
        user_id: UserId,
        story_id: StoryId,
        theme_id: ThemeId,
        mode: LearningMode,
    ) -> Result<LearningSession, SessionError> {
        if self.active.as_ref().is_some_and(LearningSession::is_active) {
            return Err(SessionError::AlreadyActive);
        }

        let now = self.clock.now();
        let session = LearningSession::start(user_id, story_id, theme_id, mode, now);
        self.recovery
            .save_snapshot(&RecoverySnapshot::capture(&session, now))
            .await?;

        self.events.emit(LearningEvent::SessionStarted {
            session_id: session.id(),
            user_id,
            story_id,
            mode,
        });
        tracing::info!(session_id = %session.id(), mode = mode.as_str(), "session started");

        self.active = Some(session.clone());
        Ok(session)
    }

    /// Folds one answer into keyword progress and the session tally.
    ///
    /// Persists the keyword record, rewrites the recovery snapshot, emits a
    /// mastery event when the threshold is crossed, and pushes the update to
    /// the remote when one is attached. A failed push is logged and ignored;
    /// learning never blocks on the network.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSession` when `session_id` does not name
    /// the active session, or a storage error if persistence fails.
    pub async fn record_answer(
        &mut self,
        session_id: SessionId,
        keyword_id: KeywordId,
        is_correct: bool,
        time_spent_secs: u32,
    ) -> Result<AttemptOutcome, SessionError> {
        let now = self.clock.now();
        let (user_id, story_id) = match self.active.as_ref() {
            Some(s) if s.id() == session_id && s.is_active() => (s.user_id(), s.story_id()),
            _ => return Err(SessionError::UnknownSession(session_id)),
        };

        let mut progress = self
            .keywords
            .get_keyword(user_id, story_id, keyword_id)
            .await?
            .unwrap_or_else(|| KeywordProgress::new(keyword_id, story_id));
        let outcome = progress.record_attempt(
            is_correct,
            time_spent_secs,
            now,
            self.settings.mastery_threshold(),
            self.settings.review_window(),
        );
        self.keywords.upsert_keyword(user_id, &progress).await?;

        if let Some(session) = self.active.as_mut() {
            session.note_answer(is_correct);
            self.recovery
                .save_snapshot(&RecoverySnapshot::capture(session, now))
                .await?;
        }

        if outcome.newly_mastered {
            self.events.emit(LearningEvent::KeywordMastered {
                user_id,
                story_id,
                keyword_id,
            });
        }

        if let Some(remote) = &self.remote {
            if let Err(err) = remote.push_keyword_update(user_id, &progress).await {
                tracing::warn!(error = %err, keyword_id = %keyword_id, "keyword push failed");
            }
        }

        self.cache.invalidate();
        Ok(outcome)
    }

    /// Ends the active session: records the study-log entry, clears the
    /// recovery snapshot, and emits the end event.
    ///
    /// Ending an unknown or already-ended session is a no-op, so a double
    /// tap on "finish" cannot fail or double-log.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the log entry or snapshot write fails.
    pub async fn end_session(
        &mut self,
        session_id: SessionId,
        reason: SessionEndReason,
    ) -> Result<(), SessionError> {
        let now = self.clock.now();
        let Some(session) = self.active.as_mut() else {
            return Ok(());
        };
        if session.id() != session_id || !session.end(reason, now) {
            return Ok(());
        }

        let entry = StudyLogEntry {
            id: None,
            user_id: session.user_id(),
            session_id: session.id(),
            story_id: session.story_id(),
            theme_id: session.theme_id(),
            reason,
            started_at: session.started_at(),
            ended_at: now,
            answered: session.answered(),
            correct: session.correct(),
        };
        self.study_log.append_entry(&entry).await?;
        self.recovery.clear_snapshot(entry.user_id).await?;

        self.events.emit(LearningEvent::SessionEnded {
            session_id,
            user_id: entry.user_id,
            reason,
        });
        tracing::info!(session_id = %session_id, reason = reason.as_str(), "session ended");

        self.cache.invalidate();
        self.active = None;
        Ok(())
    }

    /// Classifies whatever snapshot storage holds for this learner.
    ///
    /// Called once at startup, before any session starts. A snapshot past the
    /// recovery window comes back as `Expired` so the caller can show a
    /// "session lost" notice and then discard it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be loaded.
    pub async fn recovery_state(&self, user_id: UserId) -> Result<RecoveryState, SessionError> {
        let snapshot = self.recovery.load_snapshot(user_id).await?;
        Ok(RecoveryState::classify(
            snapshot,
            self.clock.now(),
            self.settings.recovery_window(),
        ))
    }

    /// Resumes an interrupted session from its snapshot, keeping the original
    /// session ID and tallies.
    ///
    /// # Errors
    ///
    /// Returns `RecoveryExpired` for stale or consumed snapshots,
    /// `AlreadyActive` if a session is running, or a storage error if the
    /// refreshed snapshot cannot be written.
    pub async fn recover_session(
        &mut self,
        snapshot: RecoverySnapshot,
    ) -> Result<LearningSession, SessionError> {
        if self.active.as_ref().is_some_and(LearningSession::is_active) {
            return Err(SessionError::AlreadyActive);
        }
        let now = self.clock.now();
        if !snapshot.can_recover() || snapshot.is_stale(now, self.settings.recovery_window()) {
            return Err(SessionError::RecoveryExpired);
        }

        let session = snapshot.session().clone();
        // Refresh the snapshot so the resumed session restarts its window.
        self.recovery
            .save_snapshot(&RecoverySnapshot::capture(&session, now))
            .await?;
        tracing::info!(session_id = %session.id(), "session recovered");

        self.active = Some(session.clone());
        Ok(session)
    }

    /// Discards the learner's snapshot without resuming.
    ///
    /// A still-recoverable snapshot gets an `Interrupted` study-log entry
    /// first, so the abandoned sitting still counts toward streaks.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the log entry or snapshot delete fails.
    pub async fn discard_recovery(&mut self, user_id: UserId) -> Result<(), SessionError> {
        if let Some(snapshot) = self.recovery.load_snapshot(user_id).await? {
            if snapshot.can_recover() {
                let session = snapshot.session();
                let entry = StudyLogEntry {
                    id: None,
                    user_id,
                    session_id: session.id(),
                    story_id: session.story_id(),
                    theme_id: session.theme_id(),
                    reason: SessionEndReason::Interrupted,
                    started_at: session.started_at(),
                    ended_at: self.clock.now(),
                    answered: session.answered(),
                    correct: session.correct(),
                };
                self.study_log.append_entry(&entry).await?;
            }
        }
        self.recovery.clear_snapshot(user_id).await?;
        Ok(())
    }
}
