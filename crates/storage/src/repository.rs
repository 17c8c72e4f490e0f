use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use lingua_core::model::{
    KeywordId, KeywordProgress, RecoverySnapshot, SessionEndReason, SessionId, StoryId, ThemeId,
    UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// One finished (or abandoned) session, appended on end for streak and
/// weekly-activity stats.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyLogEntry {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub story_id: StoryId,
    pub theme_id: ThemeId,
    pub reason: SessionEndReason,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub answered: u32,
    pub correct: u32,
}

/// Repository contract for per-keyword progress records.
///
/// Records are keyed by (user, story, keyword), created lazily on first
/// attempt, and never deleted.
#[async_trait]
pub trait KeywordProgressRepository: Send + Sync {
    /// Persist or update one keyword record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_keyword(
        &self,
        user_id: UserId,
        progress: &KeywordProgress,
    ) -> Result<(), StorageError>;

    /// Fetch one keyword record; `None` means the learner never attempted it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_keyword(
        &self,
        user_id: UserId,
        story_id: StoryId,
        keyword_id: KeywordId,
    ) -> Result<Option<KeywordProgress>, StorageError>;

    /// All records for one story.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_for_story(
        &self,
        user_id: UserId,
        story_id: StoryId,
    ) -> Result<Vec<KeywordProgress>, StorageError>;

    /// Every record the learner has, across all stories.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<KeywordProgress>, StorageError>;
}

/// Repository contract for the single per-user recovery snapshot.
#[async_trait]
pub trait RecoveryRepository: Send + Sync {
    /// Overwrite the learner's snapshot; called on every session mutation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(&self, snapshot: &RecoverySnapshot) -> Result<(), StorageError>;

    /// Load the learner's snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn load_snapshot(
        &self,
        user_id: UserId,
    ) -> Result<Option<RecoverySnapshot>, StorageError>;

    /// Remove the learner's snapshot. Clearing an absent snapshot is fine.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures.
    async fn clear_snapshot(&self, user_id: UserId) -> Result<(), StorageError>;
}

/// Repository contract for the append-only study log.
#[async_trait]
pub trait StudyLogRepository: Send + Sync {
    /// Append one finished session; returns the assigned row ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_entry(&self, entry: &StudyLogEntry) -> Result<i64, StorageError>;

    /// Distinct calendar days with at least one logged session, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn study_dates(&self, user_id: UserId) -> Result<Vec<NaiveDate>, StorageError>;

    /// Number of logged sessions ending at or after `from`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures.
    async fn count_entries_since(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> Result<u32, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    keywords: Arc<Mutex<HashMap<(UserId, StoryId, KeywordId), KeywordProgress>>>,
    snapshots: Arc<Mutex<HashMap<UserId, RecoverySnapshot>>>,
    study_log: Arc<Mutex<Vec<StudyLogEntry>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeywordProgressRepository for InMemoryRepository {
    async fn upsert_keyword(
        &self,
        user_id: UserId,
        progress: &KeywordProgress,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .keywords
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            (user_id, progress.story_id(), progress.keyword_id()),
            progress.clone(),
        );
        Ok(())
    }

    async fn get_keyword(
        &self,
        user_id: UserId,
        story_id: StoryId,
        keyword_id: KeywordId,
    ) -> Result<Option<KeywordProgress>, StorageError> {
        let guard = self
            .keywords
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(user_id, story_id, keyword_id)).cloned())
    }

    async fn list_for_story(
        &self,
        user_id: UserId,
        story_id: StoryId,
    ) -> Result<Vec<KeywordProgress>, StorageError> {
        let guard = self
            .keywords
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<KeywordProgress> = guard
            .iter()
            .filter(|((user, story, _), _)| *user == user_id && *story == story_id)
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by_key(KeywordProgress::keyword_id);
        Ok(records)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<KeywordProgress>, StorageError> {
        let guard = self
            .keywords
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<KeywordProgress> = guard
            .iter()
            .filter(|((user, _, _), _)| *user == user_id)
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by_key(|r| (r.story_id(), r.keyword_id()));
        Ok(records)
    }
}

#[async_trait]
impl RecoveryRepository for InMemoryRepository {
    async fn save_snapshot(&self, snapshot: &RecoverySnapshot) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(snapshot.session().user_id(), snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(
        &self,
        user_id: UserId,
    ) -> Result<Option<RecoverySnapshot>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&user_id).cloned())
    }

    async fn clear_snapshot(&self, user_id: UserId) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl StudyLogRepository for InMemoryRepository {
    async fn append_entry(&self, entry: &StudyLogEntry) -> Result<i64, StorageError> {
        let mut guard = self
            .study_log
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("study log overflow".into()))?
            + 1;
        let mut stored = entry.clone();
        stored.id = Some(id);
        guard.push(stored);
        Ok(id)
    }

    async fn study_dates(&self, user_id: UserId) -> Result<Vec<NaiveDate>, StorageError> {
        let guard = self
            .study_log
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut dates: Vec<NaiveDate> = guard
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.ended_at.date_naive())
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        Ok(dates)
    }

    async fn count_entries_since(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let guard = self
            .study_log
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let count = guard
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.ended_at >= from)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

/// Aggregates the three repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub keywords: Arc<dyn KeywordProgressRepository>,
    pub recovery: Arc<dyn RecoveryRepository>,
    pub study_log: Arc<dyn StudyLogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let keywords: Arc<dyn KeywordProgressRepository> = Arc::new(repo.clone());
        let recovery: Arc<dyn RecoveryRepository> = Arc::new(repo.clone());
        let study_log: Arc<dyn StudyLogRepository> = Arc::new(repo);
        Self {
            keywords,
            recovery,
            study_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lingua_core::model::{LearningMode, LearningSession};
    use lingua_core::settings::ProgressSettings;
    use lingua_core::time::fixed_now;

    fn attempted(user: u64, story: u64, keyword: u64) -> (UserId, KeywordProgress) {
        let settings = ProgressSettings::default();
        let mut progress = KeywordProgress::new(KeywordId::new(keyword), StoryId::new(story));
        progress.record_attempt(
            true,
            4,
            fixed_now(),
            settings.mastery_threshold(),
            settings.review_window(),
        );
        (UserId::new(user), progress)
    }

    #[tokio::test]
    async fn keyword_records_round_trip() {
        let repo = InMemoryRepository::new();
        let (user, progress) = attempted(1, 10, 7);
        repo.upsert_keyword(user, &progress).await.unwrap();

        let fetched = repo
            .get_keyword(user, StoryId::new(10), KeywordId::new(7))
            .await
            .unwrap()
            .expect("record should exist");
        assert_eq!(fetched, progress);

        let absent = repo
            .get_keyword(user, StoryId::new(10), KeywordId::new(8))
            .await
            .unwrap();
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn listings_are_scoped_to_user_and_story() {
        let repo = InMemoryRepository::new();
        for (user, story, keyword) in [(1, 10, 1), (1, 10, 2), (1, 11, 3), (2, 10, 4)] {
            let (user, progress) = attempted(user, story, keyword);
            repo.upsert_keyword(user, &progress).await.unwrap();
        }

        let story = repo
            .list_for_story(UserId::new(1), StoryId::new(10))
            .await
            .unwrap();
        assert_eq!(story.len(), 2);

        let all = repo.list_for_user(UserId::new(1)).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn snapshot_save_load_clear() {
        let repo = InMemoryRepository::new();
        let session = LearningSession::start(
            UserId::new(1),
            StoryId::new(10),
            ThemeId::new(1),
            LearningMode::Story,
            fixed_now(),
        );
        let snapshot = RecoverySnapshot::capture(&session, fixed_now());

        repo.save_snapshot(&snapshot).await.unwrap();
        let loaded = repo.load_snapshot(UserId::new(1)).await.unwrap();
        assert_eq!(loaded, Some(snapshot));

        repo.clear_snapshot(UserId::new(1)).await.unwrap();
        assert!(repo.load_snapshot(UserId::new(1)).await.unwrap().is_none());
        // Clearing again is not an error.
        repo.clear_snapshot(UserId::new(1)).await.unwrap();
    }

    #[tokio::test]
    async fn study_log_dates_are_distinct_and_newest_first() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        for days_ago in [0_i64, 0, 1, 3] {
            let ended_at = fixed_now() - Duration::days(days_ago);
            let entry = StudyLogEntry {
                id: None,
                user_id: user,
                session_id: SessionId::generate(),
                story_id: StoryId::new(10),
                theme_id: ThemeId::new(1),
                reason: SessionEndReason::Completed,
                started_at: ended_at - Duration::minutes(5),
                ended_at,
                answered: 5,
                correct: 4,
            };
            repo.append_entry(&entry).await.unwrap();
        }

        let dates = repo.study_dates(user).await.unwrap();
        assert_eq!(dates.len(), 3);
        assert!(dates[0] > dates[1] && dates[1] > dates[2]);

        let this_week = repo
            .count_entries_since(user, fixed_now() - Duration::days(2))
            .await
            .unwrap();
        assert_eq!(this_week, 3);
    }
}
