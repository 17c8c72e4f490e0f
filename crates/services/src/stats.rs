//! Profile statistics and review selection.

use std::sync::Arc;

use chrono::Duration;

use lingua_core::model::{KeywordProgress, UserId};
use lingua_core::settings::ProgressSettings;
use lingua_core::stats::{
    LearningStats, current_streak, keywords_learned, overall_accuracy, total_time_secs,
};
use lingua_core::time::Clock;
use storage::repository::{KeywordProgressRepository, Storage, StudyLogRepository};

use crate::error::StatsError;

/// Computes the learner's profile numbers and the review due-list.
pub struct StatsService {
    clock: Clock,
    settings: ProgressSettings,
    keywords: Arc<dyn KeywordProgressRepository>,
    study_log: Arc<dyn StudyLogRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(clock: Clock, settings: ProgressSettings, storage: &Storage) -> Self {
        Self {
            clock,
            settings,
            keywords: storage.keywords.clone(),
            study_log: storage.study_log.clone(),
        }
    }

    /// The profile summary: time, keywords, accuracy, streak, and the number
    /// of sessions in the trailing seven days.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if the records or study log cannot be loaded.
    pub async fn learning_stats(&self, user_id: UserId) -> Result<LearningStats, StatsError> {
        let records = self.keywords.list_for_user(user_id).await?;
        let dates = self.study_log.study_dates(user_id).await?;
        let week_ago = self.clock.now() - Duration::days(7);
        let sessions_this_week = self.study_log.count_entries_since(user_id, week_ago).await?;

        Ok(LearningStats {
            total_time_secs: total_time_secs(&records),
            keywords_learned: keywords_learned(&records),
            overall_accuracy: overall_accuracy(&records),
            current_streak: current_streak(&dates, self.clock.today()),
            sessions_this_week,
        })
    }

    /// Keywords due for review, weakest history first: never-reviewed before
    /// oldest-reviewed. Mastery uses the same threshold as accuracy-based
    /// dueness.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if the records cannot be loaded.
    pub async fn keywords_for_review(
        &self,
        user_id: UserId,
    ) -> Result<Vec<KeywordProgress>, StatsError> {
        let now = self.clock.now();
        let mut due: Vec<KeywordProgress> = self
            .keywords
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|r| {
                r.is_due_for_review(
                    now,
                    self.settings.review_window(),
                    self.settings.mastery_threshold(),
                )
            })
            .collect();
        due.sort_by_key(KeywordProgress::last_reviewed_at);
        Ok(due)
    }
}
