use lingua_core::model::{KeywordId, KeywordProgress, StoryId, UserId};

use super::{
    SqliteRepository,
    mapping::{id_i64, map_keyword_row},
};
use crate::repository::{KeywordProgressRepository, StorageError};

#[async_trait::async_trait]
impl KeywordProgressRepository for SqliteRepository {
    async fn upsert_keyword(
        &self,
        user_id: UserId,
        progress: &KeywordProgress,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO keyword_progress (
                user_id, story_id, keyword_id, unlocked, mastered, accuracy,
                attempts, total_time_secs, last_reviewed_at, next_review_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(user_id, story_id, keyword_id) DO UPDATE SET
                unlocked = excluded.unlocked,
                mastered = excluded.mastered,
                accuracy = excluded.accuracy,
                attempts = excluded.attempts,
                total_time_secs = excluded.total_time_secs,
                last_reviewed_at = excluded.last_reviewed_at,
                next_review_at = excluded.next_review_at
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("story_id", progress.story_id().value())?)
        .bind(id_i64("keyword_id", progress.keyword_id().value())?)
        .bind(progress.is_unlocked())
        .bind(progress.is_mastered())
        .bind(progress.accuracy())
        .bind(i64::from(progress.attempts()))
        .bind(id_i64("total_time_secs", progress.total_time_secs())?)
        .bind(progress.last_reviewed_at())
        .bind(progress.next_review_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_keyword(
        &self,
        user_id: UserId,
        story_id: StoryId,
        keyword_id: KeywordId,
    ) -> Result<Option<KeywordProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                story_id, keyword_id, unlocked, mastered, accuracy,
                attempts, total_time_secs, last_reviewed_at, next_review_at
            FROM keyword_progress
            WHERE user_id = ?1 AND story_id = ?2 AND keyword_id = ?3
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("story_id", story_id.value())?)
        .bind(id_i64("keyword_id", keyword_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_keyword_row).transpose()
    }

    async fn list_for_story(
        &self,
        user_id: UserId,
        story_id: StoryId,
    ) -> Result<Vec<KeywordProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                story_id, keyword_id, unlocked, mastered, accuracy,
                attempts, total_time_secs, last_reviewed_at, next_review_at
            FROM keyword_progress
            WHERE user_id = ?1 AND story_id = ?2
            ORDER BY keyword_id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("story_id", story_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_keyword_row(&row)?);
        }
        Ok(records)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<KeywordProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                story_id, keyword_id, unlocked, mastered, accuracy,
                attempts, total_time_secs, last_reviewed_at, next_review_at
            FROM keyword_progress
            WHERE user_id = ?1
            ORDER BY story_id ASC, keyword_id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_keyword_row(&row)?);
        }
        Ok(records)
    }
}
