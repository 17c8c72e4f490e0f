use chrono::{DateTime, NaiveDate, Utc};
use lingua_core::model::UserId;
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{id_i64, ser},
};
use crate::repository::{StorageError, StudyLogEntry, StudyLogRepository};

#[async_trait::async_trait]
impl StudyLogRepository for SqliteRepository {
    async fn append_entry(&self, entry: &StudyLogEntry) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO study_log (
                user_id, session_id, story_id, theme_id, reason,
                started_at, ended_at, answered, correct
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(id_i64("user_id", entry.user_id.value())?)
        .bind(entry.session_id.to_string())
        .bind(id_i64("story_id", entry.story_id.value())?)
        .bind(id_i64("theme_id", entry.theme_id.value())?)
        .bind(entry.reason.as_str())
        .bind(entry.started_at)
        .bind(entry.ended_at)
        .bind(i64::from(entry.answered))
        .bind(i64::from(entry.correct))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn study_dates(&self, user_id: UserId) -> Result<Vec<NaiveDate>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT date(ended_at) AS study_date
            FROM study_log
            WHERE user_id = ?1
            ORDER BY study_date DESC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut dates = Vec::with_capacity(rows.len());
        for row in rows {
            let text: String = row.try_get("study_date").map_err(ser)?;
            let date = text
                .parse::<NaiveDate>()
                .map_err(|e| StorageError::Serialization(format!("invalid study_date: {e}")))?;
            dates.push(date);
        }
        Ok(dates)
    }

    async fn count_entries_since(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS entry_count
            FROM study_log
            WHERE user_id = ?1 AND ended_at >= ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(from)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let count: i64 = row.try_get("entry_count").map_err(ser)?;
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization(format!("invalid entry_count: {count}")))
    }
}
