use lingua_core::model::{RecoverySnapshot, UserId};

use super::{
    SqliteRepository,
    mapping::{id_i64, map_snapshot_row},
};
use crate::repository::{RecoveryRepository, StorageError};

#[async_trait::async_trait]
impl RecoveryRepository for SqliteRepository {
    async fn save_snapshot(&self, snapshot: &RecoverySnapshot) -> Result<(), StorageError> {
        let session = snapshot.session();
        sqlx::query(
            r"
            INSERT INTO recovery_snapshots (
                user_id, session_id, story_id, theme_id, mode,
                started_at, answered, correct, saved_at, can_recover
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(user_id) DO UPDATE SET
                session_id = excluded.session_id,
                story_id = excluded.story_id,
                theme_id = excluded.theme_id,
                mode = excluded.mode,
                started_at = excluded.started_at,
                answered = excluded.answered,
                correct = excluded.correct,
                saved_at = excluded.saved_at,
                can_recover = excluded.can_recover
            ",
        )
        .bind(id_i64("user_id", session.user_id().value())?)
        .bind(session.id().to_string())
        .bind(id_i64("story_id", session.story_id().value())?)
        .bind(id_i64("theme_id", session.theme_id().value())?)
        .bind(session.mode().as_str())
        .bind(session.started_at())
        .bind(i64::from(session.answered()))
        .bind(i64::from(session.correct()))
        .bind(snapshot.saved_at())
        .bind(snapshot.can_recover())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn load_snapshot(
        &self,
        user_id: UserId,
    ) -> Result<Option<RecoverySnapshot>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                user_id, session_id, story_id, theme_id, mode,
                started_at, answered, correct, saved_at, can_recover
            FROM recovery_snapshots
            WHERE user_id = ?1
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_snapshot_row).transpose()
    }

    async fn clear_snapshot(&self, user_id: UserId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM recovery_snapshots WHERE user_id = ?1")
            .bind(id_i64("user_id", user_id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
