use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema (keyword progress, recovery snapshots, study log,
/// and indexes).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS keyword_progress (
                    user_id INTEGER NOT NULL,
                    story_id INTEGER NOT NULL,
                    keyword_id INTEGER NOT NULL,
                    unlocked INTEGER NOT NULL,
                    mastered INTEGER NOT NULL,
                    accuracy REAL NOT NULL CHECK (accuracy BETWEEN 0.0 AND 1.0),
                    attempts INTEGER NOT NULL CHECK (attempts >= 0),
                    total_time_secs INTEGER NOT NULL CHECK (total_time_secs >= 0),
                    last_reviewed_at TEXT,
                    next_review_at TEXT,
                    PRIMARY KEY (user_id, story_id, keyword_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS recovery_snapshots (
                    user_id INTEGER PRIMARY KEY,
                    session_id TEXT NOT NULL,
                    story_id INTEGER NOT NULL,
                    theme_id INTEGER NOT NULL,
                    mode TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    answered INTEGER NOT NULL CHECK (answered >= 0),
                    correct INTEGER NOT NULL CHECK (correct >= 0),
                    saved_at TEXT NOT NULL,
                    can_recover INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS study_log (
                    id INTEGER PRIMARY KEY,
                    user_id INTEGER NOT NULL,
                    session_id TEXT NOT NULL,
                    story_id INTEGER NOT NULL,
                    theme_id INTEGER NOT NULL,
                    reason TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    ended_at TEXT NOT NULL,
                    answered INTEGER NOT NULL CHECK (answered >= 0),
                    correct INTEGER NOT NULL CHECK (correct >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_keyword_progress_user_story
                    ON keyword_progress (user_id, story_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_study_log_user_ended
                    ON study_log (user_id, ended_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
