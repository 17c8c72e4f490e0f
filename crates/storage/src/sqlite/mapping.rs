use lingua_core::model::{
    KeywordId, KeywordProgress, LearningMode, LearningSession, RecoverySnapshot, SessionEndReason,
    SessionId, StoryId, ThemeId, UserId,
};
use sqlx::Row;

use crate::repository::{StorageError, StudyLogEntry};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn story_id_from_i64(v: i64) -> Result<StoryId, StorageError> {
    Ok(StoryId::new(i64_to_u64("story_id", v)?))
}

pub(crate) fn theme_id_from_i64(v: i64) -> Result<ThemeId, StorageError> {
    Ok(ThemeId::new(i64_to_u64("theme_id", v)?))
}

pub(crate) fn keyword_id_from_i64(v: i64) -> Result<KeywordId, StorageError> {
    Ok(KeywordId::new(i64_to_u64("keyword_id", v)?))
}

pub(crate) fn session_id_from_str(s: &str) -> Result<SessionId, StorageError> {
    s.parse::<SessionId>().map_err(ser)
}

pub(crate) fn parse_mode(s: &str) -> Result<LearningMode, StorageError> {
    LearningMode::parse(s).ok_or_else(|| StorageError::Serialization(format!("invalid mode: {s}")))
}

pub(crate) fn parse_end_reason(s: &str) -> Result<SessionEndReason, StorageError> {
    SessionEndReason::parse(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid end reason: {s}")))
}

pub(crate) fn map_keyword_row(row: &sqlx::sqlite::SqliteRow) -> Result<KeywordProgress, StorageError> {
    let attempts = u32_from_i64("attempts", row.try_get::<i64, _>("attempts").map_err(ser)?)?;
    let total_time_secs = i64_to_u64(
        "total_time_secs",
        row.try_get::<i64, _>("total_time_secs").map_err(ser)?,
    )?;

    KeywordProgress::from_persisted(
        keyword_id_from_i64(row.try_get::<i64, _>("keyword_id").map_err(ser)?)?,
        story_id_from_i64(row.try_get::<i64, _>("story_id").map_err(ser)?)?,
        row.try_get::<bool, _>("unlocked").map_err(ser)?,
        row.try_get::<bool, _>("mastered").map_err(ser)?,
        row.try_get::<f64, _>("accuracy").map_err(ser)?,
        attempts,
        total_time_secs,
        row.try_get("last_reviewed_at").map_err(ser)?,
        row.try_get("next_review_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_snapshot_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<RecoverySnapshot, StorageError> {
    let session_id: String = row.try_get("session_id").map_err(ser)?;
    let mode: String = row.try_get("mode").map_err(ser)?;

    // A persisted snapshot always refers to a still-active session; end
    // records only exist in the study log.
    let session = LearningSession::from_persisted(
        session_id_from_str(&session_id)?,
        user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        story_id_from_i64(row.try_get::<i64, _>("story_id").map_err(ser)?)?,
        theme_id_from_i64(row.try_get::<i64, _>("theme_id").map_err(ser)?)?,
        parse_mode(&mode)?,
        row.try_get("started_at").map_err(ser)?,
        u32_from_i64("answered", row.try_get::<i64, _>("answered").map_err(ser)?)?,
        u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?,
        None,
    );

    Ok(RecoverySnapshot::from_persisted(
        session,
        row.try_get("saved_at").map_err(ser)?,
        row.try_get::<bool, _>("can_recover").map_err(ser)?,
    ))
}

pub(crate) fn map_study_log_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<StudyLogEntry, StorageError> {
    let session_id: String = row.try_get("session_id").map_err(ser)?;
    let reason: String = row.try_get("reason").map_err(ser)?;

    Ok(StudyLogEntry {
        id: Some(row.try_get("id").map_err(ser)?),
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        session_id: session_id_from_str(&session_id)?,
        story_id: story_id_from_i64(row.try_get::<i64, _>("story_id").map_err(ser)?)?,
        theme_id: theme_id_from_i64(row.try_get::<i64, _>("theme_id").map_err(ser)?)?,
        reason: parse_end_reason(&reason)?,
        started_at: row.try_get("started_at").map_err(ser)?,
        ended_at: row.try_get("ended_at").map_err(ser)?,
        answered: u32_from_i64("answered", row.try_get::<i64, _>("answered").map_err(ser)?)?,
        correct: u32_from_i64("correct", row.try_get::<i64, _>("correct").map_err(ser)?)?,
    })
}
