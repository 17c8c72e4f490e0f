use thiserror::Error;

use lingua_core::model::{KeywordProgressError, SessionId};
use storage::repository::StorageError;

/// Errors surfaced by the session manager.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("a learning session is already active")]
    AlreadyActive,

    #[error("recovery snapshot has expired")]
    RecoveryExpired,

    #[error("no active session with id {0}")]
    UnknownSession(SessionId),

    #[error(transparent)]
    Progress(#[from] KeywordProgressError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors surfaced by the progress service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors surfaced by the stats service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors surfaced when talking to the remote progress endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("remote returned status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
