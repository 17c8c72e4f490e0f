#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, KeywordProgressRepository, RecoveryRepository, Storage, StorageError,
    StudyLogEntry, StudyLogRepository,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
