//! Application services: session lifecycle, progress views, statistics, and
//! the remote sync loop, composed over the storage repositories.

#![forbid(unsafe_code)]

pub mod error;
pub mod events;
pub mod progress;
pub mod sessions;
pub mod stats;
pub mod sync;

pub use error::{ProgressError, SessionError, StatsError, SyncError};
pub use events::{EventSink, LearningEvent, MemoryEventSink, NullEventSink};
pub use progress::{ProgressCache, ProgressService};
pub use sessions::SessionManager;
pub use stats::StatsService;
pub use sync::{HttpRemoteProgress, RemoteConfig, RemoteProgress, SyncCoordinator, SyncTask};
