pub mod catalog;
pub mod ids;
pub mod keyword;
pub mod progress;
pub mod recovery;
pub mod session;

pub use catalog::{Catalog, StoryEntry, ThemeEntry};
pub use ids::{KeywordId, ParseIdError, SessionId, StoryId, ThemeId, UserId};
pub use keyword::{AttemptOutcome, KeywordProgress, KeywordProgressError};
pub use progress::{OverallProgress, StoryProgress, StoryStatus, ThemeProgress};
pub use recovery::{RecoverySnapshot, RecoveryState};
pub use session::{LearningMode, LearningSession, SessionEnd, SessionEndReason};
