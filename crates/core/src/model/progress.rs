use serde::{Deserialize, Serialize};

use crate::model::ids::{StoryId, ThemeId};

/// Where a story sits in the learner's journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Derived view of one story: keyword counts and status.
///
/// Recomputed from the flat keyword records on demand; never persisted as
/// authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryProgress {
    pub story_id: StoryId,
    pub total_keywords: u32,
    pub completed_keywords: u32,
    pub status: StoryStatus,
    pub average_accuracy: f64,
}

/// Derived view of one theme: story counts and an unweighted accuracy mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeProgress {
    pub theme_id: ThemeId,
    pub total_stories: u32,
    pub completed_stories: u32,
    pub keywords_learned: u32,
    pub average_accuracy: f64,
}

/// Top-level derived view owning the denominator for the global percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallProgress {
    pub total_stories: u32,
    pub completed_stories: u32,
    pub keywords_learned: u32,
    pub average_accuracy: f64,
    /// Display percentage, rounded to the nearest integer; 0 when no themes.
    pub percent_complete: u8,
    pub themes: Vec<ThemeProgress>,
}

impl OverallProgress {
    /// An empty view, used before any sync or local computation has run.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_stories: 0,
            completed_stories: 0,
            keywords_learned: 0,
            average_accuracy: 0.0,
            percent_complete: 0,
            themes: Vec::new(),
        }
    }
}
