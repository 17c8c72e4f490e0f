use serde::{Deserialize, Serialize};

use crate::model::ids::{StoryId, ThemeId};

/// One story and the number of keywords it teaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryEntry {
    pub story_id: StoryId,
    pub keyword_count: u32,
}

/// One theme and the stories that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeEntry {
    pub theme_id: ThemeId,
    pub stories: Vec<StoryEntry>,
}

/// Static shape of the learning content: themes, their stories, and keyword
/// counts.
///
/// Keyword progress records are created lazily on first attempt, so the
/// aggregator needs the catalog for its denominators. The catalog is
/// read-only here; authoring lives elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    themes: Vec<ThemeEntry>,
}

impl Catalog {
    #[must_use]
    pub fn new(themes: Vec<ThemeEntry>) -> Self {
        Self { themes }
    }

    #[must_use]
    pub fn themes(&self) -> &[ThemeEntry] {
        &self.themes
    }

    #[must_use]
    pub fn theme(&self, theme_id: ThemeId) -> Option<&ThemeEntry> {
        self.themes.iter().find(|t| t.theme_id == theme_id)
    }

    #[must_use]
    pub fn story(&self, story_id: StoryId) -> Option<&StoryEntry> {
        self.themes
            .iter()
            .flat_map(|t| t.stories.iter())
            .find(|s| s.story_id == story_id)
    }

    /// The theme a story belongs to, if the story is in the catalog.
    #[must_use]
    pub fn theme_of_story(&self, story_id: StoryId) -> Option<ThemeId> {
        self.themes
            .iter()
            .find(|t| t.stories.iter().any(|s| s.story_id == story_id))
            .map(|t| t.theme_id)
    }

    #[must_use]
    pub fn total_stories(&self) -> u32 {
        let count = self.themes.iter().map(|t| t.stories.len()).sum::<usize>();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
