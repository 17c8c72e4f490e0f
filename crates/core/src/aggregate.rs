//! Progress aggregation: pure recomputation of story, theme, and overall
//! views from flat keyword records.
//!
//! Nothing here fails on valid input. Counts that disagree with the catalog
//! are clamped instead of raised, favoring a degraded-but-rendered view over
//! a crash; negative counts cannot occur by construction (unsigned types).

use std::collections::HashMap;

use crate::model::{
    Catalog, KeywordProgress, OverallProgress, StoryEntry, StoryId, StoryProgress, StoryStatus,
    ThemeId, ThemeProgress,
};

/// Computes the derived view of one story from its keyword records.
///
/// Completed keywords are those unlocked by at least one attempt. The total
/// comes from the catalog entry, widened if more records exist than the
/// catalog claims (stale catalog beats losing data).
#[must_use]
pub fn compute_story_progress(story: &StoryEntry, records: &[KeywordProgress]) -> StoryProgress {
    let records: Vec<&KeywordProgress> = records
        .iter()
        .filter(|r| r.story_id() == story.story_id)
        .collect();

    let record_count = u32::try_from(records.len()).unwrap_or(u32::MAX);
    let total_keywords = story.keyword_count.max(record_count);

    let completed = records.iter().filter(|r| r.is_unlocked()).count();
    let completed_keywords = u32::try_from(completed)
        .unwrap_or(u32::MAX)
        .min(total_keywords);

    let attempted: Vec<&&KeywordProgress> = records.iter().filter(|r| r.attempts() > 0).collect();
    let average_accuracy = if attempted.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let denom = attempted.len() as f64;
        let sum: f64 = attempted.iter().map(|r| r.accuracy()).sum();
        (sum / denom).clamp(0.0, 1.0)
    };

    let status = if total_keywords > 0 && completed_keywords == total_keywords {
        StoryStatus::Completed
    } else if records.is_empty() {
        StoryStatus::NotStarted
    } else {
        StoryStatus::InProgress
    };

    StoryProgress {
        story_id: story.story_id,
        total_keywords,
        completed_keywords,
        status,
        average_accuracy,
    }
}

/// Sums a theme's stories into one view.
///
/// Average accuracy is an unweighted mean of the per-story averages, taken
/// over stories the learner has started. This mirrors the shipped behavior
/// and is deliberately not attempt-weighted.
#[must_use]
pub fn compute_theme_progress(theme_id: ThemeId, stories: &[StoryProgress]) -> ThemeProgress {
    let total_stories = u32::try_from(stories.len()).unwrap_or(u32::MAX);
    let completed = stories
        .iter()
        .filter(|s| s.status == StoryStatus::Completed)
        .count();
    let completed_stories = u32::try_from(completed)
        .unwrap_or(u32::MAX)
        .min(total_stories);

    let keywords_learned = stories
        .iter()
        .fold(0_u32, |acc, s| acc.saturating_add(s.completed_keywords));

    let started: Vec<&StoryProgress> = stories
        .iter()
        .filter(|s| s.status != StoryStatus::NotStarted)
        .collect();
    let average_accuracy = if started.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let denom = started.len() as f64;
        let sum: f64 = started.iter().map(|s| s.average_accuracy).sum();
        (sum / denom).clamp(0.0, 1.0)
    };

    ThemeProgress {
        theme_id,
        total_stories,
        completed_stories,
        keywords_learned,
        average_accuracy,
    }
}

/// Rolls every theme up into the top-level view.
///
/// The display percentage is completed stories over total stories across all
/// themes, rounded to the nearest integer. Zero themes (or zero stories)
/// yields 0%, never an error or NaN.
#[must_use]
pub fn compute_overall_progress(themes: Vec<ThemeProgress>) -> OverallProgress {
    let total_stories = themes
        .iter()
        .fold(0_u32, |acc, t| acc.saturating_add(t.total_stories));
    let completed_stories = themes
        .iter()
        .fold(0_u32, |acc, t| acc.saturating_add(t.completed_stories))
        .min(total_stories);
    let keywords_learned = themes
        .iter()
        .fold(0_u32, |acc, t| acc.saturating_add(t.keywords_learned));

    let active: Vec<&ThemeProgress> = themes.iter().filter(|t| t.keywords_learned > 0).collect();
    let average_accuracy = if active.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let denom = active.len() as f64;
        let sum: f64 = active.iter().map(|t| t.average_accuracy).sum();
        (sum / denom).clamp(0.0, 1.0)
    };

    let percent_complete = if total_stories == 0 {
        0
    } else {
        let pct = f64::from(completed_stories) * 100.0 / f64::from(total_stories);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            pct.round().clamp(0.0, 100.0) as u8
        }
    };

    OverallProgress {
        total_stories,
        completed_stories,
        keywords_learned,
        average_accuracy,
        percent_complete,
        themes,
    }
}

/// Convenience: recompute the whole tree for one learner's records.
#[must_use]
pub fn compute_for_user(catalog: &Catalog, records: &[KeywordProgress]) -> OverallProgress {
    let mut by_story: HashMap<StoryId, Vec<KeywordProgress>> = HashMap::new();
    for record in records {
        by_story
            .entry(record.story_id())
            .or_default()
            .push(record.clone());
    }

    let empty: Vec<KeywordProgress> = Vec::new();
    let themes = catalog
        .themes()
        .iter()
        .map(|theme| {
            let stories: Vec<StoryProgress> = theme
                .stories
                .iter()
                .map(|story| {
                    let story_records = by_story.get(&story.story_id).unwrap_or(&empty);
                    compute_story_progress(story, story_records)
                })
                .collect();
            compute_theme_progress(theme.theme_id, &stories)
        })
        .collect();

    compute_overall_progress(themes)
}
