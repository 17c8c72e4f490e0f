//! Streak and summary statistics derived from study history.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{KeywordProgress, StoryId};

/// Summary numbers shown on the learner's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_time_secs: u64,
    pub keywords_learned: u32,
    pub overall_accuracy: f64,
    pub current_streak: u32,
    pub sessions_this_week: u32,
}

/// Counts consecutive study days ending at (or just before) `today`.
///
/// The current day gets grace: a learner who studied yesterday but not yet
/// today still holds the streak. Only a full missed calendar day breaks it.
/// Duplicate dates are tolerated; order does not matter.
#[must_use]
pub fn current_streak(study_dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = study_dates.to_vec();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let yesterday = today - Duration::days(1);
    let mut expected = match dates.first() {
        Some(&d) if d == today => today,
        Some(&d) if d == yesterday => yesterday,
        _ => return 0,
    };

    let mut streak = 0_u32;
    for date in dates {
        if date == expected {
            streak += 1;
            expected -= Duration::days(1);
        } else if date < expected {
            break;
        }
    }
    streak
}

/// Overall accuracy with the same policy as the aggregator: per-story means
/// first, then an unweighted mean across stories with any attempts.
#[must_use]
pub fn overall_accuracy(records: &[KeywordProgress]) -> f64 {
    let mut by_story: HashMap<StoryId, (f64, u32)> = HashMap::new();
    for record in records.iter().filter(|r| r.attempts() > 0) {
        let entry = by_story.entry(record.story_id()).or_insert((0.0, 0));
        entry.0 += record.accuracy();
        entry.1 += 1;
    }

    if by_story.is_empty() {
        return 0.0;
    }

    let sum: f64 = by_story
        .values()
        .map(|(total, count)| total / f64::from(*count))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let denom = by_story.len() as f64;
    (sum / denom).clamp(0.0, 1.0)
}

/// Total seconds the learner has spent across all keywords.
#[must_use]
pub fn total_time_secs(records: &[KeywordProgress]) -> u64 {
    records
        .iter()
        .fold(0_u64, |acc, r| acc.saturating_add(r.total_time_secs()))
}

/// Number of keywords the learner has unlocked.
#[must_use]
pub fn keywords_learned(records: &[KeywordProgress]) -> u32 {
    let count = records.iter().filter(|r| r.is_unlocked()).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
