use chrono::Duration;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressSettingsError {
    #[error("mastery threshold must be in (0, 1]")]
    InvalidMasteryThreshold,

    #[error("review window must be > 0 days")]
    InvalidReviewWindow,

    #[error("recovery window must be > 0 hours")]
    InvalidRecoveryWindow,

    #[error("sync interval must be > 0 seconds")]
    InvalidSyncInterval,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunable knobs for progress tracking, shared by sessions, stats and sync.
///
/// Defaults match the shipped product behavior: a keyword is mastered at
/// 80% running accuracy, keywords fall due for review after 7 days, a
/// recovery snapshot goes stale after 24 hours, and the sync loop ticks
/// every 60 seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSettings {
    mastery_threshold: f64,
    review_window_days: u32,
    recovery_window_hours: u32,
    sync_interval_secs: u32,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            mastery_threshold: 0.8,
            review_window_days: 7,
            recovery_window_hours: 24,
            sync_interval_secs: 60,
        }
    }
}

impl ProgressSettings {
    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the mastery threshold leaves (0, 1] or any window
    /// is zero.
    pub fn new(
        mastery_threshold: f64,
        review_window_days: u32,
        recovery_window_hours: u32,
        sync_interval_secs: u32,
    ) -> Result<Self, ProgressSettingsError> {
        if !(mastery_threshold > 0.0 && mastery_threshold <= 1.0) {
            return Err(ProgressSettingsError::InvalidMasteryThreshold);
        }
        if review_window_days == 0 {
            return Err(ProgressSettingsError::InvalidReviewWindow);
        }
        if recovery_window_hours == 0 {
            return Err(ProgressSettingsError::InvalidRecoveryWindow);
        }
        if sync_interval_secs == 0 {
            return Err(ProgressSettingsError::InvalidSyncInterval);
        }
        Ok(Self {
            mastery_threshold,
            review_window_days,
            recovery_window_hours,
            sync_interval_secs,
        })
    }

    /// Accuracy at or above which a keyword counts as mastered.
    #[must_use]
    pub fn mastery_threshold(&self) -> f64 {
        self.mastery_threshold
    }

    /// How long a keyword may go unreviewed before it falls due again.
    #[must_use]
    pub fn review_window(&self) -> Duration {
        Duration::days(i64::from(self.review_window_days))
    }

    /// How long a recovery snapshot stays resumable.
    #[must_use]
    pub fn recovery_window(&self) -> Duration {
        Duration::hours(i64::from(self.recovery_window_hours))
    }

    /// Period of the background sync loop.
    #[must_use]
    pub fn sync_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.sync_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_behavior() {
        let settings = ProgressSettings::default();
        assert!((settings.mastery_threshold() - 0.8).abs() < f64::EPSILON);
        assert_eq!(settings.review_window(), Duration::days(7));
        assert_eq!(settings.recovery_window(), Duration::hours(24));
        assert_eq!(settings.sync_interval().as_secs(), 60);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert_eq!(
            ProgressSettings::new(0.0, 7, 24, 60).unwrap_err(),
            ProgressSettingsError::InvalidMasteryThreshold
        );
        assert_eq!(
            ProgressSettings::new(1.5, 7, 24, 60).unwrap_err(),
            ProgressSettingsError::InvalidMasteryThreshold
        );
    }

    #[test]
    fn rejects_zero_windows() {
        assert_eq!(
            ProgressSettings::new(0.8, 0, 24, 60).unwrap_err(),
            ProgressSettingsError::InvalidReviewWindow
        );
        assert_eq!(
            ProgressSettings::new(0.8, 7, 0, 60).unwrap_err(),
            ProgressSettingsError::InvalidRecoveryWindow
        );
        assert_eq!(
            ProgressSettings::new(0.8, 7, 24, 0).unwrap_err(),
            ProgressSettingsError::InvalidSyncInterval
        );
    }
}
