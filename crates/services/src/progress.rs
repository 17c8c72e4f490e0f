//! Read-side progress views, recomputed from flat keyword records and cached
//! until the next write or remote sync overwrites them.

use std::sync::{Arc, Mutex};

use lingua_core::aggregate::{
    compute_for_user, compute_story_progress, compute_theme_progress,
};
use lingua_core::model::{
    Catalog, OverallProgress, StoryEntry, StoryId, StoryProgress, ThemeId, ThemeProgress, UserId,
};
use storage::repository::KeywordProgressRepository;

use crate::error::ProgressError;

/// Shared cache of the last computed (or synced) overall view.
///
/// One slot, one learner: the app runs with a single signed-in user, so the
/// cache does not key by user. Writers invalidate it; the periodic sync
/// overwrites it with the server's copy.
#[derive(Clone, Default)]
pub struct ProgressCache {
    inner: Arc<Mutex<Option<OverallProgress>>>,
}

impl ProgressCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<OverallProgress> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn store(&self, progress: OverallProgress) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(progress);
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = None;
        }
    }
}

/// Serves story, theme, and overall progress views.
pub struct ProgressService {
    catalog: Arc<Catalog>,
    keywords: Arc<dyn KeywordProgressRepository>,
    cache: ProgressCache,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        keywords: Arc<dyn KeywordProgressRepository>,
        cache: ProgressCache,
    ) -> Self {
        Self {
            catalog,
            keywords,
            cache,
        }
    }

    /// Derived view of one story.
    ///
    /// A story the catalog does not know is treated as having zero planned
    /// keywords; the aggregator then sizes it from whatever records exist.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the records cannot be loaded.
    pub async fn story_progress(
        &self,
        user_id: UserId,
        story_id: StoryId,
    ) -> Result<StoryProgress, ProgressError> {
        let records = self.keywords.list_for_story(user_id, story_id).await?;
        let entry = self.catalog.story(story_id).cloned().unwrap_or(StoryEntry {
            story_id,
            keyword_count: 0,
        });
        Ok(compute_story_progress(&entry, &records))
    }

    /// Derived view of one theme, summed over its catalog stories.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the records cannot be loaded.
    pub async fn theme_progress(
        &self,
        user_id: UserId,
        theme_id: ThemeId,
    ) -> Result<ThemeProgress, ProgressError> {
        let records = self.keywords.list_for_user(user_id).await?;
        let stories: Vec<StoryProgress> = self
            .catalog
            .theme(theme_id)
            .map(|theme| theme.stories.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|entry| compute_story_progress(entry, &records))
            .collect();
        Ok(compute_theme_progress(theme_id, &stories))
    }

    /// The top-level view, served from cache when present.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if a recompute is needed and the records
    /// cannot be loaded.
    pub async fn overall_progress(&self, user_id: UserId) -> Result<OverallProgress, ProgressError> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }
        self.refresh_overall(user_id).await
    }

    /// Recomputes the top-level view from storage, ignoring the cache, and
    /// stores the result.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the records cannot be loaded.
    pub async fn refresh_overall(&self, user_id: UserId) -> Result<OverallProgress, ProgressError> {
        let records = self.keywords.list_for_user(user_id).await?;
        let progress = compute_for_user(&self.catalog, &records);
        self.cache.store(progress.clone());
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_core::model::{KeywordId, KeywordProgress, ThemeEntry};
    use lingua_core::settings::ProgressSettings;
    use lingua_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn build_catalog() -> Arc<Catalog> {
        Arc::new(Catalog::new(vec![ThemeEntry {
            theme_id: ThemeId::new(1),
            stories: vec![
                StoryEntry {
                    story_id: StoryId::new(10),
                    keyword_count: 2,
                },
                StoryEntry {
                    story_id: StoryId::new(11),
                    keyword_count: 3,
                },
            ],
        }]))
    }

    async fn seed_attempts(repo: &InMemoryRepository, story: u64, keyword: u64, answers: &[bool]) {
        let settings = ProgressSettings::default();
        let mut progress = KeywordProgress::new(KeywordId::new(keyword), StoryId::new(story));
        for &correct in answers {
            progress.record_attempt(
                correct,
                3,
                fixed_now(),
                settings.mastery_threshold(),
                settings.review_window(),
            );
        }
        repo.upsert_keyword(UserId::new(1), &progress).await.unwrap();
    }

    fn service(repo: &InMemoryRepository) -> ProgressService {
        ProgressService::new(
            build_catalog(),
            Arc::new(repo.clone()),
            ProgressCache::new(),
        )
    }

    #[tokio::test]
    async fn story_view_uses_catalog_denominator() {
        let repo = InMemoryRepository::new();
        seed_attempts(&repo, 10, 1, &[true]).await;

        let view = service(&repo)
            .story_progress(UserId::new(1), StoryId::new(10))
            .await
            .unwrap();
        assert_eq!(view.total_keywords, 2);
        assert_eq!(view.completed_keywords, 1);
    }

    #[tokio::test]
    async fn overall_view_is_cached_until_invalidated() {
        let repo = InMemoryRepository::new();
        seed_attempts(&repo, 10, 1, &[true]).await;
        let svc = service(&repo);

        let first = svc.overall_progress(UserId::new(1)).await.unwrap();
        assert_eq!(first.keywords_learned, 1);

        // New write lands but the cache still serves the old view.
        seed_attempts(&repo, 10, 2, &[true]).await;
        let stale = svc.overall_progress(UserId::new(1)).await.unwrap();
        assert_eq!(stale.keywords_learned, 1);

        svc.cache.invalidate();
        let fresh = svc.overall_progress(UserId::new(1)).await.unwrap();
        assert_eq!(fresh.keywords_learned, 2);
    }

    #[tokio::test]
    async fn unknown_story_renders_from_records_alone() {
        let repo = InMemoryRepository::new();
        seed_attempts(&repo, 99, 1, &[true]).await;

        let view = service(&repo)
            .story_progress(UserId::new(1), StoryId::new(99))
            .await
            .unwrap();
        assert_eq!(view.total_keywords, 1);
    }
}
