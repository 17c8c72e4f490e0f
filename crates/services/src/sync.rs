//! Periodic remote sync. The server is the source of truth for aggregated
//! progress: a successful fetch overwrites the local cache wholesale, and
//! every failure leaves the cache exactly as it was.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use lingua_core::model::{KeywordProgress, OverallProgress, UserId};

use crate::error::SyncError;
use crate::progress::ProgressCache;

/// Remote endpoint for aggregated progress.
#[async_trait]
pub trait RemoteProgress: Send + Sync {
    /// Fetch the server's aggregated view for one learner.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on transport failures or non-success statuses.
    async fn fetch_user_progress(&self, user_id: UserId) -> Result<OverallProgress, SyncError>;

    /// Push one updated keyword record to the server.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on transport failures or non-success statuses.
    async fn push_keyword_update(
        &self,
        user_id: UserId,
        progress: &KeywordProgress,
    ) -> Result<(), SyncError>;
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

/// Where the progress API lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl RemoteConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Reads `LINGUA_API_BASE_URL` and `LINGUA_API_KEY`; `None` when the
    /// base URL is unset, which disables remote sync entirely.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("LINGUA_API_BASE_URL").ok().map(|base_url| Self {
            base_url,
            api_key: std::env::var("LINGUA_API_KEY").ok(),
        })
    }
}

/// `RemoteProgress` over plain HTTP/JSON.
pub struct HttpRemoteProgress {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl HttpRemoteProgress {
    /// # Errors
    ///
    /// Returns `SyncError` if the HTTP client cannot be constructed.
    pub fn new(config: RemoteConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[async_trait]
impl RemoteProgress for HttpRemoteProgress {
    async fn fetch_user_progress(&self, user_id: UserId) -> Result<OverallProgress, SyncError> {
        let url = format!("{}/users/{}/progress", self.config.base_url, user_id.value());
        let response = self.authorize(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status()));
        }
        Ok(response.json::<OverallProgress>().await?)
    }

    async fn push_keyword_update(
        &self,
        user_id: UserId,
        progress: &KeywordProgress,
    ) -> Result<(), SyncError> {
        let url = format!(
            "{}/users/{}/stories/{}/keywords/{}",
            self.config.base_url,
            user_id.value(),
            progress.story_id().value(),
            progress.keyword_id().value(),
        );
        let response = self.authorize(self.client.put(url)).json(progress).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

//
// ─── COORDINATOR ───────────────────────────────────────────────────────────────
//

/// Drives the fetch-and-overwrite cycle on a fixed interval.
pub struct SyncCoordinator {
    user_id: UserId,
    remote: Arc<dyn RemoteProgress>,
    cache: ProgressCache,
    interval: Duration,
}

impl SyncCoordinator {
    #[must_use]
    pub fn new(
        user_id: UserId,
        remote: Arc<dyn RemoteProgress>,
        cache: ProgressCache,
        interval: Duration,
    ) -> Self {
        Self {
            user_id,
            remote,
            cache,
            interval,
        }
    }

    /// One fetch attempt. Failures are logged and swallowed; the cache is
    /// only touched on success. Returns whether the fetch succeeded.
    pub async fn sync_once(&self) -> bool {
        match self.remote.fetch_user_progress(self.user_id).await {
            Ok(progress) => {
                self.cache.store(progress);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote progress sync failed");
                false
            }
        }
    }

    /// Spawns the periodic loop: one sync immediately, then one per interval.
    #[must_use]
    pub fn spawn(self) -> SyncTask {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick completes immediately, giving the startup sync.
            loop {
                ticker.tick().await;
                self.sync_once().await;
            }
        });
        SyncTask { handle }
    }
}

/// Handle to the running sync loop. Dropping it stops the loop, so shutdown
/// cannot leak the timer.
pub struct SyncTask {
    handle: JoinHandle<()>,
}

impl SyncTask {
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for SyncTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_no_api_key() {
        let config = RemoteConfig::new("https://api.example.test");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn overall_progress_deserializes_from_api_shape() {
        let body = serde_json::json!({
            "total_stories": 4,
            "completed_stories": 1,
            "keywords_learned": 9,
            "average_accuracy": 0.75,
            "percent_complete": 25,
            "themes": []
        });
        let progress: OverallProgress = serde_json::from_value(body).unwrap();
        assert_eq!(progress.percent_complete, 25);
        assert_eq!(progress.keywords_learned, 9);
    }
}
