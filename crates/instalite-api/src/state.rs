use std::sync::Arc;

use instalite_caption::CaptionService;
use instalite_db::Database;

use crate::rate_limit::RateLimiter;
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub storage: Storage,
    pub captions: CaptionService,
    pub caption_limiter: RateLimiter,
}

impl AppStateInner {
    /// Run a blocking database call off the async runtime.
    pub async fn with_db<F, T>(self: &Arc<Self>, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&state.db))
            .await
            .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
    }
}
