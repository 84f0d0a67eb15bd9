// Background cache refresh task.
// Re-fetches the full page sequence every `cache_duration`, keeping the
// last good snapshot when an attempt fails.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;

use crate::changelog::Changelog;

/// Spawn the periodic refresh task. A zero duration disables
/// refreshing: the cache then serves its startup snapshot forever.
pub fn spawn(changelog: Arc<Changelog>, cache_duration: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        if cache_duration.is_zero() {
            tracing::warn!("CACHE_DURATION is 0, periodic refresh disabled");
            return;
        }

        let mut interval = time::interval(cache_duration);
        // The first tick fires immediately; the cache was just built.
        interval.tick().await;

        loop {
            interval.tick().await;
            match changelog.refresh().await {
                Ok(()) => tracing::info!("changelog cache refreshed"),
                Err(e) => tracing::error!("changelog refresh failed, keeping cached pages: {}", e),
            }
        }
    })
}
