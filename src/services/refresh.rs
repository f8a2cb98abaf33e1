use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::clients::tvmaze::TvMazeClient;
use crate::db::Store;

#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshStats {
    pub refreshed: usize,
    pub failed: usize,
}

/// Background catalog refresh. At most one pass runs at a time: a trigger
/// arriving mid-pass is dropped, not queued.
pub struct RefreshService {
    store: Store,
    tvmaze: Arc<TvMazeClient>,
    in_flight: AtomicBool,
    delay_seconds: u32,
}

struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl RefreshService {
    #[must_use]
    pub fn new(store: Store, tvmaze: Arc<TvMazeClient>, delay_seconds: u32) -> Self {
        Self {
            store,
            tvmaze,
            in_flight: AtomicBool::new(false),
            delay_seconds,
        }
    }

    /// Re-fetch metadata for every show the catalog has not ended. Returns
    /// `None` when another pass was already running.
    pub async fn refresh_all(&self) -> Result<Option<RefreshStats>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Catalog refresh already in progress, dropping trigger");
            return Ok(None);
        }
        let _guard = FlightGuard(&self.in_flight);

        let shows = self.store.list_refreshable_shows().await?;
        info!("Refreshing catalog metadata for {} shows", shows.len());

        let mut stats = RefreshStats::default();

        for show in shows {
            match self.refresh_show(show.id).await {
                Ok(true) => stats.refreshed += 1,
                Ok(false) => {
                    warn!("Show {} ({}) vanished from catalog", show.name, show.id);
                    stats.failed += 1;
                }
                Err(e) => {
                    // One show's failure never aborts the pass; the next
                    // scheduled run retries it.
                    warn!("Failed to refresh {} ({}): {}", show.name, show.id, e);
                    stats.failed += 1;
                }
            }

            if self.delay_seconds > 0 {
                tokio::time::sleep(std::time::Duration::from_secs(u64::from(
                    self.delay_seconds,
                )))
                .await;
            }
        }

        info!(
            "Catalog refresh complete: {} refreshed, {} failed",
            stats.refreshed, stats.failed
        );
        Ok(Some(stats))
    }

    async fn refresh_show(&self, show_id: i32) -> Result<bool> {
        let Some((show, episodes)) = self.tvmaze.get_show_with_episodes(show_id).await? else {
            return Ok(false);
        };

        self.store.upsert_show(&show).await?;
        self.store.upsert_episodes(&episodes).await?;
        Ok(true)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}
