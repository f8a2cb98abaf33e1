use std::sync::Arc;

use crate::clients::tvmaze::TvMazeClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{RefreshService, ShowService, TransferService, WatchService};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// This client should be reused across all HTTP-based services to enable
/// connection pooling and avoid socket exhaustion.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Trackarr/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub tvmaze: Arc<TvMazeClient>,

    pub shows: ShowService,

    pub watching: WatchService,

    pub transfer: TransferService,

    pub refresh: Arc<RefreshService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client =
            build_shared_http_client(config.catalog.request_timeout_seconds.into())?;
        let tvmaze = Arc::new(TvMazeClient::with_shared_client(
            http_client,
            &config.catalog.base_url,
        ));

        let shows = ShowService::new(store.clone(), tvmaze.clone());
        let watching = WatchService::new(store.clone());
        let transfer = TransferService::new(store.clone(), tvmaze.clone());
        let refresh = Arc::new(RefreshService::new(
            store.clone(),
            tvmaze.clone(),
            config.scheduler.refresh_delay_seconds,
        ));

        Ok(Self {
            config,
            store,
            tvmaze,
            shows,
            watching,
            transfer,
            refresh,
        })
    }
}
