use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::state::SharedState;

/// Drives the periodic catalog refresh. The refresh service itself is
/// single-flight, so an overlapping tick (or a manual trigger racing the
/// schedule) is dropped there, never queued.
pub struct Scheduler {
    state: Arc<SharedState>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(state: Arc<SharedState>, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                if let Err(e) = state.refresh.refresh_all().await {
                    error!("Scheduled catalog refresh failed: {}", e);
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.refresh_interval_minutes;

        info!("Scheduler refreshing every {} minutes", interval_mins);

        let mut refresh_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));
        // The first tick fires immediately; skip it so startup isn't a
        // surprise full catalog pass.
        refresh_interval.tick().await;

        loop {
            refresh_interval.tick().await;
            if !*self.running.read().await {
                break;
            }
            info!("Running scheduled catalog refresh...");
            if let Err(e) = self.state.refresh.refresh_all().await {
                error!("Scheduled catalog refresh failed: {}", e);
            }
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self) -> Result<()> {
        info!("Running manual catalog refresh...");

        match self.state.refresh.refresh_all().await? {
            Some(stats) => info!(
                "Refresh complete: {} refreshed, {} failed",
                stats.refreshed, stats.failed
            ),
            None => info!("A refresh pass was already running; trigger dropped"),
        }

        Ok(())
    }
}
