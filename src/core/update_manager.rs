//! Periodic refresh driver

use super::aggregate::TelemetryAggregate;
use super::constants::MIN_REFRESH_INTERVAL;
use super::snapshot::TelemetrySnapshot;
use anyhow::{Context, Result};
use log::{error, trace};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// Runs `TelemetryAggregate::update` on a fixed interval.
///
/// Each refresh runs on tokio's blocking pool since probes wait on
/// subprocesses for up to several seconds.
pub struct RefreshManager {
    aggregate: Arc<TelemetryAggregate>,
    interval: Duration,
}

impl RefreshManager {
    pub fn new(aggregate: Arc<TelemetryAggregate>, interval: Duration) -> Self {
        Self {
            aggregate,
            interval: interval.max(MIN_REFRESH_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn aggregate(&self) -> &Arc<TelemetryAggregate> {
        &self.aggregate
    }

    /// One refresh off the async executor
    pub async fn refresh_once(&self) -> Result<Arc<TelemetrySnapshot>> {
        let aggregate = Arc::clone(&self.aggregate);
        tokio::task::spawn_blocking(move || aggregate.update())
            .await
            .context("refresh task failed")
    }

    /// Refresh forever; a slow refresh delays the next tick instead of bunching
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let start = Instant::now();
            if let Err(e) = self.refresh_once().await {
                error!("Error refreshing telemetry: {:#}", e);
            }
            trace!("Refresh cycle took {:?}", start.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accel_sens_sources::{ProbeContext, ScriptedRunner};
    use accel_sens_types::{HostPaths, TelemetryConfig};
    use tempfile::TempDir;

    fn aggregate(root: &std::path::Path) -> Arc<TelemetryAggregate> {
        let config = TelemetryConfig {
            paths: HostPaths::with_root(root),
            ..TelemetryConfig::default()
        };
        Arc::new(TelemetryAggregate::with_context(ProbeContext::with_runner(
            config,
            Arc::new(ScriptedRunner::new()),
        )))
    }

    #[test]
    fn test_interval_has_floor() {
        let dir = TempDir::new().unwrap();
        let manager = RefreshManager::new(aggregate(dir.path()), Duration::ZERO);
        assert_eq!(manager.interval(), MIN_REFRESH_INTERVAL);
    }

    #[tokio::test]
    async fn test_refresh_once_publishes_snapshot() {
        let dir = TempDir::new().unwrap();
        let manager = RefreshManager::new(aggregate(dir.path()), Duration::from_secs(2));
        let rx = manager.aggregate().subscribe();

        let snapshot = manager.refresh_once().await.unwrap();
        assert_eq!(snapshot.generation, 1);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_run_refreshes_periodically() {
        let dir = TempDir::new().unwrap();
        let manager = RefreshManager::new(aggregate(dir.path()), Duration::from_millis(100));

        let _ = tokio::time::timeout(Duration::from_millis(450), manager.run()).await;
        assert!(manager.aggregate().snapshot().generation >= 2);
    }
}
