//! The registry behind its single exclusive lock.
//!
//! Ingestion and the periodic sweep share one [`BeaconMonitor`]. Each
//! operation takes the lock for a memory-only critical section: one event
//! for ingestion, a full snapshot/classify/evict cycle for a report. Callers
//! render and print after the lock has been released.

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::MonitorConfig;
use crate::detect::{Registry, Timestamp};
use crate::report::{self, Report, ReportMode};

pub struct BeaconMonitor {
    registry: Mutex<Registry>,
    config: MonitorConfig,
}

impl BeaconMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Fold one beacon event into the registry.
    pub async fn record_event(&self, server: &str, time: Timestamp) {
        let mut registry = self.registry.lock().await;
        registry.record_event(server, time, self.config.grouping.group_timeout_secs);
    }

    /// Produce a report. The lock is held for the whole cycle, so a live
    /// sweep never observes a half-applied event and evicts exactly what it
    /// returned.
    pub async fn report(&self, mode: ReportMode) -> Report {
        let mut registry = self.registry.lock().await;
        let out = report::report(
            &mut registry,
            mode,
            self.config.grouping.group_timeout_secs,
            &self.config.thresholds,
        );
        debug!(?mode, records = out.len(), "report built");
        out
    }

    pub async fn server_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    pub async fn group_count(&self) -> usize {
        self.registry.lock().await.group_count()
    }
}
