//! Time-ordered reporting over the registry.
//!
//! A report is a snapshot turned into owned records: each group is
//! classified and annotated with its statistics, then emitted in time order.
//! A live sweep additionally evicts what it reported.

pub mod format;

use serde::Serialize;
use tracing::debug;

use crate::detect::sort::{in_time_order, time_order};
use crate::detect::{
    classify, Category, GroupId, GroupRef, Monotonicity, Registry, Thresholds, Timestamp,
};

/// Which view of the registry to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// One block per server, ordered by when the server was first seen.
    ByServer,
    /// Every group, ordered by first event.
    ByGroup,
    /// Groups finished as of `now`, ordered by last event, then evicted.
    LiveSweep { now: Timestamp },
}

/// Structured description of one classified group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub server: String,
    pub group: GroupId,
    pub first_time: Timestamp,
    pub last_time: Timestamp,
    pub duration_secs: f64,
    pub event_count: u32,
    pub out_of_order: u32,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub increasing: u32,
    pub monotonicity: Monotonicity,
    pub category: Category,
    pub label: &'static str,
}

impl GroupReport {
    pub fn new(view: GroupRef<'_>, limits: &Thresholds) -> Self {
        let group = view.group;
        let category = classify(group, limits);
        Self {
            server: view.server.id().to_string(),
            group: group.id(),
            first_time: group.first_time(),
            last_time: group.last_time(),
            duration_secs: group.duration_secs(),
            event_count: group.event_count(),
            out_of_order: group.out_of_order_count(),
            mean: group.mean(),
            std_dev: group.std_dev(),
            min: group.min(),
            max: group.max(),
            increasing: group.increasing_count(),
            monotonicity: group.monotonicity(),
            category,
            label: category.label(),
        }
    }
}

/// One server with all of its groups in creation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerReport {
    pub server: String,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub groups: Vec<GroupReport>,
}

/// Output of [`report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "records", rename_all = "snake_case")]
pub enum Report {
    ByServer(Vec<ServerReport>),
    ByGroup(Vec<GroupReport>),
}

impl Report {
    pub fn len(&self) -> usize {
        match self {
            Report::ByServer(servers) => servers.len(),
            Report::ByGroup(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Group records regardless of layout, in report order.
    pub fn groups(&self) -> Vec<&GroupReport> {
        match self {
            Report::ByServer(servers) => servers.iter().flat_map(|s| s.groups.iter()).collect(),
            Report::ByGroup(groups) => groups.iter().collect(),
        }
    }
}

/// Snapshot, classify, and order the registry contents.
///
/// Only [`ReportMode::LiveSweep`] mutates the registry: it closes groups idle
/// longer than `group_timeout` and evicts every group it returns.
pub fn report(
    registry: &mut Registry,
    mode: ReportMode,
    group_timeout: f64,
    limits: &Thresholds,
) -> Report {
    match mode {
        ReportMode::ByServer => {
            let servers: Vec<_> = registry.servers().collect();
            let keys: Vec<_> = servers.iter().map(|s| (s.first_seen(), s.seq())).collect();
            let records = time_order(&keys)
                .into_iter()
                .map(|i| {
                    let server = servers[i];
                    ServerReport {
                        server: server.id().to_string(),
                        first_seen: server.first_seen(),
                        last_seen: server.last_seen(),
                        groups: server
                            .groups()
                            .iter()
                            .map(|group| GroupReport::new(GroupRef { server, group }, limits))
                            .collect(),
                    }
                })
                .collect();
            Report::ByServer(records)
        }
        ReportMode::ByGroup => {
            let keyed = registry
                .snapshot_groups(None, group_timeout)
                .into_iter()
                .map(|view| {
                    let key = (view.group.first_time(), view.group.id());
                    (key, GroupReport::new(view, limits))
                })
                .collect();
            Report::ByGroup(in_time_order(keyed))
        }
        ReportMode::LiveSweep { now } => {
            let keyed: Vec<_> = registry
                .snapshot_groups(Some(now), group_timeout)
                .into_iter()
                .map(|view| {
                    let key = (view.group.last_time(), view.group.id());
                    (key, (view.key(), GroupReport::new(view, limits)))
                })
                .collect();

            let mut reports = Vec::with_capacity(keyed.len());
            for (key, record) in in_time_order(keyed) {
                registry.evict(&key);
                reports.push(record);
            }
            if !reports.is_empty() {
                debug!(
                    swept = reports.len(),
                    servers_left = registry.len(),
                    "live sweep evicted finished groups"
                );
            }
            Report::ByGroup(reports)
        }
    }
}
