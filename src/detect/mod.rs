//! Beacon anomaly grouping, statistics, and classification.
//!
//! Events are folded into per-server runs ([`AnomalyGroup`]) held by a
//! [`ServerRecord`]; the [`Registry`] owns every record and is the single
//! mutation point for ingestion and sweeps.

pub mod classify;
pub mod group;
pub mod registry;
pub mod server;
pub mod sort;

pub use self::classify::{classify, Category, Thresholds};
pub use self::group::{AnomalyGroup, GroupId, Monotonicity};
pub use self::registry::{GroupKey, GroupRef, Registry};
pub use self::server::ServerRecord;

/// Wall-clock instant of a beacon event.
///
/// Watcher logs carry no zone information, so times are kept naive and
/// compared as written.
pub type Timestamp = chrono::NaiveDateTime;

/// Signed seconds from `earlier` to `later`, with nanosecond resolution.
pub fn elapsed_secs(later: Timestamp, earlier: Timestamp) -> f64 {
    let delta = later - earlier;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        // Only reachable for gaps of roughly 292 years.
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::Timestamp;
    use chrono::{Duration, NaiveDate};

    /// A fixed epoch plus `secs` seconds; fractional seconds are honored.
    pub fn at(secs: f64) -> Timestamp {
        let base = NaiveDate::from_ymd_opt(2004, 5, 18)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        base + Duration::nanoseconds((secs * 1e9).round() as i64)
    }
}
