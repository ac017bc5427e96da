use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{elapsed_secs, Timestamp};

/// Registry-unique identity of a group.
///
/// Ids are handed out in creation order, so they double as a tie-breaker
/// when two groups share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupId(pub u64);

/// Trend of the interval sequence within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Monotonicity {
    /// No non-zero interval seen yet.
    None,
    MonotonicIncreasing,
    MonotonicDecreasing,
    /// Once here, a group never becomes monotonic again.
    Mixed,
}

/// One contiguous run of beacon events for a single server.
#[derive(Debug, Clone)]
pub struct AnomalyGroup {
    id: GroupId,
    first_time: Timestamp,
    last_time: Timestamp,
    interval_count: u32,
    sum: f64,
    sum_squares: f64,
    max: f64,
    min: f64,
    last_interval: f64,
    increasing_count: u32,
    monotonicity: Monotonicity,
    out_of_order_count: u32,
    finished: bool,
}

impl AnomalyGroup {
    /// Start a group with a single event at `time`.
    pub fn new(id: GroupId, time: Timestamp) -> Self {
        Self {
            id,
            first_time: time,
            last_time: time,
            interval_count: 0,
            sum: 0.0,
            sum_squares: 0.0,
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
            last_interval: 0.0,
            increasing_count: 0,
            monotonicity: Monotonicity::None,
            out_of_order_count: 0,
            finished: false,
        }
    }

    /// Fold one more event into the running statistics.
    ///
    /// A timestamp earlier than the previous event is accepted and counted
    /// as out of order.
    pub fn update(&mut self, time: Timestamp) {
        let delta = elapsed_secs(time, self.last_time);
        self.last_time = time;

        self.interval_count += 1;
        self.sum += delta;
        self.sum_squares += delta * delta;

        if delta > self.last_interval {
            self.increasing_count += 1;
        }

        // Compares against max/min from before this sample.
        self.monotonicity = match self.monotonicity {
            Monotonicity::None if delta > 0.0 => Monotonicity::MonotonicIncreasing,
            Monotonicity::None if delta < 0.0 => Monotonicity::MonotonicDecreasing,
            Monotonicity::MonotonicIncreasing if delta < self.max => Monotonicity::Mixed,
            Monotonicity::MonotonicDecreasing if delta > self.min => Monotonicity::Mixed,
            unchanged => unchanged,
        };

        self.max = self.max.max(delta);
        self.min = self.min.min(delta);

        if delta < 0.0 {
            self.out_of_order_count += 1;
        }
        self.last_interval = delta;

        trace!(group = self.id.0, delta, n = self.interval_count, "group updated");
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn first_time(&self) -> Timestamp {
        self.first_time
    }

    pub fn last_time(&self) -> Timestamp {
        self.last_time
    }

    /// Seconds between the first and last event.
    pub fn duration_secs(&self) -> f64 {
        elapsed_secs(self.last_time, self.first_time)
    }

    pub fn interval_count(&self) -> u32 {
        self.interval_count
    }

    pub fn event_count(&self) -> u32 {
        self.interval_count + 1
    }

    pub fn increasing_count(&self) -> u32 {
        self.increasing_count
    }

    pub fn out_of_order_count(&self) -> u32 {
        self.out_of_order_count
    }

    pub fn monotonicity(&self) -> Monotonicity {
        self.monotonicity
    }

    /// Largest interval, or `0.0` for a single-event group.
    pub fn max(&self) -> f64 {
        if self.interval_count == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Smallest interval, or `0.0` for a single-event group.
    pub fn min(&self) -> f64 {
        if self.interval_count == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn mean(&self) -> f64 {
        if self.interval_count == 0 {
            return 0.0;
        }
        self.sum / self.interval_count as f64
    }

    /// Population standard deviation of the intervals.
    pub fn std_dev(&self) -> f64 {
        if self.interval_count <= 1 {
            return 0.0;
        }
        let n = self.interval_count as f64;
        let mean = self.sum / n;
        // Rounding can push the radicand slightly below zero.
        (self.sum_squares / n - mean * mean).max(0.0).sqrt()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn mark_finished(&mut self) {
        self.finished = true;
    }
}
