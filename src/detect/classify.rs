//! Mapping from group statistics to an anomaly category.
//!
//! A very large max/min interval ratio with steadily growing gaps is the
//! signature of a server starting up (its beacon interval backs off). A tight
//! max-min spread is steady periodic beaconing. Short runs get their own
//! bucket rather than a misleading classification.

use serde::{Deserialize, Serialize};

use super::{AnomalyGroup, Monotonicity};

/// Tunable limits used by [`classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Groups with at most this many events are "short".
    pub short_points: u32,
    /// Groups with fewer events than this are "medium long".
    pub medium_points: u32,
    /// Groups with fewer events than this are "long".
    pub long_points: u32,
    /// Seconds within which max and min must agree to count as regular.
    pub regular_tolerance: f64,
    /// max/min interval ratio above which a server looks like it is starting.
    pub max_min_ratio: f64,
    /// Non-increasing intervals tolerated for "probably coming up".
    pub max_non_increasing: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            short_points: 5,
            medium_points: 15,
            long_points: 50,
            regular_tolerance: 0.25,
            max_min_ratio: 25.0,
            max_non_increasing: 2,
        }
    }
}

/// Classification of one anomaly group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Single,
    ServerComingUp,
    ProbablyServerComingUp,
    Regular,
    Short,
    MediumLong,
    Long,
    VeryLong,
    OutOfOrder,
}

impl Category {
    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Single => "Single anomaly",
            Category::ServerComingUp => "Server coming up",
            Category::ProbablyServerComingUp => "Probably server coming up",
            Category::Regular => "Regular beacons, network coming back",
            Category::Short => "Short sequence",
            Category::MediumLong => "Medium long sequence",
            Category::Long => "Long sequence",
            Category::VeryLong => "Very long sequence",
            Category::OutOfOrder => "Anomalies out of order",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a group. Checks run top to bottom and the first match wins.
pub fn classify(group: &AnomalyGroup, limits: &Thresholds) -> Category {
    let events = group.event_count();
    let (max, min) = (group.max(), group.min());

    if events == 1 {
        return Category::Single;
    }
    if group.out_of_order_count() > 0 {
        return Category::OutOfOrder;
    }
    if events <= limits.short_points {
        return Category::Short;
    }
    if max > 0.0 && min > 0.0 && max / min > limits.max_min_ratio {
        if group.monotonicity() == Monotonicity::MonotonicIncreasing {
            return Category::ServerComingUp;
        }
        let non_increasing = group.interval_count() - group.increasing_count();
        if non_increasing <= limits.max_non_increasing {
            return Category::ProbablyServerComingUp;
        }
    }
    if max - min < limits.regular_tolerance {
        return Category::Regular;
    }
    if events < limits.medium_points {
        return Category::MediumLong;
    }
    if events < limits.long_points {
        return Category::Long;
    }
    Category::VeryLong
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::testutil::at;
    use crate::detect::GroupId;

    fn group_with_intervals(intervals: &[f64]) -> AnomalyGroup {
        let mut t = 0.0;
        let mut group = AnomalyGroup::new(GroupId(1), at(t));
        for d in intervals {
            t += d;
            group.update(at(t));
        }
        group
    }

    /// `n` intervals alternating between `a` and `b`.
    fn alternating(n: usize, a: f64, b: f64) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { a } else { b }).collect()
    }

    fn check(intervals: &[f64]) -> Category {
        classify(&group_with_intervals(intervals), &Thresholds::default())
    }

    #[test]
    fn test_single_event() {
        assert_eq!(check(&[]), Category::Single);
    }

    #[test]
    fn test_out_of_order_wins_over_everything_else() {
        let group = {
            let mut g = AnomalyGroup::new(GroupId(1), at(0.0));
            g.update(at(5.0));
            g.update(at(3.0));
            g
        };
        assert_eq!(classify(&group, &Thresholds::default()), Category::OutOfOrder);
    }

    #[test]
    fn test_short_boundary() {
        // 5 events is still short, 6 is not.
        assert_eq!(check(&[1.0; 4]), Category::Short);
        assert_eq!(check(&[1.0; 5]), Category::Regular);
    }

    #[test]
    fn test_server_coming_up() {
        // 1, 2, 4, ... 64: ratio 64, strictly increasing.
        let intervals: Vec<f64> = (0..7).map(|i| 2f64.powi(i)).collect();
        assert_eq!(check(&intervals), Category::ServerComingUp);
    }

    #[test]
    fn test_ratio_exactly_at_limit_is_not_coming_up() {
        // max/min == 25.0 exactly; the rule is strictly greater.
        let intervals = [1.0, 5.0, 10.0, 20.0, 25.0];
        let category = check(&intervals);
        assert_ne!(category, Category::ServerComingUp);
        assert_ne!(category, Category::ProbablyServerComingUp);
        assert_eq!(category, Category::MediumLong);
    }

    #[test]
    fn test_probably_server_coming_up() {
        // One dip makes it mixed, but only one sample is non-increasing.
        let intervals = [1.0, 2.0, 4.0, 3.0, 8.0, 16.0, 32.0];
        let group = group_with_intervals(&intervals);
        assert_eq!(group.monotonicity(), Monotonicity::Mixed);
        assert_eq!(group.interval_count() - group.increasing_count(), 1);
        assert_eq!(
            classify(&group, &Thresholds::default()),
            Category::ProbablyServerComingUp
        );
    }

    #[test]
    fn test_non_increasing_limit_is_inclusive() {
        // Two repeats after the climb: exactly two non-increasing samples.
        let at_limit = group_with_intervals(&[1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 1.0, 1.0]);
        assert_eq!(at_limit.interval_count() - at_limit.increasing_count(), 2);
        assert_eq!(
            classify(&at_limit, &Thresholds::default()),
            Category::ProbablyServerComingUp
        );

        let over = group_with_intervals(&[1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 1.0, 1.0, 1.0]);
        assert_eq!(over.interval_count() - over.increasing_count(), 3);
        assert_eq!(classify(&over, &Thresholds::default()), Category::MediumLong);
    }

    #[test]
    fn test_large_ratio_with_many_dips_falls_through() {
        let intervals = alternating(12, 1.0, 30.0);
        // 5 non-increasing samples: too many for "probably".
        assert_eq!(check(&intervals), Category::MediumLong);
    }

    #[test]
    fn test_regular_beacons() {
        assert_eq!(check(&[10.0, 10.1, 9.9, 10.0, 10.1]), Category::Regular);
    }

    #[test]
    fn test_length_boundaries() {
        // Spread of 1s keeps these out of the regular bucket.
        assert_eq!(check(&alternating(13, 2.0, 3.0)), Category::MediumLong); // 14 events
        assert_eq!(check(&alternating(14, 2.0, 3.0)), Category::Long); // 15 events
        assert_eq!(check(&alternating(48, 2.0, 3.0)), Category::Long); // 49 events
        assert_eq!(check(&alternating(49, 2.0, 3.0)), Category::VeryLong); // 50 events
    }

    #[test]
    fn test_thresholds_are_injectable() {
        let limits = Thresholds {
            short_points: 10,
            ..Thresholds::default()
        };
        let group = group_with_intervals(&[1.0; 6]);
        assert_eq!(classify(&group, &limits), Category::Short);
        assert_eq!(classify(&group, &Thresholds::default()), Category::Regular);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let group = group_with_intervals(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
        let first = classify(&group, &Thresholds::default());
        for _ in 0..10 {
            assert_eq!(classify(&group, &Thresholds::default()), first);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Category::Single.to_string(), "Single anomaly");
        assert_eq!(
            Category::Regular.label(),
            "Regular beacons, network coming back"
        );
        assert_eq!(Category::OutOfOrder.label(), "Anomalies out of order");
    }
}
