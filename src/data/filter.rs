use chrono::NaiveDate;

use super::model::SeriesSet;

// ---------------------------------------------------------------------------
// Time-range filter: which calendar days are shown
// ---------------------------------------------------------------------------

/// Inclusive UTC day range. When `enabled` is false every entry passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub enabled: bool,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            enabled: false,
            from: NaiveDate::MIN,
            to: NaiveDate::MAX,
        }
    }
}

impl TimeRange {
    /// A disabled range covering the days of the given series.
    pub fn spanning(series: &SeriesSet) -> Self {
        match (series.first(), series.last()) {
            (Some(first), Some(last)) => Self {
                enabled: false,
                from: first.timestamp.date_naive(),
                to: last.timestamp.date_naive(),
            },
            _ => Self::default(),
        }
    }

    /// Whether the range lets the given day through.
    pub fn contains(&self, day: NaiveDate) -> bool {
        !self.enabled || (self.from <= day && day <= self.to)
    }
}

/// Return the entries that fall inside `range`, keeping their order.
///
/// A range whose `from` is after its `to` selects nothing.
pub fn apply(series: &SeriesSet, range: &TimeRange) -> SeriesSet {
    if !range.enabled {
        return series.clone();
    }
    let entries = series
        .entries
        .iter()
        .filter(|e| range.contains(e.timestamp.date_naive()))
        .cloned()
        .collect();
    SeriesSet {
        entries,
        discarded: series.discarded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::series::build;
    use crate::data::timestamp::EpochPolicy;
    use serde_json::json;

    fn sample() -> SeriesSet {
        let batch = vec![
            json!({"timestamp": "2024-01-01T23:59:59Z", "temp": 1}),
            json!({"timestamp": "2024-01-02T00:00:00Z", "temp": 2}),
            json!({"timestamp": "2024-01-03T12:00:00Z", "temp": 3}),
        ];
        build(&[batch], EpochPolicy::Compat).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn disabled_range_keeps_everything() {
        let series = sample();
        let range = TimeRange::spanning(&series);
        assert!(!range.enabled);
        assert_eq!(range.from, day(1));
        assert_eq!(range.to, day(3));
        assert_eq!(apply(&series, &range).len(), 3);
    }

    #[test]
    fn enabled_range_is_inclusive() {
        let series = sample();
        let range = TimeRange {
            enabled: true,
            from: day(2),
            to: day(3),
        };
        let filtered = apply(&series, &range);
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            filtered.entries[0].metric(crate::data::model::MetricName::Temperature),
            Some(2.0)
        );
    }

    #[test]
    fn inverted_range_selects_nothing() {
        let series = sample();
        let range = TimeRange {
            enabled: true,
            from: day(3),
            to: day(1),
        };
        assert!(apply(&series, &range).is_empty());
    }
}
