use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

/// Epochs above this are always milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;
/// Epochs at or below this are always seconds.
const SECONDS_THRESHOLD: f64 = 1e9;

/// How numeric epochs between 1e9 and 1e12 are read.
///
/// Producers in the field emit both seconds and milliseconds. Values in that
/// band have historically been read as milliseconds, which places a seconds
/// epoch such as `1_700_000_000` in January 1970. `InferSeconds` reads the band
/// as seconds instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EpochPolicy {
    #[default]
    Compat,
    InferSeconds,
}

/// Naive layouts tried after RFC 3339 / RFC 2822. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Resolve a heterogeneous timestamp value into an instant.
///
/// Numbers and numeric strings are epochs; other strings are parsed as
/// calendar dates. Anything else resolves to `None`.
pub fn resolve(value: &JsonValue, policy: EpochPolicy) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::Number(n) => n.as_f64().and_then(|v| from_epoch(v, policy)),
        JsonValue::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.parse::<f64>() {
                Ok(v) if v.is_finite() => from_epoch(v, policy),
                Ok(_) => None,
                Err(_) => parse_date(s),
            }
        }
        _ => None,
    }
}

/// Interpret a raw epoch number according to its magnitude.
pub fn from_epoch(raw: f64, policy: EpochPolicy) -> Option<DateTime<Utc>> {
    if !raw.is_finite() {
        return None;
    }
    let millis = if raw > MILLIS_THRESHOLD {
        raw
    } else if raw > SECONDS_THRESHOLD {
        match policy {
            EpochPolicy::Compat => raw,
            EpochPolicy::InferSeconds => raw * 1000.0,
        }
    } else {
        raw * 1000.0
    };
    // Sub-millisecond precision is dropped.
    let millis = millis.trunc();
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    log::trace!("Unparseable timestamp string: {s:?}");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn millis(v: &JsonValue) -> Option<i64> {
        resolve(v, EpochPolicy::Compat).map(|dt| dt.timestamp_millis())
    }

    #[test]
    fn large_numbers_are_milliseconds() {
        assert_eq!(millis(&json!(1_700_000_000_123_i64)), Some(1_700_000_000_123));
        assert_eq!(millis(&json!("1700000000123")), Some(1_700_000_000_123));
    }

    #[test]
    fn small_numbers_are_seconds() {
        assert_eq!(millis(&json!(1_000_000)), Some(1_000_000_000));
        assert_eq!(millis(&json!(0)), Some(0));
        assert_eq!(millis(&json!(" 12.5 ")), Some(12_500));
    }

    #[test]
    fn middle_band_follows_policy() {
        let v = json!(1_700_000_000_i64);
        assert_eq!(millis(&v), Some(1_700_000_000));
        assert_eq!(
            resolve(&v, EpochPolicy::InferSeconds).map(|dt| dt.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn monotonic_within_each_band() {
        let samples = [
            -5.0, 0.0, 1.0, 999_999_999.0, 1e9, 1e9 + 1.0, 5e11, 1e12, 1e12 + 1.0, 2e12,
        ];
        for pair in samples.windows(2) {
            let band = |v: f64| {
                if v > MILLIS_THRESHOLD {
                    2
                } else if v > SECONDS_THRESHOLD {
                    1
                } else {
                    0
                }
            };
            if band(pair[0]) != band(pair[1]) {
                continue;
            }
            let a = from_epoch(pair[0], EpochPolicy::Compat).unwrap();
            let b = from_epoch(pair[1], EpochPolicy::Compat).unwrap();
            assert!(a <= b, "{} should not resolve after {}", pair[0], pair[1]);
        }
    }

    /// Ordering is only guaranteed within a band. Under `Compat` the step
    /// from seconds to milliseconds at 1e9 moves back by about 31 years.
    #[test]
    fn compat_band_edge_is_not_monotonic() {
        let at_edge = from_epoch(SECONDS_THRESHOLD, EpochPolicy::Compat).unwrap();
        let above = from_epoch(SECONDS_THRESHOLD + 1.0, EpochPolicy::Compat).unwrap();
        assert_eq!(at_edge.timestamp(), 1_000_000_000);
        assert_eq!(above.timestamp_millis(), 1_000_000_001);
        assert!(above < at_edge);

        let at_edge = from_epoch(SECONDS_THRESHOLD, EpochPolicy::InferSeconds).unwrap();
        let above = from_epoch(SECONDS_THRESHOLD + 1.0, EpochPolicy::InferSeconds).unwrap();
        assert!(above > at_edge);
    }

    #[test]
    fn date_strings() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(resolve(&json!("2024-03-01T12:30:00Z"), EpochPolicy::Compat), Some(expected));
        assert_eq!(
            resolve(&json!("2024-03-01T14:30:00+02:00"), EpochPolicy::Compat),
            Some(expected)
        );
        assert_eq!(resolve(&json!("2024-03-01 12:30:00"), EpochPolicy::Compat), Some(expected));
        assert_eq!(resolve(&json!("2024-03-01 12:30"), EpochPolicy::Compat), Some(expected));
        assert_eq!(
            resolve(&json!("Fri, 01 Mar 2024 12:30:00 +0000"), EpochPolicy::Compat),
            Some(expected)
        );
        assert_eq!(
            resolve(&json!("2024-03-01"), EpochPolicy::Compat),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unresolvable_values() {
        for v in [
            json!(null),
            json!(""),
            json!("   "),
            json!("yesterday"),
            json!("NaN"),
            json!(true),
            json!([1]),
            json!({"ts": 1}),
        ] {
            assert_eq!(resolve(&v, EpochPolicy::Compat), None, "{v}");
        }
    }
}
