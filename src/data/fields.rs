use serde_json::Value as JsonValue;

use super::model::MetricName;

// ---------------------------------------------------------------------------
// Alias tables
// ---------------------------------------------------------------------------

/// Keys a record may use for its timestamp, in priority order.
pub const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "time", "t", "date", "datetime", "ts"];

const TEMPERATURE: &[&str] = &["temperature", "temp", "t"];
const HUMIDITY: &[&str] = &["humidity", "hum", "h"];
const PRESSURE: &[&str] = &["pressure", "pres", "p"];
const PM2_5: &[&str] = &["pm2_5", "pm2.5", "pm25", "pm_2_5", "pm2"];
const PM10: &[&str] = &["pm10", "pm_10"];
const PM1_0: &[&str] = &["pm1_0", "pm1.0", "pm1"];
const CO2: &[&str] = &["co2", "co_2", "co2_ppm", "co2ppm"];
const VOC: &[&str] = &[
    "voc",
    "tvoc",
    "tvoc_index",
    "tvocindex",
    "voc_ppb",
    "vocppb",
    "sgp40_raw",
];

/// Accepted field names for a metric, first match wins.
pub fn aliases(metric: MetricName) -> &'static [&'static str] {
    match metric {
        MetricName::Temperature => TEMPERATURE,
        MetricName::Humidity => HUMIDITY,
        MetricName::Pressure => PRESSURE,
        MetricName::Pm2_5 => PM2_5,
        MetricName::Pm10 => PM10,
        MetricName::Pm1_0 => PM1_0,
        MetricName::Co2 => CO2,
        MetricName::Voc => VOC,
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Resolve a numeric field through an alias list.
///
/// The first alias whose value is neither null nor `""` decides the outcome:
/// if that value does not coerce to a finite number the result is `None`,
/// later aliases are not consulted.
pub fn extract(record: &JsonValue, aliases: &[&str]) -> Option<f64> {
    let obj = record.as_object()?;
    let value = aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !is_blank(v))?;
    to_number(value)
}

pub fn extract_metric(record: &JsonValue, metric: MetricName) -> Option<f64> {
    extract(record, aliases(metric))
}

/// First timestamp alias carrying a non-null value, parseable or not.
pub fn timestamp_field(record: &JsonValue) -> Option<&JsonValue> {
    let obj = record.as_object()?;
    TIMESTAMP_ALIASES
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

fn to_number(value: &JsonValue) -> Option<f64> {
    let n = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_every_alias_is_none() {
        let rec = json!({"timestamp": 1, "other": 5});
        for metric in MetricName::ALL {
            assert_eq!(extract_metric(&rec, metric), None, "{metric}");
        }
    }

    #[test]
    fn earlier_alias_wins() {
        let rec = json!({"t": 99.0, "temp": 21.5});
        assert_eq!(extract_metric(&rec, MetricName::Temperature), Some(21.5));

        let rec = json!({"sgp40_raw": 30000, "tvoc": 120});
        assert_eq!(extract_metric(&rec, MetricName::Voc), Some(120.0));

        let rec = json!({"pm2": 4, "pm2.5": "12.5"});
        assert_eq!(extract_metric(&rec, MetricName::Pm2_5), Some(12.5));
    }

    #[test]
    fn null_and_empty_string_fall_through() {
        let rec = json!({"humidity": null, "hum": "", "h": 41});
        assert_eq!(extract_metric(&rec, MetricName::Humidity), Some(41.0));
    }

    #[test]
    fn invalid_first_match_does_not_fall_through() {
        let rec = json!({"co2": "n/a", "co2_ppm": 410});
        assert_eq!(extract_metric(&rec, MetricName::Co2), None);

        let rec = json!({"pressure": {"value": 1013}, "p": 1013});
        assert_eq!(extract_metric(&rec, MetricName::Pressure), None);
    }

    #[test]
    fn numeric_strings_and_non_objects() {
        let rec = json!({"pm10": " 17 "});
        assert_eq!(extract_metric(&rec, MetricName::Pm10), Some(17.0));
        assert_eq!(extract_metric(&json!({"pm10": "inf"}), MetricName::Pm10), None);
        assert_eq!(extract_metric(&json!(42), MetricName::Pm10), None);
    }

    #[test]
    fn timestamp_field_uses_presence() {
        let rec = json!({"time": "garbage", "ts": 1_700_000_000_000_i64});
        assert_eq!(timestamp_field(&rec), Some(&json!("garbage")));

        let rec = json!({"timestamp": null, "date": "2024-01-01"});
        assert_eq!(timestamp_field(&rec), Some(&json!("2024-01-01")));

        assert_eq!(timestamp_field(&json!({"temp": 1})), None);
    }
}
