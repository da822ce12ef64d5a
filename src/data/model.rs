use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

// ---------------------------------------------------------------------------
// RawRecord – one untyped reading as it came out of a source
// ---------------------------------------------------------------------------

/// A reading exactly as a producer wrote it. Usually a JSON object, but the
/// normaliser passes through whatever the source array contained.
pub type RawRecord = JsonValue;

// ---------------------------------------------------------------------------
// MetricName – the tracked sensor quantities
// ---------------------------------------------------------------------------

/// One tracked sensor quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricName {
    Temperature,
    Humidity,
    Pressure,
    Pm2_5,
    Pm10,
    Pm1_0,
    Co2,
    Voc,
}

impl MetricName {
    pub const ALL: [MetricName; 8] = [
        MetricName::Temperature,
        MetricName::Humidity,
        MetricName::Pressure,
        MetricName::Pm2_5,
        MetricName::Pm10,
        MetricName::Pm1_0,
        MetricName::Co2,
        MetricName::Voc,
    ];

    /// Human-readable name for legends and summaries.
    pub fn label(self) -> &'static str {
        match self {
            MetricName::Temperature => "Temperature",
            MetricName::Humidity => "Humidity",
            MetricName::Pressure => "Pressure",
            MetricName::Pm2_5 => "PM2.5",
            MetricName::Pm10 => "PM10",
            MetricName::Pm1_0 => "PM1.0",
            MetricName::Co2 => "CO2",
            MetricName::Voc => "VOC",
        }
    }

    pub fn is_particulate(self) -> bool {
        matches!(self, MetricName::Pm2_5 | MetricName::Pm10 | MetricName::Pm1_0)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// ResolvedEntry – one timestamped reading with typed metrics
// ---------------------------------------------------------------------------

/// A record whose timestamp resolved. Every metric key is present; the value
/// is `None` when the record had no usable field for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub timestamp: DateTime<Utc>,
    pub metrics: BTreeMap<MetricName, Option<f64>>,
}

impl ResolvedEntry {
    pub fn metric(&self, metric: MetricName) -> Option<f64> {
        self.metrics.get(&metric).copied().flatten()
    }

    /// ISO-8601 label with millisecond precision and a `Z` suffix.
    pub fn label(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

// ---------------------------------------------------------------------------
// SeriesSet – the merged, time-ordered dataset
// ---------------------------------------------------------------------------

/// All resolved entries of one load, ascending by timestamp. Ties keep the
/// order in which the sources delivered them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    pub entries: Vec<ResolvedEntry>,
    /// Records dropped because no timestamp could be resolved.
    pub discarded: usize,
}

impl SeriesSet {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&ResolvedEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&ResolvedEntry> {
        self.entries.last()
    }

    /// Chart labels, one per entry.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(ResolvedEntry::label).collect()
    }

    /// One metric across all entries, aligned with [`SeriesSet::labels`].
    pub fn column(&self, metric: MetricName) -> Vec<Option<f64>> {
        self.entries.iter().map(|e| e.metric(metric)).collect()
    }
}

// ---------------------------------------------------------------------------
// SummaryStats – aggregate over one column
// ---------------------------------------------------------------------------

/// Min / max / mean over the numeric values of one column, rounded to two
/// decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
}

impl SummaryStats {
    pub fn format(&self) -> String {
        format!(
            "Count: {} | Min: {:.2} | Avg: {:.2} | Max: {:.2}",
            self.count, self.min, self.avg, self.max
        )
    }
}

/// Summary text for an optional summary.
pub fn format_summary(summary: Option<&SummaryStats>) -> String {
    match summary {
        Some(s) => s.format(),
        None => "No numeric data".to_string(),
    }
}
