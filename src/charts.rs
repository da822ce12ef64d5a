use crate::config::ViewerConfig;
use crate::data::model::{MetricName, SeriesSet};
use crate::data::stats::{has_numeric_data, moving_average, summarize};
use crate::present::{ChartData, ChartSummary, Dataset};

// ---------------------------------------------------------------------------
// Chart catalogue
// ---------------------------------------------------------------------------

/// A chart and the metrics plotted on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub y_label: &'static str,
    pub metrics: &'static [MetricName],
}

impl ChartSpec {
    pub fn is_particulate(&self) -> bool {
        self.metrics.iter().any(|m| m.is_particulate())
    }

    /// Moving-average window used unless the user overrides it.
    pub fn default_window(&self, config: &ViewerConfig) -> usize {
        if self.is_particulate() {
            config.particulate_window
        } else {
            config.default_window
        }
    }
}

pub const CHARTS: [ChartSpec; 6] = [
    ChartSpec {
        id: "temperature",
        title: "Temperature",
        y_label: "°C",
        metrics: &[MetricName::Temperature],
    },
    ChartSpec {
        id: "humidity",
        title: "Humidity",
        y_label: "%",
        metrics: &[MetricName::Humidity],
    },
    ChartSpec {
        id: "pressure",
        title: "Pressure",
        y_label: "hPa",
        metrics: &[MetricName::Pressure],
    },
    ChartSpec {
        id: "particulate",
        title: "Particulate matter",
        y_label: "µg/m³",
        metrics: &[MetricName::Pm1_0, MetricName::Pm2_5, MetricName::Pm10],
    },
    ChartSpec {
        id: "co2",
        title: "CO2",
        y_label: "ppm",
        metrics: &[MetricName::Co2],
    },
    ChartSpec {
        id: "voc",
        title: "VOC",
        y_label: "index",
        metrics: &[MetricName::Voc],
    },
];

// ---------------------------------------------------------------------------
// Building chart data
// ---------------------------------------------------------------------------

/// Build labels, raw and smoothed datasets plus summaries for one chart.
///
/// Smoothing and summaries are skipped when the chart has no numeric data.
pub fn prepare(series: &SeriesSet, spec: &ChartSpec, window: usize) -> (ChartData, ChartSummary) {
    let raw: Vec<Dataset> = spec
        .metrics
        .iter()
        .map(|&metric| Dataset {
            label: metric.label().to_string(),
            metric,
            values: series.column(metric),
        })
        .collect();

    let columns: Vec<&[Option<f64>]> = raw.iter().map(|d| d.values.as_slice()).collect();
    let (smoothed, summary) = if has_numeric_data(&columns) {
        let smoothed = raw
            .iter()
            .map(|d| Dataset {
                label: format!("{} (MA {window})", d.label),
                metric: d.metric,
                values: moving_average(&d.values, window),
            })
            .collect();
        let summary = ChartSummary {
            entries: raw.iter().map(|d| (d.metric, summarize(&d.values))).collect(),
        };
        (smoothed, summary)
    } else {
        (Vec::new(), ChartSummary::default())
    };

    let data = ChartData {
        labels: series.labels(),
        raw,
        smoothed,
        y_label: spec.y_label.to_string(),
        window,
    };
    (data, summary)
}
