use std::collections::BTreeMap;

use thiserror::Error;

use crate::data::model::{MetricName, SummaryStats, format_summary};
use crate::data::stats::has_numeric_data;

// ---------------------------------------------------------------------------
// What a chart is handed
// ---------------------------------------------------------------------------

/// One line on a chart, aligned with the chart labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub metric: MetricName,
    pub values: Vec<Option<f64>>,
}

/// Everything the rendering collaborator needs for one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    /// ISO-8601 timestamps, ascending.
    pub labels: Vec<String>,
    pub raw: Vec<Dataset>,
    pub smoothed: Vec<Dataset>,
    pub y_label: String,
    pub window: usize,
}

/// Per-metric summaries of one chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSummary {
    pub entries: Vec<(MetricName, Option<SummaryStats>)>,
}

impl ChartSummary {
    /// Display text, one line per metric. Single-metric charts omit the name.
    pub fn format(&self) -> String {
        match self.entries.as_slice() {
            [] => format_summary(None),
            [(_, stats)] => format_summary(stats.as_ref()),
            many => many
                .iter()
                .map(|(metric, stats)| format!("{metric}: {}", format_summary(stats.as_ref())))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("dataset '{label}' has {actual} values for {expected} labels")]
    LengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
    #[error("invalid timestamp label '{0}'")]
    InvalidLabel(String),
}

/// Turns chart data into something drawable.
pub trait ChartRenderer {
    type Handle;

    fn render(&mut self, chart_id: &str, data: &ChartData) -> Result<Self::Handle, RenderError>;
}

/// Receives the summary text shown next to each chart.
pub trait SummaryDisplay {
    fn show_summary(&mut self, chart_id: &str, text: String);
}

/// Summary texts keyed by chart id.
#[derive(Debug, Clone, Default)]
pub struct SummaryBoard {
    texts: BTreeMap<String, String>,
}

impl SummaryBoard {
    pub fn get(&self, chart_id: &str) -> Option<&str> {
        self.texts.get(chart_id).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.texts.clear();
    }
}

impl SummaryDisplay for SummaryBoard {
    fn show_summary(&mut self, chart_id: &str, text: String) {
        self.texts.insert(chart_id.to_string(), text);
    }
}

// ---------------------------------------------------------------------------
// Chart registry
// ---------------------------------------------------------------------------

/// Active chart handles keyed by chart id. Replacing or destroying a handle
/// drops the previous one.
#[derive(Debug)]
pub struct ChartRegistry<H> {
    handles: BTreeMap<String, H>,
}

impl<H> Default for ChartRegistry<H> {
    fn default() -> Self {
        Self {
            handles: BTreeMap::new(),
        }
    }
}

impl<H> ChartRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle` for `id`, destroying any previous handle.
    /// Returns whether a previous handle existed.
    pub fn upsert(&mut self, id: &str, handle: H) -> bool {
        let replaced = self.destroy(id);
        self.handles.insert(id.to_string(), handle);
        replaced
    }

    /// Destroy the handle for `id`. Returns whether one existed.
    pub fn destroy(&mut self, id: &str) -> bool {
        let existed = self.handles.remove(id).is_some();
        if existed {
            log::debug!("Destroyed chart '{id}'");
        }
        existed
    }

    pub fn get(&self, id: &str) -> Option<&H> {
        self.handles.get(id)
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// What happened to one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    Rendered,
    /// No numeric data in any raw dataset.
    Empty,
    Failed(RenderError),
}

/// Hand one chart to the renderer and its summary to the summary display.
///
/// Empty charts and render failures destroy the chart's previous handle; a
/// failure never touches other charts.
pub fn present<R, S>(
    registry: &mut ChartRegistry<R::Handle>,
    renderer: &mut R,
    summaries: &mut S,
    chart_id: &str,
    data: &ChartData,
    summary: &ChartSummary,
) -> PresentOutcome
where
    R: ChartRenderer,
    S: SummaryDisplay,
{
    let raw_columns: Vec<&[Option<f64>]> = data.raw.iter().map(|d| d.values.as_slice()).collect();
    if !has_numeric_data(&raw_columns) {
        registry.destroy(chart_id);
        summaries.show_summary(chart_id, format_summary(None));
        return PresentOutcome::Empty;
    }

    match renderer.render(chart_id, data) {
        Ok(handle) => {
            registry.upsert(chart_id, handle);
            summaries.show_summary(chart_id, summary.format());
            PresentOutcome::Rendered
        }
        Err(e) => {
            log::error!("Failed to render chart '{chart_id}': {e}");
            registry.destroy(chart_id);
            summaries.show_summary(chart_id, format!("Chart unavailable: {e}"));
            PresentOutcome::Failed(e)
        }
    }
}
