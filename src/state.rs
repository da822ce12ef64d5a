use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::charts::{self, CHARTS, ChartSpec};
use crate::config::ViewerConfig;
use crate::data::filter::{self, TimeRange};
use crate::data::loader::{Fetcher, LoadReport, Source, SourceError, load_sources, parse_sources};
use crate::data::model::SeriesSet;
use crate::data::series::build;
use crate::data::stats::RAW_WINDOW;
use crate::present::{ChartRegistry, PresentOutcome, SummaryBoard, present};
use crate::ui::plot::{EguiRenderer, PlotModel};

// ---------------------------------------------------------------------------
// Per-chart state
// ---------------------------------------------------------------------------

/// What the chart grid shows for one chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartStatus {
    Rendered,
    Empty,
    Failed(String),
}

/// User choices for one chart's smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSettings {
    pub window: usize,
    /// Plot raw values only (window 1).
    pub raw_passthrough: bool,
}

impl ChartSettings {
    pub fn effective_window(&self) -> usize {
        if self.raw_passthrough {
            RAW_WINDOW
        } else {
            self.window
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Comma-separated source list as typed by the user.
    pub sources_input: String,

    /// Merged series of the last successful load (None until then).
    pub series: Option<SeriesSet>,

    /// Optional day window applied before charting.
    pub range: TimeRange,

    pub chart_settings: BTreeMap<&'static str, ChartSettings>,

    /// Active chart handles.
    pub registry: ChartRegistry<PlotModel>,
    pub renderer: EguiRenderer,
    pub summaries: SummaryBoard,
    pub chart_status: BTreeMap<&'static str, ChartStatus>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Sources skipped during the last load.
    pub skipped_sources: Vec<String>,

    /// Whether a load is in progress.
    pub loading: bool,

    /// Number of loads in flight. Loads are never cancelled.
    in_flight: usize,

    /// Every worker reports on the same channel, so reports arrive in
    /// completion order and the last to finish wins.
    report_tx: Sender<LoadReport>,
    report_rx: Receiver<LoadReport>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let chart_settings = CHARTS
            .iter()
            .map(|spec| {
                let settings = ChartSettings {
                    window: spec.default_window(&config),
                    raw_passthrough: false,
                };
                (spec.id, settings)
            })
            .collect();
        let (report_tx, report_rx) = mpsc::channel();
        Self {
            sources_input: config.default_sources.join(", "),
            config,
            series: None,
            range: TimeRange::default(),
            chart_settings,
            registry: ChartRegistry::new(),
            renderer: EguiRenderer::default(),
            summaries: SummaryBoard::default(),
            chart_status: BTreeMap::new(),
            status_message: None,
            skipped_sources: Vec::new(),
            loading: false,
            in_flight: 0,
            report_tx,
            report_rx,
        }
    }

    /// Start loading the current source list on a worker thread.
    /// `notify` is called from the worker once the report is ready.
    pub fn start_load<F>(&mut self, notify: F)
    where
        F: Fn() + Send + 'static,
    {
        let sources = parse_sources(&self.sources_input);
        if sources.is_empty() {
            self.status_message = Some("No sources given".to_string());
            return;
        }
        log::info!("Loading {} sources", sources.len());

        let timeout = self.config.http_timeout();
        let tx = self.report_tx.clone();
        std::thread::spawn(move || {
            let report = match Fetcher::new(timeout) {
                Ok(fetcher) => load_sources(&fetcher, &sources),
                Err(e) => unavailable_report(&sources, &e),
            };
            // The receiver is gone only if the app closed.
            let _ = tx.send(report);
            notify();
        });
        self.in_flight += 1;
        self.loading = true;
    }

    /// Apply finished loads in the order they completed. Returns whether
    /// anything changed.
    pub fn poll_loads(&mut self) -> bool {
        let mut changed = false;
        while let Ok(report) = self.report_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.ingest(report);
            changed = true;
        }
        self.loading = self.in_flight > 0;
        changed
    }

    /// Merge a load report and redraw every chart.
    pub fn ingest(&mut self, report: LoadReport) {
        self.skipped_sources = report.failures.iter().map(SourceError::to_string).collect();

        match build(&report.batches, self.config.epoch_policy()) {
            Ok(series) => {
                log::info!(
                    "Loaded {} entries from {} records in {} sources ({} skipped)",
                    series.len(),
                    report.record_count(),
                    report.batches.len(),
                    report.failures.len()
                );
                self.range = TimeRange::spanning(&series);
                self.series = Some(series);
                self.status_message = None;
                self.rebuild_charts();
            }
            Err(e) => {
                log::warn!("Load produced nothing to chart: {e}");
                self.series = None;
                self.registry.clear();
                self.summaries.clear();
                self.chart_status.clear();
                self.status_message = Some(e.to_string());
            }
        }
    }

    /// Re-run smoothing, summaries and rendering for every chart.
    pub fn rebuild_charts(&mut self) {
        let Some(series) = &self.series else {
            return;
        };
        let visible = filter::apply(series, &self.range);
        if visible.is_empty() {
            log::debug!("No entries between {} and {}", self.range.from, self.range.to);
        }

        for spec in &CHARTS {
            let window = self.window_for(spec);
            let (data, summary) = charts::prepare(&visible, spec, window);
            let outcome = present(
                &mut self.registry,
                &mut self.renderer,
                &mut self.summaries,
                spec.id,
                &data,
                &summary,
            );
            let status = match outcome {
                PresentOutcome::Rendered => ChartStatus::Rendered,
                PresentOutcome::Empty => ChartStatus::Empty,
                PresentOutcome::Failed(e) => ChartStatus::Failed(e.to_string()),
            };
            self.chart_status.insert(spec.id, status);
        }
    }

    pub fn window_for(&self, spec: &ChartSpec) -> usize {
        self.chart_settings
            .get(spec.id)
            .map(ChartSettings::effective_window)
            .unwrap_or_else(|| spec.default_window(&self.config))
    }

    /// Append file paths picked in the file dialog to the source list.
    pub fn add_sources<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = String>,
    {
        for source in sources {
            if self.sources_input.trim().is_empty() {
                self.sources_input = source;
            } else {
                self.sources_input = format!("{}, {source}", self.sources_input.trim_end());
            }
        }
    }
}

fn unavailable_report(sources: &[Source], err: &anyhow::Error) -> LoadReport {
    log::error!("Cannot load sources: {err:#}");
    LoadReport {
        batches: Vec::new(),
        failures: sources
            .iter()
            .map(|s| SourceError::Unavailable {
                name: s.to_string(),
                reason: format!("{err:#}"),
            })
            .collect(),
    }
}
