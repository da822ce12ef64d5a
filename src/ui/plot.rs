use chrono::DateTime;
use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::charts::CHARTS;
use crate::color::MetricColors;
use crate::present::{ChartData, ChartRenderer, Dataset, RenderError};
use crate::state::{AppState, ChartStatus};

const CHART_HEIGHT: f32 = 220.0;

// ---------------------------------------------------------------------------
// Plot model – the chart handle kept in the registry
// ---------------------------------------------------------------------------

/// One drawable line. `x` is seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLine {
    pub name: String,
    pub color: Color32,
    pub smoothed: bool,
    pub points: Vec<[f64; 2]>,
}

/// A prepared chart, ready to draw every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotModel {
    pub y_label: String,
    pub lines: Vec<PlotLine>,
}

/// Renders [`ChartData`] into [`PlotModel`]s for `egui_plot`.
#[derive(Debug, Clone, Default)]
pub struct EguiRenderer {
    colors: MetricColors,
}

impl EguiRenderer {
    fn line(
        &self,
        xs: &[f64],
        dataset: &Dataset,
        smoothed: bool,
    ) -> Result<PlotLine, RenderError> {
        if dataset.values.len() != xs.len() {
            return Err(RenderError::LengthMismatch {
                label: dataset.label.clone(),
                expected: xs.len(),
                actual: dataset.values.len(),
            });
        }
        // Gaps are skipped, the line joins the neighbouring readings.
        let points = xs
            .iter()
            .zip(&dataset.values)
            .filter_map(|(&x, y)| y.map(|y| [x, y]))
            .collect();
        let color = if smoothed {
            self.colors.smoothed(dataset.metric)
        } else {
            self.colors.raw(dataset.metric)
        };
        Ok(PlotLine {
            name: dataset.label.clone(),
            color,
            smoothed,
            points,
        })
    }
}

impl ChartRenderer for EguiRenderer {
    type Handle = PlotModel;

    fn render(&mut self, chart_id: &str, data: &ChartData) -> Result<PlotModel, RenderError> {
        let xs = data
            .labels
            .iter()
            .map(|label| {
                DateTime::parse_from_rfc3339(label)
                    .map(|dt| dt.timestamp_millis() as f64 / 1000.0)
                    .map_err(|_| RenderError::InvalidLabel(label.clone()))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let mut lines = Vec::with_capacity(data.raw.len() + data.smoothed.len());
        for dataset in &data.raw {
            lines.push(self.line(&xs, dataset, false)?);
        }
        for dataset in &data.smoothed {
            lines.push(self.line(&xs, dataset, true)?);
        }
        log::debug!("Rendered chart '{chart_id}' with {} lines", lines.len());

        Ok(PlotModel {
            y_label: data.y_label.clone(),
            lines,
        })
    }
}

// ---------------------------------------------------------------------------
// Chart grid (central panel)
// ---------------------------------------------------------------------------

fn format_time(seconds: f64, pattern: &str) -> String {
    DateTime::from_timestamp(seconds.floor() as i64, 0)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_default()
}

/// Render every chart in the central panel.
pub fn chart_grid(ui: &mut Ui, state: &AppState) {
    if state.series.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            let text = if state.loading {
                "Loading…"
            } else {
                "Enter sources above and press Load  (or File → Open…)"
            };
            ui.heading(text);
        });
        return;
    }

    eframe::egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for spec in &CHARTS {
                ui.heading(spec.title);
                if let Some(summary) = state.summaries.get(spec.id) {
                    ui.label(RichText::new(summary).monospace());
                }

                match state.chart_status.get(spec.id) {
                    Some(ChartStatus::Rendered) => {
                        if let Some(model) = state.registry.get(spec.id) {
                            draw_chart(ui, spec.id, model);
                        }
                    }
                    Some(ChartStatus::Empty) => {
                        empty_state(ui, RichText::new("No numeric data").weak());
                    }
                    Some(ChartStatus::Failed(msg)) => {
                        empty_state(ui, RichText::new(msg).color(Color32::RED));
                    }
                    None => {}
                }
                ui.separator();
            }
        });
}

fn empty_state(ui: &mut Ui, text: RichText) {
    ui.allocate_ui(
        eframe::egui::vec2(ui.available_width(), CHART_HEIGHT / 3.0),
        |ui: &mut Ui| {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(text);
            });
        },
    );
}

fn draw_chart(ui: &mut Ui, chart_id: &str, model: &PlotModel) {
    Plot::new(format!("chart_{chart_id}"))
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(model.y_label.as_str())
        .x_axis_formatter(|mark, _range| format_time(mark.value, "%m-%d %H:%M"))
        .label_formatter(|name, point| {
            let when = format_time(point.x, "%Y-%m-%d %H:%M:%S");
            if name.is_empty() {
                when
            } else {
                format!("{name}\n{when}\n{:.2}", point.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for line in &model.lines {
                let points: PlotPoints = line.points.iter().copied().collect();
                let width = if line.smoothed { 2.5 } else { 1.0 };
                plot_ui.line(
                    Line::new(points)
                        .name(&line.name)
                        .color(line.color)
                        .width(width),
                );
            }
        });
}
