use eframe::egui;

use crate::config::ViewerConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SensorPandaApp {
    pub state: AppState,
}

impl SensorPandaApp {
    /// Build the app and kick off a load when sources are preconfigured.
    pub fn new(ctx: &egui::Context, config: ViewerConfig) -> Self {
        let mut state = AppState::new(config);
        if !state.sources_input.trim().is_empty() {
            let ctx = ctx.clone();
            state.start_load(move || ctx.request_repaint());
        }
        Self { state }
    }
}

impl eframe::App for SensorPandaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_loads();

        // ---- Top panel: sources and status ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: range and smoothing ----
        egui::SidePanel::left("control_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_grid(ui, &self.state);
        });
    }
}
