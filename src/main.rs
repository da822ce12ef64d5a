mod app;
mod charts;
mod color;
mod config;
mod data;
mod present;
mod state;
mod ui;

use app::SensorPandaApp;
use config::ViewerConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let mut config = ViewerConfig::load().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {e:#}");
        ViewerConfig::default()
    });

    // Sources on the command line replace the configured ones.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        config.default_sources = args;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Sensor Panda – Air Quality Viewer",
        options,
        Box::new(|cc| Ok(Box::new(SensorPandaApp::new(&cc.egui_ctx, config)))),
    )
}
