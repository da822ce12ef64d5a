use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::charts::CHARTS;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – range and smoothing controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Readings");
    ui.separator();

    let Some(series) = &state.series else {
        ui.label("No data loaded.");
        return;
    };

    let mut changed = false;
    let n_entries = series.len();
    let discarded = series.discarded;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.label(format!("{n_entries} entries"));
            if discarded > 0 {
                ui.label(
                    RichText::new(format!("{discarded} records without a valid timestamp"))
                        .color(Color32::YELLOW),
                );
            }
            ui.separator();

            // ---- Day range ----
            ui.strong("Time range");
            changed |= ui
                .checkbox(&mut state.range.enabled, "Limit to days")
                .changed();
            ui.add_enabled_ui(state.range.enabled, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("From");
                    ui.push_id("range_from", |ui: &mut Ui| {
                        changed |= ui.add(DatePickerButton::new(&mut state.range.from)).changed();
                    });
                });
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("To");
                    ui.push_id("range_to", |ui: &mut Ui| {
                        changed |= ui.add(DatePickerButton::new(&mut state.range.to)).changed();
                    });
                });
            });
            ui.separator();

            // ---- Smoothing per chart (collapsible) ----
            ui.strong("Moving average");
            for spec in &CHARTS {
                let Some(settings) = state.chart_settings.get_mut(spec.id) else {
                    continue;
                };
                egui::CollapsingHeader::new(RichText::new(spec.title).strong())
                    .id_salt(spec.id)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        changed |= ui
                            .checkbox(&mut settings.raw_passthrough, "Raw values only")
                            .changed();
                        ui.add_enabled_ui(!settings.raw_passthrough, |ui: &mut Ui| {
                            ui.horizontal(|ui: &mut Ui| {
                                ui.label("Window");
                                changed |= ui
                                    .add(DragValue::new(&mut settings.window).range(2..=120))
                                    .changed();
                            });
                        });
                    });
            }
        });

    if changed {
        state.rebuild_charts();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label("Sources");
        let response = ui.add(
            egui::TextEdit::singleline(&mut state.sources_input)
                .hint_text("readings.json, https://example.com/api/readings")
                .desired_width(420.0),
        );
        let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        if ui.button("Load").clicked() || submitted {
            let ctx = ui.ctx().clone();
            state.start_load(move || ctx.request_repaint());
        }

        if state.loading {
            ui.spinner();
        }

        ui.separator();

        if let Some(series) = &state.series {
            ui.label(format!("{} entries", series.len()));
        }

        if !state.skipped_sources.is_empty() {
            ui.label(
                RichText::new(format!("{} sources skipped", state.skipped_sources.len()))
                    .color(Color32::YELLOW),
            )
            .on_hover_text(state.skipped_sources.join("\n"));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open sensor readings")
        .add_filter("Supported files", &["json", "csv", "parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_files();

    if let Some(paths) = files {
        log::info!("Selected {} files", paths.len());
        state.add_sources(paths.iter().map(|p| p.display().to_string()));
    }
}
