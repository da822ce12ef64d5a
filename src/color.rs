use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::MetricName;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize, lightness: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, lightness);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Metric colours
// ---------------------------------------------------------------------------

/// Fixed colour per metric, so a metric looks the same on every chart and
/// across loads. Smoothed lines use a darker shade of the same hue.
#[derive(Debug, Clone)]
pub struct MetricColors {
    raw: BTreeMap<MetricName, Color32>,
    smoothed: BTreeMap<MetricName, Color32>,
}

impl Default for MetricColors {
    fn default() -> Self {
        let n = MetricName::ALL.len();
        let raw = MetricName::ALL
            .into_iter()
            .zip(generate_palette(n, 0.65))
            .collect();
        let smoothed = MetricName::ALL
            .into_iter()
            .zip(generate_palette(n, 0.40))
            .collect();
        Self { raw, smoothed }
    }
}

impl MetricColors {
    pub fn raw(&self, metric: MetricName) -> Color32 {
        self.raw.get(&metric).copied().unwrap_or(Color32::GRAY)
    }

    pub fn smoothed(&self, metric: MetricName) -> Color32 {
        self.smoothed
            .get(&metric)
            .copied()
            .unwrap_or(Color32::DARK_GRAY)
    }
}
