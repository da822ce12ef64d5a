/// egui front end: toolbar and control panel, plus the chart grid.
pub mod panels;
pub mod plot;
