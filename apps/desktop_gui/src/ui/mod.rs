//! egui views for the tracker workflow.

pub mod app;

pub use app::TrackerApp;
