mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

use backend_bridge::commands::BackendCommand;
use backend_bridge::runtime::VenuePosition;
use controller::events::UiEvent;
use ui::TrackerApp;

/// Desktop shell for the vendor event tracker. Desktop machines have no GPS,
/// so the venue position is configured at launch.
#[derive(Parser, Debug)]
struct Args {
    /// Latitude reported for the check-in geotag.
    #[arg(long, default_value_t = 13.7563)]
    latitude: f64,
    /// Longitude reported for the check-in geotag.
    #[arg(long, default_value_t = 100.5018)]
    longitude: f64,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    backend_bridge::runtime::launch(
        cmd_rx,
        ui_tx,
        VenuePosition {
            latitude: args.latitude,
            longitude: args.longitude,
        },
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Zappy Vendor Tracker")
            .with_inner_size([480.0, 760.0])
            .with_min_inner_size([400.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Zappy Vendor Tracker",
        options,
        Box::new(|_cc| Ok(Box::new(TrackerApp::new(cmd_tx, ui_rx)))),
    )
}
