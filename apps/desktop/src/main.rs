//! Headless walkthrough of the tracker workflow, for demoing the controller
//! without a display. Reads each issued code straight back from the session,
//! which is exactly what the simulated customer gate permits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::SetupPhase;
use tracker_core::{FilePhotoSource, FixedLocationProvider, RandomCodeIssuer, WorkflowSession};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    vendor_name: String,
    /// Venue photo submitted at check-in.
    #[arg(long)]
    check_in_photo: PathBuf,
    #[arg(long)]
    pre_photo: PathBuf,
    #[arg(long)]
    post_photo: PathBuf,
    /// Venue coordinates reported for the check-in geotag.
    #[arg(long, default_value_t = 13.7563)]
    latitude: f64,
    #[arg(long, default_value_t = 100.5018)]
    longitude: f64,
    #[arg(long, default_value = "")]
    pre_notes: String,
    #[arg(long, default_value = "")]
    post_notes: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    tracing::info!(
        latitude = args.latitude,
        longitude = args.longitude,
        "starting headless tracker walkthrough"
    );

    let mut session = WorkflowSession::new(
        Arc::new(FixedLocationProvider::new(args.latitude, args.longitude)),
        Arc::new(FilePhotoSource),
        Arc::new(RandomCodeIssuer),
    );

    session.submit_login(&args.vendor_name)?;
    println!("Signed in; assignment started for {}", args.vendor_name.trim());

    session.check_in(&args.check_in_photo).await?;
    let start_code = active_code(&session)?;
    println!("Checked in; customer start code is {start_code}");
    session.submit_code(&start_code)?;
    println!("Event start verified");

    session
        .attach_setup_photo(SetupPhase::Pre, &args.pre_photo)
        .await?;
    if !args.pre_notes.is_empty() {
        session.set_setup_notes(SetupPhase::Pre, args.pre_notes.clone())?;
    }
    session
        .attach_setup_photo(SetupPhase::Post, &args.post_photo)
        .await?;
    if !args.post_notes.is_empty() {
        session.set_setup_notes(SetupPhase::Post, args.post_notes.clone())?;
    }
    session.finish_setup()?;
    let completion_code = active_code(&session)?;
    println!("Setup documented; customer completion code is {completion_code}");
    session.submit_code(&completion_code)?;

    let summary = session
        .summary()
        .context("workflow completed without a summary")?;
    println!("Event completed for {}", summary.vendor_id);
    println!("  Check-in: {}", summary.checked_in_at.to_rfc3339());
    println!(
        "  Location: {:.4}, {:.4}",
        summary.location.latitude, summary.location.longitude
    );
    println!("  Duration: {} mins", summary.duration_minutes);
    Ok(())
}

fn active_code(session: &WorkflowSession) -> Result<String> {
    Ok(session
        .active_code()
        .context("no active verification code")?
        .to_string())
}
