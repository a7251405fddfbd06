//! Backend worker thread: owns the workflow session and services UI commands.
//!
//! Each command maps to exactly one controller operation; the worker answers
//! every success with a fresh [`SessionSnapshot`] and every refusal with a
//! categorized [`UiError`]. The UI disables the triggering control while a
//! command is in flight, so at most one async operation is outstanding.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use tracker_core::{FilePhotoSource, FixedLocationProvider, RandomCodeIssuer, WorkflowSession};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Venue coordinates the worker reports for check-ins; desktop builds have
/// no positioning hardware, so the shell configures them at startup.
#[derive(Debug, Clone, Copy)]
pub struct VenuePosition {
    pub latitude: f64,
    pub longitude: f64,
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, venue: VenuePosition) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut session = WorkflowSession::new(
                Arc::new(FixedLocationProvider::new(venue.latitude, venue.longitude)),
                Arc::new(FilePhotoSource),
                Arc::new(RandomCodeIssuer),
            );
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));
            let _ = ui_tx.try_send(UiEvent::SessionUpdated(session.snapshot()));

            while let Ok(cmd) = cmd_rx.recv() {
                let outcome = match cmd {
                    BackendCommand::SubmitLogin { name } => session
                        .submit_login(&name)
                        .map_err(|err| UiError::from_workflow(UiErrorContext::Login, &err)),
                    BackendCommand::CheckIn { photo_path } => session
                        .check_in(&photo_path)
                        .await
                        .map_err(|err| UiError::from_workflow(UiErrorContext::CheckIn, &err)),
                    BackendCommand::SubmitCode { input } => session
                        .submit_code(&input)
                        .map_err(|err| UiError::from_workflow(UiErrorContext::Verification, &err)),
                    BackendCommand::AttachSetupPhoto { phase, photo_path } => session
                        .attach_setup_photo(phase, &photo_path)
                        .await
                        .map_err(|err| UiError::from_workflow(UiErrorContext::Setup, &err)),
                    BackendCommand::SetSetupNotes { phase, text } => session
                        .set_setup_notes(phase, text)
                        .map_err(|err| UiError::from_workflow(UiErrorContext::Setup, &err)),
                    BackendCommand::FinishSetup => session
                        .finish_setup()
                        .map_err(|err| UiError::from_workflow(UiErrorContext::Setup, &err)),
                    BackendCommand::Reset => session
                        .reset()
                        .map_err(|err| UiError::from_workflow(UiErrorContext::General, &err)),
                };

                match outcome {
                    Ok(()) => {
                        let _ = ui_tx.try_send(UiEvent::SessionUpdated(session.snapshot()));
                    }
                    Err(ui_err) => {
                        tracing::warn!(message = ui_err.message(), "workflow command refused");
                        let _ = ui_tx.try_send(UiEvent::Error(ui_err));
                    }
                }
            }
        });
    });
}
