//! Command orchestration helpers from UI actions to the backend queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = match &cmd {
        BackendCommand::SubmitLogin { .. } => "submit_login",
        BackendCommand::CheckIn { .. } => "check_in",
        BackendCommand::SubmitCode { .. } => "submit_code",
        BackendCommand::AttachSetupPhoto { .. } => "attach_setup_photo",
        BackendCommand::SetSetupNotes { .. } => "set_setup_notes",
        BackendCommand::FinishSetup => "finish_setup",
        BackendCommand::Reset => "reset",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
        }
    }
}
