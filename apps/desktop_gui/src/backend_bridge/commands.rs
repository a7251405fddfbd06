//! Commands queued from the UI to the backend worker.

use shared::domain::SetupPhase;
use std::path::PathBuf;

pub enum BackendCommand {
    SubmitLogin {
        name: String,
    },
    CheckIn {
        photo_path: PathBuf,
    },
    SubmitCode {
        input: String,
    },
    AttachSetupPhoto {
        phase: SetupPhase,
        photo_path: PathBuf,
    },
    SetSetupNotes {
        phase: SetupPhase,
        text: String,
    },
    FinishSetup,
    Reset,
}
