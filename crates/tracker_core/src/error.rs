use shared::domain::{SetupPhase, WorkflowStep};
use thiserror::Error;

/// Everything a workflow operation can refuse with. All variants are
/// recoverable by retrying or by correcting the input; none poison the
/// session.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("vendor name must not be empty")]
    EmptyVendorName,
    #[error("{operation} is not available while the workflow is at {actual:?}")]
    StepMismatch {
        operation: &'static str,
        actual: WorkflowStep,
    },
    #[error("no active assignment record; sign in to begin")]
    NoActiveRecord,
    #[error("could not read device location: {0}")]
    Location(String),
    #[error("could not load photo: {0}")]
    Photo(String),
    #[error("no verification code has been issued yet")]
    NoActiveCode,
    #[error("invalid code; ask the customer to re-read it and try again")]
    CodeMismatch,
    #[error("the {} photo was already captured for this assignment", .0.label())]
    PhotoAlreadyCaptured(SetupPhase),
    #[error("both pre-setup and post-setup photos are required before handover")]
    SetupIncomplete,
}
