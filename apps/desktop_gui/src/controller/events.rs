//! Backend-to-UI events and error modeling.

use tracker_core::{SessionSnapshot, WorkflowError};

pub enum UiEvent {
    Info(String),
    SessionUpdated(SessionSnapshot),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Location,
    Photo,
    Verification,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Login,
    CheckIn,
    Verification,
    Setup,
    General,
}

/// An inline, retryable error banner. Every workflow refusal is transient, so
/// the category only steers where and how the message is rendered.
#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_workflow(context: UiErrorContext, err: &WorkflowError) -> Self {
        let category = match err {
            WorkflowError::EmptyVendorName
            | WorkflowError::StepMismatch { .. }
            | WorkflowError::NoActiveRecord
            | WorkflowError::PhotoAlreadyCaptured(_)
            | WorkflowError::SetupIncomplete => UiErrorCategory::Validation,
            WorkflowError::Location(_) => UiErrorCategory::Location,
            WorkflowError::Photo(_) => UiErrorCategory::Photo,
            WorkflowError::NoActiveCode | WorkflowError::CodeMismatch => {
                UiErrorCategory::Verification
            }
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
