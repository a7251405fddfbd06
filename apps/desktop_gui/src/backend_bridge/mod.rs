//! Bridge between the UI thread and the backend worker owning the session.

pub mod commands;
pub mod runtime;
