//! Workflow controller for the vendor event tracker.
//!
//! A [`WorkflowSession`] owns the current [`WorkflowStep`] and the
//! [`EventRecord`] accumulated for one on-site assignment. Frontends feed it
//! user intents (sign-in, check-in, code entry, setup uploads) and render
//! from the [`SessionSnapshot`] it hands back; device capabilities (location,
//! photo files, code generation) enter through the traits defined here so the
//! controller stays testable without any hardware.

use std::{path::Path, sync::Arc};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{EncodedPhoto, GeoFix, OneTimeCode, SetupPhase, WorkflowStep},
    record::{CheckInRecord, EventRecord, EventSummary},
};
use tracing::{debug, info, warn};

pub mod error;

pub use error::WorkflowError;

/// Device geolocation capability. A read is single-shot and may fail
/// (permission denied, no fix); failure is surfaced to the vendor and the
/// check-in can simply be retried.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_fix(&self) -> Result<GeoFix>;
}

pub struct MissingLocationProvider;

#[async_trait]
impl LocationProvider for MissingLocationProvider {
    async fn current_fix(&self) -> Result<GeoFix> {
        Err(anyhow!(
            "device location capability is unavailable; enable GPS permissions and retry"
        ))
    }
}

/// Fixed coordinates standing in for a real positioning device. Desktop
/// builds have no GPS, so the shell configures the venue position up front.
pub struct FixedLocationProvider {
    latitude: f64,
    longitude: f64,
}

impl FixedLocationProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_fix(&self) -> Result<GeoFix> {
        Ok(GeoFix {
            latitude: self.latitude,
            longitude: self.longitude,
            captured_at: Utc::now(),
        })
    }
}

/// Turns a user-picked image file into the embeddable base64 form the record
/// stores.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn load(&self, path: &Path) -> Result<EncodedPhoto>;
}

pub struct MissingPhotoSource;

#[async_trait]
impl PhotoSource for MissingPhotoSource {
    async fn load(&self, path: &Path) -> Result<EncodedPhoto> {
        Err(anyhow!(
            "photo capture capability is unavailable (requested {})",
            path.display()
        ))
    }
}

/// Reads the picked file from disk and guesses its MIME type from the
/// extension.
pub struct FilePhotoSource;

#[async_trait]
impl PhotoSource for FilePhotoSource {
    async fn load(&self, path: &Path) -> Result<EncodedPhoto> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read photo file {}", path.display()))?;
        if bytes.is_empty() {
            return Err(anyhow!("photo file {} is empty", path.display()));
        }
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        Ok(EncodedPhoto::from_bytes(mime.essence_str(), &bytes))
    }
}

/// Source of the simulated 4-digit customer codes. Not a security mechanism;
/// the active code is shown to the vendor as the stand-in for a customer
/// phone delivery.
pub trait CodeIssuer: Send + Sync {
    fn issue(&self) -> OneTimeCode;
}

pub struct RandomCodeIssuer;

impl CodeIssuer for RandomCodeIssuer {
    fn issue(&self) -> OneTimeCode {
        OneTimeCode::from_numeric(fastrand::u32(..10_000))
    }
}

/// Cloneable view of the session for frontends; crosses the UI/worker
/// channel boundary as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub step: WorkflowStep,
    pub record: Option<EventRecord>,
    pub active_code: Option<OneTimeCode>,
    pub summary: Option<EventSummary>,
}

/// The finite-state workflow: `Login → CheckIn → OtpStart → Setup →
/// OtpComplete → Summary`, forward-only, with `reset` as the single way back.
///
/// Exactly one session is active at a time and nothing it captures survives a
/// reset. Operations invoked at the wrong step fail with
/// [`WorkflowError::StepMismatch`] and change nothing.
pub struct WorkflowSession {
    location: Arc<dyn LocationProvider>,
    photos: Arc<dyn PhotoSource>,
    codes: Arc<dyn CodeIssuer>,
    step: WorkflowStep,
    record: Option<EventRecord>,
    active_code: Option<OneTimeCode>,
}

impl WorkflowSession {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        photos: Arc<dyn PhotoSource>,
        codes: Arc<dyn CodeIssuer>,
    ) -> Self {
        Self {
            location,
            photos,
            codes,
            step: WorkflowStep::Login,
            record: None,
            active_code: None,
        }
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn record(&self) -> Option<&EventRecord> {
        self.record.as_ref()
    }

    /// The code the vendor must currently match, surfaced for the simulated
    /// "sent to the customer" display.
    pub fn active_code(&self) -> Option<&OneTimeCode> {
        self.active_code.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            step: self.step,
            record: self.record.clone(),
            active_code: self.active_code.clone(),
            summary: self.summary(),
        }
    }

    fn require_step(
        &self,
        expected: WorkflowStep,
        operation: &'static str,
    ) -> Result<(), WorkflowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WorkflowError::StepMismatch {
                operation,
                actual: self.step,
            })
        }
    }

    fn active_record(&mut self) -> Result<&mut EventRecord, WorkflowError> {
        self.record.as_mut().ok_or(WorkflowError::NoActiveRecord)
    }

    /// Sign-in with the vendor's display name. Whitespace-only names are
    /// rejected; a trimmed copy becomes the immutable vendor id for the rest
    /// of the session.
    pub fn submit_login(&mut self, name: &str) -> Result<(), WorkflowError> {
        self.require_step(WorkflowStep::Login, "sign-in")?;
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(WorkflowError::EmptyVendorName);
        }
        info!(vendor = trimmed, "vendor signed in, assignment started");
        self.record = Some(EventRecord::new(trimmed));
        self.step = WorkflowStep::CheckIn;
        Ok(())
    }

    /// Arrival check-in: read the device position, encode the venue photo,
    /// stamp the time, then issue the first customer code. The location read
    /// comes first so a denied permission aborts before any photo work; both
    /// failures leave the step unchanged for a retry.
    pub async fn check_in(&mut self, photo_path: &Path) -> Result<(), WorkflowError> {
        self.require_step(WorkflowStep::CheckIn, "check-in")?;
        let fix = self
            .location
            .current_fix()
            .await
            .map_err(|err| WorkflowError::Location(err.to_string()))?;
        let photo = self
            .photos
            .load(photo_path)
            .await
            .map_err(|err| WorkflowError::Photo(err.to_string()))?;

        let record = self.active_record()?;
        record.check_in = Some(CheckInRecord {
            photo,
            location: fix,
            timestamp: Utc::now(),
        });
        self.active_code = Some(self.codes.issue());
        self.step = WorkflowStep::OtpStart;
        info!(
            latitude = fix.latitude,
            longitude = fix.longitude,
            "checked in at venue, start code issued"
        );
        Ok(())
    }

    /// Customer code entry, shared by both verification gates. The input is
    /// compared against the active code after trimming surrounding
    /// whitespace; anything else must match exactly. A match at `OtpStart`
    /// stamps `start_time` and opens setup; a match at `OtpComplete` stamps
    /// `end_time` and closes the assignment. A mismatch changes nothing.
    pub fn submit_code(&mut self, input: &str) -> Result<(), WorkflowError> {
        let stage = match self.step {
            WorkflowStep::OtpStart | WorkflowStep::OtpComplete => self.step,
            actual => {
                return Err(WorkflowError::StepMismatch {
                    operation: "code verification",
                    actual,
                })
            }
        };
        let code = self.active_code.as_ref().ok_or(WorkflowError::NoActiveCode)?;
        if !code.matches(input.trim()) {
            warn!("verification code mismatch");
            return Err(WorkflowError::CodeMismatch);
        }

        let record = self.active_record()?;
        let now = Utc::now();
        self.step = match stage {
            WorkflowStep::OtpStart => {
                record.start_time = Some(now);
                info!("event start verified");
                WorkflowStep::Setup
            }
            _ => {
                record.end_time = Some(now);
                info!("event completion verified");
                WorkflowStep::Summary
            }
        };
        self.active_code = None;
        Ok(())
    }

    /// Stores a setup photo for the given phase. Each phase accepts exactly
    /// one photo per session.
    pub async fn attach_setup_photo(
        &mut self,
        phase: SetupPhase,
        path: &Path,
    ) -> Result<(), WorkflowError> {
        self.require_step(WorkflowStep::Setup, "setup photo upload")?;
        let photo = self
            .photos
            .load(path)
            .await
            .map_err(|err| WorkflowError::Photo(err.to_string()))?;

        let setup = &mut self.active_record()?.setup;
        let slot = match phase {
            SetupPhase::Pre => &mut setup.pre_photo,
            SetupPhase::Post => &mut setup.post_photo,
        };
        if slot.is_some() {
            return Err(WorkflowError::PhotoAlreadyCaptured(phase));
        }
        *slot = Some(photo);
        debug!(phase = phase.label(), "setup photo attached");
        Ok(())
    }

    /// Notes may be rewritten as often as the vendor edits them.
    pub fn set_setup_notes(
        &mut self,
        phase: SetupPhase,
        text: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        self.require_step(WorkflowStep::Setup, "setup notes")?;
        let setup = &mut self.active_record()?.setup;
        match phase {
            SetupPhase::Pre => setup.pre_notes = text.into(),
            SetupPhase::Post => setup.post_notes = text.into(),
        }
        Ok(())
    }

    /// Handover: requires both setup photos, then issues the closing code.
    pub fn finish_setup(&mut self) -> Result<(), WorkflowError> {
        self.require_step(WorkflowStep::Setup, "handover")?;
        let record = self.record.as_ref().ok_or(WorkflowError::NoActiveRecord)?;
        if !record.setup.is_complete() {
            return Err(WorkflowError::SetupIncomplete);
        }
        self.active_code = Some(self.codes.issue());
        self.step = WorkflowStep::OtpComplete;
        info!("setup documented, completion code issued");
        Ok(())
    }

    /// Discards the record and returns to sign-in. Serves the logout control
    /// on the middle steps and "start new assignment" on the summary view.
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        self.require_step_not_login("reset")?;
        info!("session reset, record discarded");
        self.record = None;
        self.active_code = None;
        self.step = WorkflowStep::Login;
        Ok(())
    }

    fn require_step_not_login(&self, operation: &'static str) -> Result<(), WorkflowError> {
        if self.step == WorkflowStep::Login {
            return Err(WorkflowError::StepMismatch {
                operation,
                actual: self.step,
            });
        }
        Ok(())
    }

    /// Closing summary, available once the completion code was confirmed.
    pub fn summary(&self) -> Option<EventSummary> {
        let record = self.record.as_ref()?;
        let check_in = record.check_in.as_ref()?;
        Some(EventSummary {
            vendor_id: record.vendor_id.clone(),
            checked_in_at: check_in.timestamp,
            location: check_in.location,
            duration_minutes: record.duration_minutes()?,
        })
    }
}

#[cfg(test)]
mod tests;
