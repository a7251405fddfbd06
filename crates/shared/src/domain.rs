use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The six stations of an on-site assignment, in the order a vendor walks
/// through them. Progression is forward-only; the only backwards move is a
/// full reset to `Login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    Login,
    CheckIn,
    OtpStart,
    Setup,
    OtpComplete,
    Summary,
}

impl WorkflowStep {
    pub fn title(self) -> &'static str {
        match self {
            WorkflowStep::Login => "Sign In",
            WorkflowStep::CheckIn => "1. Check-In",
            WorkflowStep::OtpStart => "2. Start Event",
            WorkflowStep::Setup => "3. Progress",
            WorkflowStep::OtpComplete => "4. Closing",
            WorkflowStep::Summary => "Success",
        }
    }

    /// Position within the four tracked stations (1..=4), or `None` for the
    /// sign-in and summary views where no progress indicator is shown.
    pub fn progress_position(self) -> Option<u8> {
        match self {
            WorkflowStep::Login | WorkflowStep::Summary => None,
            WorkflowStep::CheckIn => Some(1),
            WorkflowStep::OtpStart => Some(2),
            WorkflowStep::Setup => Some(3),
            WorkflowStep::OtpComplete => Some(4),
        }
    }

}

/// Which half of the setup documentation a photo or note belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupPhase {
    Pre,
    Post,
}

impl SetupPhase {
    pub fn label(self) -> &'static str {
        match self {
            SetupPhase::Pre => "pre-setup",
            SetupPhase::Post => "post-setup",
        }
    }
}

/// A device location read at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[error("failed to decode photo payload: {0}")]
pub struct PhotoDecodeError(#[from] base64::DecodeError);

/// An image held in memory as base64 with its guessed MIME type, the
/// embeddable form the workflow stores instead of raw file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPhoto {
    mime: String,
    payload: String,
}

impl EncodedPhoto {
    pub fn from_bytes(mime: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime: mime.into(),
            payload: STANDARD.encode(bytes),
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn payload_base64(&self) -> &str {
        &self.payload
    }

    /// `data:<mime>;base64,<payload>` form for embedding in a view.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.payload)
    }

    /// Original bytes, for preview rendering.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, PhotoDecodeError> {
        Ok(STANDARD.decode(&self.payload)?)
    }
}

/// 4-digit verification code shown to the vendor as a simulated customer
/// approval gate. Compared for equality only; carries no expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimeCode(String);

impl OneTimeCode {
    pub const DIGITS: usize = 4;

    /// Accepts exactly four ASCII digits.
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        if code.len() == Self::DIGITS && code.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(code))
        } else {
            None
        }
    }

    /// Zero-padded 4-digit code from any number; values wrap at 10_000.
    pub fn from_numeric(n: u32) -> Self {
        Self(format!("{:04}", n % 10_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, input: &str) -> bool {
        self.0 == input
    }
}

impl std::fmt::Display for OneTimeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
