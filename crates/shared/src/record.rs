use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{EncodedPhoto, GeoFix, SetupPhase};

/// Arrival evidence captured exactly once, at successful check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRecord {
    pub photo: EncodedPhoto,
    pub location: GeoFix,
    pub timestamp: DateTime<Utc>,
}

/// Pre/post documentation of the setup phase. Photos are write-once per
/// session; notes may be rewritten freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupRecord {
    pub pre_photo: Option<EncodedPhoto>,
    pub pre_notes: String,
    pub post_photo: Option<EncodedPhoto>,
    pub post_notes: String,
}

impl SetupRecord {
    pub fn photo(&self, phase: SetupPhase) -> Option<&EncodedPhoto> {
        match phase {
            SetupPhase::Pre => self.pre_photo.as_ref(),
            SetupPhase::Post => self.post_photo.as_ref(),
        }
    }

    pub fn notes(&self, phase: SetupPhase) -> &str {
        match phase {
            SetupPhase::Pre => &self.pre_notes,
            SetupPhase::Post => &self.post_notes,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pre_photo.is_some() && self.post_photo.is_some()
    }
}

/// Everything accumulated for one assignment. Created at login, discarded on
/// reset; nothing outlives the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub vendor_id: String,
    pub check_in: Option<CheckInRecord>,
    pub setup: SetupRecord,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl EventRecord {
    pub fn new(vendor_id: impl Into<String>) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            check_in: None,
            setup: SetupRecord::default(),
            start_time: None,
            end_time: None,
        }
    }

    /// Whole minutes between start and end confirmation, rounded to nearest.
    /// Available only after both timestamps exist.
    pub fn duration_minutes(&self) -> Option<i64> {
        let (start, end) = (self.start_time?, self.end_time?);
        let seconds = (end - start).num_seconds();
        Some((seconds + 30).div_euclid(60))
    }
}

/// Closing view of a completed assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub vendor_id: String,
    pub checked_in_at: DateTime<Utc>,
    pub location: GeoFix,
    pub duration_minutes: i64,
}
