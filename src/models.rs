use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Closed set of lifecycle states a lead may occupy.
///
/// There is deliberately no transition graph: any state may follow any other,
/// so staff can correct mis-clicks or reopen cancelled leads without an
/// escape hatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    Contacted,
    Booked,
    Cancelled,
    Archived,
}

impl LeadStatus {
    /// All states, in board-column order.
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Booked,
        LeadStatus::Cancelled,
        LeadStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Booked => "Booked",
            LeadStatus::Cancelled => "Cancelled",
            LeadStatus::Archived => "Archived",
        }
    }

    /// Parse a stored status string. Returns `None` for anything outside the
    /// closed set; callers decide how to degrade.
    pub fn parse(s: &str) -> Option<LeadStatus> {
        match s {
            "New" => Some(LeadStatus::New),
            "Contacted" => Some(LeadStatus::Contacted),
            "Booked" => Some(LeadStatus::Booked),
            "Cancelled" => Some(LeadStatus::Cancelled),
            "Archived" => Some(LeadStatus::Archived),
            _ => None,
        }
    }

    /// Read-side label for a stored status value.
    ///
    /// The intake pipeline guarantees `New` only at creation time; a null or
    /// unrecognized value read back later (out-of-band write, corruption)
    /// must render as "Unknown" rather than crashing or silently defaulting.
    pub fn label(stored: Option<&str>) -> &'static str {
        stored
            .and_then(LeadStatus::parse)
            .map(|s| s.as_str())
            .unwrap_or("Unknown")
    }
}

/// A stored lead row, exactly as persisted.
///
/// `status` stays a raw nullable string here: the row must round-trip values
/// this system did not write, and label resolution happens at the read
/// surface via [`LeadStatus::label`].
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub patient_name: Option<String>,
    pub phone_number: Option<String>,
    pub dob: Option<String>,
    pub pain_reason: Option<String>,
    pub insurance: Option<String>,
    pub location: Option<String>,
    pub scheduling_prefs: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl Lead {
    pub fn status_label(&self) -> &'static str {
        LeadStatus::label(self.status.as_deref())
    }
}

/// Canonical creation record emitted by the intake pipeline.
///
/// Required fields are owned non-empty strings by construction; every
/// optional field is either `None` or a trimmed non-empty string, never "".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub patient_name: String,
    pub phone_number: String,
    pub dob: Option<String>,
    pub pain_reason: Option<String>,
    pub insurance: Option<String>,
    pub location: Option<String>,
    pub scheduling_prefs: Option<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
}

/// Deserializes a field into the present half of the tri-state: a key that is
/// present deserializes to `Some(inner)` where `inner` keeps the null/value
/// distinction. Absent keys never reach this function and stay `None` via
/// `#[serde(default)]`.
fn tri_state<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Sparse partial update for a lead.
///
/// Every recognized field is tri-state: `None` means the key was not sent
/// (leave the stored value untouched), `Some(None)` means the key was sent as
/// JSON null (explicitly clear the field), `Some(Some(v))` sets a value. The
/// presence test is structural, never a truthiness check on the value.
/// Unrecognized keys are ignored, not rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadPatch {
    #[serde(default, deserialize_with = "tri_state")]
    pub patient_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub dob: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub pain_reason: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub insurance: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub scheduling_prefs: Option<Option<String>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub status: Option<Option<LeadStatus>>,
    #[serde(default, deserialize_with = "tri_state")]
    pub notes: Option<Option<String>>,
}

impl LeadPatch {
    /// True when no recognized key was present in the request.
    pub fn is_empty(&self) -> bool {
        self.patient_name.is_none()
            && self.phone_number.is_none()
            && self.dob.is_none()
            && self.pain_reason.is_none()
            && self.insurance.is_none()
            && self.location.is_none()
            && self.scheduling_prefs.is_none()
            && self.status.is_none()
            && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_round_trips_all_variants() {
        for status in LeadStatus::ALL {
            assert_eq!(LeadStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn status_label_degrades_to_unknown() {
        assert_eq!(LeadStatus::label(None), "Unknown");
        assert_eq!(LeadStatus::label(Some("Closed-Won")), "Unknown");
        assert_eq!(LeadStatus::label(Some("new")), "Unknown");
        assert_eq!(LeadStatus::label(Some("Booked")), "Booked");
    }

    #[test]
    fn empty_patch_has_no_present_keys() {
        let patch: LeadPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
        assert!(patch.status.is_none());
        assert!(patch.notes.is_none());
    }

    #[test]
    fn explicit_null_differs_from_absent() {
        let cleared: LeadPatch = serde_json::from_str(r#"{"status": null}"#).unwrap();
        assert_eq!(cleared.status, Some(None));
        assert!(!cleared.is_empty());

        let omitted: LeadPatch = serde_json::from_str(r#"{"notes": "call back"}"#).unwrap();
        assert_eq!(omitted.status, None);
        assert_eq!(omitted.notes, Some(Some("call back".to_string())));
    }

    #[test]
    fn status_value_is_typed() {
        let patch: LeadPatch = serde_json::from_str(r#"{"status": "Booked"}"#).unwrap();
        assert_eq!(patch.status, Some(Some(LeadStatus::Booked)));

        // Outside the closed set: rejected at deserialization, not stored
        let bad: Result<LeadPatch, _> = serde_json::from_str(r#"{"status": "Reopened"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let patch: LeadPatch =
            serde_json::from_str(r#"{"notes": "x", "paitent_name": "typo", "priority": 3}"#)
                .unwrap();
        assert_eq!(patch.notes, Some(Some("x".to_string())));
        assert!(patch.patient_name.is_none());
    }
}
