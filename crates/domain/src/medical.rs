//! Medical profile records
//!
//! Keyed by reporter identifier and owned by the reporting user. Read access
//! is gated by role and by the alert's anonymity flag; a profile is never
//! attached to an anonymous alert.

use serde::{Deserialize, Serialize};

/// Someone to call when the reporter cannot answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmergencyContact {
    /// Contact name
    pub name: String,
    /// Phone number, free-form
    pub phone: String,
    /// Relationship to the reporter
    pub relationship: String,
}

/// Medical context for a reporting user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalProfile {
    /// Owning reporter identifier
    pub reporter_id: String,
    /// Full legal name
    pub full_name: String,
    /// Blood type, e.g. "O-"
    pub blood_type: Option<String>,
    /// Age in years
    pub age: Option<u8>,
    /// Known conditions
    pub conditions: Vec<String>,
    /// Current medications
    pub medications: Vec<String>,
    /// Emergency contacts
    pub emergency_contacts: Vec<EmergencyContact>,
    /// Free-text notes
    pub notes: Option<String>,
}
