//! Alert records and the status state machine vocabulary
//!
//! An [`Alert`] is one reported emergency incident. It is created once,
//! mutated only through the lifecycle operations, and never deleted.

#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic coordinate (latitude, longitude) in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

/// Opaque unique alert identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AlertId(pub Uuid);

impl AlertId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Incident category reported by the citizen client
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    /// Medical emergency
    Medical,
    /// Fire
    Fire,
    /// Traffic accident
    Traffic,
    /// Non-urgent assistance request
    Assist,
    /// Panic button press (no further detail)
    Panic,
}

/// Alert lifecycle status
///
/// `Resolved`, `Cancelled` and `PatientAttended` are terminal: no role may
/// transition an alert out of them. `PatientAttended` represents
/// scene-resolved-without-transport; an alert may end there without ever
/// reaching `Resolved`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    /// Reported, not yet assigned to a station/unit
    New,
    /// Station and unit assigned, unit not yet moving
    Assigned,
    /// Unit travelling to the incident
    EnRoute,
    /// Unit arrived at the incident location
    OnScene,
    /// Unit attending the patient on scene
    Attending,
    /// Patient being transported
    Transporting,
    /// Patient attended on scene, no transport (terminal)
    PatientAttended,
    /// Incident fully resolved (terminal)
    Resolved,
    /// Cancelled by the reporter or an operator (terminal)
    Cancelled,
}

impl AlertStatus {
    /// Every defined status, in lifecycle order
    pub const ALL: [AlertStatus; 9] = [
        AlertStatus::New,
        AlertStatus::Assigned,
        AlertStatus::EnRoute,
        AlertStatus::OnScene,
        AlertStatus::Attending,
        AlertStatus::Transporting,
        AlertStatus::PatientAttended,
        AlertStatus::Resolved,
        AlertStatus::Cancelled,
    ];

    /// The operational subset a field unit may set on its own mission
    pub const OPERATIONAL: [AlertStatus; 6] = [
        AlertStatus::EnRoute,
        AlertStatus::OnScene,
        AlertStatus::Attending,
        AlertStatus::Transporting,
        AlertStatus::PatientAttended,
        AlertStatus::Resolved,
    ];

    /// Whether this status admits no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AlertStatus::Resolved | AlertStatus::Cancelled | AlertStatus::PatientAttended
        )
    }

    /// Whether this status is in the field-unit operational subset
    pub fn is_operational(self) -> bool {
        Self::OPERATIONAL.contains(&self)
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertStatus::New => "new",
            AlertStatus::Assigned => "assigned",
            AlertStatus::EnRoute => "en_route",
            AlertStatus::OnScene => "on_scene",
            AlertStatus::Attending => "attending",
            AlertStatus::Transporting => "transporting",
            AlertStatus::PatientAttended => "patient_attended",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AlertStatus::ALL
            .into_iter()
            .find(|v| v.to_string() == s)
            .ok_or_else(|| format!("unknown alert status: {s}"))
    }
}

impl std::fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IncidentCategory::Medical => "medical",
            IncidentCategory::Fire => "fire",
            IncidentCategory::Traffic => "traffic",
            IncidentCategory::Assist => "assist",
            IncidentCategory::Panic => "panic",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for IncidentCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "medical" => Ok(IncidentCategory::Medical),
            "fire" => Ok(IncidentCategory::Fire),
            "traffic" => Ok(IncidentCategory::Traffic),
            "assist" => Ok(IncidentCategory::Assist),
            "panic" => Ok(IncidentCategory::Panic),
            other => Err(format!("unknown incident category: {other}")),
        }
    }
}

/// Station half of an assignment; identifier and display name travel together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignedStation {
    /// Station identifier
    pub id: String,
    /// Station display name
    pub name: String,
}

/// Unit half of an assignment; identifier and display name travel together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignedUnit {
    /// Unit identifier
    pub id: String,
    /// Unit display name
    pub name: String,
}

/// One reported emergency incident
///
/// The id/name pair invariant of the station and unit assignments is
/// structural: each pair is a single `Option` of a two-field struct, so the
/// halves cannot diverge. `revision` is the store's conditional-update token
/// and is bumped by exactly one on every applied mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    /// Unique identifier
    pub id: AlertId,
    /// Reporter identifier; `None` for anonymous reports
    pub reporter_id: Option<String>,
    /// Server-assigned creation time, immutable after creation
    pub created_at: DateTime<Utc>,
    /// Incident location
    pub location: GeoPoint,
    /// Incident category
    pub category: IncidentCategory,
    /// Current lifecycle status
    pub status: AlertStatus,
    /// Assigned station, if any
    pub station: Option<AssignedStation>,
    /// Assigned unit, if any
    pub unit: Option<AssignedUnit>,
    /// Reason supplied on cancellation; present iff `status == Cancelled`
    pub cancellation_reason: Option<String>,
    /// Whether the reporter chose to stay anonymous
    pub anonymous: bool,
    /// Store conditional-update token
    pub revision: u64,
}

impl Alert {
    /// Create a fresh alert in `New` status with a server-assigned timestamp
    pub fn new(
        reporter_id: Option<String>,
        location: GeoPoint,
        category: IncidentCategory,
        anonymous: bool,
    ) -> Self {
        Self {
            id: AlertId::new(),
            reporter_id,
            created_at: Utc::now(),
            location,
            category,
            status: AlertStatus::New,
            station: None,
            unit: None,
            cancellation_reason: None,
            anonymous,
            revision: 0,
        }
    }

    /// Whether this alert is currently assigned to the given unit
    pub fn is_assigned_to_unit(&self, unit_id: &str) -> bool {
        self.unit.as_ref().is_some_and(|u| u.id == unit_id)
    }

    /// Whether the alert is a unit's active mission: assigned and not terminal
    pub fn is_active_mission(&self) -> bool {
        self.unit.is_some() && !self.status.is_terminal()
    }
}
