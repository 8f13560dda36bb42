//! Transport representation of alerts
//!
//! Native timestamps are not transportable across the client boundary, so an
//! alert crossing it travels as a [`WireAlert`] with its creation time
//! flattened into the two-field wire form. Reconstruction on the receiving
//! side is exact.

use serde::{Deserialize, Serialize};
use siren_domain::{
    Alert, AlertId, AlertStatus, AssignedStation, AssignedUnit, GeoPoint, IncidentCategory,
    WireTimestamp,
};

/// An alert as it crosses the server/client boundary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireAlert {
    /// Alert identifier
    pub id: AlertId,
    /// Reporter identifier, absent for anonymous reports
    pub reporter_id: Option<String>,
    /// Creation time in wire form
    pub created_at: WireTimestamp,
    /// Incident location
    pub location: GeoPoint,
    /// Incident category
    pub category: IncidentCategory,
    /// Current status
    pub status: AlertStatus,
    /// Assigned station pair
    pub station: Option<AssignedStation>,
    /// Assigned unit pair
    pub unit: Option<AssignedUnit>,
    /// Cancellation reason, present iff cancelled
    pub cancellation_reason: Option<String>,
    /// Anonymity flag
    pub anonymous: bool,
}

impl WireAlert {
    /// Reconstruct the native alert on the receiving side
    ///
    /// The store revision does not travel; a reconstructed record carries
    /// revision 0 and is read-only for clients anyway.
    pub fn into_alert(self) -> Option<Alert> {
        Some(Alert {
            id: self.id,
            reporter_id: self.reporter_id,
            created_at: self.created_at.to_datetime()?,
            location: self.location,
            category: self.category,
            status: self.status,
            station: self.station,
            unit: self.unit,
            cancellation_reason: self.cancellation_reason,
            anonymous: self.anonymous,
            revision: 0,
        })
    }
}

impl From<&Alert> for WireAlert {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            reporter_id: alert.reporter_id.clone(),
            created_at: WireTimestamp::from_datetime(alert.created_at),
            location: alert.location,
            category: alert.category,
            status: alert.status,
            station: alert.station.clone(),
            unit: alert.unit.clone(),
            cancellation_reason: alert.cancellation_reason.clone(),
            anonymous: alert.anonymous,
        }
    }
}
