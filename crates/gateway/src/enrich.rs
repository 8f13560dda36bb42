//! Alert view models with medical context
//!
//! Pure read/transform: enrichment never mutates the alert. Medical fields
//! are attached only for entitled viewers of non-anonymous alerts, and a
//! profile-store failure degrades that alert's medical context to
//! "unavailable" instead of failing the whole read.

#![warn(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use siren_domain::{
    Actor, Alert, AlertId, AlertStatus, AssignedStation, AssignedUnit, GeoPoint,
    IncidentCategory, MedicalProfile, WireTimestamp,
};
use tracing::warn;

use crate::profile::MedicalProfileStore;

/// Maximum identifiers one batched profile-lookup predicate may carry
pub const MAX_LOOKUP_BATCH: usize = 10;

/// Medical context attached to an alert view
///
/// `Omitted` means the viewer is not entitled or no profile applies; fields
/// are left out entirely, never substituted with defaults that could pass
/// for real data. `Unavailable` means the profile store failed; the alert is
/// still shown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MedicalContext {
    /// No medical data applies to this view
    Omitted,
    /// The profile store could not be reached
    Unavailable,
    /// The reporter's profile
    Present {
        /// Profile record
        profile: MedicalProfile,
    },
}

/// An alert joined with its medical context, safe for the display tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertView {
    /// Alert identifier
    pub id: AlertId,
    /// Reporter identifier, absent for anonymous reports
    pub reporter_id: Option<String>,
    /// Creation time in the transportable wire form
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
    /// Medical context for the requesting viewer
    pub medical: MedicalContext,
}

impl AlertView {
    fn from_alert(alert: &Alert, medical: MedicalContext) -> Self {
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
            medical,
        }
    }
}

/// Joins alerts with reporter medical profiles for authorized viewers
pub struct EnrichmentGateway {
    profiles: Arc<dyn MedicalProfileStore>,
}

impl EnrichmentGateway {
    /// Create a gateway over the given profile store
    pub fn new(profiles: Arc<dyn MedicalProfileStore>) -> Self {
        Self { profiles }
    }

    /// Enrich a single alert for the given viewer
    pub fn enrich(&self, alert: &Alert, viewer: &Actor) -> AlertView {
        let Some(reporter_id) = entitled_reporter(alert, viewer) else {
            return AlertView::from_alert(alert, MedicalContext::Omitted);
        };

        let medical = match self.profiles.get(reporter_id) {
            Ok(Some(profile)) => MedicalContext::Present { profile },
            Ok(None) => MedicalContext::Omitted,
            Err(e) => {
                warn!(alert = %alert.id, error = %e, "profile lookup failed, degrading");
                MedicalContext::Unavailable
            }
        };
        AlertView::from_alert(alert, medical)
    }

    /// Enrich a collection with batched profile lookups
    ///
    /// Entitled reporter identifiers are deduplicated and chunked into
    /// groups of at most [`MAX_LOOKUP_BATCH`], respecting the store's
    /// predicate ceiling; per-alert lookups would not scale past it.
    pub fn enrich_all(&self, alerts: &[Alert], viewer: &Actor) -> Vec<AlertView> {
        let mut wanted: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for alert in alerts {
            if let Some(reporter_id) = entitled_reporter(alert, viewer) {
                if seen.insert(reporter_id) {
                    wanted.push(reporter_id.to_string());
                }
            }
        }

        let mut found: HashMap<String, MedicalProfile> = HashMap::new();
        let mut failed: HashSet<String> = HashSet::new();
        for chunk in wanted.chunks(MAX_LOOKUP_BATCH) {
            match self.profiles.get_many(chunk) {
                Ok(profiles) => found.extend(profiles),
                Err(e) => {
                    warn!(error = %e, ids = chunk.len(), "batched profile lookup failed");
                    failed.extend(chunk.iter().cloned());
                }
            }
        }

        alerts
            .iter()
            .map(|alert| {
                let medical = match entitled_reporter(alert, viewer) {
                    None => MedicalContext::Omitted,
                    Some(reporter_id) if failed.contains(reporter_id) => {
                        MedicalContext::Unavailable
                    }
                    Some(reporter_id) => match found.get(reporter_id) {
                        Some(profile) => {
                            MedicalContext::Present { profile: profile.clone() }
                        }
                        None => MedicalContext::Omitted,
                    },
                };
                AlertView::from_alert(alert, medical)
            })
            .collect()
    }
}

/// The reporter identifier to look up, if this viewer may see medical data
///
/// Anonymous alerts never expose medical data, even when a profile exists
/// for a reporter identifier the record still carries.
fn entitled_reporter<'a>(alert: &'a Alert, viewer: &Actor) -> Option<&'a str> {
    if alert.anonymous {
        return None;
    }
    let reporter_id = alert.reporter_id.as_deref()?;
    let entitled = match viewer {
        Actor::Dispatch { .. } => true,
        Actor::Unit { unit_id } => alert.is_assigned_to_unit(unit_id),
        Actor::Reporter { reporter_id: viewer_id } => {
            viewer_id.as_deref() == Some(reporter_id)
        }
    };
    entitled.then_some(reporter_id)
}
