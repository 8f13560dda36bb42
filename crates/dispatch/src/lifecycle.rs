//! Alert lifecycle operations
//!
//! Every mutation of an alert record flows through [`AlertLifecycle`]: it
//! validates the transition against the role-scoped allow-list, applies the
//! audit fields, and commits with a single conditional update. A lost race
//! surfaces as a conflict for exactly one of two concurrent writers; a
//! rejected mutation never changes the stored record.
//!
//! Applied mutations are published on the change bus; the realtime
//! distributor fans them out per subscription.

#![warn(missing_docs)]

use std::sync::Arc;

use siren_domain::{
    check_transition, Actor, Alert, AlertError, AlertId, AlertStatus, AssignedStation,
    AssignedUnit, GeoPoint, IncidentCategory, Result,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::resolver::{AssignmentResolver, Resolution};
use crate::store::{AlertStore, StoreError};

/// Default change bus capacity; slow subscribers past this resync via snapshot
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// A state change applied to one alert, as published on the change bus
#[derive(Debug, Clone)]
pub struct AlertChange {
    /// The alert after the change
    pub alert: Alert,
}

/// A citizen's incident submission
#[derive(Debug, Clone)]
pub struct SubmitAlert {
    /// Incident location
    pub location: GeoPoint,
    /// Incident category
    pub category: IncidentCategory,
    /// Whether the reporter chose anonymity
    pub anonymous: bool,
}

/// The multi-writer alert state machine
pub struct AlertLifecycle {
    store: Arc<dyn AlertStore>,
    resolver: AssignmentResolver,
    changes: broadcast::Sender<AlertChange>,
}

impl AlertLifecycle {
    /// Create a lifecycle over the given store and resolver
    pub fn new(store: Arc<dyn AlertStore>, resolver: AssignmentResolver) -> Self {
        Self::with_bus_capacity(store, resolver, DEFAULT_BUS_CAPACITY)
    }

    /// Create a lifecycle with an explicit change bus capacity
    pub fn with_bus_capacity(
        store: Arc<dyn AlertStore>,
        resolver: AssignmentResolver,
        capacity: usize,
    ) -> Self {
        let (changes, _) = broadcast::channel(capacity);
        Self { store, resolver, changes }
    }

    /// Subscribe to applied alert changes
    pub fn subscribe_changes(&self) -> broadcast::Receiver<AlertChange> {
        self.changes.subscribe()
    }

    /// Read access to the underlying store (snapshots, read paths)
    pub fn store(&self) -> &Arc<dyn AlertStore> {
        &self.store
    }

    /// Submit a new incident
    ///
    /// Creation and first assignment are one atomic step: when the resolver
    /// finds a station with an available unit the record is inserted already
    /// `assigned`; a station-only match records the station and leaves the
    /// alert `new` pending manual dispatch. Resolver failure never blocks
    /// creation; the alert is inserted unassigned and the condition logged.
    pub fn submit(&self, actor: &Actor, submission: SubmitAlert) -> Result<Alert> {
        let reporter_id = match actor {
            Actor::Reporter { reporter_id } => {
                if submission.anonymous {
                    None
                } else {
                    match reporter_id {
                        Some(id) => Some(id.clone()),
                        None => {
                            return Err(AlertError::Validation(
                                "a named report requires a reporter identifier".to_string(),
                            ))
                        }
                    }
                }
            }
            other => {
                warn!(actor = %other.audit_label(), "non-reporter submission denied");
                return Err(AlertError::Authorization(
                    "only reporting clients may submit alerts".to_string(),
                ));
            }
        };

        let mut alert = Alert::new(
            reporter_id,
            submission.location,
            submission.category,
            submission.anonymous,
        );

        match self.resolver.resolve(submission.location) {
            Ok(Resolution::Assigned { station, unit }) => {
                alert.station = Some(AssignedStation { id: station.id, name: station.name });
                alert.unit = Some(AssignedUnit { id: unit.id, name: unit.name });
                alert.status = AlertStatus::Assigned;
            }
            Ok(Resolution::StationOnly { station }) => {
                info!(alert = %alert.id, station = %station.id,
                    "no available unit at nearest station, pending manual dispatch");
                alert.station = Some(AssignedStation { id: station.id, name: station.name });
            }
            Ok(Resolution::NoStations) => {
                warn!(alert = %alert.id, "no stations configured, alert left unassigned");
            }
            Err(e) => {
                warn!(alert = %alert.id, error = %e,
                    "assignment resolution failed, alert left unassigned");
            }
        }

        self.store.insert(&alert).map_err(map_store_error)?;
        info!(alert = %alert.id, status = %alert.status, actor = %actor.audit_label(),
            "alert created");
        self.publish(&alert);
        Ok(alert)
    }

    /// Cancel an alert with a reason
    pub fn cancel(&self, actor: &Actor, id: AlertId, reason: &str) -> Result<Alert> {
        self.update_status(actor, id, AlertStatus::Cancelled, Some(reason))
    }

    /// Apply a status transition on behalf of an actor
    ///
    /// Single conditional-update attempt: a concurrent writer that moved the
    /// record first wins, and this caller receives a conflict. No automatic
    /// retry; a blind retry of a lost transition would be unsafe.
    pub fn update_status(
        &self,
        actor: &Actor,
        id: AlertId,
        target: AlertStatus,
        reason: Option<&str>,
    ) -> Result<Alert> {
        let alert = self.load(id)?;

        if let Err(e) = check_transition(actor, &alert, target, reason) {
            if e.kind() == siren_domain::ErrorKind::Authorization {
                // Denials are audit events, not just client feedback.
                warn!(alert = %id, actor = %actor.audit_label(), target = %target,
                    "transition denied");
            }
            return Err(e);
        }

        let mut updated = alert.clone();
        updated.status = target;
        if target == AlertStatus::Cancelled {
            updated.cancellation_reason = reason.map(str::to_string);
        }
        updated.revision = alert.revision + 1;

        self.commit(&updated, alert.revision)?;
        info!(alert = %id, from = %alert.status, to = %target,
            actor = %actor.audit_label(), "status updated");
        Ok(updated)
    }

    /// Assign a station/unit pair to an alert (dispatch-only sub-operation)
    ///
    /// Sets both id/name pairs and the `assigned` status in one conditional
    /// update. The station and unit must still exist in the fleet directory;
    /// a vanished referent is a dispatch-blocked condition.
    pub fn assign(
        &self,
        actor: &Actor,
        id: AlertId,
        station_id: &str,
        unit_id: &str,
    ) -> Result<Alert> {
        if !actor.is_dispatch() {
            warn!(alert = %id, actor = %actor.audit_label(), "assignment denied");
            return Err(AlertError::Authorization(
                "only dispatch may assign stations and units".to_string(),
            ));
        }

        let alert = self.load(id)?;
        if alert.status.is_terminal() {
            return Err(AlertError::Conflict(format!(
                "alert {id} is already {}",
                alert.status
            )));
        }

        let directory = self.resolver.directory();
        let station = directory
            .station(station_id)
            .map_err(|e| AlertError::Upstream(e.to_string()))?
            .ok_or_else(|| AlertError::NotFound(format!("station {station_id}")))?;
        let unit = directory
            .unit(unit_id)
            .map_err(|e| AlertError::Upstream(e.to_string()))?
            .ok_or_else(|| AlertError::NotFound(format!("unit {unit_id}")))?;
        if unit.station_id != station.id {
            return Err(AlertError::Validation(format!(
                "unit {} belongs to station {}, not {}",
                unit.id, unit.station_id, station.id
            )));
        }

        let mut updated = alert.clone();
        updated.station = Some(AssignedStation { id: station.id, name: station.name });
        updated.unit = Some(AssignedUnit { id: unit.id, name: unit.name });
        updated.status = AlertStatus::Assigned;
        updated.revision = alert.revision + 1;

        self.commit(&updated, alert.revision)?;
        info!(alert = %id, station = %station_id, unit = %unit_id,
            actor = %actor.audit_label(), "alert assigned");
        Ok(updated)
    }

    fn load(&self, id: AlertId) -> Result<Alert> {
        self.store
            .get(id)
            .map_err(map_store_error)?
            .ok_or_else(|| AlertError::NotFound(format!("alert {id}")))
    }

    fn commit(&self, updated: &Alert, expected_revision: u64) -> Result<()> {
        match self.store.update_if(updated, expected_revision) {
            Ok(()) => {
                self.publish(updated);
                Ok(())
            }
            Err(e) => Err(map_store_error(e)),
        }
    }

    fn publish(&self, alert: &Alert) {
        // No receivers is fine; subscriptions come and go.
        let _ = self.changes.send(AlertChange { alert: alert.clone() });
    }
}

fn map_store_error(e: StoreError) -> AlertError {
    match e {
        StoreError::NotFound(id) => AlertError::NotFound(format!("alert {id}")),
        StoreError::RevisionMismatch { id, .. } => {
            AlertError::Conflict(format!("alert {id} was changed concurrently"))
        }
        StoreError::Duplicate(id) => AlertError::Conflict(format!("alert {id} already exists")),
        StoreError::Database(e) => AlertError::Upstream(format!("alert store: {e}")),
        StoreError::Corrupt { id, detail } => {
            AlertError::Upstream(format!("alert store record {id}: {detail}"))
        }
    }
}
