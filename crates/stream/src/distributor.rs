//! Per-subscriber fan-out of alert changes
//!
//! One tokio task per live subscription. The task registers on the change
//! bus before snapshotting so nothing applied between snapshot and first
//! delivery is lost, emits the snapshot (immediately, even when empty), then
//! forwards every matching change in bus order. A subscriber that falls
//! behind the bounded bus is resynchronized with a fresh snapshot; missed
//! deltas are never replayed.

#![warn(missing_docs)]

use std::collections::HashSet;
use std::sync::Arc;

use siren_dispatch::store::{AlertStore, StoreError};
use siren_dispatch::{AlertChange, AlertLifecycle};
use siren_domain::{Alert, AlertId};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::scope::Scope;

/// Default per-subscriber queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// One delivery on a subscription channel
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// The full current matching set; also sent after a delivery gap
    Snapshot(Vec<Alert>),
    /// An alert entered the scope or changed while in it
    Upserted(Alert),
    /// A previously delivered alert left the scope
    Removed(AlertId),
}

/// Fans lifecycle changes out to scope-filtered subscriber queues
pub struct RealtimeDistributor {
    lifecycle: Arc<AlertLifecycle>,
    queue_capacity: usize,
}

impl RealtimeDistributor {
    /// Create a distributor over the given lifecycle
    pub fn new(lifecycle: Arc<AlertLifecycle>) -> Self {
        Self::with_queue_capacity(lifecycle, DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a distributor with an explicit per-subscriber queue capacity
    pub fn with_queue_capacity(lifecycle: Arc<AlertLifecycle>, queue_capacity: usize) -> Self {
        Self { lifecycle, queue_capacity }
    }

    /// Register a subscription for the given scope
    ///
    /// The returned channel first emits the current matching alert set, then
    /// every subsequent change. Dropping or closing the subscription releases
    /// its task promptly, even mid-delivery.
    pub fn subscribe(&self, scope: Scope) -> Subscription {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let lifecycle = Arc::clone(&self.lifecycle);
        let task = tokio::spawn(async move {
            run_subscription(lifecycle, scope, tx).await;
        });
        Subscription { events: rx, task }
    }
}

/// A live subscription channel
pub struct Subscription {
    events: mpsc::Receiver<SubscriptionEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Receive the next event; `None` once the channel is torn down
    pub async fn recv(&mut self) -> Option<SubscriptionEvent> {
        self.events.recv().await
    }

    /// Tear the subscription down; safe to call at any time
    pub fn close(&self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_subscription(
    lifecycle: Arc<AlertLifecycle>,
    scope: Scope,
    tx: mpsc::Sender<SubscriptionEvent>,
) {
    // Register before snapshotting: changes applied while the snapshot is
    // read are delivered again afterwards, which is harmless; changes lost
    // between the two would not be.
    let mut changes = lifecycle.subscribe_changes();

    let Some(mut known) = send_snapshot(&lifecycle, &scope, &tx).await else {
        return;
    };

    loop {
        match changes.recv().await {
            Ok(AlertChange { alert }) => {
                if scope.matches(&alert) {
                    known.insert(alert.id);
                    if tx.send(SubscriptionEvent::Upserted(alert)).await.is_err() {
                        return;
                    }
                } else if known.remove(&alert.id) {
                    if tx.send(SubscriptionEvent::Removed(alert.id)).await.is_err() {
                        return;
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(?scope, missed, "subscriber lagged, resyncing with snapshot");
                match send_snapshot(&lifecycle, &scope, &tx).await {
                    Some(refreshed) => known = refreshed,
                    None => return,
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(?scope, "change bus closed, ending subscription");
                return;
            }
        }
    }
}

/// Send the current matching set; `None` when the subscriber is gone or the
/// store failed (the channel closes and the client re-subscribes)
async fn send_snapshot(
    lifecycle: &AlertLifecycle,
    scope: &Scope,
    tx: &mpsc::Sender<SubscriptionEvent>,
) -> Option<HashSet<AlertId>> {
    let alerts = match snapshot(scope, lifecycle.store().as_ref()) {
        Ok(alerts) => alerts,
        Err(e) => {
            error!(?scope, error = %e, "snapshot query failed, closing subscription");
            return None;
        }
    };
    let known = alerts.iter().map(|a| a.id).collect();
    tx.send(SubscriptionEvent::Snapshot(alerts)).await.ok()?;
    Some(known)
}

fn snapshot(scope: &Scope, store: &dyn AlertStore) -> Result<Vec<Alert>, StoreError> {
    match scope {
        Scope::OwnAlerts { reporter_id } => store.list_by_reporter(reporter_id),
        Scope::AllAlerts => store.list_recent(),
        Scope::StationAlerts { .. } => Ok(store
            .list_recent()?
            .into_iter()
            .filter(|a| scope.matches(a))
            .collect()),
        Scope::UnitMission { unit_id } => {
            Ok(store.active_for_unit(unit_id)?.into_iter().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siren_dispatch::{AssignmentResolver, MemoryAlertStore, MemoryFleetDirectory, SubmitAlert};
    use siren_domain::{Actor, AlertStatus, GeoPoint, IncidentCategory, Station, Unit, UnitCategory};
    use std::time::Duration;
    use tokio::time::timeout;

    fn fixture() -> Arc<AlertLifecycle> {
        let dir = Arc::new(MemoryFleetDirectory::new());
        dir.upsert_station(Station {
            id: "st-1".to_string(),
            name: "Central".to_string(),
            location: GeoPoint { lat: 14.6349, lon: -90.5069 },
            address: "Zona 1".to_string(),
        });
        dir.upsert_unit(Unit {
            id: "amb-1".to_string(),
            name: "Ambulance 1".to_string(),
            category: UnitCategory::Ambulance,
            available: true,
            station_id: "st-1".to_string(),
        });
        Arc::new(AlertLifecycle::new(
            Arc::new(MemoryAlertStore::new()),
            AssignmentResolver::new(dir),
        ))
    }

    fn reporter() -> Actor {
        Actor::Reporter { reporter_id: Some("user-1".to_string()) }
    }

    fn submission() -> SubmitAlert {
        SubmitAlert {
            location: GeoPoint { lat: 14.6350, lon: -90.5070 },
            category: IncidentCategory::Medical,
            anonymous: false,
        }
    }

    async fn next(sub: &mut Subscription) -> SubscriptionEvent {
        timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("subscription delivery timed out")
            .expect("subscription closed unexpectedly")
    }

    #[tokio::test]
    async fn empty_scope_emits_empty_snapshot_immediately() {
        let lifecycle = fixture();
        let distributor = RealtimeDistributor::new(lifecycle);
        let mut sub = distributor.subscribe(Scope::OwnAlerts {
            reporter_id: "user-with-no-alerts".to_string(),
        });

        assert_eq!(next(&mut sub).await, SubscriptionEvent::Snapshot(Vec::new()));
    }

    #[tokio::test]
    async fn snapshot_contains_preexisting_alerts() {
        let lifecycle = fixture();
        let alert = lifecycle.submit(&reporter(), submission()).unwrap();

        let distributor = RealtimeDistributor::new(lifecycle);
        let mut sub = distributor.subscribe(Scope::AllAlerts);

        match next(&mut sub).await {
            SubscriptionEvent::Snapshot(alerts) => {
                assert_eq!(alerts.len(), 1);
                assert_eq!(alerts[0].id, alert.id);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn changes_fan_out_to_overlapping_scopes() {
        let lifecycle = fixture();
        let distributor = RealtimeDistributor::new(Arc::clone(&lifecycle));

        let mut all = distributor.subscribe(Scope::AllAlerts);
        let mut own = distributor.subscribe(Scope::OwnAlerts { reporter_id: "user-1".to_string() });
        let mut mission = distributor.subscribe(Scope::UnitMission { unit_id: "amb-1".to_string() });
        assert!(matches!(next(&mut all).await, SubscriptionEvent::Snapshot(_)));
        assert!(matches!(next(&mut own).await, SubscriptionEvent::Snapshot(_)));
        assert!(matches!(next(&mut mission).await, SubscriptionEvent::Snapshot(_)));

        let alert = lifecycle.submit(&reporter(), submission()).unwrap();

        for sub in [&mut all, &mut own, &mut mission] {
            match next(sub).await {
                SubscriptionEvent::Upserted(delivered) => assert_eq!(delivered.id, alert.id),
                other => panic!("expected upsert, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn mission_scope_removes_alert_on_terminal_transition() {
        let lifecycle = fixture();
        let alert = lifecycle.submit(&reporter(), submission()).unwrap();

        let distributor = RealtimeDistributor::new(Arc::clone(&lifecycle));
        let mut mission =
            distributor.subscribe(Scope::UnitMission { unit_id: "amb-1".to_string() });
        match next(&mut mission).await {
            SubscriptionEvent::Snapshot(alerts) => assert_eq!(alerts.len(), 1),
            other => panic!("expected snapshot, got {other:?}"),
        }

        let unit = Actor::Unit { unit_id: "amb-1".to_string() };
        lifecycle.update_status(&unit, alert.id, AlertStatus::EnRoute, None).unwrap();
        assert!(matches!(next(&mut mission).await, SubscriptionEvent::Upserted(_)));

        lifecycle.update_status(&unit, alert.id, AlertStatus::Resolved, None).unwrap();
        assert_eq!(next(&mut mission).await, SubscriptionEvent::Removed(alert.id));
    }

    #[tokio::test]
    async fn out_of_scope_changes_are_not_delivered() {
        let lifecycle = fixture();
        let distributor = RealtimeDistributor::new(Arc::clone(&lifecycle));
        let mut other =
            distributor.subscribe(Scope::OwnAlerts { reporter_id: "user-2".to_string() });
        assert_eq!(next(&mut other).await, SubscriptionEvent::Snapshot(Vec::new()));

        lifecycle.submit(&reporter(), submission()).unwrap();

        // Nothing should arrive for user-2.
        let quiet = timeout(Duration::from_millis(200), other.recv()).await;
        assert!(quiet.is_err(), "unexpected delivery {quiet:?}");
    }

    #[tokio::test]
    async fn close_is_safe_mid_delivery() {
        let lifecycle = fixture();
        let distributor = RealtimeDistributor::with_queue_capacity(Arc::clone(&lifecycle), 1);
        let sub = distributor.subscribe(Scope::AllAlerts);

        // Fill the un-consumed queue so the task is parked on a send.
        lifecycle.submit(&reporter(), submission()).unwrap();
        lifecycle.submit(&reporter(), submission()).unwrap();
        sub.close();
        drop(sub);

        // Further mutations must not panic anything.
        lifecycle.submit(&reporter(), submission()).unwrap();
    }

    #[tokio::test]
    async fn lagged_subscriber_resyncs_with_fresh_snapshot() {
        let dir = Arc::new(MemoryFleetDirectory::new());
        let lifecycle = Arc::new(AlertLifecycle::with_bus_capacity(
            Arc::new(MemoryAlertStore::new()),
            AssignmentResolver::new(dir),
            1,
        ));
        let distributor = RealtimeDistributor::with_queue_capacity(Arc::clone(&lifecycle), 1);
        let mut sub = distributor.subscribe(Scope::AllAlerts);
        assert_eq!(next(&mut sub).await, SubscriptionEvent::Snapshot(Vec::new()));

        // Without consuming, push enough changes to overrun the size-1 bus.
        let mut last = None;
        for _ in 0..8 {
            last = Some(lifecycle.submit(&reporter(), submission()).unwrap());
        }
        let last = last.unwrap();

        // Drain until the resync snapshot arrives; it must reflect the
        // current store, including the change that overran the bus.
        loop {
            match next(&mut sub).await {
                SubscriptionEvent::Snapshot(alerts) => {
                    assert!(alerts.iter().any(|a| a.id == last.id));
                    break;
                }
                SubscriptionEvent::Upserted(_) | SubscriptionEvent::Removed(_) => continue,
            }
        }
    }
}
