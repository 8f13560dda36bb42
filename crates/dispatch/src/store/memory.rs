//! In-process alert store
//!
//! Default wiring for tests and single-node deployments. The write lock
//! around the map gives `update_if` its check-and-swap atomicity.

use std::collections::HashMap;
use std::sync::RwLock;

use siren_domain::{Alert, AlertId};

use super::{AlertStore, StoreError};

/// Alert store backed by an in-memory map
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    alerts: RwLock<HashMap<AlertId, Alert>>,
}

impl MemoryAlertStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored alerts
    pub fn len(&self) -> usize {
        self.alerts.read().expect("alert lock poisoned").len()
    }

    /// Whether the store holds no alerts
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sorted_desc(mut alerts: Vec<Alert>) -> Vec<Alert> {
    // Stable order for equal timestamps via the identifier.
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    alerts
}

impl AlertStore for MemoryAlertStore {
    fn insert(&self, alert: &Alert) -> Result<(), StoreError> {
        let mut alerts = self.alerts.write().expect("alert lock poisoned");
        if alerts.contains_key(&alert.id) {
            return Err(StoreError::Duplicate(alert.id));
        }
        alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    fn get(&self, id: AlertId) -> Result<Option<Alert>, StoreError> {
        Ok(self.alerts.read().expect("alert lock poisoned").get(&id).cloned())
    }

    fn update_if(&self, updated: &Alert, expected_revision: u64) -> Result<(), StoreError> {
        let mut alerts = self.alerts.write().expect("alert lock poisoned");
        let stored = alerts
            .get_mut(&updated.id)
            .ok_or(StoreError::NotFound(updated.id))?;
        if stored.revision != expected_revision {
            return Err(StoreError::RevisionMismatch {
                id: updated.id,
                expected: expected_revision,
                stored: stored.revision,
            });
        }
        *stored = updated.clone();
        Ok(())
    }

    fn list_recent(&self) -> Result<Vec<Alert>, StoreError> {
        let alerts = self.alerts.read().expect("alert lock poisoned");
        Ok(sorted_desc(alerts.values().cloned().collect()))
    }

    fn list_by_reporter(&self, reporter_id: &str) -> Result<Vec<Alert>, StoreError> {
        let alerts = self.alerts.read().expect("alert lock poisoned");
        Ok(sorted_desc(
            alerts
                .values()
                .filter(|a| a.reporter_id.as_deref() == Some(reporter_id))
                .cloned()
                .collect(),
        ))
    }

    fn active_for_unit(&self, unit_id: &str) -> Result<Option<Alert>, StoreError> {
        let alerts = self.alerts.read().expect("alert lock poisoned");
        Ok(alerts
            .values()
            .find(|a| a.is_assigned_to_unit(unit_id) && !a.status.is_terminal())
            .cloned())
    }
}
