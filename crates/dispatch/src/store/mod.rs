//! Persisted alert store boundary
//!
//! Alerts are flat records keyed by identifier. The store provides the one
//! hard mutual-exclusion mechanism in the system: a conditional update keyed
//! on the record's revision. Two concurrent transition attempts on the same
//! alert resolve to exactly one winner; the loser observes a revision
//! mismatch and surfaces it as a conflict.
//!
//! Only three read patterns are required: all alerts by creation time
//! descending, alerts for a reporter, and a unit's active mission.
//! Alerts are never physically deleted.

use siren_domain::{Alert, AlertId};
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryAlertStore;
pub use sqlite::SqliteAlertStore;

/// Store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with the given identifier
    #[error("alert not found: {0}")]
    NotFound(AlertId),

    /// Identifier already present on insert
    #[error("duplicate alert id: {0}")]
    Duplicate(AlertId),

    /// Conditional update lost: the stored revision moved on
    #[error("revision mismatch for alert {id}: expected {expected}, stored {stored}")]
    RevisionMismatch {
        /// Alert identifier
        id: AlertId,
        /// Revision the writer based its update on
        expected: u64,
        /// Revision actually stored
        stored: u64,
    },

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored record failed to decode
    #[error("corrupt record for alert {id}: {detail}")]
    Corrupt {
        /// Alert identifier
        id: String,
        /// What failed to decode
        detail: String,
    },
}

/// Flat alert records keyed by identifier, with conditional updates
pub trait AlertStore: Send + Sync {
    /// Insert a fresh record; the identifier must be new
    fn insert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// Fetch one record
    fn get(&self, id: AlertId) -> Result<Option<Alert>, StoreError>;

    /// Replace the record iff its stored revision equals `expected_revision`
    ///
    /// This is the linearization point for all transitions on one alert.
    fn update_if(&self, updated: &Alert, expected_revision: u64) -> Result<(), StoreError>;

    /// All alerts, creation time descending
    fn list_recent(&self) -> Result<Vec<Alert>, StoreError>;

    /// Alerts reported by the given identifier, creation time descending
    fn list_by_reporter(&self, reporter_id: &str) -> Result<Vec<Alert>, StoreError>;

    /// The unit's active mission: assigned to it and not terminal
    ///
    /// At most one alert per unit by the one-active-mission invariant.
    fn active_for_unit(&self, unit_id: &str) -> Result<Option<Alert>, StoreError>;
}
