//! Medical profile store boundary
//!
//! Profiles are keyed by reporter identifier and owned by the reporting
//! user. The underlying store caps the number of identifiers one batched
//! lookup predicate may carry; callers chunk accordingly.

use std::collections::HashMap;
use std::sync::RwLock;

use siren_domain::MedicalProfile;
use thiserror::Error;

/// Profile store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The store could not be reached
    #[error("profile store unavailable: {0}")]
    Unavailable(String),

    /// A batched lookup exceeded the store's predicate ceiling
    #[error("batch of {got} identifiers exceeds the predicate limit {limit}")]
    BatchTooLarge {
        /// Identifiers requested
        got: usize,
        /// Maximum the store accepts
        limit: usize,
    },
}

/// Read access to medical profiles
pub trait MedicalProfileStore: Send + Sync {
    /// Single profile lookup
    fn get(&self, reporter_id: &str) -> Result<Option<MedicalProfile>, ProfileError>;

    /// Batched lookup; the identifier count must respect the store's
    /// predicate ceiling
    fn get_many(&self, reporter_ids: &[String])
        -> Result<HashMap<String, MedicalProfile>, ProfileError>;
}

/// In-process profile store
///
/// Enforces the same batch-predicate ceiling as the production store so the
/// gateway's chunking is exercised by tests.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, MedicalProfile>>,
}

impl MemoryProfileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a profile
    pub fn upsert(&self, profile: MedicalProfile) {
        self.profiles
            .write()
            .expect("profile lock poisoned")
            .insert(profile.reporter_id.clone(), profile);
    }
}

impl MedicalProfileStore for MemoryProfileStore {
    fn get(&self, reporter_id: &str) -> Result<Option<MedicalProfile>, ProfileError> {
        Ok(self
            .profiles
            .read()
            .expect("profile lock poisoned")
            .get(reporter_id)
            .cloned())
    }

    fn get_many(
        &self,
        reporter_ids: &[String],
    ) -> Result<HashMap<String, MedicalProfile>, ProfileError> {
        if reporter_ids.len() > crate::enrich::MAX_LOOKUP_BATCH {
            return Err(ProfileError::BatchTooLarge {
                got: reporter_ids.len(),
                limit: crate::enrich::MAX_LOOKUP_BATCH,
            });
        }
        let profiles = self.profiles.read().expect("profile lock poisoned");
        Ok(reporter_ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }
}
