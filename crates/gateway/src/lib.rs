//! Alert enrichment for display tiers
//!
//! Joins alert records with the reporting user's medical profile, producing
//! view models safe to hand across the client boundary. Profile data is
//! gated by viewer role and by the alert's anonymity flag, and profile
//! lookups are batched within the underlying store's predicate ceiling.

pub mod enrich;
pub mod profile;

pub use enrich::{AlertView, EnrichmentGateway, MedicalContext, MAX_LOOKUP_BATCH};
pub use profile::{MedicalProfileStore, MemoryProfileStore, ProfileError};
