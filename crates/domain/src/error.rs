//! Error taxonomy for alert operations
//!
//! Every rejected mutation maps onto exactly one of these variants, and a
//! rejection always leaves the stored record exactly as it was. The
//! `Display` strings are the human-readable reasons handed to clients; raw
//! internal errors never cross that boundary.

use thiserror::Error;

/// Errors surfaced by lifecycle, resolver and enrichment operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlertError {
    /// Missing or malformed input (e.g. cancellation without a reason).
    /// Surfaced directly to the initiating client, never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A role attempted a transition outside its permitted set.
    /// Surfaced as a denial and logged server-side for audit.
    #[error("Not permitted: {0}")]
    Authorization(String),

    /// A concurrent transition won the race, or the alert is terminal.
    /// Clients should refresh; blind retry is unsafe.
    #[error("State changed, please refresh: {0}")]
    Conflict(String),

    /// A referenced station, unit or alert does not exist.
    /// A dispatch-blocked condition, never a silent drop.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator (fleet directory, profile store) failed.
    /// Fatal only to the operation that needed it.
    #[error("Upstream unavailable: {0}")]
    Upstream(String),
}

/// Discriminant of [`AlertError`], used for transport status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Validation failure
    Validation,
    /// Authorization denial
    Authorization,
    /// Lost race or terminal-state conflict
    Conflict,
    /// Missing referent
    NotFound,
    /// Collaborator failure
    Upstream,
}

impl AlertError {
    /// The taxonomy bucket this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            AlertError::Validation(_) => ErrorKind::Validation,
            AlertError::Authorization(_) => ErrorKind::Authorization,
            AlertError::Conflict(_) => ErrorKind::Conflict,
            AlertError::NotFound(_) => ErrorKind::NotFound,
            AlertError::Upstream(_) => ErrorKind::Upstream,
        }
    }
}

/// Result alias for domain operations
pub type Result<T> = std::result::Result<T, AlertError>;
