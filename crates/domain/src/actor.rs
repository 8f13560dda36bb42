//! Request-scoped actor context
//!
//! Every lifecycle and enrichment call receives the acting party explicitly.
//! There is no ambient "current session" state; one process can safely handle
//! concurrent requests from all three roles.

use serde::{Deserialize, Serialize};

/// The party performing an operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    /// Dispatch operator with broad transition authority
    Dispatch {
        /// Operator identifier, for audit logging
        operator_id: String,
    },
    /// Reporting citizen; anonymous reporters carry no identifier
    Reporter {
        /// Durable reporter identifier, `None` when anonymous
        reporter_id: Option<String>,
    },
    /// Field unit bound to one responding resource
    Unit {
        /// The unit's identifier
        unit_id: String,
    },
}

impl Actor {
    /// Short audit label, e.g. `dispatch:op-1`
    pub fn audit_label(&self) -> String {
        match self {
            Actor::Dispatch { operator_id } => format!("dispatch:{operator_id}"),
            Actor::Reporter { reporter_id: Some(id) } => format!("reporter:{id}"),
            Actor::Reporter { reporter_id: None } => "reporter:anonymous".to_string(),
            Actor::Unit { unit_id } => format!("unit:{unit_id}"),
        }
    }

    /// Whether this actor holds dispatch authority
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Actor::Dispatch { .. })
    }
}
