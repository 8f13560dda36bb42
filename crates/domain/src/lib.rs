//! Domain model for the SIREN emergency alert core
//!
//! This crate contains pure domain logic with no I/O dependencies:
//! - Alert, station, unit and medical profile records
//! - The alert status state machine and its role-scoped transition table
//! - Request-scoped actor context
//! - The error taxonomy shared by every operation
//! - Wire-safe timestamp conversion

pub mod actor;
pub mod alert;
pub mod error;
pub mod fleet;
pub mod medical;
pub mod transitions;
pub mod wire_time;

pub use actor::Actor;
pub use alert::{
    Alert, AlertId, AlertStatus, AssignedStation, AssignedUnit, GeoPoint, IncidentCategory,
};
pub use error::{AlertError, ErrorKind, Result};
pub use fleet::{Station, Unit, UnitCategory};
pub use medical::{EmergencyContact, MedicalProfile};
pub use transitions::{allowed_targets, check_transition};
pub use wire_time::WireTimestamp;
