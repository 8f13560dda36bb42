//! Station and unit records
//!
//! Owned by fleet administration; read-only to the core. The unit
//! availability flag is advisory input to assignment, not state-machine
//! governed.

use serde::{Deserialize, Serialize};

use crate::alert::GeoPoint;

/// A fixed responding facility
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    /// Station identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Facility location
    pub location: GeoPoint,
    /// Street address
    pub address: String,
}

/// Dispatchable resource category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    /// Ambulance
    Ambulance,
    /// Fire engine
    Engine,
    /// Rescue vehicle
    Rescue,
    /// Anything else
    Other,
}

/// A dispatchable resource belonging to exactly one station
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    /// Unit identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Resource category
    pub category: UnitCategory,
    /// Advisory availability flag
    pub available: bool,
    /// Owning station identifier
    pub station_id: String,
}
