//! Fleet directory boundary
//!
//! Stations and units are owned by fleet administration and read-only to the
//! core. The directory is the only collaborator the resolver consults besides
//! the geo index; a directory failure is an upstream condition, fatal to the
//! single resolution attempt that needed it.

use std::sync::RwLock;

use siren_domain::{Station, Unit};
use thiserror::Error;

/// Fleet directory errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FleetError {
    /// The directory could not be reached
    #[error("fleet directory unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the station and unit records
pub trait FleetDirectory: Send + Sync {
    /// All stations, in stable iteration order
    fn list_stations(&self) -> Result<Vec<Station>, FleetError>;

    /// Units belonging to a station, optionally filtered to available ones
    fn list_units(&self, station_id: &str, only_available: bool)
        -> Result<Vec<Unit>, FleetError>;

    /// Single station lookup
    fn station(&self, id: &str) -> Result<Option<Station>, FleetError>;

    /// Single unit lookup
    fn unit(&self, id: &str) -> Result<Option<Unit>, FleetError>;
}

/// In-process fleet directory
///
/// Keeps stations and units in insertion order so nearest-station tie-breaks
/// and first-available-unit selection stay deterministic.
#[derive(Debug, Default)]
pub struct MemoryFleetDirectory {
    stations: RwLock<Vec<Station>>,
    units: RwLock<Vec<Unit>>,
}

impl MemoryFleetDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a station
    pub fn upsert_station(&self, station: Station) {
        let mut stations = self.stations.write().expect("station lock poisoned");
        if let Some(existing) = stations.iter_mut().find(|s| s.id == station.id) {
            *existing = station;
        } else {
            stations.push(station);
        }
    }

    /// Add or replace a unit
    pub fn upsert_unit(&self, unit: Unit) {
        let mut units = self.units.write().expect("unit lock poisoned");
        if let Some(existing) = units.iter_mut().find(|u| u.id == unit.id) {
            *existing = unit;
        } else {
            units.push(unit);
        }
    }

    /// Flip a unit's advisory availability flag
    pub fn set_unit_available(&self, unit_id: &str, available: bool) {
        let mut units = self.units.write().expect("unit lock poisoned");
        if let Some(unit) = units.iter_mut().find(|u| u.id == unit_id) {
            unit.available = available;
        }
    }
}

impl FleetDirectory for MemoryFleetDirectory {
    fn list_stations(&self) -> Result<Vec<Station>, FleetError> {
        Ok(self.stations.read().expect("station lock poisoned").clone())
    }

    fn list_units(
        &self,
        station_id: &str,
        only_available: bool,
    ) -> Result<Vec<Unit>, FleetError> {
        let units = self.units.read().expect("unit lock poisoned");
        Ok(units
            .iter()
            .filter(|u| u.station_id == station_id && (!only_available || u.available))
            .cloned()
            .collect())
    }

    fn station(&self, id: &str) -> Result<Option<Station>, FleetError> {
        let stations = self.stations.read().expect("station lock poisoned");
        Ok(stations.iter().find(|s| s.id == id).cloned())
    }

    fn unit(&self, id: &str) -> Result<Option<Unit>, FleetError> {
        let units = self.units.read().expect("unit lock poisoned");
        Ok(units.iter().find(|u| u.id == id).cloned())
    }
}
