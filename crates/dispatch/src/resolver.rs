//! Incident location → candidate station/unit pair
//!
//! The resolver queries the geo index for the nearest station and takes the
//! first available unit there. When the nearest station has no available
//! unit it does **not** fall back to the next-nearest station: the alert is
//! left pending manual dispatch with a station-only partial match. That
//! behavior is preserved as observed in the field deployment.

#![warn(missing_docs)]

use std::sync::Arc;

use siren_domain::{AlertError, GeoPoint, Station, Unit};
use tracing::debug;

use crate::directory::FleetDirectory;
use crate::geo::GeoIndex;

/// Outcome of one resolution attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Nearest station found and it has an available unit
    Assigned {
        /// Selected station
        station: Station,
        /// First available unit at that station
        unit: Unit,
    },
    /// Nearest station found but no unit is available there
    StationOnly {
        /// Selected station, pending manual dispatch
        station: Station,
    },
    /// No stations exist at all; a configuration error, not a silent failure
    NoStations,
}

/// Resolves an incident location to a responding station and unit
pub struct AssignmentResolver {
    directory: Arc<dyn FleetDirectory>,
}

impl AssignmentResolver {
    /// Create a resolver over the given fleet directory
    pub fn new(directory: Arc<dyn FleetDirectory>) -> Self {
        Self { directory }
    }

    /// The fleet directory this resolver consults
    pub fn directory(&self) -> &Arc<dyn FleetDirectory> {
        &self.directory
    }

    /// Resolve a candidate station/unit pair for an incident location
    ///
    /// A directory failure maps to [`AlertError::Upstream`] and is fatal to
    /// this resolution attempt only; callers keep the alert creatable.
    pub fn resolve(&self, location: GeoPoint) -> Result<Resolution, AlertError> {
        let stations = self
            .directory
            .list_stations()
            .map_err(|e| AlertError::Upstream(e.to_string()))?;

        let index = GeoIndex::new(stations);
        let Some(station) = index.nearest(location).cloned() else {
            return Ok(Resolution::NoStations);
        };

        let units = self
            .directory
            .list_units(&station.id, true)
            .map_err(|e| AlertError::Upstream(e.to_string()))?;

        match units.into_iter().next() {
            Some(unit) => {
                debug!(station = %station.id, unit = %unit.id, "resolved assignment");
                Ok(Resolution::Assigned { station, unit })
            }
            None => {
                debug!(station = %station.id, "nearest station has no available unit");
                Ok(Resolution::StationOnly { station })
            }
        }
    }
}
