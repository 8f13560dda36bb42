//! Nearest-station queries
//!
//! The station set is small (tens of facilities, not millions), so the index
//! is a linear great-circle scan rather than a spatial tree. Distance is the
//! haversine formula on a spherical Earth, which is adequate at city/metro
//! scale.

#![warn(missing_docs)]

use siren_domain::{GeoPoint, Station};

/// Mean Earth radius in kilometres for the spherical approximation
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Index over the current station set
#[derive(Debug, Clone)]
pub struct GeoIndex {
    stations: Vec<Station>,
}

impl GeoIndex {
    /// Build an index over the given stations, preserving their order
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    /// The station closest to `point` by great-circle distance
    ///
    /// Returns `None` only when the station set is empty, which is a
    /// reportable configuration error for callers. Exactly equal distances
    /// keep the first station in iteration order; true ties are measure-zero
    /// in practice.
    pub fn nearest(&self, point: GeoPoint) -> Option<&Station> {
        let mut best: Option<(&Station, f64)> = None;
        for station in &self.stations {
            let distance = haversine_km(point, station.location);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((station, distance)),
            }
        }
        best.map(|(station, _)| station)
    }

    /// Whether the index holds no stations
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}
