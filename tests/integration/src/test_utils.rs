//! Shared fixtures for cross-crate scenarios

use std::sync::Arc;

use siren_dispatch::store::AlertStore;
use siren_dispatch::{
    AlertLifecycle, AssignmentResolver, MemoryAlertStore, MemoryFleetDirectory,
    SqliteAlertStore,
};
use siren_domain::{Actor, GeoPoint, IncidentCategory, Station, Unit, UnitCategory};

/// Two stations with one available ambulance at the nearer one
pub fn seeded_directory() -> Arc<MemoryFleetDirectory> {
    let dir = Arc::new(MemoryFleetDirectory::new());
    dir.upsert_station(Station {
        id: "st-central".to_string(),
        name: "Central".to_string(),
        location: GeoPoint { lat: 14.6349, lon: -90.5069 },
        address: "Zona 1".to_string(),
    });
    dir.upsert_station(Station {
        id: "st-north".to_string(),
        name: "North".to_string(),
        location: GeoPoint { lat: 14.7000, lon: -90.5000 },
        address: "Zona 18".to_string(),
    });
    dir.upsert_unit(Unit {
        id: "amb-1".to_string(),
        name: "Ambulance 1".to_string(),
        category: UnitCategory::Ambulance,
        available: true,
        station_id: "st-central".to_string(),
    });
    dir.upsert_unit(Unit {
        id: "amb-2".to_string(),
        name: "Ambulance 2".to_string(),
        category: UnitCategory::Ambulance,
        available: true,
        station_id: "st-north".to_string(),
    });
    dir
}

/// The seeded directory with every unit out of service, so submissions
/// stay `new` pending manual dispatch
pub fn out_of_service_directory() -> Arc<MemoryFleetDirectory> {
    let dir = seeded_directory();
    dir.set_unit_available("amb-1", false);
    dir.set_unit_available("amb-2", false);
    dir
}

pub fn memory_lifecycle() -> Arc<AlertLifecycle> {
    lifecycle_over(Arc::new(MemoryAlertStore::new()))
}

pub fn sqlite_lifecycle() -> Arc<AlertLifecycle> {
    let store = SqliteAlertStore::open_in_memory().expect("in-memory sqlite");
    lifecycle_over(Arc::new(store))
}

pub fn lifecycle_over(store: Arc<dyn AlertStore>) -> Arc<AlertLifecycle> {
    Arc::new(AlertLifecycle::new(
        store,
        AssignmentResolver::new(seeded_directory()),
    ))
}

/// Lifecycles over both store backends, with no unit available
pub fn pending_lifecycles() -> [Arc<AlertLifecycle>; 2] {
    let memory: Arc<dyn AlertStore> = Arc::new(MemoryAlertStore::new());
    let sqlite: Arc<dyn AlertStore> =
        Arc::new(SqliteAlertStore::open_in_memory().expect("in-memory sqlite"));
    [memory, sqlite].map(|store| {
        Arc::new(AlertLifecycle::new(
            store,
            AssignmentResolver::new(out_of_service_directory()),
        ))
    })
}

pub fn reporter(id: &str) -> Actor {
    Actor::Reporter { reporter_id: Some(id.to_string()) }
}

pub fn dispatch() -> Actor {
    Actor::Dispatch { operator_id: "op-1".to_string() }
}

pub fn unit(id: &str) -> Actor {
    Actor::Unit { unit_id: id.to_string() }
}

/// An incident close to the central station
pub fn downtown_incident() -> siren_dispatch::SubmitAlert {
    siren_dispatch::SubmitAlert {
        location: GeoPoint { lat: 14.6350, lon: -90.5070 },
        category: IncidentCategory::Medical,
        anonymous: false,
    }
}
