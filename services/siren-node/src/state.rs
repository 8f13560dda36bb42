use std::fs;
use std::sync::Arc;

use serde::Deserialize;
use siren_dispatch::store::AlertStore;
use siren_dispatch::{
    AlertLifecycle, AssignmentResolver, MemoryAlertStore, MemoryFleetDirectory,
    SqliteAlertStore,
};
use siren_gateway::{EnrichmentGateway, MemoryProfileStore};
use siren_stream::distributor::RealtimeDistributor;
use siren_domain::{Station, Unit};
use tracing::info;

use crate::config::Config;

/// Fleet seed file shape: stations and their units, loaded once at boot.
#[derive(Deserialize)]
struct FleetSeed {
    #[serde(default)]
    stations: Vec<Station>,
    #[serde(default)]
    units: Vec<Unit>,
}

pub struct AppState {
    pub config: Config,
    pub directory: Arc<MemoryFleetDirectory>,
    pub lifecycle: Arc<AlertLifecycle>,
    pub distributor: Arc<RealtimeDistributor>,
    pub profiles: Arc<MemoryProfileStore>,
    pub gateway: EnrichmentGateway,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let directory = Arc::new(MemoryFleetDirectory::new());
        if let Some(path) = &config.fleet_path {
            let seed: FleetSeed = serde_json::from_str(&fs::read_to_string(path)?)?;
            info!(
                stations = seed.stations.len(),
                units = seed.units.len(),
                "fleet seed loaded from {path}"
            );
            for station in seed.stations {
                directory.upsert_station(station);
            }
            for unit in seed.units {
                directory.upsert_unit(unit);
            }
        }

        let store: Arc<dyn AlertStore> = match &config.db_path {
            Some(path) => {
                info!("alert store at {path}");
                Arc::new(SqliteAlertStore::open(path)?)
            }
            None => {
                info!("alert store in memory");
                Arc::new(MemoryAlertStore::new())
            }
        };

        let resolver = AssignmentResolver::new(directory.clone());
        let lifecycle = Arc::new(AlertLifecycle::with_bus_capacity(
            store,
            resolver,
            config.bus_capacity,
        ));
        let distributor = Arc::new(RealtimeDistributor::new(lifecycle.clone()));
        let profiles = Arc::new(MemoryProfileStore::new());
        let gateway = EnrichmentGateway::new(profiles.clone());

        Ok(AppState {
            config,
            directory,
            lifecycle,
            distributor,
            profiles,
            gateway,
        })
    }
}
