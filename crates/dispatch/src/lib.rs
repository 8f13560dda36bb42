//! Alert dispatch core: assignment and the status state machine
//!
//! This crate owns the write path of the system:
//! - [`geo`]: nearest-station queries over the current station set
//! - [`directory`]: the read-only fleet directory boundary
//! - [`resolver`]: incident location → candidate station/unit pair
//! - [`store`]: the persisted alert store boundary with conditional updates
//! - [`lifecycle`]: the multi-writer alert state machine and change bus

pub mod directory;
pub mod geo;
pub mod lifecycle;
pub mod resolver;
pub mod store;

pub use directory::{FleetDirectory, FleetError, MemoryFleetDirectory};
pub use geo::GeoIndex;
pub use lifecycle::{AlertChange, AlertLifecycle, SubmitAlert};
pub use resolver::{AssignmentResolver, Resolution};
pub use store::{AlertStore, MemoryAlertStore, SqliteAlertStore, StoreError};
