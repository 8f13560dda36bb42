//! Subscription scopes
//!
//! A scope is the filter predicate defining which alerts a channel receives.
//! Scopes are mutually exclusive per client session; across clients they may
//! overlap freely, so one alert can be pushed to a citizen's own-alerts
//! channel, an operator's all-alerts channel and a unit's mission channel at
//! the same time.

use serde::{Deserialize, Serialize};
use siren_domain::Alert;

/// Filter predicate for one subscription channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Scope {
    /// Alerts reported by one identified citizen
    OwnAlerts {
        /// Reporter identifier
        reporter_id: String,
    },
    /// Every alert (operator console)
    AllAlerts,
    /// Alerts assigned to one station (station-scoped console)
    StationAlerts {
        /// Station identifier
        station_id: String,
    },
    /// The single active mission of one unit
    UnitMission {
        /// Unit identifier
        unit_id: String,
    },
}

impl Scope {
    /// Whether this scope currently covers the given alert
    pub fn matches(&self, alert: &Alert) -> bool {
        match self {
            Scope::OwnAlerts { reporter_id } => {
                alert.reporter_id.as_deref() == Some(reporter_id.as_str())
            }
            Scope::AllAlerts => true,
            Scope::StationAlerts { station_id } => {
                alert.station.as_ref().is_some_and(|s| s.id == *station_id)
            }
            // A terminal alert is no longer the unit's mission.
            Scope::UnitMission { unit_id } => {
                alert.is_assigned_to_unit(unit_id) && !alert.status.is_terminal()
            }
        }
    }
}
