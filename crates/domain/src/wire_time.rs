//! Wire-safe timestamp conversion
//!
//! Native time values are not transportable as-is across the server/client
//! boundary, so every timestamp crossing it is flattened into a plain
//! two-field (seconds, fractional-seconds) structure and reconstructed on the
//! receiving side. Both directions are exact inverses at nanosecond
//! precision.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Serializable two-field timestamp
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WireTimestamp {
    /// Whole seconds since the Unix epoch
    pub secs: i64,
    /// Fractional part in nanoseconds, `0..1_000_000_000`
    pub nanos: u32,
}

impl WireTimestamp {
    /// Flatten a native timestamp for transport
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            secs: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }

    /// Reconstruct the native timestamp
    ///
    /// Returns `None` only for out-of-range values that no server-assigned
    /// timestamp produces.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.secs, self.nanos).single()
    }
}

impl From<DateTime<Utc>> for WireTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}
