//! SQLite-backed alert store
//!
//! Durable single-node storage with WAL mode for crash recovery. The
//! conditional update is a single `UPDATE … WHERE id = ? AND revision = ?`;
//! SQLite's per-connection serialization makes that the linearization point
//! for each alert.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use siren_domain::{
    Alert, AlertId, AlertStatus, AssignedStation, AssignedUnit, GeoPoint, IncidentCategory,
};
use tracing::info;
use uuid::Uuid;

use super::{AlertStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS alerts (
    id                  TEXT PRIMARY KEY,
    reporter_id         TEXT,
    created_secs        INTEGER NOT NULL,
    created_nanos       INTEGER NOT NULL,
    lat                 REAL NOT NULL,
    lon                 REAL NOT NULL,
    category            TEXT NOT NULL,
    status              TEXT NOT NULL,
    station_id          TEXT,
    station_name        TEXT,
    unit_id             TEXT,
    unit_name           TEXT,
    cancellation_reason TEXT,
    anonymous           INTEGER NOT NULL,
    revision            INTEGER NOT NULL,
    CHECK ((station_id IS NULL) = (station_name IS NULL)),
    CHECK ((unit_id IS NULL) = (unit_name IS NULL)),
    CHECK ((status = 'cancelled') = (cancellation_reason IS NOT NULL))
);
CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts (created_secs DESC, created_nanos DESC);
CREATE INDEX IF NOT EXISTS idx_alerts_reporter ON alerts (reporter_id);
CREATE INDEX IF NOT EXISTS idx_alerts_unit_status ON alerts (unit_id, status);
";

const COLUMNS: &str = "id, reporter_id, created_secs, created_nanos, lat, lon, category, status, \
                       station_id, station_name, unit_id, unit_name, cancellation_reason, \
                       anonymous, revision";

/// Alert store backed by SQLite
pub struct SqliteAlertStore {
    conn: Mutex<Connection>,
}

impl SqliteAlertStore {
    /// Open (or create) a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %path.as_ref().display(), "opened alert store");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory store (tests and throwaway deployments)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

/// Plain column values for one row, decoded into an [`Alert`] in a second step
struct RawAlertRow {
    id: String,
    reporter_id: Option<String>,
    created_secs: i64,
    created_nanos: u32,
    lat: f64,
    lon: f64,
    category: String,
    status: String,
    station_id: Option<String>,
    station_name: Option<String>,
    unit_id: Option<String>,
    unit_name: Option<String>,
    cancellation_reason: Option<String>,
    anonymous: bool,
    revision: u64,
}

impl RawAlertRow {
    fn from_row(row: &rusqlite::Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            reporter_id: row.get(1)?,
            created_secs: row.get(2)?,
            created_nanos: row.get(3)?,
            lat: row.get(4)?,
            lon: row.get(5)?,
            category: row.get(6)?,
            status: row.get(7)?,
            station_id: row.get(8)?,
            station_name: row.get(9)?,
            unit_id: row.get(10)?,
            unit_name: row.get(11)?,
            cancellation_reason: row.get(12)?,
            anonymous: row.get(13)?,
            revision: row.get(14)?,
        })
    }

    fn into_alert(self) -> Result<Alert, StoreError> {
        let corrupt = |detail: String| StoreError::Corrupt { id: self.id.clone(), detail };

        let uuid = Uuid::parse_str(&self.id)
            .map_err(|e| corrupt(format!("bad identifier: {e}")))?;
        let created_at = Utc
            .timestamp_opt(self.created_secs, self.created_nanos)
            .single()
            .ok_or_else(|| corrupt("bad creation timestamp".to_string()))?;
        let category = IncidentCategory::from_str(&self.category).map_err(corrupt)?;
        let status = AlertStatus::from_str(&self.status).map_err(corrupt)?;

        let station = match (self.station_id.clone(), self.station_name.clone()) {
            (Some(id), Some(name)) => Some(AssignedStation { id, name }),
            (None, None) => None,
            _ => return Err(corrupt("station id/name pair split".to_string())),
        };
        let unit = match (self.unit_id.clone(), self.unit_name.clone()) {
            (Some(id), Some(name)) => Some(AssignedUnit { id, name }),
            (None, None) => None,
            _ => return Err(corrupt("unit id/name pair split".to_string())),
        };

        Ok(Alert {
            id: AlertId(uuid),
            reporter_id: self.reporter_id,
            created_at,
            location: GeoPoint { lat: self.lat, lon: self.lon },
            category,
            status,
            station,
            unit,
            cancellation_reason: self.cancellation_reason,
            anonymous: self.anonymous,
            revision: self.revision,
        })
    }
}

fn bind_values(alert: &Alert) -> [rusqlite::types::Value; 15] {
    use rusqlite::types::Value;
    [
        Value::Text(alert.id.to_string()),
        alert.reporter_id.clone().map_or(Value::Null, Value::Text),
        Value::Integer(alert.created_at.timestamp()),
        Value::Integer(i64::from(alert.created_at.timestamp_subsec_nanos())),
        Value::Real(alert.location.lat),
        Value::Real(alert.location.lon),
        Value::Text(alert.category.to_string()),
        Value::Text(alert.status.to_string()),
        alert.station.as_ref().map_or(Value::Null, |s| Value::Text(s.id.clone())),
        alert.station.as_ref().map_or(Value::Null, |s| Value::Text(s.name.clone())),
        alert.unit.as_ref().map_or(Value::Null, |u| Value::Text(u.id.clone())),
        alert.unit.as_ref().map_or(Value::Null, |u| Value::Text(u.name.clone())),
        alert.cancellation_reason.clone().map_or(Value::Null, Value::Text),
        Value::Integer(i64::from(alert.anonymous)),
        Value::Integer(alert.revision as i64),
    ]
}

impl AlertStore for SqliteAlertStore {
    fn insert(&self, alert: &Alert) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM alerts WHERE id = ?1",
                params![alert.id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::Duplicate(alert.id));
        }

        conn.execute(
            "INSERT INTO alerts (id, reporter_id, created_secs, created_nanos, lat, lon, \
             category, status, station_id, station_name, unit_id, unit_name, \
             cancellation_reason, anonymous, revision) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params_from_iter(bind_values(alert)),
        )?;
        Ok(())
    }

    fn get(&self, id: AlertId) -> Result<Option<Alert>, StoreError> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM alerts WHERE id = ?1"),
                params![id.to_string()],
                RawAlertRow::from_row,
            )
            .optional()?;
        raw.map(RawAlertRow::into_alert).transpose()
    }

    fn update_if(&self, updated: &Alert, expected_revision: u64) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let values = bind_values(updated);
        let changed = conn.execute(
            "UPDATE alerts SET reporter_id = ?2, created_secs = ?3, created_nanos = ?4, \
             lat = ?5, lon = ?6, category = ?7, status = ?8, station_id = ?9, \
             station_name = ?10, unit_id = ?11, unit_name = ?12, cancellation_reason = ?13, \
             anonymous = ?14, revision = ?15 \
             WHERE id = ?1 AND revision = ?16",
            rusqlite::params_from_iter(
                values
                    .into_iter()
                    .chain([rusqlite::types::Value::Integer(expected_revision as i64)]),
            ),
        )?;
        if changed == 1 {
            return Ok(());
        }

        // Distinguish a vanished record from a lost race.
        let stored: Option<i64> = conn
            .query_row(
                "SELECT revision FROM alerts WHERE id = ?1",
                params![updated.id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match stored {
            None => Err(StoreError::NotFound(updated.id)),
            Some(revision) => Err(StoreError::RevisionMismatch {
                id: updated.id,
                expected: expected_revision,
                stored: revision as u64,
            }),
        }
    }

    fn list_recent(&self) -> Result<Vec<Alert>, StoreError> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM alerts ORDER BY created_secs DESC, created_nanos DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], RawAlertRow::from_row)?;
        rows.collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(RawAlertRow::into_alert)
            .collect()
    }

    fn list_by_reporter(&self, reporter_id: &str) -> Result<Vec<Alert>, StoreError> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM alerts WHERE reporter_id = ?1 \
             ORDER BY created_secs DESC, created_nanos DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![reporter_id], RawAlertRow::from_row)?;
        rows.collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(RawAlertRow::into_alert)
            .collect()
    }

    fn active_for_unit(&self, unit_id: &str) -> Result<Option<Alert>, StoreError> {
        let conn = self.conn.lock().expect("connection lock poisoned");
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM alerts WHERE unit_id = ?1 \
                     AND status NOT IN ('resolved', 'cancelled', 'patient_attended') \
                     LIMIT 1"
                ),
                params![unit_id],
                RawAlertRow::from_row,
            )
            .optional()?;
        raw.map(RawAlertRow::into_alert).transpose()
    }
}
