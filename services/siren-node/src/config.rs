use std::env;

/// Log output format selected at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ws_port: u16,
    /// Alert database path; unset means the in-process store.
    pub db_path: Option<String>,
    /// Fleet seed file (stations and units) loaded at boot.
    pub fleet_path: Option<String>,
    pub bus_capacity: usize,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let log_format = match env::var("SIREN_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Ok(Config {
            host: env::var("SIREN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SIREN_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080),
            ws_port: env::var("SIREN_WS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8081),
            db_path: env::var("SIREN_DB_PATH").ok(),
            fleet_path: env::var("SIREN_FLEET_PATH").ok(),
            bus_capacity: env::var("SIREN_BUS_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
            log_format,
        })
    }
}
