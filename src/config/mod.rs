//! Configuration module for the agency desk backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment API key; when unset every `/api` route is open
    pub api_key: Option<String>,
    /// Directory holding requests.json, users.json and passwords.json
    pub data_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("AGENCY_API_KEY").ok().filter(|k| !k.is_empty());

        let data_dir = env::var("AGENCY_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();

        let bind_addr = env::var("AGENCY_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
            .parse()?;

        let log_level = env::var("AGENCY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("AGENCY_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            api_key,
            data_dir,
            bind_addr,
            log_level,
            log_json,
        })
    }
}
