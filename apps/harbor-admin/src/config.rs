//! Admin configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. `main` loads an optional `.env` first; command-line flags are
//! applied on top.

use serde::Serialize;
use std::env;
use std::path::PathBuf;

/// Default store: a SQLite file in the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./harbor.db";

/// Admin configuration.
#[derive(Debug, Clone, Serialize)]
pub struct AdminConfig {
    /// Connection URL; the scheme decides the vendor
    pub database_url: String,

    /// Pool size for command connections
    pub max_connections: u32,

    /// Directory scan-refs walks when no path is given
    pub scan_root: PathBuf,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let max_connections: u32 = lookup("HARBOR_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HARBOR_MAX_CONNECTIONS".to_string()))?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "HARBOR_MAX_CONNECTIONS".to_string(),
            ));
        }

        let scan_root = lookup("HARBOR_SCAN_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(AdminConfig {
            database_url,
            max_connections,
            scan_root,
        })
    }

    /// Replaces the database URL when one was given on the command line.
    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url {
            self.database_url = url;
        }
        self
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
