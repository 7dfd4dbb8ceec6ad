//! # Admin Error Type
//!
//! Everything a command can fail with. `main` turns it into an `anyhow`
//! report on stderr and a non-zero exit.

use harbor_db::DbError;

use crate::config::ConfigError;

/// Admin command errors.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{command} is not available for {vendor} databases")]
    UnsupportedDatabase { command: String, vendor: String },
}

/// Result type for admin commands.
pub type AdminResult<T> = Result<T, AdminError>;
