//! # Database Vendor Detection
//!
//! Admin commands accept a connection URL and behave differently per vendor:
//! the summary view is a PostgreSQL materialized view, while a SQLite store
//! only carries a plain view and has nothing to refresh.
//!
//! ```text
//! postgres://user@host/db      → PostgreSql
//! postgresql://user@host/db    → PostgreSql
//! sqlite://./harbor.db         → Sqlite
//! sqlite::memory:              → Sqlite
//! ./harbor.db                  → Sqlite (bare path)
//! mysql://… / mariadb://…      → MySql
//! anything else                → Other
//! ```

use serde::{Deserialize, Serialize};

/// Relational database vendor behind a connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseVendor {
    PostgreSql,
    Sqlite,
    MySql,
    Other,
}

impl DatabaseVendor {
    /// Detects the vendor from a connection URL's scheme.
    ///
    /// ```rust
    /// use harbor_core::DatabaseVendor;
    ///
    /// assert_eq!(DatabaseVendor::from_url("postgres://localhost/pos"), DatabaseVendor::PostgreSql);
    /// assert_eq!(DatabaseVendor::from_url("sqlite://./pos.db"), DatabaseVendor::Sqlite);
    /// ```
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        let scheme = match url.split_once(':') {
            Some((scheme, _)) => scheme.to_ascii_lowercase(),
            // No scheme at all: treat as a file path for the local store.
            None => return DatabaseVendor::Sqlite,
        };

        match scheme.as_str() {
            "postgres" | "postgresql" => DatabaseVendor::PostgreSql,
            "sqlite" => DatabaseVendor::Sqlite,
            "mysql" | "mariadb" => DatabaseVendor::MySql,
            // Windows drive letters ("C:\pos.db") and relative paths
            _ if scheme.len() == 1 || scheme.starts_with('.') || scheme.contains('/') => {
                DatabaseVendor::Sqlite
            }
            _ => DatabaseVendor::Other,
        }
    }

    /// Short lowercase name used in log lines and command output.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DatabaseVendor::PostgreSql => "postgresql",
            DatabaseVendor::Sqlite => "sqlite",
            DatabaseVendor::MySql => "mysql",
            DatabaseVendor::Other => "other",
        }
    }

    /// Bind placeholder for the `n`th (1-based) parameter.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            DatabaseVendor::PostgreSql => format!("${}", n),
            _ => "?".to_string(),
        }
    }
}

impl std::fmt::Display for DatabaseVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts the file path from a SQLite URL (or returns a bare path unchanged).
///
/// Returns `None` for non-SQLite URLs.
pub fn sqlite_path(url: &str) -> Option<&str> {
    if DatabaseVendor::from_url(url) != DatabaseVendor::Sqlite {
        return None;
    }
    let url = url.trim();
    let rest = match url.strip_prefix("sqlite:") {
        Some(rest) => rest.strip_prefix("//").unwrap_or(rest),
        None => url,
    };
    // Drop query parameters such as ?mode=rwc
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}
