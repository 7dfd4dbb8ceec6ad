//! # Materialized View Refresh
//!
//! Keeps the PostgreSQL daily payment summary current.
//!
//! ## Refresh Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  refresh_daily_summary(url)                                             │
//! │       │                                                                 │
//! │       ├── vendor != PostgreSQL ──► Skipped { vendor }  (no connection)  │
//! │       ▼                                                                 │
//! │  REFRESH MATERIALIZED VIEW CONCURRENTLY "view"                          │
//! │       │ ok ──► Concurrent        readers never blocked                  │
//! │       │ err (warn!)                                                     │
//! │       ▼                                                                 │
//! │  REFRESH MATERIALIZED VIEW "view"                                       │
//! │       │ ok ──► Blocking          takes an exclusive lock                │
//! │       │ err ──► DbError                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The concurrent form needs a unique index on the view and a view that
//! has been populated once; either gap makes it fail and the blocking form
//! takes over.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use harbor_core::{DatabaseVendor, DAILY_SUMMARY_VIEW};

use crate::error::DbResult;
use crate::pool::connect_postgres;

/// How a refresh request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Refreshed without blocking readers.
    Concurrent,
    /// Concurrent refresh failed; refreshed under an exclusive lock.
    Blocking,
    /// Not a PostgreSQL database; nothing was touched.
    Skipped { vendor: DatabaseVendor },
}

impl std::fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshOutcome::Concurrent => f.write_str("refreshed concurrently"),
            RefreshOutcome::Blocking => f.write_str("refreshed (blocking fallback)"),
            RefreshOutcome::Skipped { vendor } => {
                write!(f, "skipped: materialized views are not used on {}", vendor)
            }
        }
    }
}

/// Something that can refresh a materialized view.
#[async_trait]
pub trait ViewRefresher: Send + Sync {
    /// `REFRESH MATERIALIZED VIEW CONCURRENTLY`.
    async fn refresh_concurrently(&self, view: &str) -> DbResult<()>;

    /// `REFRESH MATERIALIZED VIEW`.
    async fn refresh_blocking(&self, view: &str) -> DbResult<()>;
}

#[async_trait]
impl ViewRefresher for PgPool {
    async fn refresh_concurrently(&self, view: &str) -> DbResult<()> {
        let sql = format!("REFRESH MATERIALIZED VIEW CONCURRENTLY {}", quote_ident(view));
        sqlx::query(&sql).execute(self).await?;
        Ok(())
    }

    async fn refresh_blocking(&self, view: &str) -> DbResult<()> {
        let sql = format!("REFRESH MATERIALIZED VIEW {}", quote_ident(view));
        sqlx::query(&sql).execute(self).await?;
        Ok(())
    }
}

/// Refreshes `view`, falling back to a blocking refresh once.
pub async fn refresh_view<R>(refresher: &R, view: &str) -> DbResult<RefreshOutcome>
where
    R: ViewRefresher + ?Sized,
{
    match refresher.refresh_concurrently(view).await {
        Ok(()) => {
            info!(view, "Materialized view refreshed concurrently");
            Ok(RefreshOutcome::Concurrent)
        }
        Err(e) => {
            warn!(view, error = %e, "Concurrent refresh failed, falling back to blocking refresh");
            refresher.refresh_blocking(view).await?;
            info!(view, "Materialized view refreshed (blocking)");
            Ok(RefreshOutcome::Blocking)
        }
    }
}

/// Refreshes the daily payment summary on the database at `url`.
///
/// Non-PostgreSQL URLs are skipped without opening a connection.
pub async fn refresh_daily_summary(url: &str, max_connections: u32) -> DbResult<RefreshOutcome> {
    let vendor = DatabaseVendor::from_url(url);
    if vendor != DatabaseVendor::PostgreSql {
        info!(vendor = %vendor, "Skipping materialized view refresh");
        return Ok(RefreshOutcome::Skipped { vendor });
    }

    let pool = connect_postgres(url, max_connections).await?;
    let outcome = refresh_view(&pool, DAILY_SUMMARY_VIEW).await;
    pool.close().await;
    outcome
}

/// Double-quotes a PostgreSQL identifier.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
