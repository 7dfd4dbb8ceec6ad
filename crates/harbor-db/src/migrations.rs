//! # Database Migrations
//!
//! Embedded SQL migrations for both vendors.
//!
//! ## Migration History
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  0001_initial_schema          batches keyed by (product, variation,     │
//! │                               outlet, batch_number)                     │
//! │  0002_sale_item_discount      variation_name nullable, discount_cents   │
//! │                               CHECK (discount_cents >= 0)               │
//! │  0003_expenses                expenses.shift_id ON DELETE SET NULL      │
//! │  0004_kitchen_ticket_till     tickets.till_id ON DELETE SET NULL        │
//! │  0005_remove_batch_variation  drop unique → drop index → drop column   │
//! │                               → unique (product, outlet, batch_number)  │
//! │  0006_daily_payment_summary   PG materialized view / SQLite view        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `migrations/sqlite/` and `migrations/postgres/` carry the same sequence.
//! Each migration runs in its own transaction; a failing step rolls that
//! migration back and stops the run.
//!
//! ## Adding New Migrations
//!
//! 1. Add the next-numbered file to BOTH directories
//! 2. **NEVER** modify an applied migration; sqlx verifies checksums

use sqlx::{PgPool, SqlitePool};
use tracing::{info, warn};

use harbor_core::vendor::sqlite_path;
use harbor_core::DatabaseVendor;

use crate::error::{DbError, DbResult};
use crate::pool::{connect_postgres, Database, DbConfig};

/// Embedded migrations for the SQLite store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Embedded migrations for the PostgreSQL reporting database.
pub static POSTGRES_MIGRATOR: sqlx::migrate::Migrator =
    sqlx::migrate!("../../migrations/postgres");

/// Runs all pending SQLite migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Runs all pending PostgreSQL migrations.
pub async fn run_postgres_migrations(pool: &PgPool) -> DbResult<()> {
    info!("Checking for pending PostgreSQL migrations");

    POSTGRES_MIGRATOR.run(pool).await?;

    info!("All PostgreSQL migrations applied successfully");
    Ok(())
}

/// Returns (total_migrations, applied_migrations) for the SQLite store.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // Missing table means nothing has been applied yet
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    Ok((total, applied as usize))
}

/// Applies the right migration set for whatever `url` points at.
///
/// Returns the vendor that was migrated.
pub async fn migrate_url(url: &str, max_connections: u32) -> DbResult<DatabaseVendor> {
    let vendor = DatabaseVendor::from_url(url);
    info!(vendor = %vendor, "Migrating database");

    match vendor {
        DatabaseVendor::PostgreSql => {
            let pool = connect_postgres(url, max_connections).await?;
            let result = run_postgres_migrations(&pool).await;
            pool.close().await;
            result?;
        }
        DatabaseVendor::Sqlite => {
            let path = sqlite_path(url).ok_or_else(|| {
                DbError::ConnectionFailed(format!("no database path in '{}'", url))
            })?;
            let db = Database::new(DbConfig::new(path).max_connections(max_connections)).await?;
            db.close().await;
        }
        other => {
            warn!(vendor = %other, "No migrations for this vendor");
            return Err(DbError::UnsupportedVendor {
                operation: "migrate".to_string(),
                vendor: other.to_string(),
            });
        }
    }

    Ok(vendor)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn bare_pool() -> SqlitePool {
        Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap()
            .pool()
            .clone()
    }

    /// Applies the first `n` migrations' SQL without the migrator bookkeeping.
    async fn apply_first(pool: &SqlitePool, n: usize) {
        for migration in MIGRATOR.iter().take(n) {
            sqlx::raw_sql(&migration.sql).execute(pool).await.unwrap();
        }
    }

    fn migration_sql(version: i64) -> String {
        MIGRATOR
            .iter()
            .find(|m| m.version == version)
            .map(|m| m.sql.to_string())
            .unwrap()
    }

    async fn seed_variation_batches(pool: &SqlitePool, second_variation_number: &str) {
        let now = "2026-03-14T08:00:00+00:00";
        sqlx::raw_sql(&format!(
            r#"
            INSERT INTO outlets (id, name, is_active, created_at) VALUES ('o1', 'Main', 1, '{now}');
            INSERT INTO products (id, sku, name, price_cents, created_at, updated_at)
                VALUES ('p1', 'TEA', 'Tea', 150, '{now}', '{now}');
            INSERT INTO item_variations (id, product_id, name, created_at)
                VALUES ('v1', 'p1', 'Small', '{now}'), ('v2', 'p1', 'Large', '{now}');
            INSERT INTO batches (id, product_id, variation_id, outlet_id, batch_number, quantity, received_at, updated_at)
                VALUES ('b1', 'p1', 'v1', 'o1', 'LOT-1', 10, '{now}', '{now}'),
                       ('b2', 'p1', 'v2', 'o1', '{second_variation_number}', 4, '{now}', '{now}');
            "#
        ))
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_all_migrations_apply() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, 6);
        assert_eq!(applied, 6);

        // Rerunning is a no-op
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_before_any_migration() {
        let pool = bare_pool().await;
        let (total, applied) = migration_status(&pool).await.unwrap();
        assert_eq!(total, 6);
        assert_eq!(applied, 0);
    }

    #[tokio::test]
    async fn test_variation_removal_keeps_batches() {
        let pool = bare_pool().await;
        apply_first(&pool, 4).await;
        seed_variation_batches(&pool, "LOT-2").await;

        sqlx::raw_sql(&migration_sql(5)).execute(&pool).await.unwrap();

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('batches')")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert!(!columns.iter().any(|c| c == "variation_id"));

        let total: i64 = sqlx::query_scalar("SELECT SUM(quantity) FROM batches")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 14);
    }

    #[tokio::test]
    async fn test_variation_removal_aborts_on_collision() {
        let pool = bare_pool().await;
        apply_first(&pool, 4).await;
        // Same batch number under two variations collapses to one key
        seed_variation_batches(&pool, "LOT-1").await;

        let mut tx = pool.begin().await.unwrap();
        let result = sqlx::raw_sql(&migration_sql(5)).execute(&mut *tx).await;
        assert!(result.is_err());
        tx.rollback().await.unwrap();

        // Rolled back: the variation column is still there
        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('batches')")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert!(columns.iter().any(|c| c == "variation_id"));
    }

    #[tokio::test]
    async fn test_migrate_url_rejects_unknown_vendor() {
        let err = migrate_url("mssql://db/pos", 1).await.unwrap_err();
        assert!(matches!(err, DbError::UnsupportedVendor { .. }));
    }
}
