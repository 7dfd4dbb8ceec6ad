//! # Diagnostics
//!
//! Read-only queries used by the admin commands. They go through
//! `sqlx::Any` so the same code inspects the SQLite store or the PostgreSQL
//! reporting database.
//!
//! The `Any` driver only decodes primitive types, so dates and timestamps
//! are cast to text in SQL and integer aggregates are cast to BIGINT.
//! Output shapes are not a stable API.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::{debug, info};

use harbor_core::DatabaseVendor;

use crate::error::{DbError, DbResult};

/// Row counts for the catalog and shift tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub products: i64,
    /// Retired item variations still present in the legacy table.
    pub legacy_variations: i64,
    pub product_units: i64,
    pub shifts_total: i64,
    pub shifts_open: i64,
    pub shifts_closed: i64,
}

/// One line of the shift report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ShiftReportRow {
    pub id: String,
    pub till_id: String,
    pub cashier_name: String,
    pub status: String,
    pub operating_date: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub opening_float_cents: i64,
    pub closing_cash_cents: Option<i64>,
    pub expense_count: i64,
    pub expense_total_cents: i64,
}

/// Read-only connection for diagnostics.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pool: AnyPool,
    vendor: DatabaseVendor,
}

impl Diagnostics {
    /// Connects to `url` (SQLite or PostgreSQL).
    pub async fn connect(url: &str, max_connections: u32) -> DbResult<Self> {
        sqlx::any::install_default_drivers();

        let vendor = DatabaseVendor::from_url(url);
        if !matches!(vendor, DatabaseVendor::PostgreSql | DatabaseVendor::Sqlite) {
            return Err(DbError::UnsupportedVendor {
                operation: "diagnostics".to_string(),
                vendor: vendor.to_string(),
            });
        }

        info!(vendor = %vendor, "Connecting for diagnostics");

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        Ok(Diagnostics { pool, vendor })
    }

    /// Vendor behind the connection.
    pub fn vendor(&self) -> DatabaseVendor {
        self.vendor
    }

    /// Counts products, legacy variations, product units and shifts.
    pub async fn table_counts(&self) -> DbResult<TableCounts> {
        let products = self.count("products").await?;
        let legacy_variations = self.count("item_variations").await?;
        let product_units = self.count("product_units").await?;

        let (shifts_total, shifts_open, shifts_closed): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                CAST(COUNT(*) AS BIGINT),
                CAST(COALESCE(SUM(CASE WHEN status = 'OPEN' THEN 1 ELSE 0 END), 0) AS BIGINT),
                CAST(COALESCE(SUM(CASE WHEN status = 'CLOSED' THEN 1 ELSE 0 END), 0) AS BIGINT)
            FROM shifts
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TableCounts {
            products,
            legacy_variations,
            product_units,
            shifts_total,
            shifts_open,
            shifts_closed,
        })
    }

    /// Shifts with their expense totals, optionally for one operating date.
    pub async fn shift_report(&self, operating_date: Option<NaiveDate>) -> DbResult<Vec<ShiftReportRow>> {
        let filter = match operating_date {
            Some(_) => format!(
                "WHERE CAST(s.operating_date AS TEXT) = {}",
                self.vendor.placeholder(1)
            ),
            None => String::new(),
        };

        let sql = format!(
            r#"
            SELECT
                s.id, s.till_id, s.cashier_name, s.status,
                CAST(s.operating_date AS TEXT) AS operating_date,
                CAST(s.start_time AS TEXT) AS start_time,
                CAST(s.end_time AS TEXT) AS end_time,
                s.opening_float_cents, s.closing_cash_cents,
                CAST(COUNT(e.id) AS BIGINT) AS expense_count,
                CAST(COALESCE(SUM(e.amount_cents), 0) AS BIGINT) AS expense_total_cents
            FROM shifts s
            LEFT JOIN expenses e ON e.shift_id = s.id
            {filter}
            GROUP BY
                s.id, s.till_id, s.cashier_name, s.status, s.operating_date,
                s.start_time, s.end_time, s.opening_float_cents, s.closing_cash_cents
            ORDER BY s.start_time
            "#
        );

        debug!(?operating_date, "Building shift report");

        let mut query = sqlx::query_as::<_, ShiftReportRow>(&sql);
        if let Some(date) = operating_date {
            query = query.bind(date.format("%Y-%m-%d").to_string());
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn count(&self, table: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT CAST(COUNT(*) AS BIGINT) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use tempfile::TempDir;

    /// Migrated SQLite file with two tills, one closed shift with expenses
    /// and one open shift.
    async fn seeded_store() -> (TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diag.db");
        let db = Database::new(DbConfig::new(&path)).await.unwrap();

        let outlet = db.outlets().create("Main").await.unwrap();
        let front = db.tills().create(&outlet.id, "Front").await.unwrap();
        let back = db.tills().create(&outlet.id, "Back").await.unwrap();
        let product = db
            .products()
            .create(NewProduct {
                sku: "RICE".to_string(),
                name: "Rice".to_string(),
                base_unit: "kg".to_string(),
                price_cents: 250,
                tax_rate_bps: 0,
            })
            .await
            .unwrap();
        db.products()
            .add_unit(&product.id, "sack", 25_000, None)
            .await
            .unwrap();

        let closed = db.shifts().open_shift(&front.id, "Amina", 0).await.unwrap();
        db.expenses()
            .record(&outlet.id, Some(&closed.id), "fuel", None, 700, true)
            .await
            .unwrap();
        db.expenses()
            .record(&outlet.id, Some(&closed.id), "ice", None, 300, false)
            .await
            .unwrap();
        db.shifts().close_shift(&closed.id, 0).await.unwrap();
        db.shifts().open_shift(&back.id, "Baraka", 1_000).await.unwrap();

        db.close().await;
        let url = format!("sqlite://{}", path.display());
        (dir, url)
    }

    #[tokio::test]
    async fn test_table_counts() {
        let (_dir, url) = seeded_store().await;
        let diag = Diagnostics::connect(&url, 1).await.unwrap();
        assert_eq!(diag.vendor(), DatabaseVendor::Sqlite);

        let counts = diag.table_counts().await.unwrap();
        assert_eq!(
            counts,
            TableCounts {
                products: 1,
                legacy_variations: 0,
                product_units: 1,
                shifts_total: 2,
                shifts_open: 1,
                shifts_closed: 1,
            }
        );
        diag.close().await;
    }

    #[tokio::test]
    async fn test_shift_report_totals_expenses() {
        let (_dir, url) = seeded_store().await;
        let diag = Diagnostics::connect(&url, 1).await.unwrap();

        let rows = diag.shift_report(None).await.unwrap();
        assert_eq!(rows.len(), 2);

        let amina = rows.iter().find(|r| r.cashier_name == "Amina").unwrap();
        assert_eq!(amina.status, "CLOSED");
        assert_eq!(amina.expense_count, 2);
        assert_eq!(amina.expense_total_cents, 1_000);
        assert!(amina.end_time.is_some());

        let baraka = rows.iter().find(|r| r.cashier_name == "Baraka").unwrap();
        assert_eq!(baraka.expense_count, 0);
        assert_eq!(baraka.expense_total_cents, 0);
        assert!(baraka.end_time.is_none());

        let today = NaiveDate::parse_from_str(&amina.operating_date, "%Y-%m-%d").unwrap();
        assert_eq!(diag.shift_report(Some(today)).await.unwrap().len(), 2);
        let long_ago = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        assert!(diag.shift_report(Some(long_ago)).await.unwrap().is_empty());
        diag.close().await;
    }

    #[tokio::test]
    async fn test_unsupported_vendor() {
        let err = Diagnostics::connect("mysql://nowhere.invalid/pos", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UnsupportedVendor { .. }));
    }
}
