//! # Summary Repository
//!
//! Reads `sales_payment_daily_summary`. On SQLite this is a plain view and
//! always current; the PostgreSQL copy is refreshed by [`crate::refresh`].

use chrono::NaiveDate;
use sqlx::SqlitePool;

use harbor_core::DailyPaymentSummary;

use crate::error::DbResult;

/// Repository for the daily payment summary.
#[derive(Debug, Clone)]
pub struct SummaryRepository {
    pool: SqlitePool,
}

impl SummaryRepository {
    /// Creates a new SummaryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SummaryRepository { pool }
    }

    /// All summary rows, newest business date first.
    pub async fn list(&self) -> DbResult<Vec<DailyPaymentSummary>> {
        let rows = sqlx::query_as::<_, DailyPaymentSummary>(
            r#"
            SELECT business_date, outlet_id, method, payment_count, total_cents
            FROM sales_payment_daily_summary
            ORDER BY business_date DESC, outlet_id, method
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Summary rows for one business date.
    pub async fn for_date(&self, business_date: NaiveDate) -> DbResult<Vec<DailyPaymentSummary>> {
        let rows = sqlx::query_as::<_, DailyPaymentSummary>(
            r#"
            SELECT business_date, outlet_id, method, payment_count, total_cents
            FROM sales_payment_daily_summary
            WHERE business_date = ?
            ORDER BY outlet_id, method
            "#,
        )
        .bind(business_date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::fixtures;
    use crate::repository::sale::NewSaleLine;
    use chrono::Utc;
    use harbor_core::PaymentMethod;

    #[tokio::test]
    async fn test_only_completed_sales_are_summarised() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let product = fixtures::product(&db, "SODA", 100, 0).await;

        for _ in 0..2 {
            let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();
            db.sales()
                .add_item(&sale.id, NewSaleLine::new(&product.id, 3))
                .await
                .unwrap();
            db.sales()
                .add_payment(&sale.id, PaymentMethod::Cash, 300, None, None)
                .await
                .unwrap();
            db.sales().finalize_sale(&sale.id).await.unwrap();
        }

        // Paid but never completed
        let draft = db.sales().create_sale(&outlet.id, None, None).await.unwrap();
        db.sales()
            .add_payment(&draft.id, PaymentMethod::MobileMoney, 500, None, None)
            .await
            .unwrap();

        let rows = db.summary().for_date(Utc::now().date_naive()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].method, "cash");
        assert_eq!(rows[0].payment_count, 2);
        assert_eq!(rows[0].total_cents, 600);
        assert_eq!(rows[0].outlet_id, outlet.id);

        assert_eq!(db.summary().list().await.unwrap(), rows);
    }
}
