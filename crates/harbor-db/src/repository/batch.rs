//! # Batch Repository
//!
//! Stock lots per product and outlet.
//!
//! ## Keys and Stock Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UNIQUE (product_id, outlet_id, batch_number)                          │
//! │                                                                         │
//! │  LOT-7 of SUGAR at Westlands  ✓                                        │
//! │  LOT-7 of SUGAR at CBD        ✓  (different outlet)                    │
//! │  LOT-7 of SUGAR at Westlands  ✗  UniqueViolation                       │
//! │                                                                         │
//! │  quantity is in base units and never negative:                         │
//! │     UPDATE batches SET quantity = quantity - ?                         │
//! │     WHERE id = ? AND quantity >= ?                                     │
//! │  Zero rows touched → InsufficientStock, nothing written.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use harbor_core::validation::{validate_batch_number, validate_stock_quantity};
use harbor_core::{Batch, CoreError, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

const BATCH_COLUMNS: &str = r#"
    id, product_id, outlet_id, batch_number, quantity,
    cost_cents, expiry_date, received_at, updated_at
"#;

/// Input for receiving a new batch.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub product_id: String,
    pub outlet_id: String,
    pub batch_number: String,
    /// Received quantity in base units.
    pub quantity: i64,
    pub cost_cents: Option<i64>,
    pub expiry_date: Option<NaiveDate>,
}

/// Repository for batch database operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Records a received stock lot.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - batch number already used for this
    ///   product at this outlet
    pub async fn receive(&self, input: NewBatch) -> DbResult<Batch> {
        validate_batch_number(&input.batch_number)?;
        validate_stock_quantity(input.quantity)?;

        let now = Utc::now();
        let batch = Batch {
            id: generate_id(),
            product_id: input.product_id,
            outlet_id: input.outlet_id,
            batch_number: input.batch_number.trim().to_string(),
            quantity: input.quantity,
            cost_cents: input.cost_cents,
            expiry_date: input.expiry_date,
            received_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO batches (
                id, product_id, outlet_id, batch_number, quantity,
                cost_cents, expiry_date, received_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&batch.id)
        .bind(&batch.product_id)
        .bind(&batch.outlet_id)
        .bind(&batch.batch_number)
        .bind(batch.quantity)
        .bind(batch.cost_cents)
        .bind(batch.expiry_date)
        .bind(batch.received_at)
        .bind(batch.updated_at)
        .execute(&self.pool)
        .await?;

        info!(
            batch_number = %batch.batch_number,
            product_id = %batch.product_id,
            outlet_id = %batch.outlet_id,
            quantity = batch.quantity,
            "Batch received"
        );

        Ok(batch)
    }

    /// Gets a batch by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Batch>> {
        let mut conn = self.pool.acquire().await?;
        fetch_batch(&mut conn, id).await
    }

    /// Finds a batch by its business key.
    pub async fn find(
        &self,
        product_id: &str,
        outlet_id: &str,
        batch_number: &str,
    ) -> DbResult<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(&format!(
            "SELECT {} FROM batches WHERE product_id = ? AND outlet_id = ? AND batch_number = ?",
            BATCH_COLUMNS
        ))
        .bind(product_id)
        .bind(outlet_id)
        .bind(batch_number.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Lists a product's batches at an outlet, earliest expiry first
    /// (undated lots last).
    pub async fn list_for_product(&self, product_id: &str, outlet_id: &str) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(&format!(
            r#"
            SELECT {} FROM batches
            WHERE product_id = ? AND outlet_id = ?
            ORDER BY expiry_date IS NULL, expiry_date, received_at
            "#,
            BATCH_COLUMNS
        ))
        .bind(product_id)
        .bind(outlet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Lists stocked batches at an outlet that expired before `today`.
    pub async fn list_expired(&self, outlet_id: &str, today: NaiveDate) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(&format!(
            r#"
            SELECT {} FROM batches
            WHERE outlet_id = ? AND quantity > 0
              AND expiry_date IS NOT NULL AND expiry_date < ?
            ORDER BY expiry_date
            "#,
            BATCH_COLUMNS
        ))
        .bind(outlet_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Total stock of a product at an outlet, in base units.
    pub async fn available_quantity(&self, product_id: &str, outlet_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM batches WHERE product_id = ? AND outlet_id = ?",
        )
        .bind(product_id)
        .bind(outlet_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Adds stock to an existing batch.
    pub async fn restock(&self, batch_id: &str, quantity: i64) -> DbResult<Batch> {
        ensure_positive(quantity)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE batches SET quantity = quantity + ?, updated_at = ? WHERE id = ?",
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(batch_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Batch", batch_id));
        }

        let batch = fetch_batch(&mut tx, batch_id)
            .await?
            .ok_or_else(|| DbError::not_found("Batch", batch_id))?;
        tx.commit().await?;

        debug!(batch_id = %batch_id, quantity, "Batch restocked");
        Ok(batch)
    }

    /// Takes `quantity` base units out of a batch.
    ///
    /// ## Returns
    /// * `Ok(Batch)` - batch after consumption
    /// * `Err(DbError::Domain(InsufficientStock))` - not enough stock; nothing written
    pub async fn consume(&self, batch_id: &str, quantity: i64) -> DbResult<Batch> {
        let mut tx = self.pool.begin().await?;
        let batch = consume_stock(&mut tx, batch_id, quantity).await?;
        tx.commit().await?;
        Ok(batch)
    }

    /// Deletes a batch.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM batches WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Batch", id));
        }

        Ok(())
    }
}

// =============================================================================
// Connection-level helpers (shared with the sale repository)
// =============================================================================

async fn fetch_batch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Batch>> {
    let batch = sqlx::query_as::<_, Batch>(&format!(
        "SELECT {} FROM batches WHERE id = ?",
        BATCH_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(batch)
}

/// Guarded decrement; runs on the caller's transaction.
pub(crate) async fn consume_stock(
    conn: &mut SqliteConnection,
    batch_id: &str,
    quantity: i64,
) -> DbResult<Batch> {
    ensure_positive(quantity)?;

    let result = sqlx::query(
        r#"
        UPDATE batches
        SET quantity = quantity - ?, updated_at = ?
        WHERE id = ? AND quantity >= ?
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(batch_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    let batch = fetch_batch(conn, batch_id)
        .await?
        .ok_or_else(|| DbError::not_found("Batch", batch_id))?;

    if result.rows_affected() == 0 {
        return Err(CoreError::InsufficientStock {
            batch_number: batch.batch_number,
            available: batch.quantity,
            requested: quantity,
        }
        .into());
    }

    debug!(
        batch_id = %batch_id,
        consumed = quantity,
        remaining = batch.quantity,
        "Batch stock consumed"
    );
    Ok(batch)
}

// Stock moves are in base units and may exceed the per-line sale cap
fn ensure_positive(quantity: i64) -> DbResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use harbor_core::{Outlet, Product};

    fn new_batch(product: &Product, outlet: &Outlet, number: &str, quantity: i64) -> NewBatch {
        NewBatch {
            product_id: product.id.clone(),
            outlet_id: outlet.id.clone(),
            batch_number: number.to_string(),
            quantity,
            cost_cents: Some(120),
            expiry_date: None,
        }
    }

    #[tokio::test]
    async fn test_batch_number_unique_per_product_and_outlet() {
        let db = fixtures::db().await;
        let westlands = fixtures::outlet(&db, "Westlands").await;
        let cbd = fixtures::outlet(&db, "CBD").await;
        let sugar = fixtures::product(&db, "SUGAR", 180, 0).await;
        let salt = fixtures::product(&db, "SALT", 60, 0).await;
        let repo = db.batches();

        repo.receive(new_batch(&sugar, &westlands, "LOT-7", 10)).await.unwrap();

        // Same number at another outlet, and for another product: both fine
        repo.receive(new_batch(&sugar, &cbd, "LOT-7", 5)).await.unwrap();
        repo.receive(new_batch(&salt, &westlands, "LOT-7", 5)).await.unwrap();

        let err = repo
            .receive(new_batch(&sugar, &westlands, "LOT-7", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let found = repo.find(&sugar.id, &cbd.id, "LOT-7").await.unwrap().unwrap();
        assert_eq!(found.quantity, 5);
    }

    #[tokio::test]
    async fn test_consume_never_goes_negative() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let product = fixtures::product(&db, "SUGAR", 180, 0).await;
        let repo = db.batches();
        let batch = repo.receive(new_batch(&product, &outlet, "LOT-1", 10)).await.unwrap();

        let after = repo.consume(&batch.id, 6).await.unwrap();
        assert_eq!(after.quantity, 4);

        let err = repo.consume(&batch.id, 5).await.unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 4);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let unchanged = repo.get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(unchanged.quantity, 4);

        let emptied = repo.consume(&batch.id, 4).await.unwrap();
        assert_eq!(emptied.quantity, 0);
    }

    #[tokio::test]
    async fn test_consume_rejects_bad_input() {
        let db = fixtures::db().await;
        let repo = db.batches();

        assert!(matches!(
            repo.consume("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.consume("missing", 0).await,
            Err(DbError::Domain(_))
        ));
    }

    #[tokio::test]
    async fn test_restock_and_available_quantity() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let product = fixtures::product(&db, "RICE", 200, 0).await;
        let repo = db.batches();

        let a = repo.receive(new_batch(&product, &outlet, "A", 10)).await.unwrap();
        repo.receive(new_batch(&product, &outlet, "B", 2)).await.unwrap();

        repo.restock(&a.id, 3).await.unwrap();
        assert_eq!(
            repo.available_quantity(&product.id, &outlet.id).await.unwrap(),
            15
        );
        assert_eq!(
            repo.available_quantity(&product.id, "elsewhere").await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_negative_receipt_rejected() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let product = fixtures::product(&db, "RICE", 200, 0).await;

        let err = db
            .batches()
            .receive(new_batch(&product, &outlet, "A", -1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_expiry_ordering() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let product = fixtures::product(&db, "MILK", 60, 0).await;
        let repo = db.batches();
        let date = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();

        let mut undated = new_batch(&product, &outlet, "U", 1);
        undated.expiry_date = None;
        let mut late = new_batch(&product, &outlet, "L", 1);
        late.expiry_date = Some(date(20));
        let mut early = new_batch(&product, &outlet, "E", 1);
        early.expiry_date = Some(date(10));

        repo.receive(undated).await.unwrap();
        repo.receive(late).await.unwrap();
        repo.receive(early).await.unwrap();

        let numbers: Vec<String> = repo
            .list_for_product(&product.id, &outlet.id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.batch_number)
            .collect();
        assert_eq!(numbers, vec!["E", "L", "U"]);

        let expired = repo.list_expired(&outlet.id, date(15)).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].batch_number, "E");
    }
}
