//! # Sale Repository
//!
//! Sales, their line items, and payments.
//!
//! ## Adding a Line
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item(sale, NewSaleLine)          one transaction                   │
//! │       │                                                                 │
//! │       ├── sale must be draft                                           │
//! │       ├── product (+ unit) looked up → unit price, factor              │
//! │       ├── quantity × factor → whole base units, else rejected          │
//! │       ├── price_line: gross, discount ∈ [0, gross], tax on net         │
//! │       ├── optional batch: guarded stock decrement                      │
//! │       ├── INSERT sale_items (sku/name/price/variation snapshots)       │
//! │       └── sale totals recomputed from all lines                        │
//! │                                                                         │
//! │  Any failure rolls the whole line back.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! SKU, name, unit price and the optional variation label are copied onto
//! the sale item so history survives catalog edits.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use harbor_core::pricing::{cash_change, price_line, SaleTotals};
use harbor_core::validation::{validate_payment_amount, validate_text};
use harbor_core::{
    CoreError, Money, Payment, PaymentMethod, Product, ProductUnit, Sale, SaleItem, SaleStatus,
    UnitFactor, ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::repository::batch::consume_stock;
use crate::repository::generate_id;

const SALE_COLUMNS: &str = r#"
    id, outlet_id, till_id, shift_id, receipt_number, status,
    subtotal_cents, discount_cents, tax_cents, total_cents,
    notes, created_at, updated_at, completed_at
"#;

const SALE_ITEM_COLUMNS: &str = r#"
    id, sale_id, product_id, sku_snapshot, name_snapshot, variation_name,
    unit_name, factor_milli, unit_price_cents, quantity, base_quantity,
    discount_cents, tax_cents, line_total_cents, created_at
"#;

/// One line to add to a sale.
#[derive(Debug, Clone, Default)]
pub struct NewSaleLine {
    pub product_id: String,
    /// Quantity in the chosen unit.
    pub quantity: i64,
    /// Sale unit name; `None` sells the base unit.
    pub unit_name: Option<String>,
    pub discount_cents: i64,
    /// Free-text label printed on the receipt ("Large", "No sugar").
    pub variation_name: Option<String>,
    /// Batch to draw stock from.
    pub batch_id: Option<String>,
}

impl NewSaleLine {
    /// A base-unit line with no discount.
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        NewSaleLine {
            product_id: product_id.into(),
            quantity,
            ..Default::default()
        }
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Creates a new draft sale.
    ///
    /// Receipt numbers are `YYYYMMDD-TT-NNNN`: date, till code (last two
    /// characters of the till id, `00` without a till), and a daily sequence.
    pub async fn create_sale(
        &self,
        outlet_id: &str,
        till_id: Option<&str>,
        shift_id: Option<&str>,
    ) -> DbResult<Sale> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let date_part = now.format("%Y%m%d").to_string();
        // Highest suffix, not a row count: deleted drafts leave gaps
        let last_sequence: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(CAST(substr(receipt_number, 13) AS INTEGER)), 0)
            FROM sales
            WHERE receipt_number LIKE ?
            "#,
        )
        .bind(format!("{}-%", date_part))
        .fetch_one(&mut *tx)
        .await?;
        let receipt_number = format!(
            "{}-{}-{:04}",
            date_part,
            till_code(till_id),
            last_sequence + 1
        );

        let sale = Sale {
            id: generate_id(),
            outlet_id: outlet_id.to_string(),
            till_id: till_id.map(str::to_string),
            shift_id: shift_id.map(str::to_string),
            receipt_number,
            status: SaleStatus::Draft,
            subtotal_cents: 0,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            notes: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        debug!(id = %sale.id, receipt_number = %sale.receipt_number, "Creating sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, outlet_id, till_id, shift_id, receipt_number, status,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                notes, created_at, updated_at, completed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.outlet_id)
        .bind(&sale.till_id)
        .bind(&sale.shift_id)
        .bind(&sale.receipt_number)
        .bind(sale.status)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.completed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(sale)
    }

    /// Adds a line to a draft sale and recomputes the sale totals.
    pub async fn add_item(&self, sale_id: &str, line: NewSaleLine) -> DbResult<SaleItem> {
        let variation_name = match line.variation_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                validate_text("variation_name", name, 100)?;
                Some(name.to_string())
            }
            _ => None,
        };

        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        ensure_status(&sale, &[SaleStatus::Draft])?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, base_unit, price_cents, tax_rate_bps,
                   is_active, created_at, updated_at
            FROM products WHERE id = ?
            "#,
        )
        .bind(&line.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;

        let (unit_name, factor, unit_price) = match line.unit_name.as_deref() {
            Some(name) => {
                let unit = sqlx::query_as::<_, ProductUnit>(
                    r#"
                    SELECT id, product_id, unit_name, factor_milli, price_cents, created_at
                    FROM product_units WHERE product_id = ? AND unit_name = ?
                    "#,
                )
                .bind(&product.id)
                .bind(name.trim())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("ProductUnit", name))?;
                let price = unit.unit_price(&product)?;
                (Some(unit.unit_name.clone()), unit.factor(), price)
            }
            None => (None, UnitFactor::BASE, product.price()),
        };

        let base_quantity = factor.to_base_quantity(line.quantity)?;
        let amounts = price_line(
            unit_price,
            line.quantity,
            Money::from_cents(line.discount_cents),
            product.tax_rate(),
        )?;

        if let Some(batch_id) = line.batch_id.as_deref() {
            let batch = consume_stock(&mut tx, batch_id, base_quantity).await?;
            // Dropping the transaction below undoes the decrement
            if batch.product_id != product.id || batch.outlet_id != sale.outlet_id {
                return Err(ValidationError::InvalidFormat {
                    field: "batch_id".to_string(),
                    reason: "batch does not hold this product at the sale's outlet".to_string(),
                }
                .into());
            }
        }

        let item = SaleItem {
            id: generate_id(),
            sale_id: sale.id.clone(),
            product_id: product.id.clone(),
            sku_snapshot: product.sku.clone(),
            name_snapshot: product.name.clone(),
            variation_name,
            unit_name,
            factor_milli: factor.milli(),
            unit_price_cents: unit_price.cents(),
            quantity: line.quantity,
            base_quantity,
            discount_cents: amounts.discount.cents(),
            tax_cents: amounts.tax.cents(),
            line_total_cents: amounts.net.cents(),
            created_at: Utc::now(),
        };

        debug!(
            sale_id = %item.sale_id,
            product_id = %item.product_id,
            quantity = item.quantity,
            base_quantity = item.base_quantity,
            "Adding sale item"
        );

        sqlx::query(&format!(
            "INSERT INTO sale_items ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            SALE_ITEM_COLUMNS
        ))
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.sku_snapshot)
        .bind(&item.name_snapshot)
        .bind(&item.variation_name)
        .bind(&item.unit_name)
        .bind(item.factor_milli)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.base_quantity)
        .bind(item.discount_cents)
        .bind(item.tax_cents)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(&mut *tx)
        .await?;

        recompute_totals(&mut tx, sale_id).await?;
        tx.commit().await?;

        Ok(item)
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, sale_id).await
    }

    /// Completes a draft sale.
    ///
    /// Totals are recomputed from the lines in the same transaction as the
    /// status change.
    pub async fn finalize_sale(&self, sale_id: &str) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        ensure_status(&sale, &[SaleStatus::Draft])?;

        if fetch_items(&mut tx, sale_id).await?.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        recompute_totals(&mut tx, sale_id).await?;

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE sales SET status = ?, completed_at = ?, updated_at = ?
            WHERE id = ? AND status = 'draft'
            "#,
        )
        .bind(SaleStatus::Completed)
        .bind(now)
        .bind(now)
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        let completed = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        tx.commit().await?;

        info!(
            receipt_number = %completed.receipt_number,
            total_cents = completed.total_cents,
            "Sale completed"
        );
        Ok(completed)
    }

    /// Voids a draft or completed sale.
    ///
    /// Stock drawn from batches is not returned automatically.
    pub async fn void_sale(&self, sale_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        ensure_status(&sale, &[SaleStatus::Draft, SaleStatus::Completed])?;

        sqlx::query("UPDATE sales SET status = ?, updated_at = ? WHERE id = ?")
            .bind(SaleStatus::Voided)
            .bind(Utc::now())
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(receipt_number = %sale.receipt_number, "Sale voided");
        Ok(())
    }

    /// Deletes a draft sale; its items go with it.
    pub async fn delete_draft(&self, sale_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        ensure_status(&sale, &[SaleStatus::Draft])?;

        sqlx::query("DELETE FROM sales WHERE id = ?")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lists sales rung up during a shift.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE shift_id = ? ORDER BY created_at",
            SALE_COLUMNS
        ))
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Records a payment against a sale.
    ///
    /// ## Arguments
    /// * `tendered_cents` - What the customer handed over; change is derived
    ///   from it and must not be negative.
    pub async fn add_payment(
        &self,
        sale_id: &str,
        method: PaymentMethod,
        amount_cents: i64,
        tendered_cents: Option<i64>,
        reference: Option<&str>,
    ) -> DbResult<Payment> {
        validate_payment_amount(amount_cents)?;

        let change_cents = match tendered_cents {
            Some(tendered) => Some(
                cash_change(Money::from_cents(amount_cents), Money::from_cents(tendered))
                    .ok_or_else(|| ValidationError::InvalidFormat {
                        field: "tendered".to_string(),
                        reason: "must cover the payment amount".to_string(),
                    })?
                    .cents(),
            ),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        ensure_status(&sale, &[SaleStatus::Draft, SaleStatus::Completed])?;

        let payment = Payment {
            id: generate_id(),
            sale_id: sale.id,
            method,
            amount_cents,
            tendered_cents,
            change_cents,
            reference: reference.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(sale_id = %payment.sale_id, method = payment.method.as_str(), amount = amount_cents, "Recording payment");

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, sale_id, method, amount_cents, tendered_cents,
                change_cents, reference, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(payment.tendered_cents)
        .bind(payment.change_cents)
        .bind(&payment.reference)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(payment)
    }

    /// Gets all payments for a sale.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, sale_id, method, amount_cents, tendered_cents,
                   change_cents, reference, created_at
            FROM payments
            WHERE sale_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Gets total amount paid for a sale.
    pub async fn get_total_paid(&self, sale_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE sale_id = ?",
        )
        .bind(sale_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {} FROM sales WHERE id = ?",
        SALE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {} FROM sale_items WHERE sale_id = ? ORDER BY created_at, id",
        SALE_ITEM_COLUMNS
    ))
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

async fn recompute_totals(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<SaleTotals> {
    let items = fetch_items(conn, sale_id).await?;
    let totals = SaleTotals::from_items(&items)?;

    sqlx::query(
        r#"
        UPDATE sales SET
            subtotal_cents = ?, discount_cents = ?, tax_cents = ?, total_cents = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(totals.subtotal_cents)
    .bind(totals.discount_cents)
    .bind(totals.tax_cents)
    .bind(totals.total_cents)
    .bind(Utc::now())
    .bind(sale_id)
    .execute(&mut *conn)
    .await?;

    Ok(totals)
}

fn ensure_status(sale: &Sale, allowed: &[SaleStatus]) -> DbResult<()> {
    if allowed.contains(&sale.status) {
        Ok(())
    } else {
        Err(CoreError::InvalidSaleStatus {
            sale_id: sale.id.clone(),
            current_status: sale.status.as_str().to_string(),
        }
        .into())
    }
}

fn till_code(till_id: Option<&str>) -> String {
    let code: Vec<char> = till_id
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if code.len() < 2 {
        "00".to_string()
    } else {
        code[code.len() - 2..]
            .iter()
            .collect::<String>()
            .to_ascii_uppercase()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::batch::NewBatch;
    use crate::repository::fixtures;
    use crate::Database;
    use harbor_core::{Outlet, Product};

    async fn setup() -> (Database, Outlet, Product) {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        // 1.80 per piece, 16% VAT
        let product = fixtures::product(&db, "SUGAR", 180, 1600).await;
        (db, outlet, product)
    }

    #[test]
    fn test_till_code() {
        assert_eq!(till_code(None), "00");
        assert_eq!(till_code(Some("a")), "00");
        assert_eq!(till_code(Some("till-7f")), "7F");
    }

    #[tokio::test]
    async fn test_receipt_numbers_are_sequential() {
        let (db, outlet, _) = setup().await;
        let first = db.sales().create_sale(&outlet.id, None, None).await.unwrap();
        let second = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        assert!(first.receipt_number.ends_with("-00-0001"));
        assert!(second.receipt_number.ends_with("-00-0002"));
        assert_eq!(first.status, SaleStatus::Draft);
    }

    #[tokio::test]
    async fn test_receipt_number_not_reused_after_draft_deleted() {
        let (db, outlet, _) = setup().await;
        let till = fixtures::till(&db, &outlet, "Till 1").await;
        let repo = db.sales();

        let first = repo.create_sale(&outlet.id, None, None).await.unwrap();
        let second = repo
            .create_sale(&outlet.id, Some(&till.id), None)
            .await
            .unwrap();
        repo.delete_draft(&first.id).await.unwrap();

        let third = repo.create_sale(&outlet.id, None, None).await.unwrap();
        assert!(second.receipt_number.ends_with("-0002"));
        assert!(third.receipt_number.ends_with("-00-0003"));
    }

    #[tokio::test]
    async fn test_line_with_discount_and_tax() {
        let (db, outlet, product) = setup().await;
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        let mut line = NewSaleLine::new(&product.id, 5);
        line.discount_cents = 100;
        line.variation_name = Some("Brown".to_string());
        let item = db.sales().add_item(&sale.id, line).await.unwrap();

        // gross 900, net 800, tax 128
        assert_eq!(item.line_total_cents, 800);
        assert_eq!(item.discount_cents, 100);
        assert_eq!(item.tax_cents, 128);
        assert_eq!(item.variation_name.as_deref(), Some("Brown"));
        assert_eq!(item.sku_snapshot, "SUGAR");

        let sale = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(sale.subtotal_cents, 900);
        assert_eq!(sale.discount_cents, 100);
        assert_eq!(sale.tax_cents, 128);
        assert_eq!(sale.total_cents, 928);
    }

    #[tokio::test]
    async fn test_variation_name_is_optional() {
        let (db, outlet, product) = setup().await;
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        let mut line = NewSaleLine::new(&product.id, 1);
        line.variation_name = Some("   ".to_string());
        let item = db.sales().add_item(&sale.id, line).await.unwrap();
        assert!(item.variation_name.is_none());

        let stored = db.sales().get_items(&sale.id).await.unwrap();
        assert!(stored[0].variation_name.is_none());
        assert_eq!(stored[0].discount_cents, 0);
    }

    #[tokio::test]
    async fn test_discount_bounds() {
        let (db, outlet, product) = setup().await;
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        let mut negative = NewSaleLine::new(&product.id, 1);
        negative.discount_cents = -1;
        assert!(matches!(
            db.sales().add_item(&sale.id, negative).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));

        let mut too_big = NewSaleLine::new(&product.id, 1);
        too_big.discount_cents = 181;
        assert!(matches!(
            db.sales().add_item(&sale.id, too_big).await,
            Err(DbError::Domain(CoreError::DiscountExceedsLine { .. }))
        ));

        assert!(db.sales().get_items(&sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_amounts_rejected() {
        let (db, outlet, _) = setup().await;
        let pricey = fixtures::product(&db, "YACHT", i64::MAX / 2 + 1, 0).await;
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        assert!(matches!(
            db.sales().add_item(&sale.id, NewSaleLine::new(&pricey.id, 2)).await,
            Err(DbError::Domain(CoreError::AmountOverflow { .. }))
        ));

        // Each line fits on its own, the sale total does not
        db.sales()
            .add_item(&sale.id, NewSaleLine::new(&pricey.id, 1))
            .await
            .unwrap();
        assert!(matches!(
            db.sales().add_item(&sale.id, NewSaleLine::new(&pricey.id, 1)).await,
            Err(DbError::Domain(CoreError::AmountOverflow { .. }))
        ));

        assert_eq!(db.sales().get_items(&sale.id).await.unwrap().len(), 1);
        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, i64::MAX / 2 + 1);
    }

    #[tokio::test]
    async fn test_negative_discount_rejected_by_schema() {
        let (db, outlet, product) = setup().await;
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        let err = sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, sku_snapshot, name_snapshot,
                unit_price_cents, quantity, base_quantity, discount_cents,
                line_total_cents, created_at
            ) VALUES ('x', ?, ?, 'SUGAR', 'Sugar', 180, 1, 1, -5, 185, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&product.id)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap_err();

        assert!(matches!(DbError::from(err), DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_unit_sale_draws_base_units_from_batch() {
        let (db, outlet, product) = setup().await;
        db.products()
            .add_unit(&product.id, "bale", 12_000, Some(2_000))
            .await
            .unwrap();
        let batch = db
            .batches()
            .receive(NewBatch {
                product_id: product.id.clone(),
                outlet_id: outlet.id.clone(),
                batch_number: "LOT-1".to_string(),
                quantity: 30,
                cost_cents: None,
                expiry_date: None,
            })
            .await
            .unwrap();
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        let mut line = NewSaleLine::new(&product.id, 2);
        line.unit_name = Some("bale".to_string());
        line.batch_id = Some(batch.id.clone());
        let item = db.sales().add_item(&sale.id, line.clone()).await.unwrap();

        assert_eq!(item.base_quantity, 24);
        assert_eq!(item.factor_milli, 12_000);
        assert_eq!(item.unit_price_cents, 2_000);
        assert_eq!(item.unit_name.as_deref(), Some("bale"));

        let remaining = db.batches().get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(remaining.quantity, 6);

        // Second pair of bales needs 24, only 6 left: no line, no stock change
        let err = db.sales().add_item(&sale.id, line).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(db.sales().get_items(&sale.id).await.unwrap().len(), 1);
        let remaining = db.batches().get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(remaining.quantity, 6);
    }

    #[tokio::test]
    async fn test_fractional_base_quantity_rejected() {
        let (db, outlet, product) = setup().await;
        db.products()
            .add_unit(&product.id, "half", 500, None)
            .await
            .unwrap();
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        let mut line = NewSaleLine::new(&product.id, 3);
        line.unit_name = Some("half".to_string());
        let err = db.sales().add_item(&sale.id, line).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::FractionalBaseQuantity { .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_from_other_outlet_rolls_back() {
        let (db, outlet, product) = setup().await;
        let elsewhere = fixtures::outlet(&db, "Elsewhere").await;
        let batch = db
            .batches()
            .receive(NewBatch {
                product_id: product.id.clone(),
                outlet_id: elsewhere.id.clone(),
                batch_number: "LOT-9".to_string(),
                quantity: 10,
                cost_cents: None,
                expiry_date: None,
            })
            .await
            .unwrap();
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        let mut line = NewSaleLine::new(&product.id, 2);
        line.batch_id = Some(batch.id.clone());
        assert!(db.sales().add_item(&sale.id, line).await.is_err());

        let untouched = db.batches().get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(untouched.quantity, 10);
    }

    #[tokio::test]
    async fn test_finalize_and_pay() {
        let (db, outlet, product) = setup().await;
        let repo = db.sales();
        let sale = repo.create_sale(&outlet.id, None, None).await.unwrap();

        // Empty sales cannot be completed
        assert!(repo.finalize_sale(&sale.id).await.is_err());

        repo.add_item(&sale.id, NewSaleLine::new(&product.id, 10))
            .await
            .unwrap();
        let payment = repo
            .add_payment(&sale.id, PaymentMethod::Cash, 2_088, Some(2_500), None)
            .await
            .unwrap();
        assert_eq!(payment.change_cents, Some(412));

        let completed = repo.finalize_sale(&sale.id).await.unwrap();
        assert_eq!(completed.status, SaleStatus::Completed);
        assert_eq!(completed.total_cents, 2_088);
        assert!(completed.completed_at.is_some());
        assert_eq!(repo.get_total_paid(&sale.id).await.unwrap(), 2_088);

        // Completed sales take no more lines
        let err = repo
            .add_item(&sale.id, NewSaleLine::new(&product.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidSaleStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_short_tender_rejected() {
        let (db, outlet, _) = setup().await;
        let sale = db.sales().create_sale(&outlet.id, None, None).await.unwrap();

        let err = db
            .sales()
            .add_payment(&sale.id, PaymentMethod::Cash, 1_000, Some(500), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert!(db.sales().get_payments(&sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_void_and_delete() {
        let (db, outlet, product) = setup().await;
        let repo = db.sales();

        let voided = repo.create_sale(&outlet.id, None, None).await.unwrap();
        repo.void_sale(&voided.id).await.unwrap();
        assert!(repo.void_sale(&voided.id).await.is_err());
        assert!(repo
            .add_payment(&voided.id, PaymentMethod::MobileMoney, 100, None, Some("MPESA-1"))
            .await
            .is_err());

        let draft = repo.create_sale(&outlet.id, None, None).await.unwrap();
        repo.add_item(&draft.id, NewSaleLine::new(&product.id, 1))
            .await
            .unwrap();
        repo.delete_draft(&draft.id).await.unwrap();

        // Items cascade with the sale
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE sale_id = ?")
            .bind(&draft.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
