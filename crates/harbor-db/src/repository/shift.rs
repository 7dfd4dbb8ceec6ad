//! # Shift Repository
//!
//! Cashier sessions on a till.
//!
//! A till holds at most one OPEN shift. The check runs inside the opening
//! transaction and the partial unique index `uq_shifts_open_per_till`
//! backs it up.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use harbor_core::shift::{ensure_closable, reconcile_cash, CashReconciliation};
use harbor_core::validation::validate_text;
use harbor_core::{CoreError, Money, Shift, ShiftStatus, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

const SHIFT_COLUMNS: &str = r#"
    id, till_id, cashier_name, status, operating_date, start_time,
    end_time, opening_float_cents, closing_cash_cents
"#;

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Opens a shift on a till.
    ///
    /// The operating date is the UTC date of the start time.
    pub async fn open_shift(
        &self,
        till_id: &str,
        cashier_name: &str,
        opening_float_cents: i64,
    ) -> DbResult<Shift> {
        let cashier_name = cashier_name.trim();
        validate_text("cashier_name", cashier_name, 100)?;
        if opening_float_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "opening_float".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        if let Some(open) = fetch_open(&mut tx, till_id).await? {
            return Err(CoreError::ShiftAlreadyOpen {
                till_id: till_id.to_string(),
                shift_id: open.id,
            }
            .into());
        }

        let now = Utc::now();
        let shift = Shift {
            id: generate_id(),
            till_id: till_id.to_string(),
            cashier_name: cashier_name.to_string(),
            status: ShiftStatus::Open,
            operating_date: now.date_naive(),
            start_time: now,
            end_time: None,
            opening_float_cents,
            closing_cash_cents: None,
        };

        sqlx::query(&format!(
            "INSERT INTO shifts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            SHIFT_COLUMNS
        ))
        .bind(&shift.id)
        .bind(&shift.till_id)
        .bind(&shift.cashier_name)
        .bind(shift.status)
        .bind(shift.operating_date)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.opening_float_cents)
        .bind(shift.closing_cash_cents)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            shift_id = %shift.id,
            till_id = %shift.till_id,
            cashier = %shift.cashier_name,
            "Shift opened"
        );
        Ok(shift)
    }

    /// Gets a shift by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;
        fetch_shift(&mut conn, id).await
    }

    /// Gets the open shift on a till, if any.
    pub async fn get_open_for_till(&self, till_id: &str) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;
        fetch_open(&mut conn, till_id).await
    }

    /// Closes an open shift, recording the counted cash.
    pub async fn close_shift(&self, id: &str, closing_cash_cents: i64) -> DbResult<Shift> {
        if closing_cash_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "closing_cash".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let shift = fetch_shift(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Shift", id))?;
        let end_time = Utc::now();
        ensure_closable(&shift, end_time)?;

        let result = sqlx::query(
            r#"
            UPDATE shifts SET status = ?, end_time = ?, closing_cash_cents = ?
            WHERE id = ? AND status = 'OPEN'
            "#,
        )
        .bind(ShiftStatus::Closed)
        .bind(end_time)
        .bind(closing_cash_cents)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ShiftAlreadyClosed {
                shift_id: id.to_string(),
            }
            .into());
        }

        tx.commit().await?;

        info!(shift_id = %id, closing_cash = closing_cash_cents, "Shift closed");

        Ok(Shift {
            status: ShiftStatus::Closed,
            end_time: Some(end_time),
            closing_cash_cents: Some(closing_cash_cents),
            ..shift
        })
    }

    /// Lists shifts, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shifts ORDER BY start_time DESC LIMIT ?",
            SHIFT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }

    /// Lists shifts for one operating date.
    pub async fn list_by_date(&self, operating_date: NaiveDate) -> DbResult<Vec<Shift>> {
        debug!(%operating_date, "Listing shifts");

        let shifts = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {} FROM shifts WHERE operating_date = ? ORDER BY start_time",
            SHIFT_COLUMNS
        ))
        .bind(operating_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }

    /// Returns (open, closed) shift counts.
    pub async fn count_by_status(&self) -> DbResult<(i64, i64)> {
        let (open, closed): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'OPEN' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'CLOSED' THEN 1 ELSE 0 END), 0)
            FROM shifts
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((open, closed))
    }

    /// Reconciles the drawer of a closed shift.
    ///
    /// Expected cash is the opening float plus cash payments on completed
    /// sales of the shift, less expenses paid out of the till.
    pub async fn reconcile(&self, shift_id: &str) -> DbResult<CashReconciliation> {
        let shift = self
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| DbError::not_found("Shift", shift_id))?;
        let counted = shift
            .closing_cash_cents
            .ok_or_else(|| ValidationError::Required {
                field: "closing_cash".to_string(),
            })?;

        let cash_payments: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(p.amount_cents), 0)
            FROM payments p
            JOIN sales s ON s.id = p.sale_id
            WHERE s.shift_id = ? AND s.status = 'completed' AND p.method = 'cash'
            "#,
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        let cash_expenses: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM expenses
            WHERE shift_id = ? AND paid_from_till = 1
            "#,
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(reconcile_cash(
            Money::from_cents(shift.opening_float_cents),
            Money::from_cents(cash_payments),
            Money::from_cents(cash_expenses),
            Money::from_cents(counted),
        ))
    }

    /// Deletes a shift. Linked expenses and sales keep their rows with
    /// the shift reference cleared.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM shifts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shift", id));
        }

        info!(shift_id = %id, "Shift deleted");
        Ok(())
    }
}

async fn fetch_shift(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Shift>> {
    let shift = sqlx::query_as::<_, Shift>(&format!(
        "SELECT {} FROM shifts WHERE id = ?",
        SHIFT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(shift)
}

async fn fetch_open(conn: &mut SqliteConnection, till_id: &str) -> DbResult<Option<Shift>> {
    let shift = sqlx::query_as::<_, Shift>(&format!(
        "SELECT {} FROM shifts WHERE till_id = ? AND status = 'OPEN'",
        SHIFT_COLUMNS
    ))
    .bind(till_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(shift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::repository::sale::NewSaleLine;
    use harbor_core::PaymentMethod;

    #[tokio::test]
    async fn test_one_open_shift_per_till() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let till = fixtures::till(&db, &outlet, "Front").await;
        let other = fixtures::till(&db, &outlet, "Back").await;

        let first = db.shifts().open_shift(&till.id, "Amina", 5_000).await.unwrap();
        assert_eq!(first.status, ShiftStatus::Open);
        assert!(first.end_time.is_none());

        let err = db.shifts().open_shift(&till.id, "Baraka", 0).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ShiftAlreadyOpen { .. })
        ));

        // Other tills are unaffected
        db.shifts().open_shift(&other.id, "Baraka", 0).await.unwrap();

        // After closing, the till can open again
        db.shifts().close_shift(&first.id, 5_000).await.unwrap();
        db.shifts().open_shift(&till.id, "Chiku", 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_index_backs_up_the_check() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let till = fixtures::till(&db, &outlet, "Front").await;
        db.shifts().open_shift(&till.id, "Amina", 0).await.unwrap();

        let err = sqlx::query(
            r#"
            INSERT INTO shifts (id, till_id, cashier_name, status, operating_date, start_time)
            VALUES ('dup', ?, 'Baraka', 'OPEN', '2026-03-14', '2026-03-14T08:00:00+00:00')
            "#,
        )
        .bind(&till.id)
        .execute(db.pool())
        .await
        .unwrap_err();

        assert!(matches!(DbError::from(err), DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_close_sets_end_time_once() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let till = fixtures::till(&db, &outlet, "Front").await;
        let shift = db.shifts().open_shift(&till.id, "Amina", 1_000).await.unwrap();

        let closed = db.shifts().close_shift(&shift.id, 1_200).await.unwrap();
        assert_eq!(closed.status, ShiftStatus::Closed);
        assert!(closed.end_time.unwrap() >= closed.start_time);

        let stored = db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ShiftStatus::Closed);
        assert_eq!(stored.closing_cash_cents, Some(1_200));

        let err = db.shifts().close_shift(&shift.id, 1_200).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::ShiftAlreadyClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_counts_and_listing() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let front = fixtures::till(&db, &outlet, "Front").await;
        let back = fixtures::till(&db, &outlet, "Back").await;

        let shift = db.shifts().open_shift(&front.id, "Amina", 0).await.unwrap();
        db.shifts().close_shift(&shift.id, 0).await.unwrap();
        db.shifts().open_shift(&back.id, "Baraka", 0).await.unwrap();

        assert_eq!(db.shifts().count_by_status().await.unwrap(), (1, 1));
        assert_eq!(db.shifts().list(10).await.unwrap().len(), 2);

        let today = db
            .shifts()
            .list_by_date(shift.operating_date)
            .await
            .unwrap();
        assert_eq!(today.len(), 2);

        let other_day = shift.operating_date.pred_opt().unwrap();
        assert!(db.shifts().list_by_date(other_day).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_drawer() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let till = fixtures::till(&db, &outlet, "Front").await;
        let product = fixtures::product(&db, "CHAI", 500, 0).await;
        let shift = db.shifts().open_shift(&till.id, "Amina", 2_000).await.unwrap();

        let sale = db
            .sales()
            .create_sale(&outlet.id, Some(&till.id), Some(&shift.id))
            .await
            .unwrap();
        db.sales()
            .add_item(&sale.id, NewSaleLine::new(&product.id, 3))
            .await
            .unwrap();
        db.sales()
            .add_payment(&sale.id, PaymentMethod::Cash, 1_000, Some(1_000), None)
            .await
            .unwrap();
        db.sales()
            .add_payment(&sale.id, PaymentMethod::ExternalCard, 500, None, Some("AUTH-1"))
            .await
            .unwrap();
        db.sales().finalize_sale(&sale.id).await.unwrap();

        db.expenses()
            .record(&outlet.id, Some(&shift.id), "supplies", None, 300, true)
            .await
            .unwrap();

        // Open shifts have nothing counted yet
        assert!(db.shifts().reconcile(&shift.id).await.is_err());

        db.shifts().close_shift(&shift.id, 2_650).await.unwrap();
        let recon = db.shifts().reconcile(&shift.id).await.unwrap();
        assert_eq!(recon.expected_cents, 2_700);
        assert_eq!(recon.counted_cents, 2_650);
        assert_eq!(recon.variance_cents, -50);
    }

    #[tokio::test]
    async fn test_blank_cashier_rejected() {
        let db = fixtures::db().await;
        let outlet = fixtures::outlet(&db, "Main").await;
        let till = fixtures::till(&db, &outlet, "Front").await;

        assert!(db.shifts().open_shift(&till.id, "  ", 0).await.is_err());
        assert!(db.shifts().open_shift(&till.id, "Amina", -1).await.is_err());
        assert!(db.shifts().get_open_for_till(&till.id).await.unwrap().is_none());
    }
}
