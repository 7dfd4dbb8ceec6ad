//! # Expense Repository
//!
//! Money spent at an outlet, optionally tied to the shift whose drawer
//! paid it. Deleting that shift keeps the expense with `shift_id` cleared.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use harbor_core::validation::{validate_expense_amount, validate_text};
use harbor_core::Expense;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense.
    ///
    /// ## Arguments
    /// * `paid_from_till` - Cash left the shift's drawer; counts against the
    ///   drawer during reconciliation.
    pub async fn record(
        &self,
        outlet_id: &str,
        shift_id: Option<&str>,
        category: &str,
        description: Option<&str>,
        amount_cents: i64,
        paid_from_till: bool,
    ) -> DbResult<Expense> {
        let category = category.trim();
        validate_text("category", category, 100)?;
        validate_expense_amount(amount_cents)?;

        let expense = Expense {
            id: generate_id(),
            outlet_id: outlet_id.to_string(),
            shift_id: shift_id.map(str::to_string),
            category: category.to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            amount_cents,
            paid_from_till,
            incurred_at: Utc::now(),
        };

        debug!(id = %expense.id, category = %expense.category, amount = amount_cents, "Recording expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, outlet_id, shift_id, category, description,
                amount_cents, paid_from_till, incurred_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.outlet_id)
        .bind(&expense.shift_id)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.paid_from_till)
        .bind(expense.incurred_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Gets an expense by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, outlet_id, shift_id, category, description,
                   amount_cents, paid_from_till, incurred_at
            FROM expenses WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists expenses recorded against a shift.
    pub async fn list_for_shift(&self, shift_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, outlet_id, shift_id, category, description,
                   amount_cents, paid_from_till, incurred_at
            FROM expenses
            WHERE shift_id = ?
            ORDER BY incurred_at
            "#,
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Sum of expenses recorded against a shift.
    pub async fn total_for_shift(&self, shift_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses WHERE shift_id = ?",
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Deletes an expense.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}
