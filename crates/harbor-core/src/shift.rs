//! # Shift Rules
//!
//! A shift bounds one cashier session on a till for an operating date.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open_shift(till, cashier, float)                                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌─────────┐   close_shift(counted_cash, end_time)   ┌──────────┐     │
//! │   │  OPEN   │ ──────────────────────────────────────► │  CLOSED  │     │
//! │   └─────────┘                                          └──────────┘     │
//! │   end_time = NULL                                      end_time set     │
//! │                                                                         │
//! │   One OPEN shift per till. CLOSED is terminal.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Shift;

/// Status of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum ShiftStatus {
    #[default]
    Open,
    Closed,
}

impl ShiftStatus {
    /// Database / wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "OPEN",
            ShiftStatus::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that `shift` may be closed at `end_time`.
pub fn ensure_closable(shift: &Shift, end_time: DateTime<Utc>) -> CoreResult<()> {
    if shift.status == ShiftStatus::Closed {
        return Err(CoreError::ShiftAlreadyClosed {
            shift_id: shift.id.clone(),
        });
    }
    if end_time < shift.start_time {
        return Err(CoreError::ShiftEndsBeforeStart {
            shift_id: shift.id.clone(),
        });
    }
    Ok(())
}

/// Cash reconciliation for a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashReconciliation {
    /// Opening float + cash taken - expenses paid out of the drawer.
    pub expected_cents: i64,
    /// What the cashier counted at close.
    pub counted_cents: i64,
    /// counted - expected. Negative means the drawer is short.
    pub variance_cents: i64,
}

/// Reconciles the drawer for a shift.
pub fn reconcile_cash(
    opening_float: Money,
    cash_payments: Money,
    cash_expenses: Money,
    counted: Money,
) -> CashReconciliation {
    let expected = opening_float + cash_payments - cash_expenses;
    CashReconciliation {
        expected_cents: expected.cents(),
        counted_cents: counted.cents(),
        variance_cents: (counted - expected).cents(),
    }
}
