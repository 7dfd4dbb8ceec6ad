//! # Domain Types
//!
//! Entities persisted by Harbor POS.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Outlet ◄──────────── Till ◄────────── Shift ◄───── Expense            │
//! │     ▲                   ▲    (set null)   ▲  (set null)                 │
//! │     │                   │                 │                             │
//! │     │             KitchenOrderTicket      │                             │
//! │     │              (till set null)        │                             │
//! │     │                                     │                             │
//! │   Batch ──► Product ◄── ProductUnit      Sale ◄── SaleItem              │
//! │   unique(product, outlet, batch_number)   ▲                             │
//! │                                           └────── Payment               │
//! │                                                                         │
//! │   ItemVariation: legacy, read-only, referenced by nothing               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity uses a UUID v4 string `id`. Business keys (sku,
//! receipt_number, batch_number) are unique where noted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::kitchen::TicketStatus;
use crate::money::{Money, TaxRate};
use crate::shift::ShiftStatus;
use crate::units::UnitFactor;

// =============================================================================
// Outlet
// =============================================================================

/// A physical store location.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Outlet {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product Catalog
// =============================================================================

/// A sellable good.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Name of the unit stock is counted in ("piece", "kg").
    pub base_unit: String,

    /// Price of one base unit in cents.
    pub price_cents: i64,

    /// Tax rate in basis points (1600 = 16%).
    pub tax_rate_bps: u32,

    /// Soft-delete flag.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

/// An alternate sale unit for a product.
///
/// `(product_id, unit_name)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductUnit {
    pub id: String,
    pub product_id: String,
    pub unit_name: String,
    /// Base units per one of this unit, in thousandths.
    pub factor_milli: i64,
    /// Price override for this unit. `None` scales the base price.
    pub price_cents: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl ProductUnit {
    /// The stored factor. Rows are validated on insert, so a non-positive
    /// factor read back from the database falls back to the base unit.
    pub fn factor(&self) -> UnitFactor {
        UnitFactor::from_milli(self.factor_milli).unwrap_or_default()
    }

    /// Price of one of this unit, given the product's base price.
    pub fn unit_price(&self, product: &Product) -> CoreResult<Money> {
        match self.price_cents {
            Some(cents) => Ok(Money::from_cents(cents)),
            None => self.factor().unit_price(product.price()),
        }
    }
}

/// Legacy per-product SKU variant.
///
/// Retired in favour of [`ProductUnit`]. The table is kept readable for
/// diagnostics only; nothing writes it and no entity references it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ItemVariation {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub price_cents: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory
// =============================================================================

/// A tracked lot of stock for a product at an outlet.
///
/// `(product_id, outlet_id, batch_number)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Batch {
    pub id: String,
    pub product_id: String,
    pub outlet_id: String,
    pub batch_number: String,
    /// Remaining stock in base units. Never negative.
    pub quantity: i64,
    /// Unit cost for margin reporting.
    pub cost_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub received_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Expired on `today` (expiry date is the last sellable day).
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.expiry_date, Some(expiry) if expiry < today)
    }
}

// =============================================================================
// Tills
// =============================================================================

/// A point-of-sale terminal at an outlet.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Till {
    pub id: String,
    pub outlet_id: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sales
// =============================================================================

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SaleStatus {
    /// Items are still being rung up.
    #[default]
    Draft,
    /// Paid and finalized.
    Completed,
    /// Cancelled.
    Voided,
}

impl SaleStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "draft",
            SaleStatus::Completed => "completed",
            SaleStatus::Voided => "voided",
        }
    }
}

/// How a payment was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    /// Card payment on an external terminal.
    ExternalCard,
    MobileMoney,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::ExternalCard => "external_card",
            PaymentMethod::MobileMoney => "mobile_money",
        }
    }
}

/// A sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub outlet_id: String,
    pub till_id: Option<String>,
    pub shift_id: Option<String>,
    pub receipt_number: String,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A line item in a sale.
///
/// Product details are snapshotted so history survives catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// SKU at time of sale.
    pub sku_snapshot: String,
    /// Product name at time of sale.
    pub name_snapshot: String,
    /// Free-text variant label at time of sale, if any.
    pub variation_name: Option<String>,
    /// Sale unit name, `None` when sold in the base unit.
    pub unit_name: Option<String>,
    /// Unit factor at time of sale, in thousandths.
    pub factor_milli: i64,
    /// Price of one sale unit.
    pub unit_price_cents: i64,
    /// Quantity in the sale unit.
    pub quantity: i64,
    /// Quantity in base units.
    pub base_quantity: i64,
    /// Line discount. Never negative.
    pub discount_cents: i64,
    pub tax_cents: i64,
    /// Gross minus discount, before tax.
    pub line_total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A payment towards a sale. Split tender means several per sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    /// For cash: amount the customer handed over.
    pub tendered_cents: Option<i64>,
    /// For cash: change returned.
    pub change_cents: Option<i64>,
    /// External reference (card auth code, mobile money receipt).
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Shifts & Expenses
// =============================================================================

/// A bounded cashier session on a till.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub till_id: String,
    pub cashier_name: String,
    pub status: ShiftStatus,
    /// Business day the shift counts towards (may differ from the
    /// calendar date of `start_time` for overnight shifts).
    #[ts(as = "String")]
    pub operating_date: NaiveDate,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    /// Set exactly when the shift is closed.
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub opening_float_cents: i64,
    pub closing_cash_cents: Option<i64>,
}

/// Money paid out for running costs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub outlet_id: String,
    /// Shift the expense was paid from. Cleared if the shift is deleted.
    pub shift_id: Option<String>,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    /// Paid out of the till drawer (counts against the shift's cash).
    pub paid_from_till: bool,
    #[ts(as = "String")]
    pub incurred_at: DateTime<Utc>,
}

// =============================================================================
// Kitchen
// =============================================================================

/// A restaurant kitchen order ticket.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct KitchenOrderTicket {
    pub id: String,
    pub outlet_id: String,
    /// Till that raised the ticket. Cleared if the till is deleted.
    pub till_id: Option<String>,
    /// Sale the ticket belongs to. Cleared if the sale is deleted.
    pub sale_id: Option<String>,
    pub ticket_number: String,
    pub table_label: Option<String>,
    pub status: TicketStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Reporting
// =============================================================================

/// One row of the daily payment summary view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyPaymentSummary {
    /// `YYYY-MM-DD` of the payment.
    pub business_date: String,
    pub outlet_id: String,
    pub method: String,
    pub payment_count: i64,
    pub total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
