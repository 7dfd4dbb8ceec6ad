//! # harbor-core: Pure Domain Logic for Harbor POS
//!
//! This crate holds the rules of the POS back office as pure functions with
//! zero I/O dependencies. The database layer (`harbor-db`) and the admin
//! commands (`harbor-admin`) build on it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Harbor POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  harbor-admin (CLI commands)                    │   │
//! │  │  migrate, refresh-summary, count, shift-report, scan-refs       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 harbor-db (Database Layer)                      │   │
//! │  │          repositories, migrations, summary refresh              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ harbor-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   types   money   units   pricing   shift   kitchen   vendor    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Product, Batch, Sale, Shift, Expense, ...)
//! - [`money`] - Integer-cent money and tax rates
//! - [`units`] - Product unit conversion factors
//! - [`pricing`] - Sale line and sale total arithmetic
//! - [`shift`] - Shift status and closing rules
//! - [`kitchen`] - Kitchen order ticket status machine
//! - [`vendor`] - Database vendor detection from connection URLs
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use harbor_core::money::{Money, TaxRate};
//!
//! let price = Money::from_cents(1000);
//! let tax = price.calculate_tax(TaxRate::from_bps(825)).unwrap();
//! assert_eq!(tax.cents(), 83);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod kitchen;
pub mod money;
pub mod pricing;
pub mod shift;
pub mod types;
pub mod units;
pub mod validation;
pub mod vendor;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use kitchen::TicketStatus;
pub use money::{Money, TaxRate};
pub use shift::ShiftStatus;
pub use types::*;
pub use units::UnitFactor;
pub use vendor::DatabaseVendor;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single sale line, in the unit it was sold in.
///
/// ## Business Reason
/// Prevents accidental over-ringing (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Name of the daily payment summary view maintained by the reporting database.
pub const DAILY_SUMMARY_VIEW: &str = "sales_payment_daily_summary";
