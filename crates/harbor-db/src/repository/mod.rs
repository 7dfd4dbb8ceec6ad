//! # Repository Module
//!
//! Database repository implementations for Harbor POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.batches().consume(&batch_id, 6)                            │
//! │       ▼                                                                 │
//! │  BatchRepository                                                       │
//! │  ├── validates input with harbor-core                                  │
//! │  ├── runs SQL against SqlitePool                                       │
//! │  └── maps constraint failures into DbError                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`OutletRepository`](outlet::OutletRepository) - Store locations
//! - [`ProductRepository`](product::ProductRepository) - Products, units, legacy variations
//! - [`BatchRepository`](batch::BatchRepository) - Stock lots
//! - [`TillRepository`](till::TillRepository) - POS terminals
//! - [`SaleRepository`](sale::SaleRepository) - Sales, items, payments
//! - [`ShiftRepository`](shift::ShiftRepository) - Cashier shifts
//! - [`ExpenseRepository`](expense::ExpenseRepository) - Expenses
//! - [`KitchenTicketRepository`](kitchen::KitchenTicketRepository) - Kitchen order tickets
//! - [`SummaryRepository`](summary::SummaryRepository) - Daily payment summary view

pub mod batch;
pub mod expense;
pub mod kitchen;
pub mod outlet;
pub mod product;
pub mod sale;
pub mod shift;
pub mod summary;
pub mod till;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
