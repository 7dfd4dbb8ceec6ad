//! # harbor-db: Database Layer for Harbor POS
//!
//! Database access for Harbor POS. The store of record is SQLite; the
//! reporting database is PostgreSQL, which carries the materialized daily
//! payment summary.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Harbor POS Data Flow                             │
//! │                                                                         │
//! │  harbor-admin command / library caller                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     harbor-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ product, batch│    │  sqlite/     │  │   │
//! │  │   │               │◄───│ sale, shift   │    │  postgres/   │  │   │
//! │  │   │  SqlitePool   │    │ expense, till │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    │ kitchen, ...  │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  │   ┌───────────────┐    ┌───────────────┐                       │   │
//! │  │   │  refresh.rs   │    │ diagnostics.rs│                       │   │
//! │  │   │  PgPool       │    │  AnyPool      │                       │   │
//! │  │   └───────────────┘    └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - SQLite pool creation and repository access
//! - [`migrations`] - Embedded migrations for both vendors
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`refresh`] - Materialized view refresh with blocking fallback
//! - [`diagnostics`] - Read-only counts and shift report over `sqlx::Any`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use harbor_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./harbor.db")).await?;
//! let shift = db.shifts().open_shift(&till.id, "Amina", 5_000).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod diagnostics;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod refresh;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use diagnostics::{Diagnostics, ShiftReportRow, TableCounts};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use refresh::{refresh_daily_summary, refresh_view, RefreshOutcome, ViewRefresher};

// Repository re-exports for convenience
pub use repository::batch::{BatchRepository, NewBatch};
pub use repository::expense::ExpenseRepository;
pub use repository::kitchen::{KitchenTicketRepository, NewKitchenTicket};
pub use repository::outlet::OutletRepository;
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::sale::{NewSaleLine, SaleRepository};
pub use repository::shift::ShiftRepository;
pub use repository::summary::SummaryRepository;
pub use repository::till::TillRepository;
