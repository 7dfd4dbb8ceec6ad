//! # Error Types
//!
//! Domain-specific error types for harbor-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  harbor-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  harbor-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  harbor-admin errors                                                   │
//! │  └── AdminError       - What the operator sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → AdminError → stderr     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Batch does not hold enough stock for the requested consumption.
    #[error("Insufficient stock in batch {batch_number}: available {available}, requested {requested}")]
    InsufficientStock {
        batch_number: String,
        available: i64,
        requested: i64,
    },

    /// Sale is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding items to a completed sale
    /// - Voiding an already voided sale
    #[error("Sale {sale_id} is {current_status}, cannot perform operation")]
    InvalidSaleStatus {
        sale_id: String,
        current_status: String,
    },

    /// Shift is already closed.
    #[error("Shift {shift_id} is already closed")]
    ShiftAlreadyClosed { shift_id: String },

    /// Shift end time precedes its start time.
    #[error("Shift {shift_id} cannot end before it started")]
    ShiftEndsBeforeStart { shift_id: String },

    /// Till already has an open shift.
    #[error("Till {till_id} already has an open shift ({shift_id})")]
    ShiftAlreadyOpen { till_id: String, shift_id: String },

    /// Kitchen ticket cannot move between the given states.
    #[error("Kitchen ticket cannot move from {from} to {to}")]
    InvalidTicketTransition { from: String, to: String },

    /// Quantity in a product unit does not map to whole base units.
    #[error("Quantity {quantity} at factor {factor_milli}/1000 is not a whole number of base units")]
    FractionalBaseQuantity { quantity: i64, factor_milli: i64 },

    /// Line discount is larger than the gross line amount.
    #[error("Discount {discount_cents} exceeds line amount {gross_cents}")]
    DiscountExceedsLine {
        discount_cents: i64,
        gross_cents: i64,
    },

    /// An amount left the i64 cent range.
    #[error("{field} is too large")]
    AmountOverflow { field: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before anything reaches the database.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
