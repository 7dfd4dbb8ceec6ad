//! # Product Units
//!
//! A product is stocked in a base unit (piece, kg, bottle). Each
//! `ProductUnit` names an alternate sale unit and how many base units it
//! holds. Factors are fixed-point thousandths so that half-kilo or
//! 0.75-litre units stay exact.
//!
//! ```text
//! base unit: piece
//! ┌──────────────┬──────────────┬──────────────────────────┐
//! │ unit_name    │ factor_milli │ meaning                  │
//! ├──────────────┼──────────────┼──────────────────────────┤
//! │ piece        │ 1000         │ 1 piece                  │
//! │ 6-pack       │ 6000         │ 6 pieces                 │
//! │ carton       │ 24000        │ 24 pieces                │
//! └──────────────┴──────────────┴──────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// Conversion factor from a sale unit to the product's base unit, in thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnitFactor(i64);

impl UnitFactor {
    /// Thousandths per base unit.
    pub const SCALE: i64 = 1000;

    /// The identity factor (one base unit).
    pub const BASE: UnitFactor = UnitFactor(Self::SCALE);

    /// Creates a factor from thousandths. Zero and negative factors are rejected.
    pub fn from_milli(milli: i64) -> Result<Self, ValidationError> {
        if milli <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "conversion_factor".to_string(),
            });
        }
        Ok(UnitFactor(milli))
    }

    /// Creates a factor holding a whole number of base units.
    pub fn whole(units: i64) -> Result<Self, ValidationError> {
        Self::from_milli(units.saturating_mul(Self::SCALE))
    }

    /// Returns the factor in thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Converts a quantity in this unit to base units.
    ///
    /// Stock is tracked in whole base units, so a quantity that lands on a
    /// fraction is rejected rather than rounded.
    ///
    /// ```rust
    /// use harbor_core::units::UnitFactor;
    ///
    /// let carton = UnitFactor::whole(24).unwrap();
    /// assert_eq!(carton.to_base_quantity(2).unwrap(), 48);
    ///
    /// let half = UnitFactor::from_milli(500).unwrap();
    /// assert!(half.to_base_quantity(3).is_err());
    /// ```
    pub fn to_base_quantity(&self, quantity: i64) -> CoreResult<i64> {
        let milli = quantity as i128 * self.0 as i128;
        if milli % Self::SCALE as i128 != 0 {
            return Err(CoreError::FractionalBaseQuantity {
                quantity,
                factor_milli: self.0,
            });
        }
        i64::try_from(milli / Self::SCALE as i128).map_err(|_| CoreError::AmountOverflow {
            field: "base quantity".to_string(),
        })
    }

    /// Price of one of this unit given the base unit price.
    pub fn unit_price(&self, base_price: Money) -> CoreResult<Money> {
        base_price
            .scale_milli(self.0)
            .ok_or_else(|| CoreError::AmountOverflow {
                field: "unit price".to_string(),
            })
    }
}

impl Default for UnitFactor {
    fn default() -> Self {
        UnitFactor::BASE
    }
}
