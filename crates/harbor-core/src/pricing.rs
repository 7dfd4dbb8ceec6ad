//! # Sale Pricing
//!
//! Line and sale-level arithmetic.
//!
//! ```text
//! gross      = unit_price × quantity
//! discount   ∈ [0, gross]
//! net        = gross − discount          (stored as line_total_cents)
//! tax        = tax_rate(net)             (half-up per line)
//!
//! subtotal   = Σ gross
//! discount   = Σ discount
//! tax        = Σ tax
//! total      = subtotal − discount + tax
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::types::SaleItem;
use crate::validation::{validate_discount_cents, validate_quantity};

/// Computed amounts for one sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    pub gross: Money,
    pub discount: Money,
    pub net: Money,
    pub tax: Money,
}

/// Prices one line.
///
/// ```rust
/// use harbor_core::money::{Money, TaxRate};
/// use harbor_core::pricing::price_line;
///
/// let line = price_line(Money::from_cents(250), 4, Money::from_cents(100), TaxRate::from_bps(1000)).unwrap();
/// assert_eq!(line.gross.cents(), 1000);
/// assert_eq!(line.net.cents(), 900);
/// assert_eq!(line.tax.cents(), 90);
/// ```
pub fn price_line(
    unit_price: Money,
    quantity: i64,
    discount: Money,
    rate: TaxRate,
) -> CoreResult<LineAmounts> {
    validate_quantity(quantity)?;
    validate_discount_cents(discount.cents())?;

    let gross = unit_price
        .multiply_quantity(quantity)
        .ok_or_else(|| overflow("line amount"))?;
    if discount > gross {
        return Err(CoreError::DiscountExceedsLine {
            discount_cents: discount.cents(),
            gross_cents: gross.cents(),
        });
    }

    let net = gross - discount;
    let tax = net.calculate_tax(rate).ok_or_else(|| overflow("line tax"))?;
    Ok(LineAmounts {
        gross,
        discount,
        net,
        tax,
    })
}

fn overflow(field: &str) -> CoreError {
    CoreError::AmountOverflow {
        field: field.to_string(),
    }
}

/// Sale-level totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl SaleTotals {
    /// Sums stored sale items.
    pub fn from_items(items: &[SaleItem]) -> CoreResult<Self> {
        let sum = |field: &str, cents: fn(&SaleItem) -> i64| -> CoreResult<i64> {
            items.iter().try_fold(0i64, |acc, item| {
                acc.checked_add(cents(item)).ok_or_else(|| overflow(field))
            })
        };
        let discount = sum("sale discount", |i| i.discount_cents)?;
        let net = sum("sale net amount", |i| i.line_total_cents)?;
        let tax = sum("sale tax", |i| i.tax_cents)?;

        Ok(SaleTotals {
            subtotal_cents: net
                .checked_add(discount)
                .ok_or_else(|| overflow("sale subtotal"))?,
            discount_cents: discount,
            tax_cents: tax,
            // subtotal - discount + tax
            total_cents: net.checked_add(tax).ok_or_else(|| overflow("sale total"))?,
        })
    }
}

/// Change owed on a cash tender, or `None` if the tender is short.
pub fn cash_change(amount_due: Money, tendered: Money) -> Option<Money> {
    if tendered < amount_due {
        None
    } else {
        Some(tendered - amount_due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(line_total: i64, discount: i64, tax: i64) -> SaleItem {
        SaleItem {
            id: "i".to_string(),
            sale_id: "s".to_string(),
            product_id: "p".to_string(),
            sku_snapshot: "SKU".to_string(),
            name_snapshot: "Thing".to_string(),
            variation_name: None,
            unit_name: None,
            factor_milli: 1000,
            unit_price_cents: line_total + discount,
            quantity: 1,
            base_quantity: 1,
            discount_cents: discount,
            tax_cents: tax,
            line_total_cents: line_total,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_line_without_discount() {
        let line = price_line(Money::from_cents(1000), 2, Money::zero(), TaxRate::from_bps(825))
            .unwrap();
        assert_eq!(line.gross.cents(), 2000);
        assert_eq!(line.net.cents(), 2000);
        assert_eq!(line.tax.cents(), 165);
    }

    #[test]
    fn test_negative_discount_rejected() {
        let result = price_line(
            Money::from_cents(1000),
            1,
            Money::from_cents(-1),
            TaxRate::zero(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_discount_larger_than_line_rejected() {
        let result = price_line(
            Money::from_cents(500),
            1,
            Money::from_cents(501),
            TaxRate::zero(),
        );
        assert!(matches!(result, Err(CoreError::DiscountExceedsLine { .. })));
    }

    #[test]
    fn test_full_discount_allowed() {
        let line = price_line(
            Money::from_cents(500),
            1,
            Money::from_cents(500),
            TaxRate::from_bps(1600),
        )
        .unwrap();
        assert!(line.net.is_zero());
        assert!(line.tax.is_zero());
    }

    #[test]
    fn test_line_overflow_is_an_error() {
        let result = price_line(
            Money::from_cents(i64::MAX / 2 + 1),
            2,
            Money::zero(),
            TaxRate::zero(),
        );
        assert!(matches!(result, Err(CoreError::AmountOverflow { .. })));
    }

    #[test]
    fn test_sale_totals() {
        let totals = SaleTotals::from_items(&[item(900, 100, 90), item(500, 0, 50)]).unwrap();
        assert_eq!(totals.subtotal_cents, 1500);
        assert_eq!(totals.discount_cents, 100);
        assert_eq!(totals.tax_cents, 140);
        assert_eq!(totals.total_cents, 1540);
    }

    #[test]
    fn test_sale_totals_overflow_is_an_error() {
        let big = i64::MAX / 2 + 1;
        let result = SaleTotals::from_items(&[item(big, 0, 0), item(big, 0, 0)]);
        assert!(matches!(result, Err(CoreError::AmountOverflow { .. })));
    }

    #[test]
    fn test_cash_change() {
        assert_eq!(
            cash_change(Money::from_cents(1540), Money::from_cents(2000)),
            Some(Money::from_cents(460))
        );
        assert_eq!(cash_change(Money::from_cents(1540), Money::from_cents(1000)), None);
    }
}
