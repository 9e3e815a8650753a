//! Order pricing.
//!
//! Prices are always recomputed from the current cart lines when an order is
//! reviewed or placed; nothing the browser submits is trusted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Orders at or above this items subtotal ship free.
pub const SHIPPING_FREE_THRESHOLD: Money = Money::new(Decimal::from_parts(100, 0, 0, false, 0));

/// Flat shipping charge below the threshold.
pub const SHIPPING_FLAT_RATE: Money = Money::new(Decimal::from_parts(10, 0, 0, false, 0));

/// Sales tax applied to the items subtotal (15%).
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// One priced line of a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLine {
    pub unit_price: Money,
    pub quantity: u32,
}

impl PriceLine {
    #[must_use]
    pub const fn new(unit_price: Money, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// Unit price times quantity, unrounded.
    #[must_use]
    pub fn total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Price breakdown stored on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPrices {
    pub items: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderPrices {
    /// Whether the order qualified for free shipping.
    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.shipping == Money::ZERO
    }
}

/// Compute items, shipping, tax, and total for a set of lines.
///
/// Each component is rounded to cents:
/// - items = sum of line totals
/// - shipping = free at or above [`SHIPPING_FREE_THRESHOLD`], else [`SHIPPING_FLAT_RATE`]
/// - tax = items x [`TAX_RATE`]
/// - total = items + shipping + tax
#[must_use]
pub fn calculate_order_prices(lines: &[PriceLine]) -> OrderPrices {
    let items = lines.iter().map(PriceLine::total).sum::<Money>().round_cents();
    let shipping = if items >= SHIPPING_FREE_THRESHOLD {
        Money::ZERO
    } else {
        SHIPPING_FLAT_RATE
    };
    let tax = Money::new(items.amount() * TAX_RATE).round_cents();
    let total = (items + shipping + tax).round_cents();

    OrderPrices {
        items,
        shipping,
        tax,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(cents: i64, qty: u32) -> PriceLine {
        PriceLine::new(Money::from_cents(cents), qty)
    }

    #[test]
    fn test_below_threshold_pays_shipping() {
        let prices = calculate_order_prices(&[line(2999, 2)]);
        assert_eq!(prices.items, Money::from_cents(5998));
        assert_eq!(prices.shipping, Money::from_cents(1000));
        // 59.98 * 0.15 = 8.997
        assert_eq!(prices.tax, Money::from_cents(900));
        assert_eq!(prices.total, Money::from_cents(7898));
        assert!(!prices.ships_free());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let prices = calculate_order_prices(&[line(5000, 2)]);
        assert_eq!(prices.items, Money::from_cents(10_000));
        assert_eq!(prices.shipping, Money::ZERO);
        assert_eq!(prices.tax, Money::from_cents(1500));
        assert_eq!(prices.total, Money::from_cents(11_500));
        assert!(prices.ships_free());
    }

    #[test]
    fn test_just_below_threshold() {
        let prices = calculate_order_prices(&[line(9999, 1)]);
        assert_eq!(prices.shipping, SHIPPING_FLAT_RATE);
        // 99.99 * 0.15 = 14.9985
        assert_eq!(prices.tax, Money::from_cents(1500));
        assert_eq!(prices.total, Money::from_cents(12_499));
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.10 * 0.15 = 0.015
        let prices = calculate_order_prices(&[line(10, 1)]);
        assert_eq!(prices.tax, Money::from_cents(2));
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        let prices = calculate_order_prices(&[line(1250, 3), line(899, 7), line(1, 99)]);
        assert_eq!(prices.total, prices.items + prices.shipping + prices.tax);
    }

    #[test]
    fn test_empty_cart() {
        let prices = calculate_order_prices(&[]);
        assert_eq!(prices.items, Money::ZERO);
        assert_eq!(prices.shipping, SHIPPING_FLAT_RATE);
        assert_eq!(prices.tax, Money::ZERO);
        assert_eq!(prices.total, SHIPPING_FLAT_RATE);
    }
}
