//! Cart domain types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use prostore_core::pricing::PriceLine;
use prostore_core::{CartId, CartItemId, Money, ProductId, UserId};

/// One product line in a cart, joined with the product's current data.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    /// Primary product image (empty when the product has none).
    pub image: String,
    /// Current catalog price.
    pub price: Money,
    /// Current stock level.
    pub stock: u32,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    /// Price times quantity, rounded to cents.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price_line().total().round_cents()
    }

    #[must_use]
    pub const fn price_line(&self) -> PriceLine {
        PriceLine::new(self.price, self.quantity)
    }
}

/// A cart with its lines, newest line first.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    /// Value of the cart-session cookie.
    pub session_id: Uuid,
    /// Owner, once a signed-in user has touched the cart.
    pub user_id: Option<UserId>,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals before shipping and tax.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .map(|l| l.price_line().total())
            .sum::<Money>()
            .round_cents()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units of `product_id` already in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    #[must_use]
    pub fn price_lines(&self) -> Vec<PriceLine> {
        self.lines.iter().map(CartLine::price_line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: ProductId, cents: i64, quantity: u32) -> CartLine {
        CartLine {
            id: CartItemId::new(),
            product_id,
            name: "Polo Shirt".to_string(),
            slug: "polo-shirt".to_string(),
            image: "/images/polo.jpg".to_string(),
            price: Money::from_cents(cents),
            stock: 10,
            quantity,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_totals() {
        let polo = ProductId::new();
        let cart = Cart {
            id: CartId::new(),
            session_id: Uuid::new_v4(),
            user_id: None,
            lines: vec![line(polo, 2999, 2), line(ProductId::new(), 1050, 1)],
        };

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Money::from_cents(7048));
        assert_eq!(cart.quantity_of(polo), 2);
        assert_eq!(cart.quantity_of(ProductId::new()), 0);
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_line_total() {
        assert_eq!(
            line(ProductId::new(), 333, 3).line_total(),
            Money::from_cents(999)
        );
    }
}
