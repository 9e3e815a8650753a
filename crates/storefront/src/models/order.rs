//! Order domain types.

use chrono::{DateTime, Utc};

use prostore_core::pricing::OrderPrices;
use prostore_core::{Email, Money, OrderId, OrderItemId, PaymentMethod, ProductId, ShippingAddress, UserId};

/// A product line captured at order time.
///
/// Name, image, and price are copies, so catalog edits never change past orders.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Money,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Money {
        (self.price * self.quantity).round_cents()
    }
}

/// A placed order with its items.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Customer name and email at read time.
    pub user_name: String,
    pub user_email: Email,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub prices: OrderPrices,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// A row in the customer's order history.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: OrderId,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Units across all lines.
    pub item_count: u32,
}

/// A row in the admin orders table.
#[derive(Debug, Clone)]
pub struct AdminOrderSummary {
    pub id: OrderId,
    pub user_name: String,
    pub user_email: String,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Line to insert with a new order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Money,
    pub quantity: u32,
}

/// Everything needed to insert an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub prices: OrderPrices,
    pub items: Vec<NewOrderItem>,
}
