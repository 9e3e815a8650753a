//! Order repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use prostore_core::pagination::{Page, PageRequest};
use prostore_core::pricing::OrderPrices;
use prostore_core::{
    CartItemId, Email, Money, OrderId, OrderItemId, OrderStatusFilter, PaymentMethod, ProductId,
    ShippingAddress, UserId,
};

use super::{RepositoryError, to_count, to_u32};
use crate::models::{AdminOrderSummary, Cart, NewOrder, Order, OrderItem, OrderSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    user_name: String,
    user_email: String,
    shipping_address: serde_json::Value,
    payment_method: String,
    items_price: Decimal,
    shipping_price: Decimal,
    tax_price: Decimal,
    total_price: Decimal,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    product_id: ProductId,
    name: String,
    image: String,
    price: Decimal,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            image: row.image,
            price: Money::new(row.price),
            quantity: to_u32(row.quantity, "quantity")?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    total_price: Decimal,
    payment_method: String,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    item_count: i64,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepositoryError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            total: Money::new(row.total_price),
            payment_method: parse_payment_method(&row.payment_method)?,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            item_count: u32::try_from(row.item_count).unwrap_or(u32::MAX),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminOrderRow {
    id: OrderId,
    user_name: String,
    user_email: String,
    total_price: Decimal,
    payment_method: String,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminOrderRow> for AdminOrderSummary {
    type Error = RepositoryError;

    fn try_from(row: AdminOrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_name: row.user_name,
            user_email: row.user_email,
            total: Money::new(row.total_price),
            payment_method: parse_payment_method(&row.payment_method)?,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
        })
    }
}

fn parse_payment_method(raw: &str) -> Result<PaymentMethod, RepositoryError> {
    raw.parse().map_err(|_| {
        RepositoryError::DataCorruption(format!("invalid payment method in database: {raw}"))
    })
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Whether the locked cart still holds exactly the lines the order was priced from.
fn lines_match(cart: &Cart, current: &[(CartItemId, i32)]) -> bool {
    let snapshot: HashMap<CartItemId, u32> =
        cart.lines.iter().map(|line| (line.id, line.quantity)).collect();
    current.len() == snapshot.len()
        && current.iter().all(|(id, quantity)| {
            snapshot.get(id).copied() == u32::try_from(*quantity).ok()
        })
}

/// Optional status and customer-search constraints for the admin list.
/// Binds: `$1` paid flag, `$2` delivered flag, `$3` `ILIKE` pattern.
const ADMIN_ORDER_FILTER: &str = r"
    WHERE ($1::BOOLEAN IS NULL OR o.is_paid = $1)
      AND ($2::BOOLEAN IS NULL OR o.is_delivered = $2)
      AND ($3::TEXT IS NULL OR u.name ILIKE $3 OR u.email ILIKE $3)
";

/// `(is_paid, is_delivered)` constraints for a status filter.
const fn filter_flags(filter: Option<OrderStatusFilter>) -> (Option<bool>, Option<bool>) {
    match filter {
        Some(OrderStatusFilter::Paid) => (Some(true), None),
        Some(OrderStatusFilter::Unpaid) => (Some(false), None),
        Some(OrderStatusFilter::Delivered) => (None, Some(true)),
        Some(OrderStatusFilter::Pending) => (None, Some(false)),
        None => (None, None),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order with its items and empty the cart it came from.
    ///
    /// The cart row is locked for the whole transaction and its lines are
    /// re-read under that lock. The order is only written if the lines still
    /// match `cart`. Either the order exists and the cart is empty, or nothing
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart is gone or already empty,
    /// and `RepositoryError::Conflict` if its lines changed since `cart` was read.
    /// Returns `RepositoryError::Database` if any statement fails. The
    /// transaction is rolled back in every error case.
    pub async fn create_from_cart(
        &self,
        order: &NewOrder,
        cart: &Cart,
    ) -> Result<OrderId, RepositoryError> {
        let order_id = OrderId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
            .bind(cart.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let current: Vec<(CartItemId, i32)> =
            sqlx::query_as("SELECT id, quantity FROM cart_items WHERE cart_id = $1")
                .bind(cart.id)
                .fetch_all(&mut *tx)
                .await?;
        if current.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        if !lines_match(cart, &current) {
            return Err(RepositoryError::Conflict("cart changed during checkout".to_string()));
        }

        sqlx::query(
            r"
            INSERT INTO orders (id, user_id, shipping_address, payment_method,
                                items_price, shipping_price, tax_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(order_id)
        .bind(order.user_id)
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method.as_str())
        .bind(order.prices.items.amount())
        .bind(order.prices.shipping.amount())
        .bind(order.prices.tax.amount())
        .bind(order.prices.total.amount())
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO order_items (id, order_id, product_id, name, image, price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(OrderItemId::new())
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(&item.image)
            .bind(item.price.amount())
            .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(order_id)
    }

    /// Load an order with its items and customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored JSON or enums are invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT o.id, o.user_id, u.name AS user_name, u.email AS user_email,
                   o.shipping_address, o.payment_method,
                   o.items_price, o.shipping_price, o.tax_price, o.total_price,
                   o.is_paid, o.paid_at, o.is_delivered, o.delivered_at, o.created_at
            FROM orders o
            JOIN users u ON u.id = o.user_id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, product_id, name, image, price, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY name, id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<OrderItem>, _>>()?;

        let shipping_address: ShippingAddress = serde_json::from_value(row.shipping_address)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid order address: {e}")))?;
        let user_email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Some(Order {
            id: row.id,
            user_id: row.user_id,
            user_name: row.user_name,
            user_email,
            shipping_address,
            payment_method: parse_payment_method(&row.payment_method)?,
            prices: OrderPrices {
                items: Money::new(row.items_price),
                shipping: Money::new(row.shipping_price),
                tax: Money::new(row.tax_price),
                total: Money::new(row.total_price),
            },
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            items,
        }))
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<OrderSummary>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.total_price, o.payment_method, o.is_paid, o.paid_at,
                   o.is_delivered, o.delivered_at, o.created_at,
                   COALESCE((SELECT SUM(oi.quantity) FROM order_items oi WHERE oi.order_id = o.id), 0)::BIGINT
                       AS item_count
            FROM orders o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<OrderSummary>, _>>()?;

        Ok(Page::new(items, to_count(total), page))
    }

    /// All orders for the back office, newest first.
    ///
    /// `search` matches the customer's name or email, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_admin(
        &self,
        filter: Option<OrderStatusFilter>,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AdminOrderSummary>, RepositoryError> {
        let (is_paid, is_delivered) = filter_flags(filter);
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM orders o JOIN users u ON u.id = o.user_id {ADMIN_ORDER_FILTER}"
        ))
        .bind(is_paid)
        .bind(is_delivered)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, AdminOrderRow>(&format!(
            r"
            SELECT o.id, u.name AS user_name, u.email AS user_email, o.total_price,
                   o.payment_method, o.is_paid, o.paid_at, o.is_delivered,
                   o.delivered_at, o.created_at
            FROM orders o
            JOIN users u ON u.id = o.user_id
            {ADMIN_ORDER_FILTER}
            ORDER BY o.created_at DESC, o.id
            LIMIT $4 OFFSET $5
            "
        ))
        .bind(is_paid)
        .bind(is_delivered)
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<AdminOrderSummary>, _>>()?;

        Ok(Page::new(items, to_count(total), page))
    }

    /// Delete an order; its items go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark an order delivered now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET is_delivered = true, delivered_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark an order both paid and delivered now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn mark_paid_and_delivered(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET is_paid = true, paid_at = now(), is_delivered = true, delivered_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use prostore_core::ProductId;

    use super::*;
    use crate::models::CartLine;

    fn cart(quantities: &[u32]) -> Cart {
        Cart {
            id: prostore_core::CartId::new(),
            session_id: Uuid::new_v4(),
            user_id: None,
            lines: quantities
                .iter()
                .map(|&quantity| CartLine {
                    id: CartItemId::new(),
                    product_id: ProductId::new(),
                    name: "Polo".to_string(),
                    slug: "polo".to_string(),
                    image: String::new(),
                    price: Money::from_cents(1_000),
                    stock: 50,
                    quantity,
                    created_at: Utc::now(),
                })
                .collect(),
        }
    }

    fn rows(cart: &Cart) -> Vec<(CartItemId, i32)> {
        cart.lines
            .iter()
            .map(|line| (line.id, i32::try_from(line.quantity).unwrap_or(i32::MAX)))
            .collect()
    }

    #[test]
    fn test_lines_match_unchanged_cart() {
        let cart = cart(&[2, 1]);
        let mut current = rows(&cart);
        current.reverse();
        assert!(lines_match(&cart, &current));
    }

    #[test]
    fn test_lines_match_rejects_changed_cart() {
        let cart = cart(&[2, 1]);

        let mut added = rows(&cart);
        added.push((CartItemId::new(), 1));
        assert!(!lines_match(&cart, &added));

        let requantified: Vec<_> = rows(&cart).into_iter().map(|(id, q)| (id, q + 1)).collect();
        assert!(!lines_match(&cart, &requantified));

        let removed: Vec<_> = rows(&cart).into_iter().take(1).collect();
        assert!(!lines_match(&cart, &removed));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jane"), "%jane%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_filter_flags() {
        assert_eq!(filter_flags(None), (None, None));
        assert_eq!(filter_flags(Some(OrderStatusFilter::Paid)), (Some(true), None));
        assert_eq!(filter_flags(Some(OrderStatusFilter::Unpaid)), (Some(false), None));
        assert_eq!(
            filter_flags(Some(OrderStatusFilter::Delivered)),
            (None, Some(true))
        );
        assert_eq!(
            filter_flags(Some(OrderStatusFilter::Pending)),
            (None, Some(false))
        );
    }
}
