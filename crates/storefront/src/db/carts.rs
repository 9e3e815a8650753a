//! Cart repository.
//!
//! Carts are keyed by the cart-session cookie. Lines are unique per
//! `(cart_id, product_id)`, so adding a product that is already in the cart
//! increments the existing line.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use prostore_core::{CartId, CartItemId, Money, ProductId, UserId};

use super::{RepositoryError, to_u32};
use crate::models::{Cart, CartLine};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    session_id: Uuid,
    user_id: Option<UserId>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    product_id: ProductId,
    name: String,
    slug: String,
    images: Vec<String>,
    price: Decimal,
    stock: i32,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            slug: row.slug,
            image: row.images.into_iter().next().unwrap_or_default(),
            price: Money::new(row.price),
            stock: to_u32(row.stock, "stock")?,
            quantity: to_u32(row.quantity, "quantity")?,
            created_at: row.created_at,
        })
    }
}

/// A cart line with the owning cart and the product's stock, for updates.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct LineStock {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub quantity: i32,
    pub stock: i32,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the cart for a cart-session ID, with lines newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_session(&self, session_id: Uuid) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, session_id, user_id FROM carts WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.with_lines(row).await?)),
            None => Ok(None),
        }
    }

    /// Create an empty cart for a cart-session ID.
    ///
    /// If a concurrent request already created it, the existing cart is returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(
        &self,
        session_id: Uuid,
        user_id: Option<UserId>,
    ) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO carts (id, session_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id) DO UPDATE SET updated_at = now()
            RETURNING id, session_id, user_id
            ",
        )
        .bind(CartId::new())
        .bind(session_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        self.with_lines(row).await
    }

    /// Assign an owner to a cart that has none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn attach_user(&self, cart_id: CartId, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE carts SET user_id = $2, updated_at = now()
            WHERE id = $1 AND user_id IS NULL
            ",
        )
        .bind(cart_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Add `quantity` units of a product, creating the line if needed.
    ///
    /// The write only happens while the resulting quantity stays within
    /// `max_quantity`, checked atomically. Returns the new line quantity, or
    /// `None` when the limit would be exceeded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_quantity(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
    ) -> Result<Option<u32>, RepositoryError> {
        let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);
        let max_quantity = i32::try_from(max_quantity).unwrap_or(i32::MAX);

        let new_quantity: Option<i32> = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (id, cart_id, product_id, quantity)
            SELECT $1, $2, $3, $4
            WHERE $4 <= $5
            ON CONFLICT (cart_id, product_id) DO UPDATE
                SET quantity = cart_items.quantity + EXCLUDED.quantity
                WHERE cart_items.quantity + EXCLUDED.quantity <= $5
            RETURNING quantity
            ",
        )
        .bind(CartItemId::new())
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(max_quantity)
        .fetch_optional(self.pool)
        .await?;

        new_quantity.map(|q| to_u32(q, "quantity")).transpose()
    }

    /// Look up a line with its product's stock, scoped to a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_line(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<LineStock>, RepositoryError> {
        let row = sqlx::query_as::<_, LineStock>(
            r"
            SELECT ci.id, ci.cart_id, ci.quantity, p.stock
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.id = $1 AND ci.cart_id = $2
            ",
        )
        .bind(item_id)
        .bind(cart_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn set_quantity(&self, item_id: CartItemId, quantity: u32) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
            .bind(item_id)
            .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete one line from a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line isn't in the cart.
    pub async fn delete_line(&self, cart_id: CartId, item_id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line from a cart. Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn with_lines(&self, row: CartRow) -> Result<Cart, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.id, ci.product_id, p.name, p.slug, p.images, p.price, p.stock,
                   ci.quantity, ci.created_at
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at DESC, ci.id
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<CartLine>, _>>()?;

        Ok(Cart {
            id: row.id,
            session_id: row.session_id,
            user_id: row.user_id,
            lines,
        })
    }
}
