//! Cart service.
//!
//! Carts belong to the cart-session cookie rather than the login session, so
//! an anonymous visitor can fill a cart and sign in at checkout without
//! losing it. Form input arrives as raw strings and is validated here.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use prostore_core::{
    CartItemId, MAX_CART_QUANTITY, ProductId, QuantityError, UserId, parse_add_quantity,
    parse_update_quantity,
};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::Cart;

/// Cart mutation that failed unexpectedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Add,
    Update,
    Remove,
    Clear,
}

impl CartAction {
    const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => "Failed to add item to cart",
            Self::Update => "Failed to update cart item",
            Self::Remove => "Failed to remove item from cart",
            Self::Clear => "Failed to clear cart",
        }
    }
}

/// Errors returned by cart mutations. `Display` is the customer-facing message.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Invalid product ID")]
    InvalidProductId,

    #[error("Invalid cart item ID")]
    InvalidCartItemId,

    #[error("{0}")]
    Quantity(#[from] QuantityError),

    #[error("Product not found")]
    ProductNotFound,

    #[error("Not enough stock available")]
    NotEnoughStock,

    #[error("Maximum quantity ({MAX_CART_QUANTITY}) exceeded")]
    MaxQuantityExceeded,

    #[error("Cart item not found")]
    ItemNotFound,

    #[error("Cart not found")]
    CartNotFound,

    /// Storage failure; details are logged, not shown.
    #[error("{}", .0.failure_message())]
    Failed(CartAction),
}

/// Log a storage failure and hide it behind the action's generic message.
fn failed(action: CartAction) -> impl FnOnce(RepositoryError) -> CartError {
    move |e| {
        tracing::error!(error = %e, ?action, "Cart operation failed");
        CartError::Failed(action)
    }
}

/// Check that `quantity` more units fit alongside `existing` units in the cart.
///
/// Stock is checked against the requested amount first, then the combined
/// line quantity against the per-line cap and the stock again.
fn check_add(existing: u32, quantity: u32, stock: u32) -> Result<(), CartError> {
    if stock < quantity {
        return Err(CartError::NotEnoughStock);
    }
    let combined = existing.saturating_add(quantity);
    if combined > MAX_CART_QUANTITY {
        return Err(CartError::MaxQuantityExceeded);
    }
    if combined > stock {
        return Err(CartError::NotEnoughStock);
    }
    Ok(())
}

/// Cart operations scoped to one cart-session ID.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Load the cart for a session without creating anything.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn get_cart(&self, session_id: Option<Uuid>) -> Result<Option<Cart>, RepositoryError> {
        match session_id {
            Some(session_id) => self.carts.find_by_session(session_id).await,
            None => Ok(None),
        }
    }

    /// Load the cart for a session, creating it if needed.
    ///
    /// A signed-in user is recorded as the owner of a cart that has none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn get_or_create_cart(
        &self,
        session_id: Uuid,
        user_id: Option<UserId>,
    ) -> Result<Cart, RepositoryError> {
        match self.carts.find_by_session(session_id).await? {
            Some(mut cart) => {
                if let Some(user_id) = user_id
                    && cart.user_id.is_none()
                {
                    self.carts.attach_user(cart.id, user_id).await?;
                    cart.user_id = Some(user_id);
                }
                Ok(cart)
            }
            None => self.carts.create(session_id, user_id).await,
        }
    }

    /// Add units of a product. Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns the first failed rule: ID and quantity validation, then
    /// product existence, then stock and the per-line cap.
    pub async fn add_item(
        &self,
        session_id: Uuid,
        user_id: Option<UserId>,
        product_id: &str,
        quantity: &str,
    ) -> Result<u32, CartError> {
        let product_id = ProductId::parse(product_id).map_err(|_| CartError::InvalidProductId)?;
        let quantity = parse_add_quantity(quantity)?;

        let product = self
            .products
            .get_by_id(product_id)
            .await
            .map_err(failed(CartAction::Add))?
            .ok_or(CartError::ProductNotFound)?;

        let cart = self
            .get_or_create_cart(session_id, user_id)
            .await
            .map_err(failed(CartAction::Add))?;

        let existing = cart.quantity_of(product_id);
        check_add(existing, quantity, product.stock)?;

        let limit = MAX_CART_QUANTITY.min(product.stock);
        let updated = self
            .carts
            .add_quantity(cart.id, product_id, quantity, limit)
            .await
            .map_err(failed(CartAction::Add))?;

        // A concurrent add can fill the line between the check and the write.
        updated.ok_or(if product.stock >= MAX_CART_QUANTITY {
            CartError::MaxQuantityExceeded
        } else {
            CartError::NotEnoughStock
        })
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line is not in this session's cart.
    /// Returns `CartError::NotEnoughStock` if the quantity exceeds stock.
    pub async fn update_item(
        &self,
        session_id: Option<Uuid>,
        item_id: &str,
        quantity: &str,
    ) -> Result<(), CartError> {
        let item_id = CartItemId::parse(item_id).map_err(|_| CartError::InvalidCartItemId)?;
        let quantity = parse_update_quantity(quantity)?;

        let cart = self
            .get_cart(session_id)
            .await
            .map_err(failed(CartAction::Update))?
            .ok_or(CartError::ItemNotFound)?;

        let line = self
            .carts
            .find_line(cart.id, item_id)
            .await
            .map_err(failed(CartAction::Update))?
            .ok_or(CartError::ItemNotFound)?;

        if quantity == 0 {
            return self
                .carts
                .delete_line(cart.id, line.id)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => CartError::ItemNotFound,
                    other => failed(CartAction::Update)(other),
                });
        }

        if i64::from(quantity) > i64::from(line.stock) {
            return Err(CartError::NotEnoughStock);
        }

        self.carts
            .set_quantity(line.id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ItemNotFound,
                other => failed(CartAction::Update)(other),
            })
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line is not in this session's cart.
    pub async fn remove_item(&self, session_id: Option<Uuid>, item_id: &str) -> Result<(), CartError> {
        let item_id = CartItemId::parse(item_id).map_err(|_| CartError::InvalidCartItemId)?;

        let cart = self
            .get_cart(session_id)
            .await
            .map_err(failed(CartAction::Remove))?
            .ok_or(CartError::ItemNotFound)?;

        self.carts
            .delete_line(cart.id, item_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ItemNotFound,
                other => failed(CartAction::Remove)(other),
            })
    }

    /// Remove every line from this session's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the session has no cart.
    pub async fn clear(&self, session_id: Option<Uuid>) -> Result<(), CartError> {
        let cart = self
            .get_cart(session_id)
            .await
            .map_err(failed(CartAction::Clear))?
            .ok_or(CartError::CartNotFound)?;

        let removed = self
            .carts
            .clear(cart.id)
            .await
            .map_err(failed(CartAction::Clear))?;
        tracing::debug!(cart_id = %cart.id, removed, "Cart cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_add_new_line() {
        assert!(check_add(0, 3, 10).is_ok());
        assert!(check_add(0, 10, 10).is_ok());
        assert!(matches!(check_add(0, 11, 10), Err(CartError::NotEnoughStock)));
    }

    #[test]
    fn test_check_add_existing_line_respects_stock() {
        assert!(check_add(5, 5, 10).is_ok());
        assert!(matches!(check_add(6, 5, 10), Err(CartError::NotEnoughStock)));
    }

    #[test]
    fn test_check_add_cap_reported_before_stock() {
        assert!(matches!(
            check_add(95, 5, 500),
            Err(CartError::MaxQuantityExceeded)
        ));
        // Combined quantity breaks both rules; the cap wins.
        assert!(matches!(
            check_add(95, 5, 98),
            Err(CartError::MaxQuantityExceeded)
        ));
    }

    #[test]
    fn test_check_add_requested_amount_checked_first() {
        assert!(matches!(check_add(98, 5, 4), Err(CartError::NotEnoughStock)));
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            CartError::Failed(CartAction::Add).to_string(),
            "Failed to add item to cart"
        );
        assert_eq!(
            CartError::Failed(CartAction::Update).to_string(),
            "Failed to update cart item"
        );
        assert_eq!(
            CartError::Failed(CartAction::Remove).to_string(),
            "Failed to remove item from cart"
        );
        assert_eq!(
            CartError::Failed(CartAction::Clear).to_string(),
            "Failed to clear cart"
        );
    }

    #[test]
    fn test_rule_messages() {
        assert_eq!(
            CartError::MaxQuantityExceeded.to_string(),
            "Maximum quantity (99) exceeded"
        );
        assert_eq!(
            CartError::NotEnoughStock.to_string(),
            "Not enough stock available"
        );
        assert_eq!(
            CartError::Quantity(QuantityError::AboveMax).to_string(),
            "Quantity cannot exceed 99"
        );
    }
}
