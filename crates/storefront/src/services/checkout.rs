//! Checkout flow: shipping address, payment method, review, place order.
//!
//! Each step's page is only reachable once the earlier steps are complete.
//! The same readiness check guards the review page and order placement, so a
//! customer can never place an order the review page would not have shown.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use prostore_core::pricing::{OrderPrices, calculate_order_prices};
use prostore_core::{
    AddressError, OrderId, PaymentMethod, PaymentMethodError, ShippingAddress, UserId,
};

use crate::db::{OrderRepository, RepositoryError, UserRepository};
use crate::models::{Cart, NewOrder, NewOrderItem, User};
use crate::services::cart::CartService;

/// Errors from checkout steps. `Display` is the customer-facing message.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("You must be logged in to place an order")]
    NotSignedIn,

    #[error("User not found")]
    UserNotFound,

    #[error("Please add a shipping address")]
    MissingAddress,

    #[error("Invalid shipping address")]
    InvalidAddress,

    #[error("Please select a payment method")]
    MissingPaymentMethod,

    #[error("Invalid payment method")]
    InvalidPaymentMethod,

    #[error("Your cart is empty")]
    EmptyCart,

    /// The cart changed between review and placement.
    #[error("Your cart has changed, please review your order again")]
    CartChanged,

    /// Submitted address failed validation.
    #[error("{0}")]
    Address(#[from] AddressError),

    /// Submitted payment method is not one we offer.
    #[error("{0}")]
    PaymentMethod(#[from] PaymentMethodError),

    #[error("Failed to save shipping address")]
    SaveAddressFailed,

    #[error("Failed to save payment method")]
    SavePaymentMethodFailed,

    #[error("Failed to create order")]
    OrderFailed,
}

impl CheckoutError {
    /// The step a customer must revisit to clear this error, if any.
    #[must_use]
    pub const fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Self::MissingAddress | Self::InvalidAddress => Some("/checkout/shipping"),
            Self::MissingPaymentMethod | Self::InvalidPaymentMethod => Some("/checkout/payment"),
            Self::EmptyCart => Some("/cart"),
            _ => None,
        }
    }
}

/// A saved address that passes validation.
///
/// # Errors
///
/// Returns `MissingAddress` or `InvalidAddress`.
pub fn require_address(user: &User) -> Result<&ShippingAddress, CheckoutError> {
    let address = user.address.as_ref().ok_or(CheckoutError::MissingAddress)?;
    if !address.is_valid() {
        return Err(CheckoutError::InvalidAddress);
    }
    Ok(address)
}

/// A saved payment method that names one we offer.
///
/// # Errors
///
/// Returns `MissingPaymentMethod` or `InvalidPaymentMethod`.
pub fn require_payment_method(user: &User) -> Result<PaymentMethod, CheckoutError> {
    let raw = user
        .payment_method
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or(CheckoutError::MissingPaymentMethod)?;
    raw.parse().map_err(|_| CheckoutError::InvalidPaymentMethod)
}

/// Everything the review page shows and order placement consumes.
#[derive(Debug, Clone)]
pub struct Review {
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub cart: Cart,
    pub prices: OrderPrices,
}

impl Review {
    /// Check the checkout prerequisites in step order.
    ///
    /// # Errors
    ///
    /// Returns the first missing prerequisite: address, payment method, then cart.
    pub fn prepare(user: &User, cart: Option<Cart>) -> Result<Self, CheckoutError> {
        let address = require_address(user)?.clone();
        let payment_method = require_payment_method(user)?;
        let cart = cart
            .filter(|c| !c.is_empty())
            .ok_or(CheckoutError::EmptyCart)?;
        let prices = calculate_order_prices(&cart.price_lines());

        Ok(Self {
            address,
            payment_method,
            cart,
            prices,
        })
    }

    /// Snapshot the cart into an order for `user_id`.
    #[must_use]
    pub fn into_new_order(self, user_id: UserId) -> (NewOrder, Cart) {
        let items = self
            .cart
            .lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                name: line.name.clone(),
                image: line.image.clone(),
                price: line.price,
                quantity: line.quantity,
            })
            .collect();

        let order = NewOrder {
            user_id,
            shipping_address: self.address,
            payment_method: self.payment_method,
            prices: self.prices,
            items,
        };
        (order, self.cart)
    }
}

/// Checkout operations for a signed-in customer.
pub struct CheckoutService<'a> {
    users: UserRepository<'a>,
    orders: OrderRepository<'a>,
    carts: CartService<'a>,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            orders: OrderRepository::new(pool),
            carts: CartService::new(pool),
        }
    }

    async fn load_user(&self, user_id: UserId) -> Result<User, RepositoryError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Store the address for future checkouts.
    ///
    /// # Errors
    ///
    /// Returns `SaveAddressFailed` if the write fails.
    pub async fn save_address(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<(), CheckoutError> {
        self.users
            .update_address(user_id, address)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %user_id, "Saving shipping address failed");
                CheckoutError::SaveAddressFailed
            })
    }

    /// Validate and store the preferred payment method.
    ///
    /// # Errors
    ///
    /// Returns `PaymentMethod` for an unknown method, `SavePaymentMethodFailed`
    /// if the write fails.
    pub async fn save_payment_method(
        &self,
        user_id: UserId,
        raw: &str,
    ) -> Result<PaymentMethod, CheckoutError> {
        let method: PaymentMethod = raw.parse()?;
        self.users
            .update_payment_method(user_id, method)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, %user_id, "Saving payment method failed");
                CheckoutError::SavePaymentMethodFailed
            })?;
        Ok(method)
    }

    /// Load the user and check they may see the payment step.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, or the address error that sends them back.
    pub async fn payment_step(&self, user_id: UserId) -> Result<User, CheckoutError> {
        let user = self.load_user(user_id).await.map_err(|e| {
            if !matches!(e, RepositoryError::NotFound) {
                tracing::error!(error = %e, %user_id, "Loading checkout user failed");
            }
            CheckoutError::UserNotFound
        })?;
        require_address(&user)?;
        Ok(user)
    }

    /// Gather the review page data.
    ///
    /// # Errors
    ///
    /// Returns the first unmet prerequisite.
    pub async fn review(
        &self,
        user_id: UserId,
        cart_session: Option<Uuid>,
    ) -> Result<Review, CheckoutError> {
        let user = self.payment_step(user_id).await?;
        let cart = self.carts.get_cart(cart_session).await.map_err(|e| {
            tracing::error!(error = %e, "Loading cart for review failed");
            CheckoutError::OrderFailed
        })?;
        Review::prepare(&user, cart)
    }

    /// Turn the session's cart into an order and empty the cart.
    ///
    /// Concurrent calls for the same cart produce at most one order; the
    /// others see an empty cart.
    ///
    /// # Errors
    ///
    /// Returns the first unmet prerequisite, `EmptyCart` if another request
    /// already placed this cart, `CartChanged` if its lines changed after they
    /// were read, or `OrderFailed` if the transaction fails.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(
        &self,
        user_id: Option<UserId>,
        cart_session: Option<Uuid>,
    ) -> Result<OrderId, CheckoutError> {
        let user_id = user_id.ok_or(CheckoutError::NotSignedIn)?;

        let user = match self.load_user(user_id).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound) => return Err(CheckoutError::UserNotFound),
            Err(e) => {
                tracing::error!(error = %e, "Loading user for order failed");
                return Err(CheckoutError::OrderFailed);
            }
        };

        let cart = self.carts.get_cart(cart_session).await.map_err(|e| {
            tracing::error!(error = %e, "Loading cart for order failed");
            CheckoutError::OrderFailed
        })?;

        let (order, cart) = Review::prepare(&user, cart)?.into_new_order(user.id);

        let order_id = self
            .orders
            .create_from_cart(&order, &cart)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CheckoutError::EmptyCart,
                RepositoryError::Conflict(_) => CheckoutError::CartChanged,
                e => {
                    tracing::error!(error = %e, "Creating order failed");
                    CheckoutError::OrderFailed
                }
            })?;

        tracing::info!(%order_id, total = %order.prices.total, "Order placed");
        Ok(order_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use prostore_core::{CartId, CartItemId, Email, Money, ProductId, Role};

    use super::*;
    use crate::models::CartLine;

    fn address() -> ShippingAddress {
        ShippingAddress::parse("Jane Doe", "1 Main Street", "Austin", "TX", "73301", "US").unwrap()
    }

    fn user(address: Option<ShippingAddress>, payment: Option<&str>) -> User {
        User {
            id: UserId::new(),
            name: "Jane Doe".to_string(),
            email: Email::parse("jane@example.com").unwrap(),
            role: Role::User,
            address,
            payment_method: payment.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cart(lines: &[(i64, u32)]) -> Cart {
        Cart {
            id: CartId::new(),
            session_id: Uuid::new_v4(),
            user_id: None,
            lines: lines
                .iter()
                .map(|&(cents, quantity)| CartLine {
                    id: CartItemId::new(),
                    product_id: ProductId::new(),
                    name: "Polo".to_string(),
                    slug: "polo".to_string(),
                    image: "/images/polo.jpg".to_string(),
                    price: Money::from_cents(cents),
                    stock: 20,
                    quantity,
                    created_at: Utc::now(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_prepare_requires_address_first() {
        let err = Review::prepare(&user(None, None), None).unwrap_err();
        assert!(matches!(err, CheckoutError::MissingAddress));
        assert_eq!(err.redirect_target(), Some("/checkout/shipping"));
    }

    #[test]
    fn test_prepare_rejects_invalid_saved_address() {
        let mut bad = address();
        bad.state = "Texas".to_string();
        let err = Review::prepare(&user(Some(bad), Some("PayPal")), Some(cart(&[(1000, 1)])))
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidAddress));
    }

    #[test]
    fn test_prepare_requires_payment_method() {
        let err = Review::prepare(&user(Some(address()), None), None).unwrap_err();
        assert!(matches!(err, CheckoutError::MissingPaymentMethod));
        assert_eq!(err.redirect_target(), Some("/checkout/payment"));

        let err = Review::prepare(&user(Some(address()), Some("Bitcoin")), None).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPaymentMethod));
    }

    #[test]
    fn test_prepare_requires_non_empty_cart() {
        let u = user(Some(address()), Some("Stripe"));
        let err = Review::prepare(&u, None).unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(err.redirect_target(), Some("/cart"));

        let err = Review::prepare(&u, Some(cart(&[]))).unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[test]
    fn test_prepare_recomputes_prices() {
        let u = user(Some(address()), Some("Cash on Delivery"));
        let review = Review::prepare(&u, Some(cart(&[(2500, 2), (1999, 1)]))).unwrap();

        assert_eq!(review.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(review.prices.items, Money::from_cents(6999));
        assert_eq!(review.prices.shipping, Money::from_cents(1000));
        assert_eq!(review.prices.tax, Money::new(Decimal::new(1050, 2)));
        assert_eq!(review.prices.total, Money::from_cents(9049));
    }

    #[test]
    fn test_into_new_order_snapshots_lines() {
        let u = user(Some(address()), Some("PayPal"));
        let review = Review::prepare(&u, Some(cart(&[(12000, 1)]))).unwrap();
        let (order, cart) = review.into_new_order(u.id);

        assert_eq!(order.user_id, u.id);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product_id, cart.lines[0].product_id);
        assert_eq!(order.items[0].image, "/images/polo.jpg");
        assert_eq!(order.items[0].price, Money::from_cents(12000));
        assert!(order.prices.ships_free());
    }

    #[test]
    fn test_guard_errors_have_no_redirect_for_failures() {
        assert_eq!(CheckoutError::OrderFailed.redirect_target(), None);
        assert_eq!(
            CheckoutError::OrderFailed.to_string(),
            "Failed to create order"
        );
        // A changed cart goes back to the review page
        assert_eq!(CheckoutError::CartChanged.redirect_target(), None);
    }
}
