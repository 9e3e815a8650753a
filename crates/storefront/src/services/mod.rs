//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Accounts: sign up, sign in, profile name
//! - `cart` - Cart lines keyed by the cart-session cookie
//! - `checkout` - Shipping, payment, review, and order placement
//! - `orders` - Customer order history and detail
//! - `admin` - Back-office order actions and dashboard figures
//!
//! Services borrow the pool and wrap one or more repositories. Their error
//! types render the message shown to the customer.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;

pub use admin::{AdminError, AdminService};
pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use checkout::{CheckoutError, CheckoutService};
pub use orders::OrderService;
