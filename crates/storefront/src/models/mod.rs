//! Domain models for the storefront.
//!
//! These types represent validated domain objects, separate from the row
//! types the repositories decode.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod stats;
pub mod user;

pub use cart::{Cart, CartLine};
pub use order::{AdminOrderSummary, NewOrder, NewOrderItem, Order, OrderItem, OrderSummary};
pub use product::Product;
pub use session::CurrentUser;
pub use stats::{DashboardStats, MonthlySales, RecentOrder};
pub use user::User;
