//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (latest products)
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Catalog
//! GET  /product/{slug}            - Product detail with add-to-cart
//!
//! # Cart (form posts, redirect back)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add units of a product
//! POST /cart/update               - Set a line's quantity (0 removes)
//! POST /cart/remove               - Remove a line
//! POST /cart/clear                - Remove every line
//!
//! # Checkout (requires auth)
//! GET  /checkout/shipping         - Shipping address form
//! POST /checkout/shipping         - Save address
//! GET  /checkout/payment          - Payment method choice
//! POST /checkout/payment          - Save payment method
//! GET  /checkout/place-order      - Review with recalculated prices
//! POST /checkout/place-order      - Create the order
//!
//! # Orders and profile (requires auth)
//! GET  /orders/{id}               - Order detail (owner or admin)
//! GET  /user/orders               - Order history
//! GET  /user/profile              - Profile
//! POST /user/profile              - Update name
//!
//! # Auth
//! GET  /sign-in                   - Sign-in page
//! POST /sign-in                   - Sign in (rate limited)
//! GET  /sign-up                   - Sign-up page
//! POST /sign-up                   - Create account (rate limited)
//! POST /sign-out                  - Sign out
//!
//! # Admin (requires admin role)
//! GET  /admin                     - Dashboard
//! GET  /admin/orders              - Orders table with filters
//! POST /admin/orders/{id}/delete  - Delete an order
//! POST /admin/orders/{id}/deliver - Mark delivered
//! POST /admin/orders/{id}/mark-paid - Mark a cash-on-delivery order paid and delivered
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod context;
pub mod home;
pub mod orders;
pub mod products;
pub mod user;
pub mod views;

pub use context::PageContext;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{RateLimiterLayer, auth_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Create the cart routes router.
fn cart_routes(limit: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add).layer(limit.clone()))
        .route("/update", post(cart::update).layer(limit.clone()))
        .route("/remove", post(cart::remove).layer(limit.clone()))
        .route("/clear", post(cart::clear).layer(limit.clone()))
}

/// Create the checkout routes router.
fn checkout_routes(limit: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route(
            "/shipping",
            get(checkout::shipping).merge(post(checkout::save_shipping).layer(limit.clone())),
        )
        .route(
            "/payment",
            get(checkout::payment).merge(post(checkout::save_payment).layer(limit.clone())),
        )
        .route(
            "/place-order",
            get(checkout::review).merge(post(checkout::place_order).layer(limit.clone())),
        )
}

/// Create the account routes router.
fn user_routes(limit: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::history))
        .route(
            "/profile",
            get(user::profile).merge(post(user::update_profile).layer(limit.clone())),
        )
}

/// Create the auth routes router.
fn auth_routes() -> Router<AppState> {
    let limit = auth_rate_limiter();
    Router::new()
        .route(
            "/sign-in",
            get(auth::sign_in_page).merge(post(auth::sign_in).layer(limit.clone())),
        )
        .route(
            "/sign-up",
            get(auth::sign_up_page).merge(post(auth::sign_up).layer(limit)),
        )
        .route("/sign-out", post(auth::sign_out))
}

/// Create the admin routes router.
fn admin_routes(limit: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/orders", get(admin::orders))
        .route(
            "/orders/{id}/delete",
            post(admin::delete_order).layer(limit.clone()),
        )
        .route(
            "/orders/{id}/deliver",
            post(admin::mark_delivered).layer(limit.clone()),
        )
        .route(
            "/orders/{id}/mark-paid",
            post(admin::mark_paid).layer(limit.clone()),
        )
}

/// Create all page routes for the storefront.
///
/// Health checks and static files are mounted by [`crate::app`].
pub fn routes() -> Router<AppState> {
    let form_limit = form_rate_limiter();

    Router::new()
        .route("/", get(home::home))
        .route("/product/{slug}", get(products::show))
        .route("/orders/{id}", get(orders::show))
        .nest("/cart", cart_routes(&form_limit))
        .nest("/checkout", checkout_routes(&form_limit))
        .nest("/user", user_routes(&form_limit))
        .nest("/admin", admin_routes(&form_limit))
        .merge(auth_routes())
}
