//! Integration tests for Prostore.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and catalog
//! cargo run -p prostore-cli -- migrate
//! cargo run -p prostore-cli -- seed products crates/cli/seed/products.yaml
//!
//! # Start the server, then run the ignored tests
//! cargo run -p prostore-storefront
//! cargo test -p prostore-integration-tests -- --ignored
//! ```
//!
//! Tests drive the running server over HTTP with a cookie-keeping client and
//! read or adjust fixtures directly in the database.
//!
//! # Environment Variables
//!
//! - `PROSTORE_TEST_URL` - Server under test (default: `http://localhost:3000`)
//! - `PROSTORE_DATABASE_URL` / `DATABASE_URL` - Same database the server uses

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::header::LOCATION;
use reqwest::{Client, Response, redirect};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

/// Password used for every account the tests create.
pub const TEST_PASSWORD: &str = "secret123";

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("PROSTORE_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Absolute URL for a path on the server under test.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// Client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the server's database.
pub async fn pool() -> PgPool {
    let database_url = std::env::var("PROSTORE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .expect("PROSTORE_DATABASE_URL must be set for integration tests");
    PgPool::connect(database_url.expose_secret())
        .await
        .expect("Failed to connect to database")
}

/// Unique throwaway email address.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Create an account through the sign-up form; the client ends up signed in.
pub async fn sign_up(client: &Client, email: &str) {
    let resp = client
        .post(url("/sign-up"))
        .form(&[
            ("name", "Test Customer"),
            ("email", email),
            ("password", TEST_PASSWORD),
            ("confirmPassword", TEST_PASSWORD),
            ("callbackUrl", "/"),
        ])
        .send()
        .await
        .expect("Failed to sign up");

    assert!(resp.status().is_redirection(), "sign-up should redirect");
    assert_eq!(location(&resp), "/", "sign-up should succeed");
}

/// ID of a product with at least `min_stock` units, from the seeded catalog.
pub async fn product_in_stock(pool: &PgPool, min_stock: i32) -> Uuid {
    sqlx::query_scalar("SELECT id FROM products WHERE stock >= $1 ORDER BY created_at LIMIT 1")
        .bind(min_stock)
        .fetch_optional(pool)
        .await
        .expect("Failed to query products")
        .expect("No product in stock; run `prostore-cli seed products` first")
}

/// Add `quantity` units of a product to the client's cart.
pub async fn add_to_cart(client: &Client, product_id: Uuid, quantity: u32) -> Response {
    client
        .post(url("/cart/add"))
        .form(&[
            ("product_id", product_id.to_string()),
            ("quantity", quantity.to_string()),
            ("return_to", "/cart".to_string()),
        ])
        .send()
        .await
        .expect("Failed to add to cart")
}

/// Give an account the admin role directly in the database.
pub async fn make_admin(pool: &PgPool, email: &str) {
    sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await
        .expect("Failed to promote user");
}
