//! Integration tests for sign-in gating and the checkout flow.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database seeded with `prostore-cli seed products`
//! - The storefront running (cargo run -p prostore-storefront)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use prostore_integration_tests::{
    add_to_cart, client, location, pool, product_in_stock, sign_up, unique_email, url,
};
use reqwest::{Client, StatusCode};
use sqlx::PgPool;
use uuid::Uuid;

/// Post the shipping and payment steps for a signed-in client.
async fn fill_checkout(client: &Client, payment_method: &str) {
    let resp = client
        .post(url("/checkout/shipping"))
        .form(&[
            ("fullName", "Test Customer"),
            ("address", "123 Main Street"),
            ("city", "Springfield"),
            ("state", "IL"),
            ("postalCode", "62701"),
            ("country", "United States"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/checkout/payment");

    let resp = client
        .post(url("/checkout/payment"))
        .form(&[("paymentMethod", payment_method)])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/checkout/place-order");
}

/// Place the order and return its ID from the redirect.
async fn place_order(client: &Client) -> Uuid {
    let resp = client
        .post(url("/checkout/place-order"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let target = location(&resp);
    let id = target
        .strip_prefix("/orders/")
        .unwrap_or_else(|| panic!("unexpected redirect: {target}"));
    Uuid::parse_str(id).unwrap()
}

/// Order totals as stored.
async fn order_totals(pool: &PgPool, order_id: Uuid) -> (String, String, String, String) {
    sqlx::query_as(
        r"
        SELECT items_price::text, shipping_price::text, tax_price::text, total_price::text
        FROM orders WHERE id = $1
        ",
    )
    .bind(order_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_checkout_requires_sign_in() {
    let resp = client()
        .get(url("/checkout/shipping"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        "/sign-in?callbackUrl=%2Fcheckout%2Fshipping"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_sign_in_rejects_bad_password() {
    let client = client();
    let email = unique_email();
    sign_up(&client, &email).await;
    client.post(url("/sign-out")).send().await.unwrap();

    let resp = client
        .post(url("/sign-in"))
        .form(&[
            ("email", email.as_str()),
            ("password", "wrong-password"),
            ("callbackUrl", "/"),
        ])
        .send()
        .await
        .unwrap();
    assert!(location(&resp).starts_with("/sign-in"));

    let body = client
        .get(url(&location(&resp)))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Invalid email or password"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_review_with_empty_cart_redirects_to_cart() {
    let client = client();
    sign_up(&client, &unique_email()).await;

    // Without an address the review step sends the customer back to shipping
    let resp = client
        .get(url("/checkout/place-order"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/checkout/shipping");

    fill_checkout(&client, "PayPal").await;
    let resp = client
        .get(url("/checkout/place-order"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/cart");
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_full_checkout_places_order() {
    let pool = pool().await;
    let client = client();
    let product_id = product_in_stock(&pool, 2).await;

    // The cart started anonymously follows the customer through sign-up
    add_to_cart(&client, product_id, 2).await;
    sign_up(&client, &unique_email()).await;
    fill_checkout(&client, "PayPal").await;

    let review = client
        .get(url("/checkout/place-order"))
        .send()
        .await
        .unwrap();
    assert_eq!(review.status(), StatusCode::OK);
    assert!(review.text().await.unwrap().contains("PayPal"));

    let order_id = place_order(&client).await;

    let (items, shipping, tax, total) = order_totals(&pool, order_id).await;
    let price: String = sqlx::query_scalar("SELECT price::text FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let cents = |s: &str| -> i64 { s.replace('.', "").parse().unwrap() };
    let expected_items = cents(&price) * 2;
    let expected_shipping = if expected_items >= 10_000 { 0 } else { 1_000 };
    // 15% tax, half-up to the cent
    let expected_tax = (expected_items * 15 + 50) / 100;
    assert_eq!(cents(&items), expected_items);
    assert_eq!(cents(&shipping), expected_shipping);
    assert_eq!(cents(&tax), expected_tax);
    assert_eq!(
        cents(&total),
        expected_items + expected_shipping + expected_tax
    );

    // The order page is visible to its owner, and the cart is emptied
    let resp = client
        .get(url(&format!("/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = client.get(url("/cart")).send().await.unwrap().text().await.unwrap();
    assert!(body.contains("Your cart is empty"));

    let history = client
        .get(url("/user/orders"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let short = order_id.to_string().chars().take(8).collect::<String>();
    assert!(history.contains(&short));
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_other_customers_cannot_view_order() {
    let pool = pool().await;
    let owner = client();
    let product_id = product_in_stock(&pool, 1).await;

    sign_up(&owner, &unique_email()).await;
    add_to_cart(&owner, product_id, 1).await;
    fill_checkout(&owner, "Stripe").await;
    let order_id = place_order(&owner).await;

    let stranger = client();
    sign_up(&stranger, &unique_email()).await;
    let resp = stranger
        .get(url(&format!("/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_concurrent_place_order_creates_one_order() {
    let pool = pool().await;
    let client = client();
    let email = unique_email();
    let product_id = product_in_stock(&pool, 2).await;

    sign_up(&client, &email).await;
    add_to_cart(&client, product_id, 2).await;
    fill_checkout(&client, "PayPal").await;

    // Repeated submits of the same cart race on one cookie jar
    let submits: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .post(url("/checkout/place-order"))
                    .send()
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut placed = 0;
    for submit in submits {
        let resp = submit.await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        if location(&resp).starts_with("/orders/") {
            placed += 1;
        }
    }
    assert_eq!(placed, 1);

    let orders: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders o JOIN users u ON u.id = o.user_id WHERE u.email = $1",
    )
    .bind(&email)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(orders, 1);

    let quantity: i64 = sqlx::query_scalar(
        r"
        SELECT COALESCE(SUM(oi.quantity), 0)::BIGINT FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        JOIN users u ON u.id = o.user_id
        WHERE u.email = $1
        ",
    )
    .bind(&email)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(quantity, 2);
}
