//! Integration tests for the admin back office.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database seeded with `prostore-cli seed products`
//! - The storefront running (cargo run -p prostore-storefront)
//!
//! Admins are created by flipping the role column, the same change
//! `prostore-cli admin promote` makes.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use prostore_integration_tests::{
    add_to_cart, client, location, make_admin, pool, product_in_stock, sign_up, unique_email, url,
};
use reqwest::{Client, StatusCode};
use sqlx::PgPool;
use uuid::Uuid;

/// Sign up a customer and place a cash-on-delivery order.
async fn place_cod_order(pool: &PgPool) -> Uuid {
    let customer = client();
    sign_up(&customer, &unique_email()).await;
    add_to_cart(&customer, product_in_stock(pool, 1).await, 1).await;

    customer
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
    customer
        .post(url("/checkout/payment"))
        .form(&[("paymentMethod", "Cash on Delivery")])
        .send()
        .await
        .unwrap();
    let resp = customer
        .post(url("/checkout/place-order"))
        .send()
        .await
        .unwrap();

    let target = location(&resp);
    Uuid::parse_str(target.strip_prefix("/orders/").unwrap()).unwrap()
}

/// Signed-in administrator client.
async fn admin_client(pool: &PgPool) -> Client {
    let client = client();
    let email = unique_email();
    sign_up(&client, &email).await;
    make_admin(pool, &email).await;
    client
}

/// Payment and delivery flags of an order, `None` once deleted.
async fn order_flags(pool: &PgPool, order_id: Uuid) -> Option<(bool, bool)> {
    sqlx::query_as("SELECT is_paid, is_delivered FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_admin_requires_sign_in() {
    let resp = client().get(url("/admin")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/sign-in?callbackUrl=%2Fadmin");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_customers_are_forbidden() {
    let client = client();
    sign_up(&client, &unique_email()).await;

    let resp = client.get(url("/admin/orders")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_role_change_applies_without_new_sign_in() {
    let pool = pool().await;
    let client = client();
    let email = unique_email();
    sign_up(&client, &email).await;

    let resp = client.get(url("/admin")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    make_admin(&pool, &email).await;
    let resp = client.get(url("/admin")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_admin_dashboard_and_order_filters() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;

    let resp = admin.get(url("/admin")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let order_id = place_cod_order(&pool).await;
    let short = order_id.to_string().chars().take(8).collect::<String>();

    let body = admin
        .get(url("/admin/orders?status=unpaid&perPage=50"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(&short));

    // Unknown filters and page numbers fall back instead of failing
    let resp = admin
        .get(url("/admin/orders?status=bogus&page=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_mark_cod_order_paid_then_delete() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let order_id = place_cod_order(&pool).await;
    assert_eq!(order_flags(&pool, order_id).await, Some((false, false)));

    let resp = admin
        .post(url(&format!("/admin/orders/{order_id}/mark-paid")))
        .form(&[("return_to", "/admin/orders")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/admin/orders");
    assert_eq!(order_flags(&pool, order_id).await, Some((true, true)));

    let resp = admin
        .post(url(&format!("/admin/orders/{order_id}/delete")))
        .form(&[("return_to", "/admin/orders")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(order_flags(&pool, order_id).await, None);
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_admin_can_view_any_order() {
    let pool = pool().await;
    let admin = admin_client(&pool).await;
    let order_id = place_cod_order(&pool).await;

    let resp = admin
        .get(url(&format!("/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("Payment will be collected upon delivery.")
    );
}
