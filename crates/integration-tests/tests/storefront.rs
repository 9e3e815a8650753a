//! Integration tests for health checks, headers, and public pages.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database
//! - The storefront running (cargo run -p prostore-storefront)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use prostore_integration_tests::{client, pool, url};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let client = client();

    let resp = client.get(url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client.get(url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_pages_carry_security_headers_and_request_id() {
    let resp = client().get(url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let headers = resp.headers();
    let csp = headers
        .get("content-security-policy")
        .expect("CSP header missing")
        .to_str()
        .unwrap();
    assert!(csp.contains("default-src 'none'"));
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_incoming_request_id_is_echoed() {
    let resp = client()
        .get(url("/health"))
        .header("x-request-id", "integration-test-id")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get("x-request-id").unwrap(),
        "integration-test-id"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and seeded catalog"]
async fn test_product_page_by_slug() {
    let pool = pool().await;
    let (slug, name): (String, String) =
        sqlx::query_as("SELECT slug, name FROM products ORDER BY created_at LIMIT 1")
            .fetch_one(&pool)
            .await
            .unwrap();

    let resp = client()
        .get(url(&format!("/product/{slug}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains(&name));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_not_found() {
    let resp = client()
        .get(url("/product/no-such-product-slug"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
