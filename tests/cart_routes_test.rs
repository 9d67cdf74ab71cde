// ABOUTME: Route-level tests driving the axum router end to end
// ABOUTME: Covers the save/convert/restore flow, review endpoint, errors, and rate limiting

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::{create_test_context, sample_items, seed_order, RecordingMailer};
use planport::routes;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn post_json(
    app: &axum::Router,
    uri: &str,
    body: &Value,
) -> anyhow::Result<(StatusCode, Value)> {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
        )
        .await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes)?;
    Ok((status, value))
}

async fn get(app: &axum::Router, uri: &str) -> anyhow::Result<(StatusCode, Value)> {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes)?;
    Ok((status, value))
}

fn save_cart_body(token: &str) -> Value {
    json!({
        "email": "test@example.com",
        "token": token,
        "items": sample_items(),
        "currency": "USD",
    })
}

#[tokio::test]
async fn test_save_convert_restore_flow() -> anyhow::Result<()> {
    let mailer = RecordingMailer::new();
    let (ctx, _database) = create_test_context(mailer.clone(), 100).await?;
    let app = routes::router(ctx);

    let (status, body) = post_json(&app, "/api/cart", &save_cart_body("tok_1")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["token"], "tok_1");
    assert_eq!(body["reminder1_scheduled"], true);
    assert_eq!(body["reminder2_scheduled"], true);
    assert_eq!(mailer.sent().len(), 2);

    let (status, body) = get(&app, "/api/cart/tok_1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["converted"], false);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));

    let (status, body) = post_json(&app, "/api/cart/converted", &json!({"token": "tok_1"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = get(&app, "/api/cart/tok_1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["converted"], true);
    Ok(())
}

#[tokio::test]
async fn test_save_without_token_generates_one() -> anyhow::Result<()> {
    let mailer = RecordingMailer::new();
    let (ctx, _database) = create_test_context(mailer, 100).await?;
    let app = routes::router(ctx);

    let body = json!({
        "email": "test@example.com",
        "items": sample_items(),
    });
    let (status, body) = post_json(&app, "/api/cart", &body).await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap_or_default();
    assert!(token.starts_with("cart_"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_email_is_bad_request() -> anyhow::Result<()> {
    let mailer = RecordingMailer::new();
    let (ctx, _database) = create_test_context(mailer.clone(), 100).await?;
    let app = routes::router(ctx);

    let body = json!({
        "email": "not-an-address",
        "items": sample_items(),
    });
    let (status, body) = post_json(&app, "/api/cart", &body).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert!(mailer.sent().is_empty(), "no side effects on rejection");
    Ok(())
}

#[tokio::test]
async fn test_convert_unknown_token_is_not_found() -> anyhow::Result<()> {
    let mailer = RecordingMailer::new();
    let (ctx, _database) = create_test_context(mailer, 100).await?;
    let app = routes::router(ctx);

    let (status, body) =
        post_json(&app, "/api/cart/converted", &json!({"token": "tok_missing"})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_review_endpoint_returns_incentive() -> anyhow::Result<()> {
    let mailer = RecordingMailer::new();
    let (ctx, database) = create_test_context(mailer, 100).await?;
    seed_order(&database, "txn_1", "buyer@example.com").await?;
    let app = routes::router(ctx);

    let body = json!({
        "transaction_id": "txn_1",
        "rating": 5,
        "title": "Great coverage",
        "body": "Worked everywhere I went.",
    });
    let (status, body) = post_json(&app, "/api/reviews", &body).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["discount_percent_off"], 15);
    let code = body["discount_code"].as_str().unwrap_or_default().to_owned();
    assert!(code.starts_with("SAVE15-"));

    // The minted code validates and redeems through the discount endpoints
    let (status, details) = get(&app, &format!("/api/discounts/{code}")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["percent_off"], 15);

    let redeem = json!({"code": code, "transaction_id": "txn_checkout"});
    let (status, body) = post_json(&app, "/api/discounts/redeem", &redeem).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["percent_off"], 15);

    let (status, body) = post_json(&app, "/api/discounts/redeem", &redeem).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CODE_ALREADY_REDEEMED");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_review_is_conflict_over_http() -> anyhow::Result<()> {
    let mailer = RecordingMailer::new();
    let (ctx, database) = create_test_context(mailer, 100).await?;
    seed_order(&database, "txn_1", "buyer@example.com").await?;
    let app = routes::router(ctx);

    let body = json!({
        "transaction_id": "txn_1",
        "rating": 4,
        "title": "Solid",
        "body": "Did what it said.",
    });
    let (status, _) = post_json(&app, "/api/reviews", &body).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = post_json(&app, "/api/reviews", &body).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"]["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn test_cart_saves_are_rate_limited_per_client() -> anyhow::Result<()> {
    let mailer = RecordingMailer::new();
    let (ctx, _database) = create_test_context(mailer, 2).await?;
    let app = routes::router(ctx);

    for i in 0..2 {
        let (status, _) = post_json(&app, "/api/cart", &save_cart_body(&format!("tok_{i}"))).await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = post_json(&app, "/api/cart", &save_cart_body("tok_over")).await?;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    Ok(())
}

#[tokio::test]
async fn test_health_endpoints_respond() -> anyhow::Result<()> {
    let mailer = RecordingMailer::new();
    let (ctx, _database) = create_test_context(mailer, 100).await?;
    let app = routes::router(ctx);

    let (status, body) = get(&app, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&app, "/ready").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    Ok(())
}
