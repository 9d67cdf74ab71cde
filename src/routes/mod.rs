// ABOUTME: HTTP route assembly for the storefront API
// ABOUTME: Thin handlers: parse, rate-limit, invoke a core service, map errors to JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # HTTP Routes
//!
//! Route modules follow one pattern: a unit struct with a `routes(ctx)`
//! constructor returning an axum `Router` with the shared [`ServerContext`]
//! as state. Handlers stay thin; all invariants live in the services.

/// Cart save, conversion, and restore routes
pub mod cart;

/// Discount validation and redemption routes
pub mod discounts;

/// Health and readiness routes
pub mod health;

/// Review submission routes
pub mod reviews;

use crate::context::ServerContext;
use crate::errors::AppError;
use axum::http::HeaderMap;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Assemble the full application router
#[must_use]
pub fn router(ctx: Arc<ServerContext>) -> Router {
    Router::new()
        .merge(health::HealthRoutes::routes())
        .merge(cart::CartRoutes::routes(Arc::clone(&ctx)))
        .merge(discounts::DiscountRoutes::routes(Arc::clone(&ctx)))
        .merge(reviews::ReviewRoutes::routes(ctx))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Derive the rate limit key for a request
///
/// Behind a proxy the client address arrives in `x-forwarded-for` (first
/// hop) or `x-real-ip`; without either, requests share one bucket.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .map_or_else(|| "unknown".to_owned(), ToOwned::to_owned)
}

/// Consume one rate limit slot or fail fast with no side effects
fn enforce_rate_limit(ctx: &ServerContext, headers: &HeaderMap) -> Result<(), AppError> {
    let key = client_key(headers);
    let status = ctx.rate_limiter.check(&key);
    if !status.allowed {
        warn!(client_key = %key, reset_at = %status.reset_at, "rate limit exceeded");
        return Err(AppError::rate_limit_exceeded(
            ctx.rate_limiter.max_requests(),
            status.reset_at,
        ));
    }
    Ok(())
}
