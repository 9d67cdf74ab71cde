// ABOUTME: Review route handler: submit a review, receive a discount incentive
// ABOUTME: Rate-limited; duplicate submissions for one purchase conflict and mint nothing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! Review submission routes

use crate::context::ServerContext;
use crate::errors::AppError;
use crate::reviews::SubmitReviewRequest;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Response after an accepted review
#[derive(Debug, Serialize)]
pub struct SubmitReviewResponse {
    /// Always true on success
    pub ok: bool,
    /// The minted single-use code
    pub discount_code: String,
    /// Percent off the code grants
    pub discount_percent_off: i64,
}

/// Review routes implementation
pub struct ReviewRoutes;

impl ReviewRoutes {
    /// Create all review routes
    #[must_use]
    pub fn routes(ctx: Arc<ServerContext>) -> Router {
        Router::new()
            .route("/api/reviews", post(Self::handle_submit_review))
            .with_state(ctx)
    }

    /// Accept a review and return its incentive code
    async fn handle_submit_review(
        State(ctx): State<Arc<ServerContext>>,
        headers: HeaderMap,
        Json(request): Json<SubmitReviewRequest>,
    ) -> Result<Response, AppError> {
        super::enforce_rate_limit(&ctx, &headers)?;

        let incentive = ctx.reviews.submit_review(request).await?;

        Ok((
            StatusCode::OK,
            Json(SubmitReviewResponse {
                ok: true,
                discount_code: incentive.discount_code,
                discount_percent_off: incentive.discount_percent_off,
            }),
        )
            .into_response())
    }
}
