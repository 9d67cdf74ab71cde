// ABOUTME: Discount route handlers: validate a code, redeem it against a transaction
// ABOUTME: Redemption is consumed by the external checkout flow at discount-application time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! Discount code routes

use crate::context::ServerContext;
use crate::errors::AppError;
use crate::models::DiscountCode;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for redeeming a code
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    /// The code as entered by the shopper; compared case-insensitively
    pub code: String,
    /// Transaction the discount applies to
    pub transaction_id: String,
}

/// Response after a successful redemption
#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    /// Always true on success
    pub ok: bool,
    /// Percent off granted
    pub percent_off: i64,
}

/// Public view of a usable code
#[derive(Debug, Serialize)]
pub struct CodeDetailsResponse {
    /// Normalized code string
    pub code: String,
    /// Percent off granted
    pub percent_off: i64,
    /// Scope tag
    pub applies_to: String,
    /// Expiry, when the code has one
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<DiscountCode> for CodeDetailsResponse {
    fn from(code: DiscountCode) -> Self {
        Self {
            code: code.code,
            percent_off: code.percent_off,
            applies_to: code.applies_to,
            expires_at: code.expires_at,
        }
    }
}

/// Discount routes implementation
pub struct DiscountRoutes;

impl DiscountRoutes {
    /// Create all discount routes
    #[must_use]
    pub fn routes(ctx: Arc<ServerContext>) -> Router {
        Router::new()
            .route("/api/discounts/redeem", post(Self::handle_redeem))
            .route("/api/discounts/:code", get(Self::handle_validate))
            .with_state(ctx)
    }

    /// Redeem a code exactly once against a transaction
    async fn handle_redeem(
        State(ctx): State<Arc<ServerContext>>,
        Json(request): Json<RedeemRequest>,
    ) -> Result<Response, AppError> {
        if request.code.trim().is_empty() {
            return Err(AppError::missing_field("code"));
        }
        if request.transaction_id.trim().is_empty() {
            return Err(AppError::missing_field("transaction_id"));
        }

        let redeemed = ctx
            .discounts
            .redeem_code(&request.code, &request.transaction_id)
            .await?;

        Ok((
            StatusCode::OK,
            Json(RedeemResponse {
                ok: true,
                percent_off: redeemed.percent_off,
            }),
        )
            .into_response())
    }

    /// Read-only usability check for checkout previews
    async fn handle_validate(
        State(ctx): State<Arc<ServerContext>>,
        Path(code): Path<String>,
    ) -> Result<Response, AppError> {
        let row = ctx.discounts.validate_code(&code).await?;
        Ok((StatusCode::OK, Json(CodeDetailsResponse::from(row))).into_response())
    }
}
