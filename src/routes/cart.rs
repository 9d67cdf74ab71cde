// ABOUTME: Cart route handlers: save, mark converted, restore by token
// ABOUTME: Save triggers reminder scheduling; all mutations sit behind the rate limiter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! Cart session routes
//!
//! `POST /api/cart` saves or updates a cart and schedules its reminders.
//! `POST /api/cart/converted` records the purchase. `GET /api/cart/{token}`
//! backs the restore-cart deep link embedded in reminder emails.

use crate::constants::defaults;
use crate::context::ServerContext;
use crate::errors::AppError;
use crate::models::{CartSession, LineItem};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for saving a cart
#[derive(Debug, Deserialize)]
pub struct SaveCartRequest {
    /// Shopper email reminders go to
    pub email: String,
    /// Session token; omitted on first save
    pub token: Option<String>,
    /// Cart line items
    pub items: Vec<LineItem>,
    /// ISO 4217 currency code; defaults to USD
    pub currency: Option<String>,
}

/// Response after a cart save
#[derive(Debug, Serialize)]
pub struct SaveCartResponse {
    /// Always true on success
    pub ok: bool,
    /// Session token for subsequent saves and conversion
    pub token: String,
    /// Whether this request dispatched the first reminder
    pub reminder1_scheduled: bool,
    /// Whether this request dispatched the second reminder
    pub reminder2_scheduled: bool,
}

/// Request body for marking a cart converted
#[derive(Debug, Deserialize)]
pub struct MarkConvertedRequest {
    /// Session token
    pub token: String,
}

/// Generic ok response
#[derive(Debug, Serialize)]
pub struct OkResponse {
    /// Always true on success
    pub ok: bool,
}

/// Cart session payload returned to the restore page
#[derive(Debug, Serialize)]
pub struct RestoreCartResponse {
    /// Session token
    pub token: String,
    /// Shopper email
    pub email: String,
    /// Cart line items
    pub items: Vec<LineItem>,
    /// ISO 4217 currency code
    pub currency: String,
    /// Whether the session already converted
    pub converted: bool,
}

impl From<CartSession> for RestoreCartResponse {
    fn from(session: CartSession) -> Self {
        Self {
            converted: session.converted_at.is_some(),
            token: session.token,
            email: session.email,
            items: session.items,
            currency: session.currency,
        }
    }
}

/// Cart routes implementation
pub struct CartRoutes;

impl CartRoutes {
    /// Create all cart routes
    #[must_use]
    pub fn routes(ctx: Arc<ServerContext>) -> Router {
        Router::new()
            .route("/api/cart", post(Self::handle_save_cart))
            .route("/api/cart/converted", post(Self::handle_mark_converted))
            .route("/api/cart/:token", get(Self::handle_restore_cart))
            .with_state(ctx)
    }

    /// Save a cart and schedule its abandonment reminders
    async fn handle_save_cart(
        State(ctx): State<Arc<ServerContext>>,
        headers: HeaderMap,
        Json(request): Json<SaveCartRequest>,
    ) -> Result<Response, AppError> {
        super::enforce_rate_limit(&ctx, &headers)?;

        let currency = request
            .currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| defaults::CURRENCY.to_owned());

        let session = ctx
            .reminders
            .save_or_update_cart(request.token, &request.email, request.items, &currency)
            .await?;

        let dispatch = ctx.reminders.schedule_reminders(&session).await?;

        Ok((
            StatusCode::OK,
            Json(SaveCartResponse {
                ok: true,
                token: session.token,
                reminder1_scheduled: dispatch.reminder1.is_some(),
                reminder2_scheduled: dispatch.reminder2.is_some(),
            }),
        )
            .into_response())
    }

    /// Record a completed purchase for a session
    async fn handle_mark_converted(
        State(ctx): State<Arc<ServerContext>>,
        Json(request): Json<MarkConvertedRequest>,
    ) -> Result<Response, AppError> {
        if request.token.trim().is_empty() {
            return Err(AppError::missing_field("token"));
        }

        ctx.reminders.mark_converted(&request.token).await?;

        Ok((StatusCode::OK, Json(OkResponse { ok: true })).into_response())
    }

    /// Fetch a session for the restore-cart deep link
    async fn handle_restore_cart(
        State(ctx): State<Arc<ServerContext>>,
        Path(token): Path<String>,
    ) -> Result<Response, AppError> {
        let session = ctx
            .database
            .get_cart_session(&token)
            .await
            .map_err(|e| AppError::database(e.to_string()).with_token(&token))?
            .ok_or_else(|| AppError::not_found("cart session").with_token(&token))?;

        Ok((StatusCode::OK, Json(RestoreCartResponse::from(session))).into_response())
    }
}
