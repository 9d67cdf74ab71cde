// ABOUTME: Review submission and discount incentive flow
// ABOUTME: One review and one thank-you code per purchase, guarded by unique constraints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # Review Incentive
//!
//! A purchaser who reviews their order gets a single-use discount code. The
//! one-code-per-order guarantee rests on two unique constraints: the review
//! table's transaction id, checked first, and the discount table's
//! triggering transaction id as a backstop. The thank-you email is sent
//! after both rows are committed; a send failure is logged and the response
//! still carries the code.

use crate::config::environment::ReviewIncentiveConfig;
use crate::constants::limits;
use crate::database::{Database, InsertOutcome};
use crate::discounts::DiscountEngine;
use crate::errors::{AppError, AppResult};
use crate::models::{DiscountCodeSpec, ProductReview};
use crate::notifications::{Mailer, OutboundEmail};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Inbound review submission
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReviewRequest {
    /// Transaction id of the purchase being reviewed
    pub transaction_id: String,
    /// Star rating, 1-5
    pub rating: i64,
    /// Review title
    pub title: String,
    /// Review body
    pub body: String,
}

/// Incentive granted for an accepted review
#[derive(Debug, Clone, Serialize)]
pub struct ReviewIncentive {
    /// The minted single-use code
    pub discount_code: String,
    /// Percent off the code grants
    pub discount_percent_off: i64,
}

/// Review submission service
#[derive(Clone)]
pub struct ReviewService {
    database: Arc<Database>,
    discounts: DiscountEngine,
    mailer: Arc<dyn Mailer>,
    config: ReviewIncentiveConfig,
}

impl ReviewService {
    /// Create a service with injected collaborators
    #[must_use]
    pub const fn new(
        database: Arc<Database>,
        discounts: DiscountEngine,
        mailer: Arc<dyn Mailer>,
        config: ReviewIncentiveConfig,
    ) -> Self {
        Self {
            database,
            discounts,
            mailer,
            config,
        }
    }

    /// Accept a review and mint its incentive code
    ///
    /// Validation happens before any write; the review insert is the
    /// uniqueness gate (duplicate submissions for the same purchase fail with
    /// a conflict and mint nothing).
    pub async fn submit_review(&self, request: SubmitReviewRequest) -> AppResult<ReviewIncentive> {
        validate_request(&request)?;

        let order = self
            .database
            .get_order_by_transaction(&request.transaction_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::not_found("order for transaction"))?;

        let review = ProductReview {
            id: ProductReview::generate_id(),
            transaction_id: order.transaction_id.clone(),
            email: order.email.clone(),
            rating: request.rating,
            title: request.title.trim().to_owned(),
            body: request.body.trim().to_owned(),
            created_at: Utc::now(),
        };

        match self
            .database
            .insert_review(&review)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
        {
            InsertOutcome::Inserted => {}
            InsertOutcome::DuplicateCode | InsertOutcome::DuplicateTransaction => {
                return Err(AppError::conflict(
                    "a review for this purchase already exists",
                ));
            }
        }

        info!(
            transaction_id = %order.transaction_id,
            rating = review.rating,
            "review accepted"
        );

        let code = self
            .discounts
            .create_code(DiscountCodeSpec {
                percent_off: self.config.percent_off,
                applies_to: "any".into(),
                created_reason: "review-thank-you".into(),
                created_for_transaction_id: Some(order.transaction_id.clone()),
                created_for_email: Some(order.email.clone()),
                expires_at: Some(Utc::now() + Duration::days(self.config.validity_days)),
            })
            .await?;

        let email = OutboundEmail::review_thank_you(&order.email, &code.code, code.percent_off);
        if let Err(e) = self.mailer.send(&email).await {
            // The code is committed and returned in the response regardless.
            warn!(
                transaction_id = %order.transaction_id,
                code = %code.code,
                error = %e,
                "review thank-you email failed"
            );
        }

        Ok(ReviewIncentive {
            discount_code: code.code,
            discount_percent_off: code.percent_off,
        })
    }
}

fn validate_request(request: &SubmitReviewRequest) -> AppResult<()> {
    if request.transaction_id.trim().is_empty() {
        return Err(AppError::missing_field("transaction_id"));
    }
    if !(limits::MIN_RATING..=limits::MAX_RATING).contains(&request.rating) {
        return Err(AppError::out_of_range(format!(
            "rating must be between {} and {}",
            limits::MIN_RATING,
            limits::MAX_RATING
        )));
    }
    if request.title.trim().is_empty() {
        return Err(AppError::missing_field("title"));
    }
    if request.title.len() > limits::MAX_REVIEW_TITLE_LEN {
        return Err(AppError::out_of_range("title is too long"));
    }
    if request.body.len() > limits::MAX_REVIEW_BODY_LEN {
        return Err(AppError::out_of_range("body is too long"));
    }
    Ok(())
}
