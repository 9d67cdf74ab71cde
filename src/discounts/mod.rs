// ABOUTME: Discount engine: floor-clamped calculation and single-use code lifecycle
// ABOUTME: Codes are minted collision-checked and redeemed exactly once via compare-and-set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # Discount Engine
//!
//! Two responsibilities: the pure floor-clamped percentage calculation used
//! at checkout, and the lifecycle of single-use promotional codes (mint,
//! validate, redeem). Redemption is first-writer-wins: the conditional
//! update guarded on `redeemed_at IS NULL` is enforced by the persistence
//! layer, so two concurrent attempts resolve to exactly one success no
//! matter how many server instances are running.

use crate::constants::limits;
use crate::database::{CasOutcome, Database, InsertOutcome};
use crate::errors::{AppError, AppResult};
use crate::models::{DiscountCalculation, DiscountCode, DiscountCodeSpec};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

/// Characters used in generated codes; ambiguous glyphs (I, L, O, 0, 1) excluded
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Apply a percent discount to a total without dropping below a floor
///
/// The desired discount is `total * percent / 100` rounded half-up; it is
/// then clamped so the discounted total never falls below `min_total_cents`.
/// When the total is already at or below the floor the discount is forced to
/// zero and the total passes through unchanged. Pure and deterministic.
#[must_use]
pub fn compute_floor_clamped_discount(
    total_cents: i64,
    percent_off: i64,
    min_total_cents: i64,
) -> DiscountCalculation {
    let desired = (total_cents * percent_off + 50) / 100;
    let max_permissible = (total_cents - min_total_cents).max(0);
    let discount_amount_cents = desired.min(max_permissible);

    DiscountCalculation {
        discount_amount_cents,
        discounted_total_cents: total_cents - discount_amount_cents,
    }
}

/// Normalize a code for storage and lookup
///
/// Comparison is case-insensitive: codes are stored uppercase and every
/// lookup folds its input the same way.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Single-use promotional code lifecycle
#[derive(Clone)]
pub struct DiscountEngine {
    database: Arc<Database>,
}

impl DiscountEngine {
    /// Create an engine over the given database handle
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Mint a new single-use code
    ///
    /// The code string is generated and collision-checked by attempting the
    /// insert; a collision regenerates, bounded by a retry budget. At most
    /// one code is ever minted per triggering transaction - a duplicate
    /// there is a conflict, not a retry.
    pub async fn create_code(&self, spec: DiscountCodeSpec) -> AppResult<DiscountCode> {
        if !(1..=100).contains(&spec.percent_off) {
            return Err(AppError::out_of_range(format!(
                "percent_off must be between 1 and 100, got {}",
                spec.percent_off
            )));
        }

        for attempt in 1..=limits::MAX_CODE_ATTEMPTS {
            let row = DiscountCode {
                code: generate_code(spec.percent_off),
                percent_off: spec.percent_off,
                applies_to: spec.applies_to.clone(),
                created_reason: spec.created_reason.clone(),
                created_for_transaction_id: spec.created_for_transaction_id.clone(),
                created_for_email: spec.created_for_email.clone(),
                expires_at: spec.expires_at,
                redeemed_at: None,
                redeemed_for_transaction_id: None,
                created_at: Utc::now(),
            };

            match self
                .database
                .insert_discount_code(&row)
                .await
                .map_err(|e| AppError::database(e.to_string()))?
            {
                InsertOutcome::Inserted => {
                    info!(
                        code = %row.code,
                        percent_off = row.percent_off,
                        reason = %row.created_reason,
                        "discount code minted"
                    );
                    return Ok(row);
                }
                InsertOutcome::DuplicateCode => {
                    warn!(code = %row.code, attempt, "discount code collision, regenerating");
                }
                InsertOutcome::DuplicateTransaction => {
                    return Err(AppError::conflict(
                        "a discount code was already issued for this transaction",
                    ));
                }
            }
        }

        Err(AppError::database(format!(
            "could not generate a unique discount code after {} attempts",
            limits::MAX_CODE_ATTEMPTS
        )))
    }

    /// Check that a code exists and is still usable
    ///
    /// Read-only; used by checkout previews. The authoritative check happens
    /// again inside [`Self::redeem_code`].
    pub async fn validate_code(&self, code: &str) -> AppResult<DiscountCode> {
        let normalized = normalize_code(code);
        let row = self
            .database
            .get_discount_code(&normalized)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::not_found("discount code").with_code(&normalized))?;

        if row.is_redeemed() {
            return Err(AppError::already_redeemed(normalized));
        }
        if row.is_expired(Utc::now()) {
            return Err(AppError::expired(normalized));
        }
        Ok(row)
    }

    /// Redeem a code against a transaction, exactly once
    ///
    /// Two concurrent attempts resolve to one `Ok` and one `AlreadyRedeemed`;
    /// the conditional update on `redeemed_at` decides the winner.
    pub async fn redeem_code(&self, code: &str, transaction_id: &str) -> AppResult<DiscountCode> {
        let row = self.validate_code(code).await?;
        let now = Utc::now();

        let outcome = self
            .database
            .redeem_discount_code_if_unredeemed(&row.code, transaction_id, now)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        match outcome {
            CasOutcome::Applied => {
                info!(code = %row.code, transaction_id, "discount code redeemed");
                Ok(DiscountCode {
                    redeemed_at: Some(now),
                    redeemed_for_transaction_id: Some(transaction_id.to_owned()),
                    ..row
                })
            }
            CasOutcome::Conflict => Err(AppError::already_redeemed(row.code)),
        }
    }
}

/// Generate a human-shareable code like `SAVE15-K7MQ2F`
fn generate_code(percent_off: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..limits::CODE_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect();
    format!("SAVE{percent_off}-{suffix}")
}
