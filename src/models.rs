// ABOUTME: Common data models for cart sessions, discount codes, orders, and reviews
// ABOUTME: Defines the reminder state machine and the transient discount calculation result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # Data Models
//!
//! Persistent entities (cart sessions, discount codes, orders, product
//! reviews) and the transient [`DiscountCalculation`] result. The reminder
//! lifecycle is monotonic: nullable fields move from `None` to `Some` exactly
//! once and are never reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line item in a shopper's cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Identifier of the connectivity plan offer
    pub offer_id: String,
    /// Display name shown in reminder emails
    pub name: String,
    /// Pre-formatted unit price label (e.g. "$20.00")
    pub unit_price_label: String,
    /// Quantity of this offer in the cart
    pub quantity: u32,
}

/// Derived lifecycle state of a cart session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartState {
    /// Saved, no reminder dispatched yet
    ActiveNoReminder,
    /// First reminder dispatched and recorded
    ActiveReminder1Sent,
    /// Both reminders dispatched and recorded
    ActiveReminder2Sent,
    /// Purchase completed; terminal
    Converted,
}

/// A persisted record of one shopper's unconverted cart
///
/// Keyed by an opaque `token` that is the sole external handle to the
/// session. Reminder fields and `converted_at` are only ever written through
/// compare-and-set updates guarded on the field still being null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSession {
    /// Opaque unique token; immutable after creation
    pub token: String,
    /// Shopper email address reminders are sent to
    pub email: String,
    /// Ordered line items
    pub items: Vec<LineItem>,
    /// ISO 4217 currency code
    pub currency: String,
    /// Provider message id of the first reminder, once dispatched and recorded
    pub reminder1_email_id: Option<String>,
    /// Provider message id of the second reminder, once dispatched and recorded
    pub reminder2_email_id: Option<String>,
    /// Scheduled delivery time of the first reminder
    pub reminder1_scheduled_at: Option<DateTime<Utc>>,
    /// Scheduled delivery time of the second reminder
    pub reminder2_scheduled_at: Option<DateTime<Utc>>,
    /// Set when the purchase completes; terminal
    pub converted_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last payload update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CartSession {
    /// Derive the state machine position from the lifecycle markers
    #[must_use]
    pub const fn state(&self) -> CartState {
        if self.converted_at.is_some() {
            CartState::Converted
        } else if self.reminder2_email_id.is_some() {
            CartState::ActiveReminder2Sent
        } else if self.reminder1_email_id.is_some() {
            CartState::ActiveReminder1Sent
        } else {
            CartState::ActiveNoReminder
        }
    }

    /// Generate a fresh opaque session token
    #[must_use]
    pub fn generate_token() -> String {
        format!("cart_{}", Uuid::new_v4().simple())
    }
}

/// A single-use promotional discount code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountCode {
    /// Unique human-shareable code string, stored uppercase
    pub code: String,
    /// Percent off the order total, fixed at creation
    pub percent_off: i64,
    /// Scope tag: "any" or a specific order constraint
    pub applies_to: String,
    /// Why the code was minted (e.g. "review-thank-you")
    pub created_reason: String,
    /// Transaction that triggered minting, when applicable; unique per code
    pub created_for_transaction_id: Option<String>,
    /// Email the code was issued to, when applicable
    pub created_for_email: Option<String>,
    /// Expiry; null means the code never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Redemption timestamp; null means still usable
    pub redeemed_at: Option<DateTime<Utc>>,
    /// Transaction the code was redeemed against
    pub redeemed_for_transaction_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl DiscountCode {
    /// Whether the code is past its expiry at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Whether the code has been redeemed
    #[must_use]
    pub const fn is_redeemed(&self) -> bool {
        self.redeemed_at.is_some()
    }
}

/// Specification for minting a new discount code
#[derive(Debug, Clone)]
pub struct DiscountCodeSpec {
    /// Percent off, must be in [1, 100]
    pub percent_off: i64,
    /// Scope tag
    pub applies_to: String,
    /// Reason recorded on the row
    pub created_reason: String,
    /// Triggering transaction; at most one code is ever minted per transaction
    pub created_for_transaction_id: Option<String>,
    /// Recipient email
    pub created_for_email: Option<String>,
    /// Optional expiry
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of applying a percent discount to a total under a floor constraint
///
/// Transient; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCalculation {
    /// Cents taken off the total
    pub discount_amount_cents: i64,
    /// Total after the discount
    pub discounted_total_cents: i64,
}

/// Minimal purchase record written by the fulfillment pipeline
///
/// The review flow validates submissions against these rows; this core never
/// creates them in production paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Payment processor transaction id
    pub transaction_id: String,
    /// Purchaser email
    pub email: String,
    /// Display name of the purchased offer
    pub offer_name: String,
    /// Amount paid, in the smallest currency unit
    pub total_cents: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Purchase timestamp
    pub created_at: DateTime<Utc>,
}

/// A product review submitted by a purchaser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReview {
    /// Review id
    pub id: String,
    /// Reviewed purchase; unique, so one review (and one incentive code) per order
    pub transaction_id: String,
    /// Reviewer email, taken from the order
    pub email: String,
    /// Star rating, 1-5
    pub rating: i64,
    /// Review title
    pub title: String,
    /// Review body
    pub body: String,
    /// Submission timestamp
    pub created_at: DateTime<Utc>,
}

impl ProductReview {
    /// Generate a fresh review id
    #[must_use]
    pub fn generate_id() -> String {
        format!("rev_{}", Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session() -> CartSession {
        CartSession {
            token: CartSession::generate_token(),
            email: "shopper@example.com".into(),
            items: vec![],
            currency: "USD".into(),
            reminder1_email_id: None,
            reminder2_email_id: None,
            reminder1_scheduled_at: None,
            reminder2_scheduled_at: None,
            converted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_state_progression() {
        let mut s = session();
        assert_eq!(s.state(), CartState::ActiveNoReminder);

        s.reminder1_email_id = Some("msg_1".into());
        assert_eq!(s.state(), CartState::ActiveReminder1Sent);

        s.reminder2_email_id = Some("msg_2".into());
        assert_eq!(s.state(), CartState::ActiveReminder2Sent);

        s.converted_at = Some(Utc::now());
        assert_eq!(s.state(), CartState::Converted);
    }

    #[test]
    fn test_conversion_wins_over_reminder_state() {
        let mut s = session();
        s.converted_at = Some(Utc::now());
        s.reminder1_email_id = Some("msg_1".into());
        assert_eq!(s.state(), CartState::Converted);
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        assert_ne!(CartSession::generate_token(), CartSession::generate_token());
        assert!(CartSession::generate_token().starts_with("cart_"));
    }

    #[test]
    fn test_discount_code_expiry() {
        let now = Utc::now();
        let code = DiscountCode {
            code: "SAVE15-ABC234".into(),
            percent_off: 15,
            applies_to: "any".into(),
            created_reason: "review-thank-you".into(),
            created_for_transaction_id: None,
            created_for_email: None,
            expires_at: Some(now - Duration::days(1)),
            redeemed_at: None,
            redeemed_for_transaction_id: None,
            created_at: now - Duration::days(30),
        };
        assert!(code.is_expired(now));
        assert!(!code.is_redeemed());

        let mut fresh = code.clone();
        fresh.expires_at = Some(now + Duration::days(1));
        assert!(!fresh.is_expired(now));

        let mut open_ended = code;
        open_ended.expires_at = None;
        assert!(!open_ended.is_expired(now));
    }
}
