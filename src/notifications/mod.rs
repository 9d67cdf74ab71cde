// ABOUTME: Email dispatch adapter trait and outbound message types
// ABOUTME: Delayed delivery is data (scheduled_at on the message), never an in-process timer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # Notifications
//!
//! The [`Mailer`] trait is the seam between the core and the email provider.
//! Dispatch is synchronous; a reminder's delay travels as a `scheduled_at`
//! field on the outbound message and the provider delivers it at that time.
//! Every adapter result is an explicit `Result` over [`MailerError`] so the
//! scheduler's failure branching is a visible match, never a caught panic.

/// HTTP email provider client
pub mod email;

pub use email::HttpMailer;

use crate::models::CartSession;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Email dispatch failure kinds
#[derive(Debug, Error)]
pub enum MailerError {
    /// The provider rejected the request
    #[error("email provider rejected the request: {status} {detail}")]
    Provider {
        /// HTTP status returned by the provider
        status: u16,
        /// Provider error detail
        detail: String,
    },
    /// The request never reached the provider
    #[error("email transport failed: {0}")]
    Transport(String),
    /// The provider answered with something unparseable
    #[error("provider response was malformed: {0}")]
    MalformedResponse(String),
    /// The provider cannot recall this message
    #[error("recall is not supported for message {0}")]
    RecallUnsupported(String),
}

/// Which email template an outbound message renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailTemplate {
    /// First cart-abandonment nudge
    CartReminderFirst,
    /// Second, final cart-abandonment nudge
    CartReminderSecond,
    /// Thank-you carrying a review incentive code
    ReviewThankYou,
}

impl EmailTemplate {
    /// Provider-side template key
    #[must_use]
    pub const fn template_key(&self) -> &'static str {
        match self {
            Self::CartReminderFirst => "cart-reminder-first",
            Self::CartReminderSecond => "cart-reminder-second",
            Self::ReviewThankYou => "review-thank-you",
        }
    }

    /// Subject line
    #[must_use]
    pub const fn subject(&self) -> &'static str {
        match self {
            Self::CartReminderFirst => "Your plan is waiting for you",
            Self::CartReminderSecond => "Last chance to finish your order",
            Self::ReviewThankYou => "Thanks for your review - here's a discount",
        }
    }
}

/// One outbound email message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEmail {
    /// Template to render
    pub template: EmailTemplate,
    /// Recipient address
    pub to: String,
    /// Template variables
    pub variables: serde_json::Value,
    /// Provider-side delivery time; `None` sends immediately
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl OutboundEmail {
    /// Build a cart reminder embedding the restore-cart deep link
    #[must_use]
    pub fn cart_reminder(
        template: EmailTemplate,
        session: &CartSession,
        store_base_url: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        let restore_url = format!("{store_base_url}/cart/restore?token={}", session.token);
        Self {
            template,
            to: session.email.clone(),
            variables: serde_json::json!({
                "token": session.token,
                "restore_url": restore_url,
                "currency": session.currency,
                "items": session.items,
            }),
            scheduled_at: Some(scheduled_at),
        }
    }

    /// Build the review thank-you message carrying a discount code
    #[must_use]
    pub fn review_thank_you(to: &str, code: &str, percent_off: i64) -> Self {
        Self {
            template: EmailTemplate::ReviewThankYou,
            to: to.to_owned(),
            variables: serde_json::json!({
                "discount_code": code,
                "percent_off": percent_off,
            }),
            scheduled_at: None,
        }
    }
}

/// Email dispatch capability
///
/// `send` returns the provider-assigned message identifier; `cancel` is
/// best-effort and may report [`MailerError::RecallUnsupported`].
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Dispatch one message, returning the provider message id
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError>;

    /// Recall a previously dispatched, not-yet-delivered message
    async fn cancel(&self, message_id: &str) -> Result<(), MailerError>;
}

/// Mailer that logs instead of sending
///
/// Used when no provider API key is configured, so the server runs end to end
/// in development without outbound email.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError> {
        let message_id = format!("local_{}", Uuid::new_v4().simple());
        info!(
            template = email.template.template_key(),
            to = %email.to,
            scheduled_at = ?email.scheduled_at,
            message_id = %message_id,
            "log-only mailer: outbound email suppressed"
        );
        Ok(message_id)
    }

    async fn cancel(&self, message_id: &str) -> Result<(), MailerError> {
        info!(message_id = %message_id, "log-only mailer: cancel suppressed");
        Ok(())
    }
}
