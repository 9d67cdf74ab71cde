// ABOUTME: Cart-abandonment reminder scheduling over compare-and-set persistence
// ABOUTME: Delay is data on the outbound email; conversions cancel pending reminders best-effort
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # Reminder Scheduler
//!
//! Orchestrates the cart session lifecycle: upsert on save, dual delayed
//! reminder dispatch, and the idempotent transition to converted. There is
//! no background timer - a reminder's delay travels as a `scheduled_at`
//! field on the outbound email and the provider delivers it then.
//!
//! Concurrency control is the persistence layer's compare-and-set on the
//! nullable reminder and conversion fields. Handlers are stateless and may
//! run as many independent instances; of two requests racing to schedule the
//! same slot, exactly one records its message id. The loser recalls its
//! duplicate dispatch best-effort.

use crate::config::environment::ReminderConfig;
use crate::constants::limits;
use crate::database::{CasOutcome, Database, ReminderSlot};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{CartSession, LineItem};
use crate::notifications::{EmailTemplate, Mailer, OutboundEmail};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Message ids dispatched by one scheduling pass
///
/// `None` in a slot means that reminder was not sent by this invocation:
/// either it was already recorded, a concurrent request won the race, the
/// session converted first, or ordering made the slot ineligible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderDispatch {
    /// Message id of the first reminder, when this pass dispatched it
    pub reminder1: Option<String>,
    /// Message id of the second reminder, when this pass dispatched it
    pub reminder2: Option<String>,
}

/// Reminder scheduling and cart session lifecycle
#[derive(Clone)]
pub struct ReminderScheduler {
    database: Arc<Database>,
    mailer: Arc<dyn Mailer>,
    config: ReminderConfig,
    store_base_url: String,
}

impl ReminderScheduler {
    /// Create a scheduler with injected collaborators
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        mailer: Arc<dyn Mailer>,
        config: ReminderConfig,
        store_base_url: impl Into<String>,
    ) -> Self {
        Self {
            database,
            mailer,
            config,
            store_base_url: store_base_url.into(),
        }
    }

    /// Upsert a cart session by token
    ///
    /// Creates the session on first save (generating a token when the client
    /// supplied none); re-saves update the payload only, never reminder or
    /// conversion fields, so re-saving is idempotent with respect to
    /// scheduling.
    pub async fn save_or_update_cart(
        &self,
        token: Option<String>,
        email: &str,
        items: Vec<LineItem>,
        currency: &str,
    ) -> AppResult<CartSession> {
        validate_email(email)?;
        validate_items(&items)?;

        let token = token
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(CartSession::generate_token);

        let session = self
            .database
            .upsert_cart_session(&token, email, &items, currency)
            .await
            .map_err(|e| AppError::database(e.to_string()).with_token(&token))?;

        info!(token = %session.token, items = session.items.len(), "cart session saved");
        Ok(session)
    }

    /// Dispatch both reminders for an unconverted session
    ///
    /// Each reminder is sent with its configured delay as a provider-side
    /// `scheduled_at`, then recorded via a conditional update guarded on the
    /// slot still being null. The second reminder is only eligible once the
    /// first is recorded, and the session is re-read immediately before the
    /// second dispatch so a conversion landing mid-flight suppresses it.
    pub async fn schedule_reminders(&self, session: &CartSession) -> AppResult<ReminderDispatch> {
        let mut dispatch = ReminderDispatch::default();

        if session.converted_at.is_some() {
            return Ok(dispatch);
        }

        if session.reminder1_email_id.is_none() {
            dispatch.reminder1 = self
                .dispatch_reminder(session, ReminderSlot::First)
                .await?;
        }

        // Re-read: a conversion since the request arrived must suppress the
        // second reminder, and ordering requires the first to be recorded.
        let current = self
            .database
            .get_cart_session(&session.token)
            .await
            .map_err(|e| AppError::database(e.to_string()).with_token(&session.token))?
            .ok_or_else(|| AppError::not_found("cart session").with_token(&session.token))?;

        if current.converted_at.is_some() {
            info!(token = %current.token, "session converted, skipping second reminder");
            return Ok(dispatch);
        }
        if current.reminder1_email_id.is_none() {
            warn!(
                token = %current.token,
                "first reminder not recorded, second reminder not yet eligible"
            );
            return Ok(dispatch);
        }
        if current.reminder2_email_id.is_none() {
            dispatch.reminder2 = self
                .dispatch_reminder(&current, ReminderSlot::Second)
                .await?;
        }

        Ok(dispatch)
    }

    /// Send one reminder and record it behind the slot's null guard
    async fn dispatch_reminder(
        &self,
        session: &CartSession,
        slot: ReminderSlot,
    ) -> AppResult<Option<String>> {
        let (template, delay) = match slot {
            ReminderSlot::First => (EmailTemplate::CartReminderFirst, self.config.first_delay()),
            ReminderSlot::Second => (
                EmailTemplate::CartReminderSecond,
                self.config.second_delay(),
            ),
        };
        let send_at = Utc::now() + delay;
        let email = OutboundEmail::cart_reminder(template, session, &self.store_base_url, send_at);

        let message_id = self.mailer.send(&email).await.map_err(|e| {
            warn!(token = %session.token, ?slot, error = %e, "reminder dispatch failed");
            AppError::notification(e.to_string()).with_token(&session.token)
        })?;

        match self
            .database
            .set_reminder_if_unset(&session.token, slot, &message_id, send_at)
            .await
        {
            Ok(CasOutcome::Applied) => {
                info!(
                    token = %session.token,
                    ?slot,
                    message_id = %message_id,
                    scheduled_at = %send_at,
                    "reminder scheduled"
                );
                Ok(Some(message_id))
            }
            Ok(CasOutcome::Conflict) => {
                // A concurrent request recorded its own dispatch first, or the
                // session converted under us. Recall our duplicate best-effort.
                info!(
                    token = %session.token,
                    ?slot,
                    message_id = %message_id,
                    "reminder slot taken, recalling duplicate dispatch"
                );
                if let Err(e) = self.mailer.cancel(&message_id).await {
                    warn!(message_id = %message_id, error = %e, "duplicate reminder recall failed");
                }
                Ok(None)
            }
            Err(e) => {
                // The email is out but the record was not updated. Accepted
                // at-least-once risk; must be loud, never silent.
                error!(
                    token = %session.token,
                    ?slot,
                    message_id = %message_id,
                    error = %e,
                    code = ?ErrorCode::PartialScheduleFailure,
                    "reminder dispatched but recording it failed"
                );
                Ok(Some(message_id))
            }
        }
    }

    /// Mark a session converted
    ///
    /// Idempotent: repeat calls after conversion are no-ops. Reminder
    /// dispatches still in flight observe the conversion on their re-read or
    /// fail their guarded update; suppression is best-effort, not
    /// transactional.
    pub async fn mark_converted(&self, token: &str) -> AppResult<()> {
        let outcome = self
            .database
            .mark_converted_if_active(token)
            .await
            .map_err(|e| AppError::database(e.to_string()).with_token(token))?;

        match outcome {
            Some(CasOutcome::Applied) => {
                info!(token, "cart session converted");
                Ok(())
            }
            Some(CasOutcome::Conflict) => {
                info!(token, "cart session already converted");
                Ok(())
            }
            None => Err(AppError::not_found("cart session").with_token(token)),
        }
    }
}

fn validate_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return Err(AppError::missing_field("email"));
    }
    if email.len() > limits::MAX_EMAIL_LEN || !email.contains('@') {
        return Err(AppError::invalid_input("email address is malformed"));
    }
    Ok(())
}

fn validate_items(items: &[LineItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::missing_field("items"));
    }
    if items.len() > limits::MAX_CART_ITEMS {
        return Err(AppError::out_of_range(format!(
            "cart may hold at most {} items",
            limits::MAX_CART_ITEMS
        )));
    }
    for item in items {
        if item.offer_id.trim().is_empty() {
            return Err(AppError::missing_field("items[].offer_id"));
        }
        if item.quantity == 0 || item.quantity > limits::MAX_ITEM_QUANTITY {
            return Err(AppError::out_of_range(format!(
                "item quantity must be between 1 and {}",
                limits::MAX_ITEM_QUANTITY
            )));
        }
    }
    Ok(())
}
