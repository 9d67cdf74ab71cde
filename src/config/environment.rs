// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses env variables into typed sub-configs for database, email, reminders, and limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! Environment-based configuration management

use crate::constants::{defaults, env_vars};
use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete server configuration assembled from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// Email provider settings
    pub email: EmailConfig,
    /// Reminder scheduling policy
    pub reminders: ReminderConfig,
    /// Review incentive policy
    pub review_incentive: ReviewIncentiveConfig,
    /// Per-client rate limiting
    pub rate_limit: RateLimitConfig,
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL; `sqlite:` URLs get the file created on first run
    pub url: String,
}

/// Email provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Base URL of the provider HTTP API
    pub api_base: String,
    /// Bearer token; absent means outbound email is logged instead of sent
    pub api_key: Option<String>,
    /// From-address stamped on every outbound message
    pub from_address: String,
    /// Public storefront base URL used to build restore-cart deep links
    pub store_base_url: String,
}

/// Reminder scheduling policy
///
/// The delays are configuration, not core logic; they become `scheduled_at`
/// fields on the outbound email rather than in-process timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Minutes after cart save until the first reminder is due
    pub first_delay_minutes: i64,
    /// Minutes after cart save until the second reminder is due
    pub second_delay_minutes: i64,
}

impl ReminderConfig {
    /// Delay before the first reminder
    #[must_use]
    pub fn first_delay(&self) -> Duration {
        Duration::minutes(self.first_delay_minutes)
    }

    /// Delay before the second reminder
    #[must_use]
    pub fn second_delay(&self) -> Duration {
        Duration::minutes(self.second_delay_minutes)
    }
}

/// Review incentive policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewIncentiveConfig {
    /// Percent off granted for a review, in [1, 100]
    pub percent_off: i64,
    /// Days a minted code stays valid
    pub validity_days: i64,
}

/// Per-client rate limiting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but unparseable, or when a
    /// parsed value violates its permitted range.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            http_port: parse_env(env_vars::HTTP_PORT, defaults::HTTP_PORT)?,
            database: DatabaseConfig {
                url: env::var(env_vars::DATABASE_URL)
                    .unwrap_or_else(|_| defaults::DATABASE_URL.to_owned()),
            },
            email: EmailConfig {
                api_base: env::var(env_vars::EMAIL_API_BASE)
                    .unwrap_or_else(|_| defaults::EMAIL_API_BASE.to_owned()),
                api_key: env::var(env_vars::EMAIL_API_KEY).ok().filter(|k| !k.is_empty()),
                from_address: env::var(env_vars::EMAIL_FROM_ADDRESS)
                    .unwrap_or_else(|_| defaults::EMAIL_FROM_ADDRESS.to_owned()),
                store_base_url: env::var(env_vars::STORE_BASE_URL)
                    .unwrap_or_else(|_| defaults::STORE_BASE_URL.to_owned()),
            },
            reminders: ReminderConfig {
                first_delay_minutes: parse_env(
                    env_vars::REMINDER_FIRST_DELAY_MINUTES,
                    defaults::REMINDER_FIRST_DELAY_MINUTES,
                )?,
                second_delay_minutes: parse_env(
                    env_vars::REMINDER_SECOND_DELAY_MINUTES,
                    defaults::REMINDER_SECOND_DELAY_MINUTES,
                )?,
            },
            review_incentive: ReviewIncentiveConfig {
                percent_off: parse_env(
                    env_vars::REVIEW_DISCOUNT_PERCENT,
                    defaults::REVIEW_DISCOUNT_PERCENT,
                )?,
                validity_days: parse_env(
                    env_vars::REVIEW_DISCOUNT_VALIDITY_DAYS,
                    defaults::REVIEW_DISCOUNT_VALIDITY_DAYS,
                )?,
            },
            rate_limit: RateLimitConfig {
                max_requests: parse_env(
                    env_vars::RATE_LIMIT_MAX_REQUESTS,
                    defaults::RATE_LIMIT_MAX_REQUESTS,
                )?,
                window_secs: parse_env(
                    env_vars::RATE_LIMIT_WINDOW_SECS,
                    defaults::RATE_LIMIT_WINDOW_SECS,
                )?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.review_incentive.percent_off) {
            bail!(
                "{} must be between 1 and 100, got {}",
                env_vars::REVIEW_DISCOUNT_PERCENT,
                self.review_incentive.percent_off
            );
        }
        if self.reminders.first_delay_minutes < 0 || self.reminders.second_delay_minutes < 0 {
            bail!("reminder delays must not be negative");
        }
        if self.reminders.second_delay_minutes <= self.reminders.first_delay_minutes {
            bail!(
                "{} must be greater than {}",
                env_vars::REMINDER_SECOND_DELAY_MINUTES,
                env_vars::REMINDER_FIRST_DELAY_MINUTES
            );
        }
        if self.rate_limit.max_requests == 0 {
            bail!("{} must be at least 1", env_vars::RATE_LIMIT_MAX_REQUESTS);
        }
        Ok(())
    }

    /// One-line startup summary, safe to log (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} db={} email_provider={} reminders={}m/{}m review_discount={}% rate_limit={}/{}s",
            self.http_port,
            self.database.url,
            if self.email.api_key.is_some() { "live" } else { "log-only" },
            self.reminders.first_delay_minutes,
            self.reminders.second_delay_minutes,
            self.review_incentive.percent_off,
            self.rate_limit.max_requests,
            self.rate_limit.window_secs,
        )
    }
}

/// Parse an optional environment variable with a default
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
