// ABOUTME: Dependency-injected server context shared by all routes
// ABOUTME: Adapters are constructed once at startup and passed in, never module-level singletons
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! Server context
//!
//! All adapter handles (database, mailer, rate limiter) and the services
//! built on them are constructed once in the binary and injected here. Route
//! handlers receive an `Arc<ServerContext>` as axum state.

use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::discounts::DiscountEngine;
use crate::notifications::Mailer;
use crate::rate_limiting::RateLimiter;
use crate::reminders::ReminderScheduler;
use crate::reviews::ReviewService;
use std::sync::Arc;

/// Shared state for the HTTP layer
pub struct ServerContext {
    /// Runtime configuration
    pub config: ServerConfig,
    /// Database handle
    pub database: Arc<Database>,
    /// Per-client rate limiter
    pub rate_limiter: RateLimiter,
    /// Cart and reminder lifecycle
    pub reminders: ReminderScheduler,
    /// Discount calculation and code lifecycle
    pub discounts: DiscountEngine,
    /// Review incentive flow
    pub reviews: ReviewService,
}

impl ServerContext {
    /// Wire the services from their injected collaborators
    #[must_use]
    pub fn new(config: ServerConfig, database: Arc<Database>, mailer: Arc<dyn Mailer>) -> Self {
        let discounts = DiscountEngine::new(Arc::clone(&database));
        let reminders = ReminderScheduler::new(
            Arc::clone(&database),
            Arc::clone(&mailer),
            config.reminders.clone(),
            config.email.store_base_url.clone(),
        );
        let reviews = ReviewService::new(
            Arc::clone(&database),
            discounts.clone(),
            mailer,
            config.review_incentive.clone(),
        );
        let rate_limiter = RateLimiter::new(&config.rate_limit);

        Self {
            config,
            database,
            rate_limiter,
            reminders,
            discounts,
            reviews,
        }
    }
}
