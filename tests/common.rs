// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory database, recording mailer, and fixture helpers
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::unwrap_used
)]

//! Shared test utilities for `planport`
//!
//! Common setup functions to reduce duplication across integration tests.
//! All tests run against an in-memory SQLite database and a recording mailer
//! that captures outbound email instead of sending it.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use planport::{
    config::environment::{
        DatabaseConfig, EmailConfig, RateLimitConfig, ReminderConfig, ReviewIncentiveConfig,
        ServerConfig,
    },
    context::ServerContext,
    database::Database,
    discounts::DiscountEngine,
    models::{LineItem, Order},
    notifications::{Mailer, MailerError, OutboundEmail},
    reminders::ReminderScheduler,
    reviews::ReviewService,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Arc<Database>> {
    init_test_logging();
    let database = Arc::new(Database::new("sqlite::memory:").await?);
    Ok(database)
}

/// Mailer that records outbound email instead of sending it
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
    cancelled: Mutex<Vec<String>>,
    counter: AtomicU64,
    /// Fail every send once this many messages have gone out
    fail_after: Mutex<Option<usize>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All messages dispatched so far
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// All message ids recalled so far
    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Make every send fail from now on
    pub fn fail_all_sends(&self) {
        self.set_fail_after(0);
    }

    /// Let `n` sends succeed, then fail the rest
    pub fn set_fail_after(&self, n: usize) {
        *self.fail_after.lock().unwrap() = Some(n);
    }

    /// Stop failing sends
    pub fn clear_failures(&self) {
        *self.fail_after.lock().unwrap() = None;
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailerError> {
        let mut sent = self.sent.lock().unwrap();
        if let Some(n) = *self.fail_after.lock().unwrap() {
            if sent.len() >= n {
                return Err(MailerError::Provider {
                    status: 500,
                    detail: "injected test failure".into(),
                });
            }
        }
        sent.push(email.clone());
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("msg_{id}"))
    }

    async fn cancel(&self, message_id: &str) -> Result<(), MailerError> {
        self.cancelled.lock().unwrap().push(message_id.to_owned());
        Ok(())
    }
}

/// Reminder policy used across tests
pub fn test_reminder_config() -> ReminderConfig {
    ReminderConfig {
        first_delay_minutes: 60,
        second_delay_minutes: 1440,
    }
}

/// Build a scheduler over the given database and mailer
pub fn create_test_scheduler(
    database: Arc<Database>,
    mailer: Arc<RecordingMailer>,
) -> ReminderScheduler {
    ReminderScheduler::new(
        database,
        mailer,
        test_reminder_config(),
        "https://shop.example",
    )
}

/// Build a review service granting 15% for 90 days
pub fn create_test_review_service(
    database: Arc<Database>,
    mailer: Arc<RecordingMailer>,
) -> ReviewService {
    let engine = DiscountEngine::new(Arc::clone(&database));
    ReviewService::new(
        database,
        engine,
        mailer,
        ReviewIncentiveConfig {
            percent_off: 15,
            validity_days: 90,
        },
    )
}

/// Full server configuration for route-level tests
pub fn test_server_config(max_requests: u32) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        email: EmailConfig {
            api_base: "https://api.mail.example".into(),
            api_key: None,
            from_address: "Planport <hello@planport.example>".into(),
            store_base_url: "https://shop.example".into(),
        },
        reminders: test_reminder_config(),
        review_incentive: ReviewIncentiveConfig {
            percent_off: 15,
            validity_days: 90,
        },
        rate_limit: RateLimitConfig {
            max_requests,
            window_secs: 60,
        },
    }
}

/// Build a server context for route-level tests
pub async fn create_test_context(
    mailer: Arc<RecordingMailer>,
    max_requests: u32,
) -> Result<(Arc<ServerContext>, Arc<Database>)> {
    let database = create_test_database().await?;
    let ctx = Arc::new(ServerContext::new(
        test_server_config(max_requests),
        Arc::clone(&database),
        mailer,
    ));
    Ok((ctx, database))
}

/// Standard cart fixture
pub fn sample_items() -> Vec<LineItem> {
    vec![
        LineItem {
            offer_id: "plan-10gb".into(),
            name: "10 GB Global".into(),
            unit_price_label: "$20.00".into(),
            quantity: 1,
        },
        LineItem {
            offer_id: "plan-1gb-eu".into(),
            name: "1 GB Europe".into(),
            unit_price_label: "$4.50".into(),
            quantity: 2,
        },
    ]
}

/// Seed an order the review flow can validate against
pub async fn seed_order(database: &Database, transaction_id: &str, email: &str) -> Result<Order> {
    let order = Order {
        transaction_id: transaction_id.to_owned(),
        email: email.to_owned(),
        offer_name: "10 GB Global".into(),
        total_cents: 2000,
        currency: "USD".into(),
        created_at: Utc::now(),
    };
    database.insert_order(&order).await?;
    Ok(order)
}
