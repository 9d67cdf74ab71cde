// ABOUTME: Database management for cart sessions, discount codes, orders, and reviews
// ABOUTME: Owns the SQLite pool, schema migrations, and the compare-and-set result types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # Database Management
//!
//! A single [`Database`] handle wraps the connection pool; per-entity
//! operations live in submodules. Writes that realize compare-and-set
//! semantics return [`CasOutcome`] so callers branch on an explicit sum type,
//! and inserts that may hit a unique constraint return [`InsertOutcome`]
//! rather than surfacing a driver error.

mod cart_sessions;
mod discount_codes;
mod orders;

pub use cart_sessions::ReminderSlot;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

/// Outcome of a conditional (compare-and-set) update
///
/// `Conflict` means the guard predicate no longer held: another writer won
/// the race. Callers decide whether that is benign (idempotent operations)
/// or an error (redemption).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The guarded update was applied
    Applied,
    /// The guard predicate failed; no row was changed
    Conflict,
}

/// Outcome of an insert that may violate a unique constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was inserted
    Inserted,
    /// The code string collided with an existing row
    DuplicateCode,
    /// The triggering transaction already has a row
    DuplicateTransaction,
}

/// Database manager for session, code, order, and review storage
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be opened or a migration fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") && !database_url.contains(":memory:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        // An in-memory SQLite database exists per connection; cap the pool at
        // one connection so every handle sees the same schema and data.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(&connection_options)
                .await?
        } else {
            SqlitePoolOptions::new().connect(&connection_options).await?
        };

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// All statements are idempotent (`CREATE TABLE IF NOT EXISTS`), so this
    /// is safe to run on every startup.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_cart_sessions().await?;
        self.migrate_discount_codes().await?;
        self.migrate_orders().await?;
        Ok(())
    }
}
