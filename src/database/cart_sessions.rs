// ABOUTME: Cart session database operations
// ABOUTME: Upsert by token and compare-and-set updates on reminder and conversion fields

use super::{CasOutcome, Database};
use crate::models::{CartSession, LineItem};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Which reminder slot a compare-and-set update targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSlot {
    /// `reminder1_email_id` / `reminder1_scheduled_at`
    First,
    /// `reminder2_email_id` / `reminder2_scheduled_at`
    Second,
}

impl Database {
    /// Create cart session table and indexes
    pub(super) async fn migrate_cart_sessions(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cart_sessions (
                token TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                items_json TEXT NOT NULL,
                currency TEXT NOT NULL DEFAULT 'USD',
                reminder1_email_id TEXT,
                reminder2_email_id TEXT,
                reminder1_scheduled_at DATETIME,
                reminder2_scheduled_at DATETIME,
                converted_at DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cart_sessions_email ON cart_sessions(email)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cart_sessions_converted ON cart_sessions(converted_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert a cart session by token
    ///
    /// Creates the row on first save; on re-save updates only the payload
    /// fields (email, items, currency) and `updated_at`. Reminder and
    /// conversion fields are never touched here, which is what makes
    /// re-saving idempotent with respect to scheduling.
    pub async fn upsert_cart_session(
        &self,
        token: &str,
        email: &str,
        items: &[LineItem],
        currency: &str,
    ) -> Result<CartSession> {
        let items_json = serde_json::to_string(items)?;
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO cart_sessions (token, email, items_json, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT(token) DO UPDATE SET
                email = excluded.email,
                items_json = excluded.items_json,
                currency = excluded.currency,
                updated_at = excluded.updated_at
            ",
        )
        .bind(token)
        .bind(email)
        .bind(&items_json)
        .bind(currency)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_cart_session(token)
            .await?
            .context("cart session vanished after upsert")
    }

    /// Get a cart session by token
    pub async fn get_cart_session(&self, token: &str) -> Result<Option<CartSession>> {
        let row = sqlx::query("SELECT * FROM cart_sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_session).transpose()
    }

    /// Record a dispatched reminder, guarded on the slot still being null
    ///
    /// The guard also requires the session to be unconverted, so a conversion
    /// that lands between dispatch and this write turns it into a conflict
    /// instead of resurrecting a reminder on a completed purchase.
    pub async fn set_reminder_if_unset(
        &self,
        token: &str,
        slot: ReminderSlot,
        message_id: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<CasOutcome> {
        let sql = match slot {
            ReminderSlot::First => {
                r"
                UPDATE cart_sessions
                SET reminder1_email_id = $2, reminder1_scheduled_at = $3, updated_at = $4
                WHERE token = $1 AND reminder1_email_id IS NULL AND converted_at IS NULL
                "
            }
            ReminderSlot::Second => {
                r"
                UPDATE cart_sessions
                SET reminder2_email_id = $2, reminder2_scheduled_at = $3, updated_at = $4
                WHERE token = $1 AND reminder2_email_id IS NULL AND converted_at IS NULL
                "
            }
        };

        let result = sqlx::query(sql)
            .bind(token)
            .bind(message_id)
            .bind(scheduled_at)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Ok(CasOutcome::Conflict)
        } else {
            Ok(CasOutcome::Applied)
        }
    }

    /// Mark a session converted, guarded on `converted_at` still being null
    ///
    /// A conflict means the session was already converted; callers treat that
    /// as an idempotent no-op. Returns `Ok(None)` when no session matches.
    pub async fn mark_converted_if_active(&self, token: &str) -> Result<Option<CasOutcome>> {
        let now = Utc::now();
        let result = sqlx::query(
            r"
            UPDATE cart_sessions
            SET converted_at = $2, updated_at = $2
            WHERE token = $1 AND converted_at IS NULL
            ",
        )
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(Some(CasOutcome::Applied));
        }

        // Distinguish "already converted" from "no such session"
        let exists = sqlx::query("SELECT token FROM cart_sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        Ok(exists.then_some(CasOutcome::Conflict))
    }
}

fn row_to_session(row: &SqliteRow) -> Result<CartSession> {
    let items_json: String = row.try_get("items_json")?;
    let items: Vec<LineItem> =
        serde_json::from_str(&items_json).context("corrupt items_json in cart_sessions row")?;

    Ok(CartSession {
        token: row.try_get("token")?,
        email: row.try_get("email")?,
        items,
        currency: row.try_get("currency")?,
        reminder1_email_id: row.try_get("reminder1_email_id")?,
        reminder2_email_id: row.try_get("reminder2_email_id")?,
        reminder1_scheduled_at: row.try_get("reminder1_scheduled_at")?,
        reminder2_scheduled_at: row.try_get("reminder2_scheduled_at")?,
        converted_at: row.try_get("converted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
