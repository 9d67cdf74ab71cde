// ABOUTME: Discount code database operations
// ABOUTME: Collision-aware insert and compare-and-set redemption guarded on redeemed_at

use super::{CasOutcome, Database, InsertOutcome};
use crate::models::DiscountCode;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Create discount code table and indexes
    pub(super) async fn migrate_discount_codes(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS discount_codes (
                code TEXT PRIMARY KEY,
                percent_off INTEGER NOT NULL CHECK (percent_off BETWEEN 1 AND 100),
                applies_to TEXT NOT NULL DEFAULT 'any',
                created_reason TEXT NOT NULL,
                created_for_transaction_id TEXT UNIQUE,
                created_for_email TEXT,
                expires_at DATETIME,
                redeemed_at DATETIME,
                redeemed_for_transaction_id TEXT,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_discount_codes_email ON discount_codes(created_for_email)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new discount code row
    ///
    /// Unique violations are returned as [`InsertOutcome`] variants instead of
    /// errors: a code-string collision lets the caller regenerate and retry,
    /// while a duplicate triggering transaction means a code was already
    /// minted for that order and must not be minted again.
    pub async fn insert_discount_code(&self, code: &DiscountCode) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r"
            INSERT INTO discount_codes (
                code, percent_off, applies_to, created_reason,
                created_for_transaction_id, created_for_email,
                expires_at, redeemed_at, redeemed_for_transaction_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, NULL, $8)
            ",
        )
        .bind(&code.code)
        .bind(code.percent_off)
        .bind(&code.applies_to)
        .bind(&code.created_reason)
        .bind(&code.created_for_transaction_id)
        .bind(&code.created_for_email)
        .bind(code.expires_at)
        .bind(code.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                if e.message().contains("created_for_transaction_id") {
                    Ok(InsertOutcome::DuplicateTransaction)
                } else {
                    Ok(InsertOutcome::DuplicateCode)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a discount code by its (already normalized) code string
    pub async fn get_discount_code(&self, code: &str) -> Result<Option<DiscountCode>> {
        let row = sqlx::query("SELECT * FROM discount_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_code).transpose()
    }

    /// Get the code minted for a triggering transaction, if any
    pub async fn get_discount_code_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<DiscountCode>> {
        let row = sqlx::query("SELECT * FROM discount_codes WHERE created_for_transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_code).transpose()
    }

    /// Redeem a code, guarded on `redeemed_at` still being null
    ///
    /// First-writer-wins: of two concurrent redemption attempts exactly one
    /// sees `Applied`; the loser gets `Conflict`.
    pub async fn redeem_discount_code_if_unredeemed(
        &self,
        code: &str,
        transaction_id: &str,
        redeemed_at: DateTime<Utc>,
    ) -> Result<CasOutcome> {
        let result = sqlx::query(
            r"
            UPDATE discount_codes
            SET redeemed_at = $2, redeemed_for_transaction_id = $3
            WHERE code = $1 AND redeemed_at IS NULL
            ",
        )
        .bind(code)
        .bind(redeemed_at)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(CasOutcome::Conflict)
        } else {
            Ok(CasOutcome::Applied)
        }
    }
}

fn row_to_code(row: &SqliteRow) -> Result<DiscountCode> {
    Ok(DiscountCode {
        code: row.try_get("code")?,
        percent_off: row.try_get("percent_off")?,
        applies_to: row.try_get("applies_to")?,
        created_reason: row.try_get("created_reason")?,
        created_for_transaction_id: row.try_get("created_for_transaction_id")?,
        created_for_email: row.try_get("created_for_email")?,
        expires_at: row.try_get("expires_at")?,
        redeemed_at: row.try_get("redeemed_at")?,
        redeemed_for_transaction_id: row.try_get("redeemed_for_transaction_id")?,
        created_at: row.try_get("created_at")?,
    })
}
