// ABOUTME: Order and product review database operations
// ABOUTME: Review insert relies on UNIQUE(transaction_id) as the one-review-per-order guard

use super::{Database, InsertOutcome};
use crate::models::{Order, ProductReview};
use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    /// Create order and review tables
    pub(super) async fn migrate_orders(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS orders (
                transaction_id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                offer_name TEXT NOT NULL,
                total_cents INTEGER NOT NULL,
                currency TEXT NOT NULL DEFAULT 'USD',
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS product_reviews (
                id TEXT PRIMARY KEY,
                transaction_id TEXT NOT NULL UNIQUE REFERENCES orders(transaction_id),
                email TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_email ON orders(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert an order row
    ///
    /// In production these rows arrive through the fulfillment pipeline; the
    /// core writes them only from seeds and tests.
    pub async fn insert_order(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO orders (transaction_id, email, offer_name, total_cents, currency, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&order.transaction_id)
        .bind(&order.email)
        .bind(&order.offer_name)
        .bind(order.total_cents)
        .bind(&order.currency)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get an order by its transaction id
    pub async fn get_order_by_transaction(&self, transaction_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    /// Insert a product review
    ///
    /// `DuplicateTransaction` means this order already has a review; the
    /// review flow maps that to a conflict and mints no second code.
    pub async fn insert_review(&self, review: &ProductReview) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r"
            INSERT INTO product_reviews (id, transaction_id, email, rating, title, body, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&review.id)
        .bind(&review.transaction_id)
        .bind(&review.email)
        .bind(review.rating)
        .bind(&review.title)
        .bind(&review.body)
        .bind(review.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Ok(InsertOutcome::DuplicateTransaction)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the review for a transaction, if one exists
    pub async fn get_review_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<ProductReview>> {
        let row = sqlx::query("SELECT * FROM product_reviews WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_review).transpose()
    }
}

fn row_to_order(row: &SqliteRow) -> Result<Order> {
    Ok(Order {
        transaction_id: row.try_get("transaction_id")?,
        email: row.try_get("email")?,
        offer_name: row.try_get("offer_name")?,
        total_cents: row.try_get("total_cents")?,
        currency: row.try_get("currency")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_review(row: &SqliteRow) -> Result<ProductReview> {
    Ok(ProductReview {
        id: row.try_get("id")?,
        transaction_id: row.try_get("transaction_id")?,
        email: row.try_get("email")?,
        rating: row.try_get("rating")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
    })
}
