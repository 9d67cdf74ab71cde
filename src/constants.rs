// ABOUTME: Application constants grouped by domain
// ABOUTME: Environment variable names, default values, and validation limits

//! Constants module
//!
//! Application constants grouped by domain: environment variable names,
//! defaults applied when a variable is absent, and validation limits.

/// Environment variable names read by [`crate::config::environment::ServerConfig::from_env`]
pub mod env_vars {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Database connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Base URL of the email provider HTTP API
    pub const EMAIL_API_BASE: &str = "EMAIL_API_BASE";
    /// Bearer token for the email provider
    pub const EMAIL_API_KEY: &str = "EMAIL_API_KEY";
    /// From-address stamped on outbound email
    pub const EMAIL_FROM_ADDRESS: &str = "EMAIL_FROM_ADDRESS";
    /// Public base URL of the storefront, used for restore-cart links
    pub const STORE_BASE_URL: &str = "STORE_BASE_URL";
    /// Delay before the first abandonment reminder, in minutes
    pub const REMINDER_FIRST_DELAY_MINUTES: &str = "REMINDER_FIRST_DELAY_MINUTES";
    /// Delay before the second abandonment reminder, in minutes
    pub const REMINDER_SECOND_DELAY_MINUTES: &str = "REMINDER_SECOND_DELAY_MINUTES";
    /// Percent-off granted for a product review
    pub const REVIEW_DISCOUNT_PERCENT: &str = "REVIEW_DISCOUNT_PERCENT";
    /// Days a review discount code stays valid
    pub const REVIEW_DISCOUNT_VALIDITY_DAYS: &str = "REVIEW_DISCOUNT_VALIDITY_DAYS";
    /// Requests allowed per client per window
    pub const RATE_LIMIT_MAX_REQUESTS: &str = "RATE_LIMIT_MAX_REQUESTS";
    /// Rate limit window length in seconds
    pub const RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
    /// Log output format (json, pretty, compact)
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

/// Default values applied when the corresponding environment variable is absent
pub mod defaults {
    /// Default HTTP listen port
    pub const HTTP_PORT: u16 = 8080;
    /// Default SQLite database location
    pub const DATABASE_URL: &str = "sqlite:data/planport.db";
    /// Default storefront base URL for deep links
    pub const STORE_BASE_URL: &str = "http://localhost:3000";
    /// Default email provider endpoint
    pub const EMAIL_API_BASE: &str = "https://api.mailchannel.example";
    /// Default from-address
    pub const EMAIL_FROM_ADDRESS: &str = "Planport <hello@planport.example>";
    /// Default cart currency
    pub const CURRENCY: &str = "USD";
    /// First reminder goes out an hour after the cart is abandoned
    pub const REMINDER_FIRST_DELAY_MINUTES: i64 = 60;
    /// Second reminder goes out a day after
    pub const REMINDER_SECOND_DELAY_MINUTES: i64 = 1440;
    /// Default review incentive percent-off
    pub const REVIEW_DISCOUNT_PERCENT: i64 = 15;
    /// Default review code validity window
    pub const REVIEW_DISCOUNT_VALIDITY_DAYS: i64 = 90;
    /// Default requests per client per window
    pub const RATE_LIMIT_MAX_REQUESTS: u32 = 30;
    /// Default rate limit window
    pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
}

/// Validation limits
pub mod limits {
    /// Attempts at generating a non-colliding discount code before giving up
    pub const MAX_CODE_ATTEMPTS: u32 = 5;
    /// Random characters in the discount code suffix
    pub const CODE_SUFFIX_LEN: usize = 6;
    /// Line items accepted in one cart
    pub const MAX_CART_ITEMS: usize = 50;
    /// Quantity accepted per line item
    pub const MAX_ITEM_QUANTITY: u32 = 20;
    /// RFC 5321 upper bound on address length
    pub const MAX_EMAIL_LEN: usize = 320;
    /// Review title length cap
    pub const MAX_REVIEW_TITLE_LEN: usize = 200;
    /// Review body length cap
    pub const MAX_REVIEW_BODY_LEN: usize = 5000;
    /// Lowest accepted star rating
    pub const MIN_RATING: i64 = 1;
    /// Highest accepted star rating
    pub const MAX_RATING: i64 = 5;
}
