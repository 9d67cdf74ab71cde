// ABOUTME: Per-client fixed-window rate limiting
// ABOUTME: In-process counters keyed by client IP, consulted before any session mutation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # Rate Limiting
//!
//! A fixed-window counter per client key. `check` both tests and consumes:
//! an allowed call counts against the window, a denied call does not.
//! Handlers consult the limiter before touching persistence, so a denied
//! request has no side effects.

use crate::config::environment::RateLimitConfig;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Result of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether this request may proceed
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window resets
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct FixedWindow {
    window_start: DateTime<Utc>,
    count: u32,
}

/// Fixed-window rate limiter keyed by client
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, FixedWindow>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter from configuration
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests: config.max_requests,
            window: Duration::seconds(config.window_secs as i64),
        }
    }

    /// Requests allowed per window
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Check and consume one request slot for `client_key`
    pub fn check(&self, client_key: &str) -> RateLimitStatus {
        self.check_at(client_key, Utc::now())
    }

    fn check_at(&self, client_key: &str, now: DateTime<Utc>) -> RateLimitStatus {
        let mut entry = self
            .windows
            .entry(client_key.to_owned())
            .or_insert(FixedWindow {
                window_start: now,
                count: 0,
            });

        if now - entry.window_start >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        let reset_at = entry.window_start + self.window;

        if entry.count >= self.max_requests {
            return RateLimitStatus {
                allowed: false,
                remaining: 0,
                reset_at,
            };
        }

        entry.count += 1;
        RateLimitStatus {
            allowed: true,
            remaining: self.max_requests - entry.count,
            reset_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    #[test]
    fn test_allows_up_to_limit_then_denies() {
        let limiter = limiter(3, 60);
        let now = Utc::now();

        for remaining in (0..3).rev() {
            let status = limiter.check_at("10.0.0.1", now);
            assert!(status.allowed);
            assert_eq!(status.remaining, remaining);
        }

        let status = limiter.check_at("10.0.0.1", now);
        assert!(!status.allowed);
        assert_eq!(status.remaining, 0);
        assert_eq!(status.reset_at, now + Duration::seconds(60));
    }

    #[test]
    fn test_denied_request_does_not_consume() {
        let limiter = limiter(1, 60);
        let now = Utc::now();

        assert!(limiter.check_at("10.0.0.1", now).allowed);
        assert!(!limiter.check_at("10.0.0.1", now).allowed);
        assert!(!limiter.check_at("10.0.0.1", now).allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = limiter(1, 60);
        let now = Utc::now();

        assert!(limiter.check_at("10.0.0.1", now).allowed);
        assert!(!limiter.check_at("10.0.0.1", now).allowed);

        let later = now + Duration::seconds(61);
        let status = limiter.check_at("10.0.0.1", later);
        assert!(status.allowed);
        assert_eq!(status.reset_at, later + Duration::seconds(60));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 60);
        let now = Utc::now();

        assert!(limiter.check_at("10.0.0.1", now).allowed);
        assert!(limiter.check_at("10.0.0.2", now).allowed);
        assert!(!limiter.check_at("10.0.0.1", now).allowed);
    }
}
