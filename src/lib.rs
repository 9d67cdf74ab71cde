// ABOUTME: Main library entry point for the Planport storefront backend
// ABOUTME: Provides cart reminder scheduling, discount codes, and the REST API surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

#![deny(unsafe_code)]

//! # Planport
//!
//! Backend for an online storefront selling connectivity plans. The two
//! stateful subsystems at its core are:
//!
//! - **Reminder scheduling**: cart-abandonment follow-up emails dispatched
//!   with provider-side delayed delivery, guarded by compare-and-set
//!   persistence so concurrent requests never double-send and conversions
//!   cancel pending reminders.
//! - **Discounts**: floor-clamped percentage discount calculation and
//!   single-use promotional codes with idempotent, race-safe redemption.
//!
//! Everything else (payments, catalog, rendering, fulfillment) lives in
//! external collaborators. The server exposes a small REST API consumed by
//! the storefront frontend.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use planport::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Configuration management from environment variables
pub mod config;

/// Application constants and default values
pub mod constants;

/// Dependency-injected server context shared by all routes
pub mod context;

/// Cart session, order, review, and discount persistence
pub mod database;

/// Floor-clamped discount calculation and code lifecycle
pub mod discounts;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Production logging and structured output
pub mod logging;

/// Common data models for cart sessions, discount codes, and orders
pub mod models;

/// Email dispatch adapter and outbound message types
pub mod notifications;

/// Per-client fixed-window rate limiting
pub mod rate_limiting;

/// Cart-abandonment reminder scheduling
pub mod reminders;

/// Review submission and discount incentive flow
pub mod reviews;

/// `HTTP` routes for the storefront API
pub mod routes;
