// ABOUTME: Configuration management module
// ABOUTME: Environment-driven server configuration with typed sub-configs

//! Configuration management
//!
//! All runtime configuration comes from environment variables with safe
//! defaults; there is no configuration file.

/// Environment-based server configuration
pub mod environment;
