// ABOUTME: Server binary wiring configuration, database, mailer, and routes
// ABOUTME: Adapters are constructed here once and injected into the server context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Planport

//! # Planport Server Binary
//!
//! Starts the storefront backend: loads configuration from the environment,
//! opens the database, picks the mailer (HTTP provider when an API key is
//! configured, log-only otherwise), and serves the REST API.

use anyhow::Result;
use clap::Parser;
use planport::{
    config::environment::ServerConfig,
    context::ServerContext,
    database::Database,
    logging,
    notifications::{HttpMailer, LogMailer, Mailer},
    routes,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "planport-server")]
#[command(about = "Planport - storefront backend for connectivity plans")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Planport server");
    info!("{}", config.summary());

    let database = Arc::new(Database::new(&config.database.url).await?);
    info!("Database initialized: {}", config.database.url);

    let mailer: Arc<dyn Mailer> = if config.email.api_key.is_some() {
        Arc::new(HttpMailer::new(&config.email)?)
    } else {
        warn!("no email API key configured; outbound email will be logged, not sent");
        Arc::new(LogMailer)
    };

    let http_port = config.http_port;
    let ctx = Arc::new(ServerContext::new(config, database, mailer));
    let app = routes::router(ctx);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await?;
    info!("Listening on port {http_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    // Graceful shutdown on ctrl-c; SIGTERM arrives via the same path in containers
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install shutdown signal handler");
    }
}
