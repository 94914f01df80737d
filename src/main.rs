// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Personal CRM API Server
//!
//! Stores contacts and syncs their birthdays and events to Google Calendar.

use personal_crm::{config::Config, db::Database, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Personal CRM API");

    // Open the SQLite store and bootstrap the schema
    let db = Database::connect(&config.database_url).await?;

    let state = Arc::new(AppState::new(config.clone(), db.clone())?);

    // Keep the user/contact gauges current
    state.metrics.refresh_gauges(&db).await;
    state
        .metrics
        .spawn_gauge_refresh(db, Duration::from_secs(config.metrics_refresh_secs));
    tracing::info!(
        interval_secs = config.metrics_refresh_secs,
        "Metrics gauge refresh started"
    );

    // Build router
    let app = personal_crm::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("personal_crm=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
