// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Personal CRM: contacts, VIP follow-ups and Google Calendar sync.
//!
//! This crate provides the backend API for storing a user's contacts,
//! syncing birthdays and custom events to Google Calendar, and building
//! the dashboard of upcoming dates and overdue follow-ups.

pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Database;
use error::AppError;
use metrics::Metrics;
use services::{
    CalendarSyncService, DashboardService, GoogleClient, TokenCipher, TokenManager,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub google: GoogleClient,
    pub tokens: TokenManager,
    pub calendar: CalendarSyncService,
    pub dashboard: DashboardService,
    pub metrics: Metrics,
}

impl AppState {
    /// Wire up the services for `config` on top of `db`.
    pub fn new(config: Config, db: Database) -> Result<Self, AppError> {
        let google = GoogleClient::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.redirect_uri(),
            config.google_endpoints.clone(),
        );
        let cipher = TokenCipher::new(&config.token_encryption_key)?;
        let tokens = TokenManager::new(db.clone(), google.clone(), cipher);
        let calendar = CalendarSyncService::new(db.clone(), google.clone(), tokens.clone());
        let dashboard = DashboardService::new(db.clone());
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Metrics registry: {}", e)))?;

        Ok(Self {
            config,
            db,
            google,
            tokens,
            calendar,
            dashboard,
            metrics,
        })
    }
}
