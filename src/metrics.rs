// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prometheus metrics.
//!
//! One [`Metrics`] object owns the registry and every collector. It is
//! created at startup and carried in the application state.

use crate::db::Database;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Application metrics and the registry they are exported from.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: IntGauge,
    pub contacts_total: IntGauge,
    pub contacts_created_total: IntCounter,
    pub users_total: IntGauge,
    pub user_logins_total: IntCounterVec,
    pub calendar_sync_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        let http_requests_in_flight = IntGauge::new(
            "http_requests_in_flight",
            "Current number of HTTP requests being processed",
        )?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        let contacts_total =
            IntGauge::new("contacts_total", "Total number of contacts in the system")?;
        registry.register(Box::new(contacts_total.clone()))?;

        let contacts_created_total =
            IntCounter::new("contacts_created_total", "Total number of contacts created")?;
        registry.register(Box::new(contacts_created_total.clone()))?;

        let users_total = IntGauge::new("users_total", "Total number of registered users")?;
        registry.register(Box::new(users_total.clone()))?;

        let user_logins_total = IntCounterVec::new(
            Opts::new("user_logins_total", "Total number of user login attempts"),
            &["status"],
        )?;
        registry.register(Box::new(user_logins_total.clone()))?;

        let calendar_sync_total = IntCounterVec::new(
            Opts::new(
                "calendar_sync_total",
                "Calendar sync operations by kind and outcome",
            ),
            &["operation", "status"],
        )?;
        registry.register(Box::new(calendar_sync_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            contacts_total,
            contacts_created_total,
            users_total,
            user_logins_total,
            calendar_sync_total,
        })
    }

    /// Record the outcome of a calendar operation.
    pub fn record_sync<T, E>(&self, operation: &str, result: &Result<T, E>) {
        let status = if result.is_ok() { "success" } else { "failure" };
        self.calendar_sync_total
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Prometheus text exposition of every registered metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    /// Set the user/contact gauges from the store.
    pub async fn refresh_gauges(&self, db: &Database) {
        match db.count_users().await {
            Ok(count) => self.users_total.set(count),
            Err(e) => tracing::warn!(error = %e, "Failed to count users"),
        }
        match db.count_contacts().await {
            Ok(count) => self.contacts_total.set(count),
            Err(e) => tracing::warn!(error = %e, "Failed to count contacts"),
        }
    }

    /// Periodically refresh the gauges in a background task.
    pub fn spawn_gauge_refresh(&self, db: Database, every: Duration) -> tokio::task::JoinHandle<()> {
        let metrics = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                metrics.refresh_gauges(&db).await;
            }
        })
    }
}
