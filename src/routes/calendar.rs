// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar sync routes for birthdays and custom events.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{CalendarSync, Event, NewEvent};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Calendar routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/contacts/{id}/calendar/sync",
            post(sync_birthday).delete(unsync_birthday),
        )
        .route("/contacts/{id}/calendar/sync/status", get(sync_status))
        .route("/contacts/{id}/events", post(create_event))
        .route("/contacts/{id}/events/{event_id}", delete(delete_event))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SyncStatusResponse {
    pub synced: bool,
}

async fn sync_birthday(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<CalendarSync>> {
    let result = state.calendar.sync_birthday(user.user_id, id, Utc::now()).await;
    state.metrics.record_sync("birthday_sync", &result);
    Ok(Json(result?.calendar))
}

async fn unsync_birthday(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let result = state
        .calendar
        .unsync_birthday(user.user_id, id, Utc::now())
        .await;
    state.metrics.record_sync("birthday_unsync", &result);
    result?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sync_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SyncStatusResponse>> {
    let synced = state
        .calendar
        .sync_status(user.user_id, id, Utc::now())
        .await?;
    Ok(Json(SyncStatusResponse { synced }))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(input): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>)> {
    input.validate()?;

    let result = state
        .calendar
        .create_custom_event(user.user_id, id, &input, Utc::now())
        .await;
    state.metrics.record_sync("event_create", &result);
    Ok((StatusCode::CREATED, Json(result?)))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((id, event_id)): Path<(i64, i64)>,
) -> Result<StatusCode> {
    let result = state
        .calendar
        .delete_custom_event(user.user_id, id, event_id, Utc::now())
        .await;
    state.metrics.record_sync("event_delete", &result);
    result?;
    Ok(StatusCode::NO_CONTENT)
}
