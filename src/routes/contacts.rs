// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact routes: list, search, create, view, update, delete, notes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Contact, ContactFilter, ContactUpdate, Event, NewContact, Relationship};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Contact routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contacts", get(list_contacts))
        .route("/contacts/search", get(search_contacts))
        .route("/contacts/new", post(create_contact))
        .route(
            "/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/contacts/{id}/edit", get(edit_contact))
        .route("/contacts/{id}/notes", post(append_notes))
}

// ─── Listing ─────────────────────────────────────────────────

/// Row of the contact list.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ContactSummary {
    pub id: i64,
    pub name: String,
    pub relationship: Option<Relationship>,
    pub company: String,
    pub birthday: String,
    pub vip: bool,
    pub last_contacted: String,
    pub calendar_sync_enabled: bool,
}

impl From<&Contact> for ContactSummary {
    fn from(c: &Contact) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            relationship: c.relationship,
            company: c.company.clone(),
            birthday: c.birthday.clone(),
            vip: c.vip,
            last_contacted: c.vip_info.last_contacted.clone(),
            calendar_sync_enabled: c.calendar.enabled,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ContactListResponse {
    pub email: String,
    pub contacts: Vec<ContactSummary>,
}

async fn contact_list(
    state: &AppState,
    user: &AuthUser,
    filter: &ContactFilter,
) -> Result<Json<ContactListResponse>> {
    let contacts = state.db.list_contacts(user.user_id, filter).await?;
    Ok(Json(ContactListResponse {
        email: user.email.clone(),
        contacts: contacts.iter().map(ContactSummary::from).collect(),
    }))
}

async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ContactListResponse>> {
    contact_list(&state, &user, &ContactFilter::default()).await
}

/// Search parameters. `filter` is the quick filter; the rest narrow it.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    relationship: Option<String>,
    #[serde(default)]
    vip: Option<bool>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    last_contacted_before: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

impl SearchParams {
    fn into_filter(self) -> Result<ContactFilter> {
        let mut filter = ContactFilter::from_quick_filter(self.filter.as_deref().unwrap_or(""));

        if let Some(prefix) = self.relationship.filter(|s| !s.is_empty()) {
            filter.relationship_prefix = Some(prefix);
        }
        if self.vip.is_some() {
            filter.vip = self.vip;
        }
        if let Some(prefix) = self.location.filter(|s| !s.is_empty()) {
            filter.location_prefix = Some(prefix);
        }
        if let Some(before) = self.last_contacted_before.filter(|s| !s.is_empty()) {
            let date = crate::models::parse_date(&before)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid date: {}", before)))?;
            filter.last_contacted_before = Some(date);
        }
        if let Some(limit) = self.limit.filter(|&l| l > 0) {
            filter.limit = Some(limit);
        }

        Ok(filter)
    }
}

async fn search_contacts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ContactListResponse>> {
    let filter = params.into_filter()?;
    tracing::debug!(user_id = user.user_id, ?filter, "Searching contacts");
    contact_list(&state, &user, &filter).await
}

// ─── Create / Delete ─────────────────────────────────────────

async fn create_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<NewContact>,
) -> Result<Json<ContactListResponse>> {
    input.validate()?;

    let contact = state
        .db
        .create_contact(user.user_id, &input, Utc::now())
        .await?;
    state.metrics.contacts_created_total.inc();

    tracing::info!(user_id = user.user_id, contact_id = contact.id, "Contact created");

    contact_list(&state, &user, &ContactFilter::default()).await
}

async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<ContactListResponse>> {
    if !state.db.delete_contact(user.user_id, id, Utc::now()).await? {
        return Err(AppError::NotFound(format!("Contact {}", id)));
    }

    tracing::info!(user_id = user.user_id, contact_id = id, "Contact deleted");

    contact_list(&state, &user, &ContactFilter::default()).await
}

// ─── Single Contact ──────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ContactDetailResponse {
    pub contact: Contact,
    pub events: Vec<Event>,
}

async fn load_contact(state: &AppState, user: &AuthUser, id: i64) -> Result<Contact> {
    state
        .db
        .get_contact(user.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Contact {}", id)))
}

async fn get_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<ContactDetailResponse>> {
    let contact = load_contact(&state, &user, id).await?;
    let events = state.db.list_contact_events(user.user_id, id).await?;
    Ok(Json(ContactDetailResponse { contact, events }))
}

async fn edit_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Contact>> {
    Ok(Json(load_contact(&state, &user, id).await?))
}

async fn update_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(update): Json<ContactUpdate>,
) -> Result<Json<Contact>> {
    update.validate()?;

    let mut contact = load_contact(&state, &user, id).await?;
    update.apply(&mut contact);
    state.db.save_contact(&contact, Utc::now()).await?;

    tracing::info!(user_id = user.user_id, contact_id = id, "Contact updated");

    Ok(Json(load_contact(&state, &user, id).await?))
}

#[derive(Deserialize)]
pub struct NoteRequest {
    note: String,
}

async fn append_notes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(body): Json<NoteRequest>,
) -> Result<Json<Contact>> {
    let note = body.note.trim();
    if note.is_empty() {
        return Err(AppError::BadRequest("Note is empty".to_string()));
    }

    let now = Utc::now();
    let mut contact = load_contact(&state, &user, id).await?;
    contact.append_note(note, now);
    state.db.save_contact(&contact, now).await?;

    Ok(Json(load_contact(&state, &user, id).await?))
}
