// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar sync: mirrors contact birthdays and custom events into the
//! user's primary Google Calendar and records the results locally.
//!
//! Provider and store writes are not transactional. A failure after the
//! provider call leaves the external event in place; nothing is retried.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{CalendarSync, Contact, Event, NewEvent, User};
use crate::services::google::{CalendarEventRequest, GoogleClient};
use crate::services::tokens::TokenManager;
use chrono::{DateTime, Utc};

/// Birthday and custom-event sync for contacts.
#[derive(Clone)]
pub struct CalendarSyncService {
    db: Database,
    google: GoogleClient,
    tokens: TokenManager,
}

impl CalendarSyncService {
    pub fn new(db: Database, google: GoogleClient, tokens: TokenManager) -> Self {
        Self { db, google, tokens }
    }

    async fn load_user(&self, user_id: i64) -> Result<User, AppError> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
    }

    async fn load_contact(&self, user_id: i64, contact_id: i64) -> Result<Contact, AppError> {
        self.db
            .get_contact(user_id, contact_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contact {}", contact_id)))
    }

    async fn access_token(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, AppError> {
        let user = self.load_user(user_id).await?;
        self.tokens.valid_access_token(&user, now).await
    }

    /// Create a yearly all-day birthday event and record it on the contact.
    pub async fn sync_birthday(
        &self,
        user_id: i64,
        contact_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Contact, AppError> {
        let contact = self.load_contact(user_id, contact_id).await?;
        let birthday = contact.birthday_date().ok_or_else(|| {
            AppError::BadRequest(format!("Contact {} has no valid birthday", contact_id))
        })?;

        let token = self.access_token(user_id, now).await?;

        let request = CalendarEventRequest::all_day(
            format!("{}'s Birthday", contact.name),
            birthday,
            Some("RRULE:FREQ=YEARLY"),
        );
        let created = self.google.insert_event(&token, &request).await?;

        let sync = CalendarSync {
            event_id: created.id,
            enabled: true,
            synced_at: Some(now),
        };
        self.db
            .set_calendar_sync(user_id, contact_id, &sync, now)
            .await?;

        tracing::info!(
            user_id,
            contact_id,
            event_id = %sync.event_id,
            "Birthday synced to calendar"
        );

        Ok(Contact {
            calendar: sync,
            ..contact
        })
    }

    /// Remove the birthday event and clear the contact's sync state.
    ///
    /// An event the provider no longer has counts as removed. On any other
    /// provider failure the local state is left as it was.
    pub async fn unsync_birthday(
        &self,
        user_id: i64,
        contact_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let contact = self.load_contact(user_id, contact_id).await?;

        if !contact.calendar.event_id.is_empty() {
            let token = self.access_token(user_id, now).await?;
            let deleted = self
                .google
                .delete_event(&token, &contact.calendar.event_id)
                .await?;
            if !deleted {
                tracing::debug!(
                    user_id,
                    contact_id,
                    event_id = %contact.calendar.event_id,
                    "Birthday event already gone"
                );
            }
        }

        self.db
            .set_calendar_sync(user_id, contact_id, &CalendarSync::default(), now)
            .await?;

        tracing::info!(user_id, contact_id, "Birthday sync removed");
        Ok(())
    }

    /// Whether the contact's birthday event still exists and is not cancelled.
    pub async fn sync_status(
        &self,
        user_id: i64,
        contact_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let contact = self.load_contact(user_id, contact_id).await?;
        if contact.calendar.event_id.is_empty() {
            return Ok(false);
        }

        let token = self.access_token(user_id, now).await?;
        let event = self
            .google
            .get_event(&token, &contact.calendar.event_id)
            .await?;

        Ok(event.is_some_and(|e| !e.is_cancelled()))
    }

    /// Create a custom event in the calendar and store it against the contact.
    ///
    /// The calendar entry is titled `"{contact} - {title}"`; the stored event
    /// keeps the plain title.
    pub async fn create_custom_event(
        &self,
        user_id: i64,
        contact_id: i64,
        input: &NewEvent,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError> {
        let date = crate::models::parse_date(&input.event_date).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid event date: {}", input.event_date))
        })?;
        if input.title.trim().is_empty() {
            return Err(AppError::BadRequest("Event title is required".to_string()));
        }

        let contact = self.load_contact(user_id, contact_id).await?;
        let token = self.access_token(user_id, now).await?;

        let request = CalendarEventRequest::all_day(
            format!("{} - {}", contact.name, input.title),
            date,
            input.recurrence.rrule(),
        );
        let created = self.google.insert_event(&token, &request).await?;

        let event = self
            .db
            .create_event(
                user_id,
                contact_id,
                &input.title,
                &input.event_date,
                input.recurrence,
                &created.id,
                now,
            )
            .await?;

        tracing::info!(
            user_id,
            contact_id,
            event_id = event.id,
            calendar_event_id = %created.id,
            "Custom event created"
        );
        Ok(event)
    }

    /// Delete a custom event from the calendar (if synced) and soft-delete it.
    pub async fn delete_custom_event(
        &self,
        user_id: i64,
        contact_id: i64,
        event_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let event = self
            .db
            .get_event(user_id, event_id)
            .await?
            .filter(|e| e.contact_id == contact_id)
            .ok_or_else(|| AppError::NotFound(format!("Event {}", event_id)))?;

        if !event.calendar_event_id.is_empty() {
            let token = self.access_token(user_id, now).await?;
            self.google
                .delete_event(&token, &event.calendar_event_id)
                .await?;
        }

        if !self.db.delete_event(user_id, event_id, now).await? {
            return Err(AppError::NotFound(format!("Event {}", event_id)));
        }

        tracing::info!(user_id, contact_id, event_id, "Custom event deleted");
        Ok(())
    }
}
