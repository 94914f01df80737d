// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and encrypted OAuth tokens)
//! - Contacts (CRUD, filtered listing, calendar-sync state)
//! - Events (custom dated events attached to contacts)
//!
//! Rows are never hard-deleted. Every read filters on the owning user and
//! `deleted_at IS NULL`.

use crate::error::AppError;
use crate::models::{
    CalendarSync, Contact, ContactFilter, Event, NewContact, Recurrence, User, UserTokens,
    DATE_FORMAT,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;

const USER_COLUMNS: &str = "id, google_id, email, picture, access_token_encrypted, \
     refresh_token_encrypted, token_expiry, created_at, updated_at, deleted_at";

const CONTACT_COLUMNS: &str = "id, user_id, name, relationship, industry, company, birthday, \
     vip, notes, spouse, children, location, phone, email, linkedin, instagram, x, \
     last_met, last_contacted, last_update, calendar_event_id, calendar_sync_enabled, \
     calendar_synced_at, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, user_id, contact_id, title, event_date, recurrence, \
     calendar_event_id, created_at, updated_at";

/// Profile details reported by Google at login.
#[derive(Debug, Clone)]
pub struct LoginProfile<'a> {
    pub google_id: &'a str,
    pub email: &'a str,
    pub picture: &'a str,
}

/// SQLite database handle.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Connect to the database at `url`, creating the file if needed, and
    /// bootstrap the schema.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to {}: {}", url, e)))?;

        let db = Self { pool };
        db.run_schema().await?;

        tracing::info!(url, "Connected to SQLite");
        Ok(db)
    }

    /// Private in-memory database for tests and benchmarks.
    ///
    /// A single connection that is never recycled, since every new
    /// connection to `:memory:` would see an empty database.
    pub async fn connect_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_schema().await?;
        Ok(db)
    }

    async fn run_schema(&self) -> Result<(), AppError> {
        let schema = include_str!("schema.sql");

        let mut statement = String::new();
        for line in schema.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("--") || trimmed.is_empty() {
                continue;
            }

            statement.push_str(line);
            statement.push('\n');

            if trimmed.ends_with(';') {
                sqlx::query(&statement).execute(&self.pool).await?;
                statement.clear();
            }
        }

        Ok(())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get an active user by ID.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = ? AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Record a login: match an existing user by Google ID, then by email,
    /// otherwise create one. Profile and tokens are overwritten, except that
    /// an empty refresh token keeps the stored one. The stored token is sealed
    /// to the Google ID, so it is dropped when the Google ID changes.
    pub async fn upsert_login_user(
        &self,
        profile: &LoginProfile<'_>,
        tokens: &UserTokens,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM users WHERE google_id = ? AND deleted_at IS NULL",
        )
        .bind(profile.google_id)
        .fetch_optional(&mut *tx)
        .await?;

        let existing = match existing {
            Some(id) => Some(id),
            None => {
                sqlx::query_scalar("SELECT id FROM users WHERE email = ? AND deleted_at IS NULL")
                    .bind(profile.email)
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };

        let user_id = match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE users SET google_id = ?, email = ?, picture = ?, \
                     access_token_encrypted = ?, \
                     refresh_token_encrypted = CASE WHEN ? = '' AND google_id = ? \
                         THEN refresh_token_encrypted ELSE ? END, \
                     token_expiry = ?, updated_at = ? WHERE id = ?",
                )
                .bind(profile.google_id)
                .bind(profile.email)
                .bind(profile.picture)
                .bind(&tokens.access_token_encrypted)
                .bind(&tokens.refresh_token_encrypted)
                .bind(profile.google_id)
                .bind(&tokens.refresh_token_encrypted)
                .bind(tokens.expires_at)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => sqlx::query(
                "INSERT INTO users (google_id, email, picture, access_token_encrypted, \
                 refresh_token_encrypted, token_expiry, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(profile.google_id)
            .bind(profile.email)
            .bind(profile.picture)
            .bind(&tokens.access_token_encrypted)
            .bind(&tokens.refresh_token_encrypted)
            .bind(tokens.expires_at)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        tx.commit().await?;

        tracing::debug!(user_id, created = existing.is_none(), "Recorded login");

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::Store(format!("User {} vanished after login", user_id)))
    }

    /// Replace a user's stored token triple.
    pub async fn update_user_tokens(
        &self,
        user_id: i64,
        tokens: &UserTokens,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET access_token_encrypted = ?, refresh_token_encrypted = ?, \
             token_expiry = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&tokens.access_token_encrypted)
        .bind(&tokens.refresh_token_encrypted)
        .bind(tokens.expires_at)
        .bind(now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {}", user_id)));
        }
        Ok(())
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ─── Contact Operations ──────────────────────────────────────

    /// Get one of the user's contacts.
    pub async fn get_contact(
        &self,
        user_id: i64,
        contact_id: i64,
    ) -> Result<Option<Contact>, AppError> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
            CONTACT_COLUMNS
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(contact_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    /// List the user's contacts matching `filter`, ordered by name.
    pub async fn list_contacts(
        &self,
        user_id: i64,
        filter: &ContactFilter,
    ) -> Result<Vec<Contact>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM contacts WHERE deleted_at IS NULL AND user_id = ",
            CONTACT_COLUMNS
        ));
        query.push_bind(user_id);

        if let Some(prefix) = &filter.relationship_prefix {
            query.push(" AND relationship LIKE ");
            query.push_bind(like_prefix(prefix));
            query.push(" ESCAPE '\\'");
        }
        if let Some(vip) = filter.vip {
            query.push(" AND vip = ");
            query.push_bind(vip);
        }
        if let Some(prefix) = &filter.location_prefix {
            query.push(" AND location LIKE ");
            query.push_bind(like_prefix(prefix));
            query.push(" ESCAPE '\\'");
        }
        if let Some(before) = filter.last_contacted_before {
            query.push(" AND last_contacted != '' AND last_contacted < ");
            query.push_bind(before.format(DATE_FORMAT).to_string());
        }

        query.push(" ORDER BY name COLLATE NOCASE, id");

        if let Some(limit) = filter.limit.filter(|&l| l > 0) {
            query.push(" LIMIT ");
            query.push_bind(i64::from(limit));
        }

        let contacts = query
            .build_query_as::<Contact>()
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    /// Insert a new contact. `created_at` and `updated_at` are both `now`.
    pub async fn create_contact(
        &self,
        user_id: i64,
        input: &NewContact,
        now: DateTime<Utc>,
    ) -> Result<Contact, AppError> {
        let vip_info = input.vip_info();
        let details = &input.details;

        let contact_id = sqlx::query(
            "INSERT INTO contacts (user_id, name, relationship, industry, company, birthday, \
             vip, notes, spouse, children, location, phone, email, linkedin, instagram, x, \
             last_met, last_contacted, last_update, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(input.relationship.map(|r| r.as_str()).unwrap_or_default())
        .bind(&input.industry)
        .bind(&input.company)
        .bind(&input.birthday)
        .bind(input.vip)
        .bind(&input.notes)
        .bind(&details.spouse)
        .bind(&details.children)
        .bind(&details.location)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.linkedin)
        .bind(&details.instagram)
        .bind(&details.x)
        .bind(&vip_info.last_met)
        .bind(&vip_info.last_contacted)
        .bind(&vip_info.last_update)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_contact(user_id, contact_id)
            .await?
            .ok_or_else(|| AppError::Store(format!("Contact {} vanished after insert", contact_id)))
    }

    /// Write back the user-editable fields of a contact.
    ///
    /// Calendar-sync columns are not touched; see [`Database::set_calendar_sync`].
    pub async fn save_contact(&self, contact: &Contact, now: DateTime<Utc>) -> Result<(), AppError> {
        let details = &contact.details;
        let vip_info = &contact.vip_info;

        let result = sqlx::query(
            "UPDATE contacts SET name = ?, relationship = ?, industry = ?, company = ?, \
             birthday = ?, vip = ?, notes = ?, spouse = ?, children = ?, location = ?, \
             phone = ?, email = ?, linkedin = ?, instagram = ?, x = ?, last_met = ?, \
             last_contacted = ?, last_update = ?, updated_at = ? \
             WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(&contact.name)
        .bind(contact.relationship.map(|r| r.as_str()).unwrap_or_default())
        .bind(&contact.industry)
        .bind(&contact.company)
        .bind(&contact.birthday)
        .bind(contact.vip)
        .bind(&contact.notes)
        .bind(&details.spouse)
        .bind(&details.children)
        .bind(&details.location)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.linkedin)
        .bind(&details.instagram)
        .bind(&details.x)
        .bind(&vip_info.last_met)
        .bind(&vip_info.last_contacted)
        .bind(&vip_info.last_update)
        .bind(now)
        .bind(contact.id)
        .bind(contact.user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contact {}", contact.id)));
        }
        Ok(())
    }

    /// Record the result of a birthday sync (or its removal).
    pub async fn set_calendar_sync(
        &self,
        user_id: i64,
        contact_id: i64,
        sync: &CalendarSync,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE contacts SET calendar_event_id = ?, calendar_sync_enabled = ?, \
             calendar_synced_at = ?, updated_at = ? \
             WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(&sync.event_id)
        .bind(sync.enabled)
        .bind(sync.synced_at)
        .bind(now)
        .bind(contact_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contact {}", contact_id)));
        }
        Ok(())
    }

    /// Soft-delete a contact. Returns `false` if nothing was deleted.
    pub async fn delete_contact(
        &self,
        user_id: i64,
        contact_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE contacts SET deleted_at = ? \
             WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(contact_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_contacts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ─── Event Operations ────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub async fn create_event(
        &self,
        user_id: i64,
        contact_id: i64,
        title: &str,
        event_date: &str,
        recurrence: Recurrence,
        calendar_event_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError> {
        let event_id = sqlx::query(
            "INSERT INTO events (user_id, contact_id, title, event_date, recurrence, \
             calendar_event_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(contact_id)
        .bind(title)
        .bind(event_date)
        .bind(recurrence.as_str())
        .bind(calendar_event_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_event(user_id, event_id)
            .await?
            .ok_or_else(|| AppError::Store(format!("Event {} vanished after insert", event_id)))
    }

    pub async fn get_event(&self, user_id: i64, event_id: i64) -> Result<Option<Event>, AppError> {
        let sql = format!(
            "SELECT {} FROM events WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
            EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    /// All of the user's events.
    pub async fn list_events(&self, user_id: i64) -> Result<Vec<Event>, AppError> {
        let sql = format!(
            "SELECT {} FROM events WHERE user_id = ? AND deleted_at IS NULL \
             ORDER BY event_date, id",
            EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    /// Events attached to one contact, ordered by date.
    pub async fn list_contact_events(
        &self,
        user_id: i64,
        contact_id: i64,
    ) -> Result<Vec<Event>, AppError> {
        let sql = format!(
            "SELECT {} FROM events WHERE user_id = ? AND contact_id = ? AND deleted_at IS NULL \
             ORDER BY event_date, id",
            EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(user_id)
            .bind(contact_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    /// Soft-delete an event. Returns `false` if nothing was deleted.
    pub async fn delete_event(
        &self,
        user_id: i64,
        event_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE events SET deleted_at = ? WHERE id = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// `LIKE` pattern matching values that start with `prefix`.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
