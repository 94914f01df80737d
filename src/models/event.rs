// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// How often a custom event repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        }
    }

    /// RFC 5545 recurrence rule for the calendar provider.
    pub fn rrule(&self) -> Option<&'static str> {
        match self {
            Recurrence::None => None,
            Recurrence::Monthly => Some("RRULE:FREQ=MONTHLY"),
            Recurrence::Yearly => Some("RRULE:FREQ=YEARLY"),
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Recurrence::None),
            "monthly" => Ok(Recurrence::Monthly),
            "yearly" => Ok(Recurrence::Yearly),
            other => Err(format!("Unknown recurrence: {}", other)),
        }
    }
}

/// A custom dated event attached to a contact.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Event {
    pub id: i64,
    pub user_id: i64,
    pub contact_id: i64,
    pub title: String,
    /// `YYYY-MM-DD`
    pub event_date: String,
    pub recurrence: Recurrence,
    /// Empty until synced
    pub calendar_event_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Event {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let recurrence: String = row.try_get("recurrence")?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            contact_id: row.try_get("contact_id")?,
            title: row.try_get("title")?,
            event_date: row.try_get("event_date")?,
            recurrence: recurrence
                .parse()
                .map_err(|e: String| sqlx::Error::ColumnDecode {
                    index: "recurrence".to_string(),
                    source: e.into(),
                })?,
            calendar_event_id: row.try_get("calendar_event_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Event {
    pub fn date(&self) -> Option<NaiveDate> {
        crate::models::parse_date(&self.event_date)
    }
}

fn validate_event_date(value: &str) -> Result<(), ValidationError> {
    crate::models::parse_date(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("date_format"))
}

/// Request body for creating a custom event.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewEvent {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(custom(function = "validate_event_date"))]
    pub event_date: String,
    #[serde(default)]
    pub recurrence: Recurrence,
}
