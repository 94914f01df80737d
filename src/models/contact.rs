// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact model and the typed inputs used to create, update and query contacts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Relationship category of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Relationship {
    Friend,
    Family,
    Colleague,
    School,
    Network,
    Services,
}

impl Relationship {
    pub const ALL: [Relationship; 6] = [
        Relationship::Friend,
        Relationship::Family,
        Relationship::Colleague,
        Relationship::School,
        Relationship::Network,
        Relationship::Services,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Friend => "Friend",
            Relationship::Family => "Family",
            Relationship::Colleague => "Colleague",
            Relationship::School => "School",
            Relationship::Network => "Network",
            Relationship::Services => "Services",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relationship::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown relationship: {}", s))
    }
}

/// Family details and ways to reach a contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct ContactDetails {
    pub spouse: String,
    pub children: String,
    pub location: String,
    pub phone: String,
    pub email: String,
    pub linkedin: String,
    pub instagram: String,
    pub x: String,
}

/// Relationship-maintenance dates tracked for VIP contacts (`YYYY-MM-DD` or empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct VipInfo {
    pub last_met: String,
    pub last_contacted: String,
    pub last_update: String,
}

/// Local record of the contact's birthday entry in the external calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalendarSync {
    /// Provider-assigned event ID (empty when not synced)
    pub event_id: String,
    pub enabled: bool,
    pub synced_at: Option<DateTime<Utc>>,
}

/// A contact owned by a single user.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub relationship: Option<Relationship>,
    pub industry: String,
    pub company: String,
    /// Birthday as `YYYY-MM-DD` (may be empty)
    pub birthday: String,
    pub vip: bool,
    pub notes: String,
    pub details: ContactDetails,
    pub vip_info: VipInfo,
    pub calendar: CalendarSync,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Contact {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let relationship: String = row.try_get("relationship")?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            // Unknown or empty categories are treated as unset.
            relationship: relationship.parse().ok(),
            industry: row.try_get("industry")?,
            company: row.try_get("company")?,
            birthday: row.try_get("birthday")?,
            vip: row.try_get("vip")?,
            notes: row.try_get("notes")?,
            details: ContactDetails {
                spouse: row.try_get("spouse")?,
                children: row.try_get("children")?,
                location: row.try_get("location")?,
                phone: row.try_get("phone")?,
                email: row.try_get("email")?,
                linkedin: row.try_get("linkedin")?,
                instagram: row.try_get("instagram")?,
                x: row.try_get("x")?,
            },
            vip_info: VipInfo {
                last_met: row.try_get("last_met")?,
                last_contacted: row.try_get("last_contacted")?,
                last_update: row.try_get("last_update")?,
            },
            calendar: CalendarSync {
                event_id: row.try_get("calendar_event_id")?,
                enabled: row.try_get("calendar_sync_enabled")?,
                synced_at: row.try_get("calendar_synced_at")?,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Contact {
    /// Whether the birthday is set and parses as a calendar date.
    pub fn birthday_date(&self) -> Option<NaiveDate> {
        crate::models::parse_date(&self.birthday)
    }

    /// Append a timestamped entry to the free-text notes.
    pub fn append_note(&mut self, note: &str, now: DateTime<Utc>) {
        let stamp = now.format("%Y-%m-%d %H:%M:%S");
        if self.notes.is_empty() {
            self.notes = format!("[{}]\n{}", stamp, note);
        } else {
            self.notes = format!("{}\n---\n[{}]\n{}", self.notes, stamp, note);
        }
    }
}

/// Accept empty strings, otherwise require `YYYY-MM-DD`.
fn validate_date(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || crate::models::parse_date(value).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("date_format"))
    }
}

/// Request body for creating a contact.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewContact {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub relationship: Option<Relationship>,
    pub industry: String,
    pub company: String,
    #[validate(custom(function = "validate_date"))]
    pub birthday: String,
    pub vip: bool,
    pub notes: String,
    pub details: ContactDetails,
    #[validate(custom(function = "validate_date"))]
    pub last_met: String,
    #[validate(custom(function = "validate_date"))]
    pub last_contacted: String,
    #[validate(custom(function = "validate_date"))]
    pub last_update: String,
}

impl NewContact {
    /// VIP-tracking dates, kept only for VIP contacts.
    pub fn vip_info(&self) -> VipInfo {
        if !self.vip {
            return VipInfo::default();
        }
        VipInfo {
            last_met: self.last_met.clone(),
            last_contacted: self.last_contacted.clone(),
            last_update: self.last_update.clone(),
        }
    }
}

/// Typed partial update of a contact. `None` leaves a field unchanged.
///
/// Calendar-sync state is not editable here; see [`crate::db::Database::set_calendar_sync`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ContactUpdate {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub relationship: Option<Relationship>,
    pub industry: Option<String>,
    pub company: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub birthday: Option<String>,
    pub vip: Option<bool>,
    pub notes: Option<String>,
    pub spouse: Option<String>,
    pub children: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub x: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub last_met: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub last_contacted: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub last_update: Option<String>,
}

impl ContactUpdate {
    /// Apply the set fields to `contact`.
    ///
    /// A contact that ends up non-VIP loses its VIP-tracking dates.
    pub fn apply(&self, contact: &mut Contact) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                target.clone_from(v);
            }
        }

        set(&mut contact.name, &self.name);
        if let Some(relationship) = self.relationship {
            contact.relationship = Some(relationship);
        }
        set(&mut contact.industry, &self.industry);
        set(&mut contact.company, &self.company);
        set(&mut contact.birthday, &self.birthday);
        if let Some(vip) = self.vip {
            contact.vip = vip;
        }
        set(&mut contact.notes, &self.notes);

        let details = &mut contact.details;
        set(&mut details.spouse, &self.spouse);
        set(&mut details.children, &self.children);
        set(&mut details.location, &self.location);
        set(&mut details.phone, &self.phone);
        set(&mut details.email, &self.email);
        set(&mut details.linkedin, &self.linkedin);
        set(&mut details.instagram, &self.instagram);
        set(&mut details.x, &self.x);

        let vip_info = &mut contact.vip_info;
        set(&mut vip_info.last_met, &self.last_met);
        set(&mut vip_info.last_contacted, &self.last_contacted);
        set(&mut vip_info.last_update, &self.last_update);

        if !contact.vip {
            contact.vip_info = VipInfo::default();
        }
    }
}

/// Filters for listing a user's contacts. All set filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    /// Case-insensitive prefix of the relationship category
    pub relationship_prefix: Option<String>,
    pub vip: Option<bool>,
    /// Case-insensitive prefix of the location
    pub location_prefix: Option<String>,
    /// Only contacts last contacted strictly before this date
    pub last_contacted_before: Option<NaiveDate>,
    pub limit: Option<u32>,
}

impl ContactFilter {
    /// Translate the quick-filter values offered by the contact list.
    ///
    /// `vip`, `non-vip` and relationship names select a subset; anything else
    /// selects all contacts.
    pub fn from_quick_filter(filter: &str) -> Self {
        match filter {
            "vip" => Self {
                vip: Some(true),
                ..Self::default()
            },
            "non-vip" => Self {
                vip: Some(false),
                ..Self::default()
            },
            other if other.parse::<Relationship>().is_ok() => Self {
                relationship_prefix: Some(other.to_string()),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}
