// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard aggregation.
//!
//! [`Dashboard::build`] is a pure function of the user's contacts, events and
//! the current time. [`DashboardService`] loads the inputs from the store.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Contact, ContactFilter, Event};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Look-ahead window for upcoming birthdays and events.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;
/// VIPs not contacted for longer than this need attention.
pub const ATTENTION_THRESHOLD_DAYS: i64 = 60;
/// Number of entries in the recent-activity list.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum UpcomingKind {
    Birthday,
    Custom,
}

/// A birthday or custom event coming up within the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpcomingEvent {
    /// Contact ID for birthdays, event ID for custom events
    pub id: i64,
    pub contact_id: i64,
    pub contact_name: String,
    #[serde(rename = "type")]
    pub kind: UpcomingKind,
    /// Empty for birthdays
    pub title: String,
    /// Stored date (`YYYY-MM-DD`)
    pub date: String,
    pub days_until: i64,
    /// Date of the occurrence, e.g. `"Jun 15"`
    pub display_date: String,
}

/// A VIP contact that has not been contacted recently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AttentionItem {
    pub contact_id: i64,
    pub name: String,
    pub company: String,
    pub last_contacted: String,
    /// 0 when never contacted
    pub days_since: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityAction {
    Added,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityItem {
    pub contact_id: i64,
    pub name: String,
    pub company: String,
    pub action: ActivityAction,
    pub time_ago: String,
}

/// Dashboard payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Dashboard {
    pub upcoming_events: Vec<UpcomingEvent>,
    pub needs_attention: Vec<AttentionItem>,
    pub recent_activity: Vec<ActivityItem>,
}

impl Dashboard {
    /// Aggregate the dashboard for one user's `contacts` and `events`.
    pub fn build(contacts: &[Contact], events: &[Event], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();

        Self {
            upcoming_events: upcoming_events(contacts, events, today),
            needs_attention: needs_attention(contacts, today),
            recent_activity: recent_activity(contacts, now),
        }
    }
}

/// The date `month`/`day` falls on in `year`. Feb 29 maps to Mar 1 in
/// non-leap years.
fn anniversary(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        if month == 2 && day == 29 {
            NaiveDate::from_ymd_opt(year, 3, 1)
        } else {
            None
        }
    })
}

/// Next occurrence of `birthday` on or after `today`.
pub fn next_birthday(birthday: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = anniversary(today.year(), birthday.month(), birthday.day())?;
    if this_year >= today {
        Some(this_year)
    } else {
        anniversary(today.year() + 1, birthday.month(), birthday.day())
    }
}

fn display_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

fn upcoming_events(contacts: &[Contact], events: &[Event], today: NaiveDate) -> Vec<UpcomingEvent> {
    let mut upcoming = Vec::new();

    for contact in contacts {
        let Some(next) = contact
            .birthday_date()
            .and_then(|bday| next_birthday(bday, today))
        else {
            continue;
        };

        let days_until = (next - today).num_days();
        if days_until > UPCOMING_WINDOW_DAYS {
            continue;
        }

        upcoming.push(UpcomingEvent {
            id: contact.id,
            contact_id: contact.id,
            contact_name: contact.name.clone(),
            kind: UpcomingKind::Birthday,
            title: String::new(),
            date: contact.birthday.clone(),
            days_until,
            display_date: display_date(next),
        });
    }

    let by_id: HashMap<i64, &Contact> = contacts.iter().map(|c| (c.id, c)).collect();

    for event in events {
        let Some(date) = event.date() else {
            continue;
        };

        let days_until = (date - today).num_days();
        if !(0..=UPCOMING_WINDOW_DAYS).contains(&days_until) {
            continue;
        }

        let Some(contact) = by_id.get(&event.contact_id) else {
            continue;
        };

        upcoming.push(UpcomingEvent {
            id: event.id,
            contact_id: event.contact_id,
            contact_name: contact.name.clone(),
            kind: UpcomingKind::Custom,
            title: event.title.clone(),
            date: event.event_date.clone(),
            days_until,
            display_date: display_date(date),
        });
    }

    upcoming.sort_by_key(|e| e.days_until);
    upcoming
}

fn needs_attention(contacts: &[Contact], today: NaiveDate) -> Vec<AttentionItem> {
    let threshold = today - Duration::days(ATTENTION_THRESHOLD_DAYS);

    contacts
        .iter()
        .filter(|c| c.vip)
        .filter_map(|c| {
            let last_contacted = &c.vip_info.last_contacted;
            let days_since = if last_contacted.is_empty() {
                0
            } else {
                let date = crate::models::parse_date(last_contacted)?;
                if date >= threshold {
                    return None;
                }
                (today - date).num_days()
            };

            Some(AttentionItem {
                contact_id: c.id,
                name: c.name.clone(),
                company: c.company.clone(),
                last_contacted: last_contacted.clone(),
                days_since,
            })
        })
        .collect()
}

fn recent_activity(contacts: &[Contact], now: DateTime<Utc>) -> Vec<ActivityItem> {
    let mut recent: Vec<&Contact> = contacts.iter().collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

    recent
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|c| ActivityItem {
            contact_id: c.id,
            name: c.name.clone(),
            company: c.company.clone(),
            action: if c.created_at == c.updated_at {
                ActivityAction::Added
            } else {
                ActivityAction::Updated
            },
            time_ago: time_ago(c.updated_at, now),
        })
        .collect()
}

/// Coarse relative time: `"Just now"`, `"N hours ago"` or `"N days ago"`.
///
/// Timestamps in the future read as `"Just now"`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - then;

    if elapsed < Duration::hours(1) {
        return "Just now".to_string();
    }

    let hours = elapsed.num_hours();
    if hours < 24 {
        return match hours {
            1 => "1 hour ago".to_string(),
            n => format!("{} hours ago", n),
        };
    }

    match elapsed.num_days() {
        1 => "1 day ago".to_string(),
        n => format!("{} days ago", n),
    }
}

/// Loads a user's data and builds the dashboard.
#[derive(Clone)]
pub struct DashboardService {
    db: Database,
}

impl DashboardService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn build_dashboard(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Dashboard, AppError> {
        let contacts = self
            .db
            .list_contacts(user_id, &ContactFilter::default())
            .await?;
        let events = self.db.list_events(user_id).await?;

        let dashboard = Dashboard::build(&contacts, &events, now);

        tracing::debug!(
            user_id,
            upcoming = dashboard.upcoming_events.len(),
            attention = dashboard.needs_attention.len(),
            "Built dashboard"
        );
        Ok(dashboard)
    }
}
