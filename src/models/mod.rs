// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod contact;
pub mod event;
pub mod user;

pub use contact::{
    CalendarSync, Contact, ContactDetails, ContactFilter, ContactUpdate, NewContact, Relationship,
    VipInfo,
};
pub use event::{Event, NewEvent, Recurrence};
pub use user::{User, UserTokens};

/// Date format used for birthdays, event dates and VIP tracking dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date, returning `None` for empty or malformed input.
pub fn parse_date(value: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}
