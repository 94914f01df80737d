// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod crypto;
pub mod dashboard;
pub mod google;
pub mod tokens;

pub use calendar::CalendarSyncService;
pub use crypto::TokenCipher;
pub use dashboard::{Dashboard, DashboardService};
pub use google::{GoogleClient, GoogleEndpoints};
pub use tokens::TokenManager;
