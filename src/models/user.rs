// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile stored in the `users` table.
///
/// OAuth tokens are stored encrypted; see [`crate::services::TokenCipher`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Google account ID (`sub` of the userinfo response)
    pub google_id: String,
    pub email: String,
    pub picture: String,
    /// Encrypted access token (base64, empty if none)
    #[serde(skip_serializing)]
    pub access_token_encrypted: String,
    /// Encrypted refresh token (base64, empty if none)
    #[serde(skip_serializing)]
    pub refresh_token_encrypted: String,
    /// When the access token expires
    pub token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Encrypted OAuth token triple as persisted for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTokens {
    pub access_token_encrypted: String,
    pub refresh_token_encrypted: String,
    pub expires_at: Option<DateTime<Utc>>,
}
