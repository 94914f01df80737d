// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth token lifecycle for a user.
//!
//! Tokens live encrypted in the `users` row. The associated data for the
//! cipher is the user's Google ID, which is known before the row exists.
//! There is no in-process cache; every request reads the row.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{User, UserTokens};
use crate::services::crypto::TokenCipher;
use crate::services::google::{GoogleClient, TokenResponse};
use chrono::{DateTime, Duration, Utc};

/// Hands out usable Google access tokens, refreshing them when expired.
#[derive(Clone)]
pub struct TokenManager {
    db: Database,
    google: GoogleClient,
    cipher: TokenCipher,
}

impl TokenManager {
    pub fn new(db: Database, google: GoogleClient, cipher: TokenCipher) -> Self {
        Self { db, google, cipher }
    }

    /// An access token is usable iff one is stored, an expiry is recorded,
    /// and `now` is strictly before it.
    pub fn is_valid(user: &User, now: DateTime<Utc>) -> bool {
        !user.access_token_encrypted.is_empty() && user.token_expiry.is_some_and(|exp| now < exp)
    }

    /// Encrypt a token response for storage, keeping `previous_refresh` when
    /// Google did not issue a new refresh token.
    pub fn seal(
        &self,
        google_id: &str,
        response: &TokenResponse,
        previous_refresh: &str,
        now: DateTime<Utc>,
    ) -> Result<UserTokens, AppError> {
        let refresh_token_encrypted = match response.refresh_token.as_deref() {
            Some(token) if !token.is_empty() => self.cipher.encrypt(google_id, token)?,
            _ => previous_refresh.to_string(),
        };

        Ok(UserTokens {
            access_token_encrypted: self.cipher.encrypt(google_id, &response.access_token)?,
            refresh_token_encrypted,
            expires_at: Some(now + Duration::seconds(response.expires_in)),
        })
    }

    /// Exchange the stored refresh token for a new access token and persist
    /// the new triple. Returns the new plaintext access token.
    ///
    /// Fails with [`AppError::AuthExpired`] without any network call when no
    /// refresh token is stored.
    pub async fn refresh(&self, user: &User, now: DateTime<Utc>) -> Result<String, AppError> {
        if user.refresh_token_encrypted.is_empty() {
            tracing::warn!(user_id = user.id, "No refresh token stored");
            return Err(AppError::AuthExpired("No refresh token".to_string()));
        }

        let refresh_token = self
            .cipher
            .decrypt(&user.google_id, &user.refresh_token_encrypted)
            .map_err(|e| {
                tracing::warn!(user_id = user.id, error = %e, "Stored refresh token unusable");
                AppError::AuthExpired("Stored refresh token unusable".to_string())
            })?;

        tracing::info!(user_id = user.id, "Access token expired, refreshing");

        let response = self.google.refresh_token(&refresh_token).await?;
        let tokens = self.seal(
            &user.google_id,
            &response,
            &user.refresh_token_encrypted,
            now,
        )?;
        self.db.update_user_tokens(user.id, &tokens, now).await?;

        tracing::info!(user_id = user.id, expires_at = ?tokens.expires_at, "Token refreshed");
        Ok(response.access_token)
    }

    /// The stored access token if still valid, otherwise a refreshed one.
    pub async fn valid_access_token(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        if Self::is_valid(user, now) {
            match self
                .cipher
                .decrypt(&user.google_id, &user.access_token_encrypted)
            {
                Ok(token) => return Ok(token),
                Err(e) => {
                    tracing::warn!(user_id = user.id, error = %e, "Stored access token unusable");
                }
            }
        }
        self.refresh(user, now).await
    }
}
