// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie authentication.
//!
//! The session is an HS256 JWT carried in the `auth_token` cookie.

use crate::config::Config;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "auth_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Authenticated user extracted from the session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

/// `302 Found` redirect to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Middleware that requires a valid session cookie.
///
/// Requests without one are sent to the login page.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| verify_jwt(cookie.value(), &state.config.jwt_signing_key));

    let Some(user) = user else {
        tracing::debug!(path = %request.uri().path(), "No valid session, redirecting to login");
        return found("/login");
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Decode and validate a session token.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;

    let claims = decode::<Claims>(token, &key, &validation).ok()?.claims;
    let user_id = claims.sub.parse().ok()?;

    Some(AuthUser {
        user_id,
        email: claims.email,
    })
}

/// Create a JWT for a user session.
pub fn create_jwt(
    user_id: i64,
    email: &str,
    signing_key: &[u8],
    lifetime_hours: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<String> {
    let issued = now.timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: issued,
        nbf: issued,
        exp: (now + Duration::hours(lifetime_hours)).timestamp(),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// HTTP-only session cookie holding `token`.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::hours(config.session_hours))
        .build()
}

/// Cookie that removes the session when passed to [`CookieJar::remove`].
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_jwt_key_32_bytes_minimum!!";

    #[test]
    fn test_jwt_round_trip() {
        let token = create_jwt(7, "ada@example.com", KEY, 24, Utc::now()).unwrap();
        let user = verify_jwt(&token, KEY).unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn test_jwt_wrong_key() {
        let token = create_jwt(7, "ada@example.com", KEY, 24, Utc::now()).unwrap();
        assert!(verify_jwt(&token, b"some_other_key_entirely_here!!!").is_none());
    }

    #[test]
    fn test_jwt_expired() {
        let issued = Utc::now() - Duration::hours(48);
        let token = create_jwt(7, "ada@example.com", KEY, 24, issued).unwrap();
        assert!(verify_jwt(&token, KEY).is_none());
    }

    #[test]
    fn test_jwt_not_yet_valid() {
        let issued = Utc::now() + Duration::hours(2);
        let token = create_jwt(7, "ada@example.com", KEY, 24, issued).unwrap();
        assert!(verify_jwt(&token, KEY).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = Config::default();
        let cookie = session_cookie("tok".to_string(), &config);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));

        config.public_url = "https://crm.example.com".to_string();
        let cookie = session_cookie("tok".to_string(), &config);
        assert_eq!(cookie.secure(), Some(true));
    }
}
