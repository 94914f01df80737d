// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth login, logout and the login landing page.

use axum::{
    extract::{Query, State},
    http::Uri,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::sqlite::LoginProfile;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, found, removal_cookie, session_cookie};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// How long a signed `state` stays acceptable.
const STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

/// Where to land after login when no (safe) destination is given.
const DEFAULT_RETURN_PATH: &str = "/contacts";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page))
        .route("/auth/google/login", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
}

async fn index() -> Response {
    found("/contacts")
}

#[derive(Deserialize)]
pub struct LoginPageParams {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginInfo {
    pub login_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn login_page(Query(params): Query<LoginPageParams>) -> Json<LoginInfo> {
    Json(LoginInfo {
        login_url: "/auth/google/login".to_string(),
        error: params.error,
    })
}

#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Local path to return to after login
    #[serde(default)]
    next: Option<String>,
}

/// Start OAuth flow - redirect to Google's consent page.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Redirect> {
    let return_to = params
        .next
        .filter(|p| is_local_path(p))
        .unwrap_or_else(|| DEFAULT_RETURN_PATH.to_string());

    let oauth_state = sign_state(&return_to, Utc::now(), &state.config.oauth_state_key)?;
    let auth_url = state.google.authorize_url(&oauth_state);

    tracing::info!(return_to = %return_to, "Starting OAuth flow, redirecting to Google");

    Ok(Redirect::temporary(&auth_url))
}

/// Accept only same-origin absolute paths. Browsers read `/\host` like
/// `//host`, so backslashes and control characters are refused outright.
fn is_local_path(path: &str) -> bool {
    if !path.starts_with('/') || path.starts_with("//") {
        return false;
    }
    if path.chars().any(|c| c == '\\' || c.is_control()) {
        return false;
    }
    match path.parse::<Uri>() {
        Ok(uri) => uri.scheme().is_none() && uri.authority().is_none(),
        Err(_) => false,
    }
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn login_error(state: &AppState, reason: &str) -> Response {
    state
        .metrics
        .user_logins_total
        .with_label_values(&["failure"])
        .inc();
    found(&format!("/login?error={}", urlencoding::encode(reason)))
}

/// OAuth callback - exchange code for tokens, record the user, start a session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let now = Utc::now();

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return login_error(&state, &error);
    }

    let Some(return_to) = params
        .state
        .as_deref()
        .and_then(|s| verify_state(s, &state.config.oauth_state_key, now))
    else {
        tracing::warn!("Invalid or expired OAuth state parameter");
        return login_error(&state, "invalid_state");
    };

    let Some(code) = params.code else {
        return login_error(&state, "missing_code");
    };

    match complete_login(&state, &code, now).await {
        Ok((jwt, user_id)) => {
            state
                .metrics
                .user_logins_total
                .with_label_values(&["success"])
                .inc();
            tracing::info!(user_id, "Login successful");

            let jar = jar.add(session_cookie(jwt, &state.config));
            (jar, found(&return_to)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            login_error(&state, "login_failed")
        }
    }
}

/// Exchange the code, look up the profile and upsert the user.
/// Returns the session JWT and the user ID.
async fn complete_login(
    state: &AppState,
    code: &str,
    now: DateTime<Utc>,
) -> Result<(String, i64)> {
    let token_response = state.google.exchange_code(code).await?;
    let profile = state
        .google
        .get_user_info(&token_response.access_token)
        .await?;

    let tokens = state.tokens.seal(&profile.id, &token_response, "", now)?;
    let user = state
        .db
        .upsert_login_user(
            &LoginProfile {
                google_id: &profile.id,
                email: &profile.email,
                picture: &profile.picture,
            },
            &tokens,
            now,
        )
        .await?;

    let jwt = create_jwt(
        user.id,
        &user.email,
        &state.config.jwt_signing_key,
        state.config.session_hours,
        now,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    Ok((jwt, user.id))
}

/// Logout - clear the session cookie.
async fn logout(jar: CookieJar) -> Response {
    (jar.remove(removal_cookie()), found("/login")).into_response()
}

/// Build the signed OAuth `state`: base64 of `"return_to|timestamp_hex|signature_hex"`.
fn sign_state(return_to: &str, now: DateTime<Utc>, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", return_to, now.timestamp_millis());

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the HMAC signature and age of an OAuth `state` and return the path
/// it carries.
fn verify_state(state: &str, secret: &[u8], now: DateTime<Utc>) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Signature and timestamp never contain '|'; splitting from the right
    // leaves any '|' in the path inside the last part.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let return_to = parts.next()?;

    let payload = format!("{}|{}", return_to, timestamp_hex);
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_ms = i64::from_str_radix(timestamp_hex, 16).ok()?;
    let age = now.timestamp_millis() - issued_ms;
    if !(0..=STATE_MAX_AGE_MS).contains(&age) {
        return None;
    }

    Some(return_to.to_string())
}
