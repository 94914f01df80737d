// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use chrono::{DateTime, Duration, Utc};
use personal_crm::config::Config;
use personal_crm::db::sqlite::LoginProfile;
use personal_crm::db::Database;
use personal_crm::middleware::auth::{create_jwt, SESSION_COOKIE};
use personal_crm::models::{Contact, NewContact, User};
use personal_crm::routes::create_router;
use personal_crm::services::google::TokenResponse;
use personal_crm::services::GoogleEndpoints;
use personal_crm::AppState;
use std::sync::Arc;
use wiremock::MockServer;

/// Router and state backed by an in-memory store and a mock Google server.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub google: MockServer,
}

/// Path of the primary calendar's events collection on the mock server.
#[allow(dead_code)]
pub const EVENTS_PATH: &str = "/calendar/v3/calendars/primary/events";

/// Create a test app whose Google endpoints point at a fresh mock server.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let google = MockServer::start().await;
    let config = Config {
        google_endpoints: GoogleEndpoints::with_base(&google.uri()),
        ..Config::default()
    };

    let db = Database::connect_in_memory()
        .await
        .expect("in-memory database");
    let state = Arc::new(AppState::new(config, db).expect("app state"));

    TestApp {
        router: create_router(state.clone()),
        state,
        google,
    }
}

/// Store a user whose access token was issued at `issued` and lasts an hour.
///
/// An empty `refresh_token` stores no refresh token.
#[allow(dead_code)]
pub async fn seed_user(
    state: &AppState,
    google_id: &str,
    access_token: &str,
    refresh_token: &str,
    issued: DateTime<Utc>,
) -> User {
    let response = TokenResponse {
        access_token: access_token.to_string(),
        expires_in: 3600,
        refresh_token: Some(refresh_token.to_string()).filter(|t| !t.is_empty()),
    };
    let tokens = state
        .tokens
        .seal(google_id, &response, "", issued)
        .expect("seal tokens");

    state
        .db
        .upsert_login_user(
            &LoginProfile {
                google_id,
                email: &format!("{}@example.com", google_id),
                picture: "",
            },
            &tokens,
            issued,
        )
        .await
        .expect("seed user")
}

/// A user with a valid access token `"access-1"` and refresh token `"refresh-1"`.
#[allow(dead_code)]
pub async fn seed_valid_user(state: &AppState) -> User {
    seed_user(state, "g-1", "access-1", "refresh-1", Utc::now()).await
}

/// A user whose access token expired an hour ago.
#[allow(dead_code)]
pub async fn seed_expired_user(state: &AppState, refresh_token: &str) -> User {
    seed_user(
        state,
        "g-1",
        "stale-access",
        refresh_token,
        Utc::now() - Duration::hours(2),
    )
    .await
}

#[allow(dead_code)]
pub fn new_contact(name: &str) -> NewContact {
    NewContact {
        name: name.to_string(),
        ..NewContact::default()
    }
}

#[allow(dead_code)]
pub async fn seed_contact(state: &AppState, user: &User, input: NewContact) -> Contact {
    state
        .db
        .create_contact(user.id, &input, Utc::now())
        .await
        .expect("seed contact")
}

/// `Cookie` header value carrying a session for `user`.
#[allow(dead_code)]
pub fn session_cookie(state: &AppState, user: &User) -> String {
    let jwt = create_jwt(
        user.id,
        &user.email,
        &state.config.jwt_signing_key,
        state.config.session_hours,
        Utc::now(),
    )
    .expect("jwt");
    format!("{}={}", SESSION_COOKIE, jwt)
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
