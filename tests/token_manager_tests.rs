// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token manager tests against a mock Google token endpoint.

use chrono::{Duration, Utc};
use personal_crm::db::sqlite::LoginProfile;
use personal_crm::error::AppError;
use personal_crm::models::UserTokens;
use personal_crm::services::google::TokenResponse;
use personal_crm::services::TokenManager;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

mod common;

#[tokio::test]
async fn test_valid_token_used_without_refresh() {
    let app = common::create_test_app().await;
    let user = common::seed_valid_user(&app.state).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.google)
        .await;

    let token = app
        .state
        .tokens
        .valid_access_token(&user, Utc::now())
        .await
        .unwrap();
    assert_eq!(token, "access-1");
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_persisted() {
    let app = common::create_test_app().await;
    let user = common::seed_expired_user(&app.state, "refresh-1").await;
    let now = Utc::now();
    assert!(!TokenManager::is_valid(&user, now));

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&app.google)
        .await;

    let token = app.state.tokens.valid_access_token(&user, now).await.unwrap();
    assert_eq!(token, "access-2");

    let stored = app.state.db.get_user(user.id).await.unwrap().unwrap();
    assert!(TokenManager::is_valid(&stored, now));
    assert_eq!(
        stored.token_expiry.map(|t| t.timestamp()),
        Some((now + Duration::seconds(3599)).timestamp())
    );
    // No new refresh token issued: the old one is kept
    assert_eq!(stored.refresh_token_encrypted, user.refresh_token_encrypted);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let app = common::create_test_app().await;
    let user = common::seed_expired_user(&app.state, "refresh-1").await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3600,
            "refresh_token": "refresh-2"
        })))
        .expect(1)
        .mount(&app.google)
        .await;

    let now = Utc::now();
    app.state.tokens.refresh(&user, now).await.unwrap();

    let stored = app.state.db.get_user(user.id).await.unwrap().unwrap();
    assert_ne!(stored.refresh_token_encrypted, user.refresh_token_encrypted);

    // The rotated token is the one sent on the next refresh
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("refresh_token=refresh-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-3",
            "expires_in": 3600
        })))
        .with_priority(1)
        .expect(1)
        .mount(&app.google)
        .await;

    let token = app.state.tokens.refresh(&stored, now).await.unwrap();
    assert_eq!(token, "access-3");
}

#[tokio::test]
async fn test_missing_refresh_token_fails_without_network() {
    let app = common::create_test_app().await;
    let user = common::seed_expired_user(&app.state, "").await;
    assert!(user.refresh_token_encrypted.is_empty());

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.google)
        .await;

    let result = app.state.tokens.valid_access_token(&user, Utc::now()).await;
    assert!(matches!(result, Err(AppError::AuthExpired(_))));
}

#[tokio::test]
async fn test_rejected_refresh_is_auth_expired() {
    let app = common::create_test_app().await;
    let user = common::seed_expired_user(&app.state, "revoked").await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&app.google)
        .await;

    let result = app.state.tokens.refresh(&user, Utc::now()).await;
    assert!(matches!(result, Err(AppError::AuthExpired(_))));

    // Stored tokens are untouched
    let stored = app.state.db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(stored.access_token_encrypted, user.access_token_encrypted);
    assert_eq!(stored.token_expiry, user.token_expiry);
}

#[tokio::test]
async fn test_login_under_new_google_id_drops_old_refresh_token() {
    let app = common::create_test_app().await;
    let old = common::seed_user(&app.state, "g-old", "a1", "r1", Utc::now()).await;
    assert!(!old.refresh_token_encrypted.is_empty());

    // Same email, new Google account, and no refresh token in this grant
    let issued = Utc::now() - Duration::hours(2);
    let response = TokenResponse {
        access_token: "a2".to_string(),
        expires_in: 3600,
        refresh_token: None,
    };
    let tokens = app.state.tokens.seal("g-new", &response, "", issued).unwrap();
    let user = app
        .state
        .db
        .upsert_login_user(
            &LoginProfile {
                google_id: "g-new",
                email: &old.email,
                picture: "",
            },
            &tokens,
            issued,
        )
        .await
        .unwrap();
    assert_eq!(user.id, old.id);
    assert_eq!(user.google_id, "g-new");
    assert_eq!(user.refresh_token_encrypted, "");

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.google)
        .await;

    let result = app.state.tokens.valid_access_token(&user, Utc::now()).await;
    assert!(matches!(result, Err(AppError::AuthExpired(_))));
}

#[tokio::test]
async fn test_undecryptable_refresh_token_is_auth_expired() {
    let app = common::create_test_app().await;
    let user = common::seed_expired_user(&app.state, "refresh-1").await;

    // Refresh token sealed to a different Google ID
    let response = TokenResponse {
        access_token: "stale-access".to_string(),
        expires_in: 3600,
        refresh_token: Some("refresh-1".to_string()),
    };
    let foreign = app
        .state
        .tokens
        .seal("g-other", &response, "", Utc::now() - Duration::hours(2))
        .unwrap();
    let tokens = UserTokens {
        access_token_encrypted: user.access_token_encrypted.clone(),
        refresh_token_encrypted: foreign.refresh_token_encrypted,
        expires_at: user.token_expiry,
    };
    app.state
        .db
        .update_user_tokens(user.id, &tokens, Utc::now())
        .await
        .unwrap();
    let user = app.state.db.get_user(user.id).await.unwrap().unwrap();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.google)
        .await;

    let result = app.state.tokens.valid_access_token(&user, Utc::now()).await;
    assert!(matches!(result, Err(AppError::AuthExpired(_))));
}
