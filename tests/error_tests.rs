// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use personal_crm::error::AppError;
use personal_crm::models::NewContact;
use validator::Validate;

mod common;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    (status, common::body_json(response).await)
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let (status, body) = render(AppError::NotFound("Contact 7".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["details"], "Contact 7");

    let (status, body) = render(AppError::BadRequest("Invalid date".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["details"], "Invalid date");

    let (status, body) = render(AppError::Unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_auth_expired_asks_for_login() {
    let (status, body) = render(AppError::AuthExpired("invalid_grant".to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "auth_expired");
    // Provider detail stays in the logs
    assert!(!body["details"].as_str().unwrap().contains("invalid_grant"));
}

#[tokio::test]
async fn test_server_errors_hide_internals() {
    let (status, body) = render(AppError::Store("disk I/O error".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store_error");
    assert!(body.get("details").is_none());

    let (status, body) = render(AppError::Internal(anyhow::anyhow!("boom"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());

    let (status, body) = render(AppError::SyncFailed("HTTP 503".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "sync_failed");
}

#[test]
fn test_conversions() {
    let err: AppError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, AppError::Store(_)));

    let invalid = NewContact::default();
    let err: AppError = invalid.validate().unwrap_err().into();
    assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("name")));
}
