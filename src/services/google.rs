// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google API client for OAuth2 and Calendar.
//!
//! Handles:
//! - Authorization URL construction and code exchange
//! - Refresh-token exchange
//! - User-info lookup after login
//! - Calendar v3 event insert/get/delete on the `primary` calendar

use crate::error::AppError;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// OAuth scopes requested at login.
pub const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/calendar.events",
];

/// Base URLs of the Google endpoints used by the app.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub calendar_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            calendar_url: "https://www.googleapis.com/calendar/v3".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// All endpoints served from one base URL (used with a mock server).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{}/o/oauth2/v2/auth", base),
            token_url: format!("{}/token", base),
            userinfo_url: format!("{}/oauth2/v2/userinfo", base),
            calendar_url: format!("{}/calendar/v3", base),
        }
    }
}

/// Google API client.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    endpoints: GoogleEndpoints,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        endpoints: GoogleEndpoints,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// URL of Google's consent page for the given signed `state`.
    ///
    /// Requests offline access and forces the consent prompt so a refresh
    /// token is issued on every login.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
            self.endpoints.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
        .map_err(|e| AppError::BadRequest(format!("Code exchange failed: {}", e)))
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Any failure, including a transport error, means the grant cannot be
    /// used right now and is reported as [`AppError::AuthExpired`].
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
        .map_err(|e| AppError::AuthExpired(format!("Token refresh failed: {}", e)))
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, String> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }

        response
            .json()
            .await
            .map_err(|e| format!("JSON parse error: {}", e))
    }

    /// Profile of the user the access token belongs to.
    pub async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, AppError> {
        let response = self
            .http
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(anyhow::anyhow!(
                "Userinfo HTTP {}: {}",
                status,
                body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Userinfo JSON parse error: {}", e)))
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/primary/events", self.endpoints.calendar_url)
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    /// Create an event on the primary calendar.
    pub async fn insert_event(
        &self,
        access_token: &str,
        event: &CalendarEventRequest,
    ) -> Result<CalendarEvent, AppError> {
        let response = self
            .http
            .post(self.events_url())
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| AppError::SyncFailed(e.to_string()))?;

        check_response_json(response).await
    }

    /// Fetch an event. `None` if the provider reports it missing or gone.
    pub async fn get_event(
        &self,
        access_token: &str,
        event_id: &str,
    ) -> Result<Option<CalendarEvent>, AppError> {
        let response = self
            .http
            .get(self.event_url(event_id))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::SyncFailed(e.to_string()))?;

        if is_gone(response.status()) {
            return Ok(None);
        }
        check_response_json(response).await.map(Some)
    }

    /// Delete an event. Returns `false` if it was already missing or gone.
    pub async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<bool, AppError> {
        let response = self
            .http
            .delete(self.event_url(event_id))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::SyncFailed(e.to_string()))?;

        if is_gone(response.status()) {
            return Ok(false);
        }
        check_response(response).await?;
        Ok(true)
    }
}

fn is_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

/// Check a Calendar API response status, passing successful responses through.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    // Unauthorized - the access token was revoked or expired early
    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::AuthExpired(format!("Calendar API: {}", body)));
    }

    Err(AppError::SyncFailed(format!("HTTP {}: {}", status, body)))
}

/// Check a Calendar API response and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    check_response(response)
        .await?
        .json()
        .await
        .map_err(|e| AppError::SyncFailed(format!("JSON parse error: {}", e)))
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    /// Only present on the first exchange or when Google rotates it
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Userinfo endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub picture: String,
}

/// All-day date of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDate {
    pub date: String,
}

/// Body of an event insert request.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEventRequest {
    pub summary: String,
    pub start: EventDate,
    pub end: EventDate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
}

impl CalendarEventRequest {
    /// An all-day event on `date`. The end date is exclusive (the next day).
    pub fn all_day(summary: String, date: NaiveDate, rrule: Option<&str>) -> Self {
        let end = date.succ_opt().unwrap_or(date);
        Self {
            summary,
            start: EventDate {
                date: date.format(crate::models::DATE_FORMAT).to_string(),
            },
            end: EventDate {
                date: end.format(crate::models::DATE_FORMAT).to_string(),
            },
            recurrence: rrule.map(|r| vec![r.to_string()]).unwrap_or_default(),
        }
    }
}

/// Calendar event as returned by the API (only the fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

impl CalendarEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status == "cancelled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_day_event_body() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let body = CalendarEventRequest::all_day(
            "Ada's Birthday".to_string(),
            date,
            Some("RRULE:FREQ=YEARLY"),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["summary"], "Ada's Birthday");
        assert_eq!(json["start"]["date"], "2024-12-31");
        assert_eq!(json["end"]["date"], "2025-01-01");
        assert_eq!(json["recurrence"][0], "RRULE:FREQ=YEARLY");
    }

    #[test]
    fn test_non_recurring_body_omits_recurrence() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let body = CalendarEventRequest::all_day("Ada - Launch".to_string(), date, None);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("recurrence").is_none());
    }

    #[test]
    fn test_authorize_url() {
        let client = GoogleClient::new(
            "client-id".to_string(),
            "secret".to_string(),
            "http://localhost:8080/auth/google/callback".to_string(),
            GoogleEndpoints::default(),
        );
        let url = client.authorize_url("abc");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("state=abc"));
        assert!(url.contains("calendar.events"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080"));
    }

    #[test]
    fn test_cancelled_status() {
        let event: CalendarEvent =
            serde_json::from_str(r#"{"id": "e1", "status": "cancelled"}"#).unwrap();
        assert!(event.is_cancelled());
        let event: CalendarEvent = serde_json::from_str(r#"{"id": "e2"}"#).unwrap();
        assert!(!event.is_cancelled());
    }
}
