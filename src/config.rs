//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first if present.

use crate::services::google::GoogleEndpoints;
use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Public base URL of this service, used for the OAuth redirect URI
    pub public_url: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// sqlx SQLite connection URL
    pub database_url: String,
    /// Server port
    pub port: u16,
    /// Session lifetime in hours
    pub session_hours: i64,
    /// Interval between metrics gauge refreshes, in seconds
    pub metrics_refresh_secs: u64,
    /// Google endpoint base URLs
    pub google_endpoints: GoogleEndpoints,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for signing the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    /// Secret the OAuth token encryption key is derived from
    pub token_encryption_key: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            public_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            database_url: "sqlite::memory:".to_string(),
            port: 8080,
            session_hours: 24,
            metrics_refresh_secs: 60,
            google_endpoints: GoogleEndpoints::default(),
            google_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            token_encryption_key: "test_token_encryption_key".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .into_bytes();

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:personal_crm.db".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            session_hours: env::var("SESSION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            metrics_refresh_secs: env::var("METRICS_REFRESH_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            google_endpoints: env::var("GOOGLE_API_BASE")
                .map(|base| GoogleEndpoints::with_base(&base))
                .unwrap_or_default(),

            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            // Falls back to the session key when not set separately
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map(String::into_bytes)
                .unwrap_or_else(|_| jwt_signing_key.clone()),
            jwt_signing_key,
            token_encryption_key: env::var("TOKEN_ENCRYPTION_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("TOKEN_ENCRYPTION_KEY"))?,
        })
    }

    /// OAuth redirect URI registered with Google.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/google/callback", self.public_url)
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("GOOGLE_CLIENT_ID", "test_id");
        env::set_var("GOOGLE_CLIENT_SECRET", "test_secret");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("TOKEN_ENCRYPTION_KEY", "test_encryption");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.google_client_id, "test_id");
        assert_eq!(config.google_client_secret, "test_secret");
        assert_eq!(config.session_hours, 24);
        assert_eq!(config.oauth_state_key, config.jwt_signing_key);
    }

    #[test]
    fn test_redirect_uri_and_cookie_security() {
        let mut config = Config::default();
        assert_eq!(
            config.redirect_uri(),
            "http://localhost:8080/auth/google/callback"
        );
        assert!(!config.secure_cookies());

        config.public_url = "https://crm.example.com".to_string();
        assert!(config.secure_cookies());
    }
}
