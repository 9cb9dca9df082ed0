//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4";
const DEFAULT_DRIVE_API_URL: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_SPREADSHEET_TITLE: &str = "Shoe Mileage Tracker";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Frontend URL for OAuth redirects and CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Sheets API v4 base URL (overridable for tests)
    pub sheets_api_url: String,
    /// Drive API v3 base URL (overridable for tests)
    pub drive_api_url: String,
    /// Google OAuth authorization endpoint
    pub google_auth_url: String,
    /// Title given to newly created spreadsheets
    pub spreadsheet_title: String,

    // --- Secrets ---
    /// HMAC key for signing the OAuth state parameter (raw bytes)
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?;
        if oauth_state_key.is_empty() {
            return Err(ConfigError::Invalid("OAUTH_STATE_KEY", "must not be empty"));
        }

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            sheets_api_url: env_url("SHEETS_API_URL", DEFAULT_SHEETS_API_URL),
            drive_api_url: env_url("DRIVE_API_URL", DEFAULT_DRIVE_API_URL),
            google_auth_url: env_url("GOOGLE_AUTH_URL", DEFAULT_GOOGLE_AUTH_URL),
            spreadsheet_title: env::var("SPREADSHEET_TITLE")
                .unwrap_or_else(|_| DEFAULT_SPREADSHEET_TITLE.to_string()),
            oauth_state_key: oauth_state_key.into_bytes(),
        })
    }

    /// Config for tests, pointing at the real Google endpoints.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id.apps.googleusercontent.com".to_string(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            port: 8080,
            sheets_api_url: DEFAULT_SHEETS_API_URL.to_string(),
            drive_api_url: DEFAULT_DRIVE_API_URL.to_string(),
            google_auth_url: DEFAULT_GOOGLE_AUTH_URL.to_string(),
            spreadsheet_title: DEFAULT_SPREADSHEET_TITLE.to_string(),
            oauth_state_key: b"test_oauth_state_key_32_bytes!!!".to_vec(),
        }
    }

    /// Cookies are only marked `Secure` when the frontend is served over HTTPS.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Read a base URL, dropping any trailing slash.
fn env_url(key: &str, default: &str) -> String {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable {0}: {1}")]
    Invalid(&'static str, &'static str),
}
