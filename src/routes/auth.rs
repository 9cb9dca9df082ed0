// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth (implicit flow) and session routes.
//!
//! Google returns the access token in the URL fragment of the page, which
//! then posts it here together with the signed `state` it was given.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_session, clear_spreadsheet, session_from_parts, store_token};
use crate::models::{SessionState, SpreadsheetValidation};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Scopes: read/write spreadsheets, and see files this app created.
pub const GOOGLE_SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.file";

/// How long a signed OAuth state stays acceptable.
const STATE_MAX_AGE_MILLIS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/session", get(get_session).post(login))
        .route("/auth/logout", post(logout))
}

/// Whether an origin is a local development server (any port).
pub fn is_local_origin(origin: &str) -> bool {
    match Url::parse(origin) {
        Ok(url) => {
            url.scheme() == "http" && matches!(url.host_str(), Some("localhost" | "127.0.0.1"))
        }
        Err(_) => false,
    }
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin() && a.has_host(),
        _ => false,
    }
}

/// OAuth may only hand the token to the tracker page or a local dev server.
pub fn is_allowed_redirect(redirect_uri: &str, frontend_url: &str) -> bool {
    same_origin(redirect_uri, frontend_url) || is_local_origin(redirect_uri)
}

// ─── OAuth Start ─────────────────────────────────────────────

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Page URL Google should send the token back to.
    /// If not provided, uses FRONTEND_URL env var.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start OAuth flow - redirect to Google's consent screen.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Redirect> {
    let redirect_uri = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    if !is_allowed_redirect(&redirect_uri, &state.config.frontend_url) {
        return Err(AppError::BadRequest(
            "redirect_uri must point at the tracker page".to_string(),
        ));
    }

    let oauth_state = sign_state(&redirect_uri, &state.config.oauth_state_key, now_millis()?)?;

    let auth_url = format!(
        "{}?\
         client_id={}&\
         redirect_uri={}&\
         response_type=token&\
         scope={}&\
         include_granted_scopes=true&\
         prompt=consent&\
         state={}",
        state.config.google_auth_url,
        urlencoding::encode(&state.config.google_client_id),
        urlencoding::encode(&redirect_uri),
        urlencoding::encode(GOOGLE_SCOPES),
        oauth_state
    );

    tracing::info!(
        redirect_uri = %redirect_uri,
        "Starting OAuth flow, redirecting to Google"
    );

    Ok(Redirect::temporary(&auth_url))
}

// ─── Session ─────────────────────────────────────────────────

/// Token handed back by Google's implicit flow.
#[derive(Deserialize)]
pub struct LoginRequest {
    access_token: String,
    state: String,
    /// Token lifetime in seconds, as reported by Google
    #[serde(default)]
    expires_in: Option<i64>,
}

/// A remembered spreadsheet that could not be used any more.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ClearedSpreadsheet {
    pub spreadsheet_id: String,
    pub validation: SpreadsheetValidation,
    pub message: String,
}

/// Current session state.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub state: SessionState,
    pub spreadsheet_id: Option<String>,
    /// Set when the stored spreadsheet failed validation and was forgotten.
    pub cleared_spreadsheet: Option<ClearedSpreadsheet>,
}

/// Complete login with the token from the OAuth redirect.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    if verify_and_decode_state(&req.state, &state.config.oauth_state_key, now_millis()?).is_none()
    {
        tracing::warn!("Rejected login with invalid or expired OAuth state");
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }

    let access_token = req.access_token.trim();
    if access_token.is_empty() {
        return Err(AppError::BadRequest("access_token is required".to_string()));
    }

    let mut session = session_from_parts(&jar, &headers);
    let had_spreadsheet = session.spreadsheet_id().is_some();
    session.login(access_token.to_string());

    let mut jar = store_token(jar, &state.config, access_token, req.expires_in);
    if had_spreadsheet && session.spreadsheet_id().is_none() {
        jar = clear_spreadsheet(jar);
    }

    tracing::info!(state = ?session.state(), "Login successful");

    Ok((
        jar,
        Json(SessionResponse {
            state: session.state(),
            spreadsheet_id: session.spreadsheet_id().map(str::to_string),
            cleared_spreadsheet: None,
        }),
    ))
}

/// Report the session, validating a remembered spreadsheet on the way.
///
/// A token Google rejects ends the session, as a logout would.
async fn get_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, Json<SessionResponse>) {
    let mut session = session_from_parts(&jar, &headers);
    let mut jar = jar;
    let mut cleared_spreadsheet = None;
    let mut token_rejected = false;

    if let (Some(token), Some(spreadsheet_id)) = (session.access_token(), session.spreadsheet_id())
    {
        let checked = state.sheets.check_spreadsheet(token, spreadsheet_id).await;
        let validation = match checked {
            Ok(validation) => validation,
            Err(e) => {
                tracing::info!(error = %e, "Stored token rejected, ending session");
                token_rejected = true;
                SpreadsheetValidation::Valid
            }
        };

        if !validation.is_valid() {
            tracing::info!(
                spreadsheet_id,
                ?validation,
                "Stored spreadsheet failed validation, clearing selection"
            );
            cleared_spreadsheet = Some(ClearedSpreadsheet {
                spreadsheet_id: spreadsheet_id.to_string(),
                message: validation.describe(),
                validation,
            });
        }
    }

    if token_rejected {
        session.logout();
        jar = clear_session(jar);
    } else if cleared_spreadsheet.is_some() {
        session.invalidate_spreadsheet();
        jar = clear_spreadsheet(jar);
    }

    (
        jar,
        Json(SessionResponse {
            state: session.state(),
            spreadsheet_id: session.spreadsheet_id().map(str::to_string),
            cleared_spreadsheet,
        }),
    )
}

/// Logout - clear the token and the spreadsheet selection.
///
/// Nothing is revoked at Google; the token simply stops being sent.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    tracing::info!("Logout");
    (clear_session(jar), StatusCode::NO_CONTENT)
}

// ─── Signed State ────────────────────────────────────────────

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Sign "redirect_uri|timestamp_hex" and base64 the result for the URL.
pub fn sign_state(redirect_uri: &str, secret: &[u8], now_millis: u128) -> Result<String> {
    let payload = format!("{}|{:x}", redirect_uri, now_millis);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the HMAC signature and age of a state parameter and return the
/// redirect URI it was issued for.
pub fn verify_and_decode_state(state: &str, secret: &[u8], now_millis: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "redirect_uri|timestamp_hex|signature_hex"; split from the
    // right since the URI may itself contain '|'.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let redirect_uri = parts.next()?;

    let payload = format!("{}|{}", redirect_uri, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if !bool::from(signature_hex.as_bytes().ct_eq(expected_signature.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_millis.saturating_sub(issued_at) > STATE_MAX_AGE_MILLIS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(redirect_uri.to_string())
}
