// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware and session cookies.
//!
//! The Google access token and the selected spreadsheet id live in two
//! cookies. Non-browser callers may send them as `Authorization: Bearer`
//! and `X-Spreadsheet-Id` instead; cookies win when both are present.

use crate::config::Config;
use crate::models::{Session, SessionState};
use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Cookie holding the Google access token.
pub const TOKEN_COOKIE: &str = "googleToken";
/// Cookie holding the selected spreadsheet id.
pub const SPREADSHEET_COOKIE: &str = "spreadsheetId";
/// Header alternative to [`SPREADSHEET_COOKIE`].
pub const SPREADSHEET_HEADER: &str = "x-spreadsheet-id";

/// Lifetime of the spreadsheet selection cookie.
const SPREADSHEET_COOKIE_DAYS: i64 = 365;
/// Google implicit-flow tokens last an hour unless told otherwise.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 60 * 60;

/// Rebuild the session from request cookies and headers.
pub fn session_from_parts(jar: &CookieJar, headers: &HeaderMap) -> Session {
    let access_token = jar
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(headers));

    let spreadsheet_id = jar
        .get(SPREADSHEET_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            headers
                .get(SPREADSHEET_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        });

    Session::restore(access_token, spreadsheet_id)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Middleware that requires a logged-in session.
///
/// Inserts the [`Session`] into request extensions for the handlers.
pub async fn require_session(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let jar = CookieJar::from_headers(request.headers());
    let session = session_from_parts(&jar, request.headers());

    if session.state() == SessionState::LoggedOut {
        return Err(StatusCode::UNAUTHORIZED);
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

// ─── Cookies ─────────────────────────────────────────────────

/// Store the access token. The cookie expires with the token so an expired
/// token means logging in again.
pub fn store_token(
    jar: CookieJar,
    config: &Config,
    access_token: &str,
    expires_in_secs: Option<i64>,
) -> CookieJar {
    let lifetime = expires_in_secs
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

    jar.add(
        Cookie::build((TOKEN_COOKIE, access_token.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(config.secure_cookies())
            .max_age(time::Duration::seconds(lifetime)),
    )
}

/// Remember the selected spreadsheet.
pub fn store_spreadsheet(jar: CookieJar, config: &Config, spreadsheet_id: &str) -> CookieJar {
    jar.add(
        Cookie::build((SPREADSHEET_COOKIE, spreadsheet_id.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(config.secure_cookies())
            .max_age(time::Duration::days(SPREADSHEET_COOKIE_DAYS)),
    )
}

/// Forget the selected spreadsheet.
pub fn clear_spreadsheet(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SPREADSHEET_COOKIE).path("/"))
}

/// Forget everything (logout).
pub fn clear_session(jar: CookieJar) -> CookieJar {
    clear_spreadsheet(jar).remove(Cookie::build(TOKEN_COOKIE).path("/"))
}
