// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::SpreadsheetValidation;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("No spreadsheet selected")]
    NoSpreadsheet,

    #[error("Invalid spreadsheet: {}", .0.describe())]
    InvalidSpreadsheet(SpreadsheetValidation),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Generated identifier already exists: {0}")]
    IdCollision(String),

    #[error("Google API error: {status} {reason}")]
    GoogleApi { status: u16, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether Google rejected the access token itself.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidToken | AppError::GoogleApi { status: 401, .. }
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NoSpreadsheet => (StatusCode::CONFLICT, "no_spreadsheet", None),
            AppError::InvalidSpreadsheet(validation) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_spreadsheet",
                Some(validation.describe()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::IdCollision(id) => {
                tracing::error!(id = %id, "Generated identifier collided with an existing row");
                (StatusCode::CONFLICT, "id_collision", None)
            }
            AppError::GoogleApi { status: 401, .. } => {
                (StatusCode::UNAUTHORIZED, "invalid_token", None)
            }
            AppError::GoogleApi { status, reason } => (
                StatusCode::BAD_GATEWAY,
                "google_api_error",
                Some(format!("{} {}", status, reason)),
            ),
            AppError::Transport(msg) => {
                tracing::warn!(error = %msg, "Google API unreachable");
                (StatusCode::BAD_GATEWAY, "transport_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
