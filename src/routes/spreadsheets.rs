// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spreadsheet picker: list, create, and select the backing spreadsheet.

use crate::error::{AppError, Result};
use crate::middleware::auth::store_spreadsheet;
use crate::models::{Session, SheetFile, SpreadsheetValidation};
use crate::services::sheets::is_plausible_spreadsheet_id;
use crate::services::tracker::fail_open;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Spreadsheet routes (require a Google token).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/spreadsheets",
            get(list_spreadsheets).post(create_spreadsheet),
        )
        .route("/api/spreadsheets/select", post(select_spreadsheet))
        .route(
            "/api/spreadsheets/{spreadsheet_id}/validation",
            get(validate_spreadsheet),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpreadsheetsResponse {
    pub spreadsheets: Vec<SheetFile>,
}

/// The spreadsheet now selected for the session.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SelectedSpreadsheet {
    pub spreadsheet_id: String,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    spreadsheet_id: String,
}

/// List the account's spreadsheets. Failures show as an empty list.
async fn list_spreadsheets(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<SpreadsheetsResponse>> {
    let token = session.require_token()?;
    let spreadsheets = fail_open(state.sheets.list_user_sheets(token).await, "spreadsheets")?;

    tracing::debug!(count = spreadsheets.len(), "Listed spreadsheets");
    Ok(Json(SpreadsheetsResponse { spreadsheets }))
}

/// Create a new tracker spreadsheet and select it.
async fn create_spreadsheet(
    State(state): State<Arc<AppState>>,
    Extension(mut session): Extension<Session>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SelectedSpreadsheet>)> {
    let token = session.require_token()?.to_string();
    let spreadsheet_id = state.sheets.create_spreadsheet(&token).await?;

    session.select_spreadsheet(spreadsheet_id.clone())?;
    let jar = store_spreadsheet(jar, &state.config, &spreadsheet_id);

    Ok((jar, Json(SelectedSpreadsheet { spreadsheet_id })))
}

/// Select an existing spreadsheet after checking it has both tabs.
async fn select_spreadsheet(
    State(state): State<Arc<AppState>>,
    Extension(mut session): Extension<Session>,
    jar: CookieJar,
    Json(req): Json<SelectRequest>,
) -> Result<(CookieJar, Json<SelectedSpreadsheet>)> {
    let spreadsheet_id = req.spreadsheet_id.trim().to_string();
    if !is_plausible_spreadsheet_id(&spreadsheet_id) {
        return Err(AppError::BadRequest("Invalid spreadsheet id".to_string()));
    }

    let token = session.require_token()?.to_string();
    let validation = state
        .sheets
        .check_spreadsheet(&token, &spreadsheet_id)
        .await?;
    if !validation.is_valid() {
        tracing::info!(spreadsheet_id = %spreadsheet_id, ?validation, "Rejected spreadsheet");
        return Err(AppError::InvalidSpreadsheet(validation));
    }

    session.select_spreadsheet(spreadsheet_id.clone())?;
    let jar = store_spreadsheet(jar, &state.config, &spreadsheet_id);

    tracing::info!(spreadsheet_id = %spreadsheet_id, "Selected spreadsheet");
    Ok((jar, Json(SelectedSpreadsheet { spreadsheet_id })))
}

/// Report whether a spreadsheet can back the tracker, and why not.
async fn validate_spreadsheet(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(spreadsheet_id): Path<String>,
) -> Result<Json<SpreadsheetValidation>> {
    if !is_plausible_spreadsheet_id(&spreadsheet_id) {
        return Err(AppError::BadRequest("Invalid spreadsheet id".to_string()));
    }

    let token = session.require_token()?;
    Ok(Json(
        state
            .sheets
            .validate_spreadsheet(token, &spreadsheet_id)
            .await,
    ))
}
