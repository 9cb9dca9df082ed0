// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for shoes and entries of the selected spreadsheet.

use crate::error::{AppError, Result};
use crate::middleware::auth::clear_spreadsheet;
use crate::models::{Entry, NewEntry, Session, Shoe};
use crate::services::mileage::{computed_miles, total_miles_by_shoe, totals_diverge};
use crate::services::tracker::fail_open;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Label for entries whose shoe id matches no shoe row.
pub const UNKNOWN_SHOE: &str = "Unknown Shoe";

/// API routes (require a session).
/// The session middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/overview", get(get_overview))
        .route("/api/shoes", get(list_shoes).post(add_shoe))
        .route("/api/entries", get(list_entries).post(add_entry))
}

// ─── Shoes ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShoesResponse {
    pub shoes: Vec<Shoe>,
}

#[derive(Deserialize)]
pub struct AddShoeRequest {
    name: String,
}

/// List all shoes. Failures show as an empty list.
async fn list_shoes(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ShoesResponse>> {
    let sheet = session.require_spreadsheet()?;
    let shoes = fail_open(state.sheets.list_shoes(&sheet).await, "shoes")?;
    Ok(Json(ShoesResponse { shoes }))
}

/// Add a shoe.
async fn add_shoe(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<AddShoeRequest>,
) -> Result<(StatusCode, Json<Shoe>)> {
    let sheet = session.require_spreadsheet()?;
    let shoe = state.tracker.add_shoe(&sheet, &req.name).await?;
    Ok((StatusCode::CREATED, Json(shoe)))
}

// ─── Entries ─────────────────────────────────────────────────

/// Entry as listed, with the shoe name resolved for display.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EntryView {
    pub id: String,
    pub shoe_id: String,
    pub shoe_name: String,
    pub date: String,
    pub miles: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EntriesResponse {
    /// Newest first
    pub entries: Vec<EntryView>,
}

/// Attach shoe names to entries, keeping their order.
pub fn entry_views(entries: Vec<Entry>, shoes: &[Shoe]) -> Vec<EntryView> {
    entries
        .into_iter()
        .map(|e| {
            let shoe_name = shoes
                .iter()
                .find(|s| s.id == e.shoe_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| UNKNOWN_SHOE.to_string());
            EntryView {
                id: e.id,
                shoe_id: e.shoe_id,
                shoe_name,
                date: e.date,
                miles: e.miles,
            }
        })
        .collect()
}

/// List entries, newest first. Failures show as an empty list.
async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<EntriesResponse>> {
    let sheet = session.require_spreadsheet()?;
    let snapshot = state.tracker.snapshot(&sheet).await?;
    Ok(Json(EntriesResponse {
        entries: entry_views(snapshot.entries, &snapshot.shoes),
    }))
}

/// Log an entry for an active shoe.
async fn add_entry(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<NewEntry>,
) -> Result<(StatusCode, Json<Entry>)> {
    let sheet = session.require_spreadsheet()?;
    let entry = state.tracker.log_entry(&sheet, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// ─── Overview ────────────────────────────────────────────────

/// Shoe with both the sheet's total and the total computed from entries.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ShoeSummary {
    pub id: String,
    pub name: String,
    pub archived: bool,
    /// Evaluated by the spreadsheet formula
    pub total_miles: f64,
    /// Sum of the listed entries for this shoe
    pub computed_miles: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OverviewResponse {
    pub spreadsheet_id: String,
    pub shoes: Vec<ShoeSummary>,
    /// Shoes that may receive new entries
    pub active_shoes: Vec<Shoe>,
    /// Newest first
    pub entries: Vec<EntryView>,
}

/// Everything the page shows after loading: validates the selected
/// spreadsheet, then reads shoes and entries together.
///
/// A spreadsheet that fails validation is forgotten and reported as 422; a
/// rejected token is reported as 401 and the selection is left alone.
async fn get_overview(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
) -> Result<Response> {
    let sheet = session.require_spreadsheet()?;

    let validation = state
        .sheets
        .check_spreadsheet(&sheet.access_token, &sheet.spreadsheet_id)
        .await?;
    if !validation.is_valid() {
        tracing::info!(
            spreadsheet_id = %sheet.spreadsheet_id,
            ?validation,
            "Selected spreadsheet failed validation, clearing selection"
        );
        return Ok((
            clear_spreadsheet(jar),
            AppError::InvalidSpreadsheet(validation),
        )
            .into_response());
    }

    let snapshot = state.tracker.snapshot(&sheet).await?;
    let totals = total_miles_by_shoe(&snapshot.entries);

    let shoes: Vec<ShoeSummary> = snapshot
        .shoes
        .iter()
        .map(|shoe| {
            let computed = computed_miles(&totals, shoe);
            if totals_diverge(shoe.total_miles, computed) {
                tracing::debug!(
                    shoe_id = %shoe.id,
                    sheet_total = shoe.total_miles,
                    computed_total = computed,
                    "Sheet total differs from computed total"
                );
            }
            ShoeSummary {
                id: shoe.id.clone(),
                name: shoe.name.clone(),
                archived: shoe.archived,
                total_miles: shoe.total_miles,
                computed_miles: computed,
            }
        })
        .collect();

    let active_shoes: Vec<Shoe> = snapshot
        .shoes
        .iter()
        .filter(|s| s.accepts_entries())
        .cloned()
        .collect();

    let entries = entry_views(snapshot.entries, &snapshot.shoes);

    Ok(Json(OverviewResponse {
        spreadsheet_id: sheet.spreadsheet_id,
        shoes,
        active_shoes,
        entries,
    })
    .into_response())
}
