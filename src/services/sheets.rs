// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Sheets and Drive API client.
//!
//! Handles:
//! - Spreadsheet creation with the `Shoes` and `Entries` tabs
//! - Spreadsheet validation (tab titles)
//! - Drive listing of the account's spreadsheets
//! - Range reads and single-row appends
//!
//! Every call carries the caller's bearer token; the client itself holds no
//! credentials. Nothing is retried.

use crate::config::Config;
use crate::error::AppError;
use crate::models::validation::{ENTRIES_TAB, SHOES_TAB};
use crate::models::{Entry, NewEntry, SheetFile, SheetHandle, Shoe, SpreadsheetValidation};
use crate::services::row_codec::{self, ENTRIES_HEADER, SHOES_HEADER};
use crate::time_utils::parse_entry_date;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;

/// Data rows of the `Shoes` tab (row 1 is the header).
pub const SHOES_RANGE: &str = "Shoes!A2:D";
/// Data rows of the `Entries` tab (row 1 is the header).
pub const ENTRIES_RANGE: &str = "Entries!A2:D";
/// Append target for new shoes.
pub const SHOES_APPEND_RANGE: &str = "Shoes!A:D";
/// Append target for new entries.
pub const ENTRIES_APPEND_RANGE: &str = "Entries!A:D";

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
/// Upper bound on Drive pages fetched for one listing.
const MAX_DRIVE_PAGES: usize = 10;
const DRIVE_PAGE_SIZE: u32 = 100;

/// Google Sheets / Drive API client.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    sheets_url: String,
    drive_url: String,
    spreadsheet_title: String,
}

impl SheetsClient {
    /// Create a client using the API endpoints from config.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            sheets_url: config.sheets_api_url.clone(),
            drive_url: config.drive_api_url.clone(),
            spreadsheet_title: config.spreadsheet_title.clone(),
        }
    }

    // ─── Spreadsheet Management ──────────────────────────────────────────────

    /// Create a new tracker spreadsheet and return its id.
    ///
    /// The spreadsheet gets exactly two tabs, each with a header row so the
    /// data ranges starting at row 2 see every appended row.
    pub async fn create_spreadsheet(&self, access_token: &str) -> Result<String, AppError> {
        let url = format!("{}/spreadsheets", self.sheets_url);

        let body = CreateSpreadsheetRequest {
            properties: SpreadsheetProperties {
                title: self.spreadsheet_title.clone(),
            },
            sheets: vec![
                SheetSpec {
                    properties: SheetProperties {
                        title: SHOES_TAB.to_string(),
                    },
                },
                SheetSpec {
                    properties: SheetProperties {
                        title: ENTRIES_TAB.to_string(),
                    },
                },
            ],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let created: CreateSpreadsheetResponse = self.check_response_json(response).await?;
        let sheet = SheetHandle::new(access_token, created.spreadsheet_id.as_str());

        if let Err(e) = self.write_headers(&sheet).await {
            // The spreadsheet exists in the user's Drive but is never selected.
            tracing::error!(
                spreadsheet_id = %created.spreadsheet_id,
                error = %e,
                "Writing header rows failed, spreadsheet left unselected"
            );
            return Err(e);
        }

        tracing::info!(spreadsheet_id = %created.spreadsheet_id, "Created tracker spreadsheet");
        Ok(created.spreadsheet_id)
    }

    async fn write_headers(&self, sheet: &SheetHandle) -> Result<(), AppError> {
        self.append_rows(sheet, "Shoes!A1:D1", vec![header_row(&SHOES_HEADER)])
            .await?;
        self.append_rows(sheet, "Entries!A1:D1", vec![header_row(&ENTRIES_HEADER)])
            .await
    }

    /// Check that a spreadsheet exists, is readable, and has both tabs.
    ///
    /// Never fails: every problem is reported as a validation outcome, with
    /// a rejected token counted as [`SpreadsheetValidation::AccessDenied`].
    pub async fn validate_spreadsheet(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
    ) -> SpreadsheetValidation {
        self.check_spreadsheet(access_token, spreadsheet_id)
            .await
            .unwrap_or(SpreadsheetValidation::AccessDenied)
    }

    /// Like [`validate_spreadsheet`](Self::validate_spreadsheet), except that
    /// Google rejecting the token itself (401) is `AppError::InvalidToken`.
    ///
    /// Used before clearing a stored selection: an expired token says
    /// nothing about the spreadsheet.
    pub async fn check_spreadsheet(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetValidation, AppError> {
        let url = format!(
            "{}/spreadsheets/{}",
            self.sheets_url,
            urlencoding::encode(spreadsheet_id)
        );

        let response = match self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("includeGridData", "false"),
                ("fields", "sheets.properties.title"),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, spreadsheet_id, "Spreadsheet validation request failed");
                return Ok(SpreadsheetValidation::TransportError {
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        match status.as_u16() {
            401 => {
                tracing::info!(spreadsheet_id, "Token rejected while validating spreadsheet");
                return Err(AppError::InvalidToken);
            }
            403 => return Ok(SpreadsheetValidation::AccessDenied),
            404 => return Ok(SpreadsheetValidation::NotFound),
            _ if !status.is_success() => {
                return Ok(SpreadsheetValidation::TransportError {
                    message: format!("HTTP {}", status),
                })
            }
            _ => {}
        }

        let metadata: SpreadsheetMetadata = match response.json().await {
            Ok(m) => m,
            Err(e) => {
                return Ok(SpreadsheetValidation::TransportError {
                    message: format!("JSON parse error: {}", e),
                })
            }
        };

        let validation = SpreadsheetValidation::from_tab_titles(
            metadata
                .sheets
                .iter()
                .map(|sheet| sheet.properties.title.as_str()),
        );
        tracing::debug!(spreadsheet_id, ?validation, "Validated spreadsheet");
        Ok(validation)
    }

    /// List spreadsheets in the account's Drive that are not trashed.
    pub async fn list_user_sheets(&self, access_token: &str) -> Result<Vec<SheetFile>, AppError> {
        let url = format!("{}/files", self.drive_url);
        let query = format!("mimeType='{}' and trashed=false", SPREADSHEET_MIME_TYPE);

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_DRIVE_PAGES {
            let mut params = vec![
                ("q", query.clone()),
                ("fields", "nextPageToken,files(id,name)".to_string()),
                ("pageSize", DRIVE_PAGE_SIZE.to_string()),
            ];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .query(&params)
                .send()
                .await
                .map_err(|e| AppError::Transport(e.to_string()))?;

            let page: DriveFileList = self.check_response_json(response).await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(files),
            }
        }

        tracing::warn!(
            count = files.len(),
            "Drive listing truncated after {} pages",
            MAX_DRIVE_PAGES
        );
        Ok(files)
    }

    // ─── Shoes ───────────────────────────────────────────────────────────────

    /// Read every shoe row.
    pub async fn list_shoes(&self, sheet: &SheetHandle) -> Result<Vec<Shoe>, AppError> {
        let rows = self.read_range(sheet, SHOES_RANGE).await?;
        Ok(row_codec::decode_shoes(&rows))
    }

    /// Add a shoe under a fresh identifier.
    pub async fn create_shoe(&self, sheet: &SheetHandle, name: &str) -> Result<Shoe, AppError> {
        let shoe = Shoe::new(new_row_id(), name.to_string());
        self.append_shoe(sheet, &shoe).await?;
        Ok(shoe)
    }

    /// Append one shoe row. The total column is written as a formula.
    pub async fn append_shoe(&self, sheet: &SheetHandle, shoe: &Shoe) -> Result<(), AppError> {
        self.append_rows(sheet, SHOES_APPEND_RANGE, vec![row_codec::encode_shoe(shoe)])
            .await
    }

    // ─── Entries ─────────────────────────────────────────────────────────────

    /// Read every entry row, newest first.
    pub async fn list_entries(&self, sheet: &SheetHandle) -> Result<Vec<Entry>, AppError> {
        let rows = self.read_range(sheet, ENTRIES_RANGE).await?;
        let mut entries = row_codec::decode_entries(&rows);
        sort_entries_newest_first(&mut entries);
        Ok(entries)
    }

    /// Log an entry under a fresh identifier.
    pub async fn create_entry(
        &self,
        sheet: &SheetHandle,
        new_entry: NewEntry,
    ) -> Result<Entry, AppError> {
        let entry = new_entry.into_entry(new_row_id());
        self.append_entry(sheet, &entry).await?;
        Ok(entry)
    }

    /// Append one entry row.
    pub async fn append_entry(&self, sheet: &SheetHandle, entry: &Entry) -> Result<(), AppError> {
        self.append_rows(
            sheet,
            ENTRIES_APPEND_RANGE,
            vec![row_codec::encode_entry(entry)],
        )
        .await
    }

    // ─── Range Helpers ───────────────────────────────────────────────────────

    /// Read a range; an empty range yields no rows.
    async fn read_range(
        &self,
        sheet: &SheetHandle,
        range: &str,
    ) -> Result<Vec<Vec<Value>>, AppError> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.sheets_url,
            urlencoding::encode(&sheet.spreadsheet_id),
            range
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&sheet.access_token)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let value_range: ValueRange = self.check_response_json(response).await?;
        Ok(value_range.values)
    }

    /// Append rows after the existing data of a range.
    async fn append_rows(
        &self,
        sheet: &SheetHandle,
        range: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), AppError> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}:append",
            self.sheets_url,
            urlencoding::encode(&sheet.spreadsheet_id),
            range
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&sheet.access_token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&AppendRequest { values: rows })
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        self.check_response(response).await?;
        tracing::debug!(spreadsheet_id = %sheet.spreadsheet_id, range, "Appended row");
        Ok(())
    }

    /// Check response status and return error if not successful.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::status_error(response).await)
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("JSON parse error: {}", e)))
    }

    async fn status_error(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Google API request failed");

        AppError::GoogleApi {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

/// Fresh random row identifier.
pub fn new_row_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Spreadsheet ids are URL-safe base64-like tokens.
pub fn is_plausible_spreadsheet_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Order entries by date, newest first. Equal dates keep their sheet order;
/// dates that cannot be parsed go last.
pub fn sort_entries_newest_first(entries: &mut [Entry]) {
    entries.sort_by_cached_key(|entry| Reverse(parse_entry_date(&entry.date)));
}

fn header_row(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

// ─── Wire Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateSpreadsheetRequest {
    properties: SpreadsheetProperties,
    sheets: Vec<SheetSpec>,
}

#[derive(Debug, Serialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SheetSpec {
    properties: SheetProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSpreadsheetResponse {
    spreadsheet_id: String,
}

/// Spreadsheet metadata restricted to tab titles.
#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetSpec>,
}

/// Values of a range. `values` is absent when the range is empty.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendRequest {
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<SheetFile>,
    next_page_token: Option<String>,
}
