// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracker service: the write-side rules on top of the Sheets client.
//!
//! The sheet enforces nothing, so this layer:
//! - trims and bounds shoe names
//! - only logs entries for existing, non-archived shoes
//! - refuses to append a row whose generated id already exists

use crate::error::AppError;
use crate::models::{Entry, NewEntry, SheetHandle, Shoe};
use crate::services::sheets::{new_row_id, SheetsClient};
use crate::time_utils::is_iso_date;

/// Longest accepted shoe name, in characters.
pub const MAX_SHOE_NAME_CHARS: usize = 100;

/// Shoes and entries of one spreadsheet, read together.
#[derive(Debug, Clone, Default)]
pub struct TrackerSnapshot {
    pub shoes: Vec<Shoe>,
    /// Newest first
    pub entries: Vec<Entry>,
}

/// High-level service used by the route handlers.
#[derive(Clone)]
pub struct TrackerService {
    sheets: SheetsClient,
}

impl TrackerService {
    pub fn new(sheets: SheetsClient) -> Self {
        Self { sheets }
    }

    /// Add a shoe after validating its name.
    pub async fn add_shoe(&self, sheet: &SheetHandle, name: &str) -> Result<Shoe, AppError> {
        let name = normalize_shoe_name(name)?;

        let existing = self.sheets.list_shoes(sheet).await?;
        let id = new_row_id();
        ensure_unique_id(&id, existing.iter().map(|s| s.id.as_str()))?;

        let shoe = Shoe::new(id, name);
        self.sheets.append_shoe(sheet, &shoe).await?;

        tracing::info!(
            spreadsheet_id = %sheet.spreadsheet_id,
            shoe_id = %shoe.id,
            "Added shoe"
        );
        Ok(shoe)
    }

    /// Log an entry against an active shoe.
    pub async fn log_entry(
        &self,
        sheet: &SheetHandle,
        new_entry: NewEntry,
    ) -> Result<Entry, AppError> {
        validate_new_entry(&new_entry)?;

        let (shoes, entries) = tokio::try_join!(
            self.sheets.list_shoes(sheet),
            self.sheets.list_entries(sheet)
        )?;

        let shoe = shoes
            .iter()
            .find(|s| s.id == new_entry.shoe_id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown shoe: {}", new_entry.shoe_id)))?;
        if !shoe.accepts_entries() {
            return Err(AppError::BadRequest(format!(
                "Shoe is archived: {}",
                shoe.name
            )));
        }

        let id = new_row_id();
        ensure_unique_id(&id, entries.iter().map(|e| e.id.as_str()))?;

        let entry = new_entry.into_entry(id);
        self.sheets.append_entry(sheet, &entry).await?;

        tracing::info!(
            spreadsheet_id = %sheet.spreadsheet_id,
            entry_id = %entry.id,
            shoe_id = %entry.shoe_id,
            miles = entry.miles,
            "Logged entry"
        );
        Ok(entry)
    }

    /// Read shoes and entries concurrently. Each read fails open to an empty
    /// list, except when Google rejects the token.
    pub async fn snapshot(&self, sheet: &SheetHandle) -> Result<TrackerSnapshot, AppError> {
        let (shoes, entries) = tokio::join!(
            self.sheets.list_shoes(sheet),
            self.sheets.list_entries(sheet)
        );

        Ok(TrackerSnapshot {
            shoes: fail_open(shoes, "shoes")?,
            entries: fail_open(entries, "entries")?,
        })
    }
}

/// Reads fail open: errors become an empty list with a warning, except an
/// invalid token, which the caller must see to log in again.
pub fn fail_open<T>(result: Result<Vec<T>, AppError>, what: &str) -> Result<Vec<T>, AppError> {
    match result {
        Ok(items) => Ok(items),
        Err(e) if e.is_token_error() => Err(AppError::InvalidToken),
        Err(e) => {
            tracing::warn!(error = %e, what, "Read failed, showing empty list");
            Ok(Vec::new())
        }
    }
}

/// Trim a shoe name and check it is usable.
pub fn normalize_shoe_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Shoe name is required".to_string()));
    }
    if name.chars().count() > MAX_SHOE_NAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "Shoe name must be at most {} characters",
            MAX_SHOE_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

/// Check the entry form fields.
pub fn validate_new_entry(entry: &NewEntry) -> Result<(), AppError> {
    if entry.shoe_id.trim().is_empty() {
        return Err(AppError::BadRequest("Shoe is required".to_string()));
    }
    if !is_iso_date(&entry.date) {
        return Err(AppError::BadRequest(
            "Date must be formatted as YYYY-MM-DD".to_string(),
        ));
    }
    if !entry.miles.is_finite() || entry.miles < 0.0 {
        return Err(AppError::BadRequest(
            "Miles must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

/// A generated id must not already be present in the tab.
pub fn ensure_unique_id<'a, I>(id: &str, existing: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    if existing.into_iter().any(|e| e == id) {
        return Err(AppError::IdCollision(id.to_string()));
    }
    Ok(())
}
