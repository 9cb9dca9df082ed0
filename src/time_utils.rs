// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for entry dates.

use chrono::{DateTime, NaiveDate};

/// Parse an entry date as stored in the sheet.
///
/// Accepts ISO dates ("2024-01-15"), RFC 3339 timestamps, and the US
/// rendering Sheets uses for date cells ("1/15/2024").
pub fn parse_entry_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(date)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| NaiveDate::parse_from_str(date, "%m/%d/%Y").ok())
}

/// Strict check used for form input: only "YYYY-MM-DD" is accepted.
pub fn is_iso_date(date: &str) -> bool {
    date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}
