// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outcome of checking that a spreadsheet can back the tracker.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Tab holding one row per shoe.
pub const SHOES_TAB: &str = "Shoes";
/// Tab holding one row per logged run.
pub const ENTRIES_TAB: &str = "Entries";
/// Every tab a tracker spreadsheet must have.
pub const REQUIRED_TABS: [&str; 2] = [SHOES_TAB, ENTRIES_TAB];

/// Why a spreadsheet can or cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpreadsheetValidation {
    /// Both required tabs exist.
    Valid,
    /// No spreadsheet with this id (deleted, or never existed).
    NotFound,
    /// The token cannot read this spreadsheet.
    AccessDenied,
    /// The spreadsheet exists but lacks required tabs.
    WrongShape { missing: Vec<String> },
    /// The check itself failed (network, unexpected status or body).
    TransportError { message: String },
}

impl SpreadsheetValidation {
    /// Classify a spreadsheet by its tab titles.
    pub fn from_tab_titles<'a, I>(titles: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let titles: Vec<&str> = titles.into_iter().collect();
        let missing: Vec<String> = REQUIRED_TABS
            .iter()
            .filter(|tab| !titles.contains(tab))
            .map(|tab| tab.to_string())
            .collect();

        if missing.is_empty() {
            SpreadsheetValidation::Valid
        } else {
            SpreadsheetValidation::WrongShape { missing }
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SpreadsheetValidation::Valid)
    }

    /// Human-readable reason, shown when a selection is rejected or cleared.
    pub fn describe(&self) -> String {
        match self {
            SpreadsheetValidation::Valid => "Spreadsheet is valid".to_string(),
            SpreadsheetValidation::NotFound => "Spreadsheet no longer exists".to_string(),
            SpreadsheetValidation::AccessDenied => {
                "Spreadsheet is not accessible with this account".to_string()
            }
            SpreadsheetValidation::WrongShape { missing } => format!(
                "Spreadsheet was not created by this app (missing tabs: {})",
                missing.join(", ")
            ),
            SpreadsheetValidation::TransportError { message } => {
                format!("Could not check spreadsheet: {}", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_tabs_present() {
        let v = SpreadsheetValidation::from_tab_titles(["Entries", "Shoes", "Notes"]);
        assert!(v.is_valid());
    }

    #[test]
    fn test_missing_tab_reported() {
        let v = SpreadsheetValidation::from_tab_titles(["Shoes", "Sheet1"]);
        assert_eq!(
            v,
            SpreadsheetValidation::WrongShape {
                missing: vec!["Entries".to_string()]
            }
        );
        assert!(!v.is_valid());
    }

    #[test]
    fn test_titles_are_case_sensitive() {
        let v = SpreadsheetValidation::from_tab_titles(["shoes", "entries"]);
        assert_eq!(
            v,
            SpreadsheetValidation::WrongShape {
                missing: vec!["Shoes".to_string(), "Entries".to_string()]
            }
        );
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let json = serde_json::to_value(SpreadsheetValidation::WrongShape {
            missing: vec!["Shoes".to_string()],
        })
        .unwrap();
        assert_eq!(json["status"], "wrong_shape");
        assert_eq!(json["missing"][0], "Shoes");

        let json = serde_json::to_value(SpreadsheetValidation::Valid).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "valid" }));
    }
}
