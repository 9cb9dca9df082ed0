// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Mileage entry model stored as a row of the `Entries` tab.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One logged run. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Entry {
    /// Random identifier generated when the entry is logged
    pub id: String,
    /// Id of the shoe worn (no referential integrity in the sheet)
    pub shoe_id: String,
    /// Calendar date as entered, normally "YYYY-MM-DD"
    pub date: String,
    /// Distance in miles
    pub miles: f64,
}

/// Fields supplied when logging a new entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewEntry {
    pub shoe_id: String,
    pub date: String,
    pub miles: f64,
}

impl NewEntry {
    /// Attach a generated identifier, producing the stored record.
    pub fn into_entry(self, id: String) -> Entry {
        Entry {
            id,
            shoe_id: self.shoe_id,
            date: self.date,
            miles: self.miles,
        }
    }
}
