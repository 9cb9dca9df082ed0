// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Shoe model stored as a row of the `Shoes` tab.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A pair of shoes whose mileage is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Shoe {
    /// Random identifier generated when the shoe is added (column A)
    pub id: String,
    /// Display name, e.g. "Nike Pegasus" (column B)
    pub name: String,
    /// Archived shoes are listed but cannot receive new entries (column C)
    pub archived: bool,
    /// Sum of all entry miles for this shoe, evaluated by the spreadsheet (column D)
    pub total_miles: f64,
}

impl Shoe {
    /// A freshly added shoe: not archived, no miles yet.
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            archived: false,
            total_miles: 0.0,
        }
    }

    /// Whether new entries may reference this shoe.
    pub fn accepts_entries(&self) -> bool {
        !self.archived
    }
}
