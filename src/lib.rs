// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Shoe Mileage Tracker: log runs per pair of shoes in a Google Spreadsheet
//!
//! This crate provides the backend API for a browser page that keeps its
//! data in the user's own spreadsheet. Shoes and entries are rows of two
//! tabs; per-shoe totals are evaluated by a formula in the sheet.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{SheetsClient, TrackerService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sheets: SheetsClient,
    pub tracker: TrackerService,
}

impl AppState {
    /// Build the state for a configuration.
    pub fn new(config: Config) -> Self {
        let sheets = SheetsClient::new(&config);
        let tracker = TrackerService::new(sheets.clone());
        Self {
            config,
            sheets,
            tracker,
        }
    }
}
