// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod mileage;
pub mod row_codec;
pub mod sheets;
pub mod tracker;

pub use sheets::SheetsClient;
pub use tracker::{TrackerService, TrackerSnapshot};
