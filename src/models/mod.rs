// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod entry;
pub mod session;
pub mod sheet_file;
pub mod shoe;
pub mod validation;

pub use entry::{Entry, NewEntry};
pub use session::{Session, SessionState, SheetHandle};
pub use sheet_file::SheetFile;
pub use shoe::Shoe;
pub use validation::SpreadsheetValidation;
