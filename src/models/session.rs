// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and spreadsheet-selection state.
//!
//! A session holds two slots: the Google access token and the selected
//! spreadsheet id. It is rebuilt from cookies on every request and written
//! back by the handlers that change it, so no global state is involved.
//!
//! ```text
//! LoggedOut --login--> NoSpreadsheet --select--> SpreadsheetSelected
//!     ^                      ^                          |
//!     |                      +-----validation failed----+
//!     +------------------logout (from any state)--------+
//! ```

use crate::error::AppError;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Observable state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    LoggedOut,
    NoSpreadsheet,
    SpreadsheetSelected,
}

/// Per-request session built from persisted browser state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    access_token: Option<String>,
    spreadsheet_id: Option<String>,
}

impl Session {
    /// Rebuild a session from persisted values. Empty strings count as absent.
    pub fn restore(access_token: Option<String>, spreadsheet_id: Option<String>) -> Self {
        let access_token = access_token.filter(|t| !t.is_empty());
        // A spreadsheet selection is meaningless without a token.
        let spreadsheet_id = access_token
            .as_ref()
            .and(spreadsheet_id.filter(|id| !id.is_empty()));
        Self {
            access_token,
            spreadsheet_id,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.access_token, &self.spreadsheet_id) {
            (None, _) => SessionState::LoggedOut,
            (Some(_), None) => SessionState::NoSpreadsheet,
            (Some(_), Some(_)) => SessionState::SpreadsheetSelected,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }

    /// Successful login. Any previous selection is kept only if the token
    /// is unchanged, since another account may not see that spreadsheet.
    pub fn login(&mut self, access_token: String) {
        if self.access_token.as_deref() != Some(access_token.as_str()) {
            self.spreadsheet_id = None;
        }
        self.access_token = Some(access_token);
    }

    /// Select a spreadsheet that has already been validated.
    pub fn select_spreadsheet(&mut self, spreadsheet_id: String) -> Result<(), AppError> {
        if self.access_token.is_none() {
            return Err(AppError::Unauthorized);
        }
        self.spreadsheet_id = Some(spreadsheet_id);
        Ok(())
    }

    /// Drop the selection after the stored spreadsheet failed validation.
    /// Returns the id that was cleared.
    pub fn invalidate_spreadsheet(&mut self) -> Option<String> {
        self.spreadsheet_id.take()
    }

    /// Forget everything.
    pub fn logout(&mut self) {
        self.access_token = None;
        self.spreadsheet_id = None;
    }

    /// Token for calls that do not need a spreadsheet.
    pub fn require_token(&self) -> Result<&str, AppError> {
        self.access_token().ok_or(AppError::Unauthorized)
    }

    /// Handle for data calls against the selected spreadsheet.
    pub fn require_spreadsheet(&self) -> Result<SheetHandle, AppError> {
        let access_token = self.require_token()?;
        let spreadsheet_id = self.spreadsheet_id().ok_or(AppError::NoSpreadsheet)?;
        Ok(SheetHandle::new(access_token, spreadsheet_id))
    }
}

/// Credentials and target for a data call against one spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
    pub access_token: String,
    pub spreadsheet_id: String,
}

impl SheetHandle {
    pub fn new(access_token: impl Into<String>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            spreadsheet_id: spreadsheet_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_states() {
        assert_eq!(Session::restore(None, None).state(), SessionState::LoggedOut);
        assert_eq!(
            Session::restore(Some("tok".into()), None).state(),
            SessionState::NoSpreadsheet
        );
        assert_eq!(
            Session::restore(Some("tok".into()), Some("sheet".into())).state(),
            SessionState::SpreadsheetSelected
        );
    }

    #[test]
    fn test_restore_ignores_spreadsheet_without_token() {
        let session = Session::restore(None, Some("sheet".into()));
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert_eq!(session.spreadsheet_id(), None);
    }

    #[test]
    fn test_restore_treats_empty_values_as_absent() {
        let session = Session::restore(Some(String::new()), Some(String::new()));
        assert_eq!(session.state(), SessionState::LoggedOut);

        let session = Session::restore(Some("tok".into()), Some(String::new()));
        assert_eq!(session.state(), SessionState::NoSpreadsheet);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut session = Session::default();
        assert!(matches!(
            session.select_spreadsheet("sheet".into()),
            Err(AppError::Unauthorized)
        ));

        session.login("tok".into());
        assert_eq!(session.state(), SessionState::NoSpreadsheet);

        session.select_spreadsheet("sheet".into()).unwrap();
        assert_eq!(session.state(), SessionState::SpreadsheetSelected);

        assert_eq!(session.invalidate_spreadsheet(), Some("sheet".to_string()));
        assert_eq!(session.state(), SessionState::NoSpreadsheet);

        session.select_spreadsheet("other".into()).unwrap();
        session.logout();
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert_eq!(session.spreadsheet_id(), None);
    }

    #[test]
    fn test_login_with_new_token_drops_selection() {
        let mut session = Session::restore(Some("tok".into()), Some("sheet".into()));
        session.login("tok".into());
        assert_eq!(session.spreadsheet_id(), Some("sheet"));

        session.login("other-tok".into());
        assert_eq!(session.state(), SessionState::NoSpreadsheet);
    }

    #[test]
    fn test_require_spreadsheet() {
        let session = Session::default();
        assert!(matches!(
            session.require_spreadsheet(),
            Err(AppError::Unauthorized)
        ));

        let session = Session::restore(Some("tok".into()), None);
        assert!(matches!(
            session.require_spreadsheet(),
            Err(AppError::NoSpreadsheet)
        ));

        let session = Session::restore(Some("tok".into()), Some("sheet".into()));
        assert_eq!(
            session.require_spreadsheet().unwrap(),
            SheetHandle::new("tok", "sheet")
        );
    }
}
