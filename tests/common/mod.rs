// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: an in-process fake of the Sheets and Drive APIs.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use shoe_mileage_tracker::config::Config;
use shoe_mileage_tracker::routes::create_router;
use shoe_mileage_tracker::services::SheetsClient;
use shoe_mileage_tracker::AppState;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// The only access token the fake accepts.
#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-access-token";

/// One fake spreadsheet: tab title -> rows (row 1 first).
#[derive(Debug, Clone, Default)]
pub struct FakeSpreadsheet {
    pub title: String,
    pub tabs: Vec<String>,
    pub rows: HashMap<String, Vec<Vec<String>>>,
}

/// Record of one append call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct AppendCall {
    pub spreadsheet_id: String,
    pub range: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub spreadsheets: HashMap<String, FakeSpreadsheet>,
    pub appends: Vec<AppendCall>,
    pub next_id: u32,
    pub fail_creates: bool,
    pub fail_reads: bool,
    pub fail_appends: bool,
    /// Spreadsheets the test token may not open.
    pub forbidden: HashSet<String>,
    /// Most files Drive returns per page, below what the client asks for.
    pub drive_page_size: Option<usize>,
    pub drive_requests: usize,
}

type Shared = Arc<Mutex<FakeState>>;

/// Fake Google APIs listening on an ephemeral local port.
pub struct FakeGoogle {
    pub addr: SocketAddr,
    pub state: Shared,
}

#[allow(dead_code)]
impl FakeGoogle {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::default()));

        let router = Router::new()
            .route("/v4/spreadsheets", axum::routing::post(create_spreadsheet))
            .route("/v4/spreadsheets/{id}", get(get_spreadsheet))
            .route(
                "/v4/spreadsheets/{id}/values/{range}",
                get(get_values).post(append_values),
            )
            .route("/drive/v3/files", get(list_files))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake google");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, state }
    }

    /// Config pointing both API base URLs at this fake.
    pub fn config(&self) -> Config {
        let mut config = Config::test_default();
        config.sheets_api_url = format!("http://{}/v4", self.addr);
        config.drive_api_url = format!("http://{}/drive/v3", self.addr);
        config
    }

    pub fn client(&self) -> SheetsClient {
        SheetsClient::new(&self.config())
    }

    /// Add a spreadsheet with the given tabs, each holding a header row.
    pub fn add_spreadsheet(&self, id: &str, tabs: &[&str]) {
        let mut sheet = FakeSpreadsheet {
            title: format!("Sheet {}", id),
            ..Default::default()
        };
        for tab in tabs {
            sheet.tabs.push(tab.to_string());
            sheet
                .rows
                .insert(tab.to_string(), vec![vec!["header".to_string()]]);
        }
        self.state
            .lock()
            .unwrap()
            .spreadsheets
            .insert(id.to_string(), sheet);
    }

    /// Add a valid tracker spreadsheet.
    pub fn add_tracker_spreadsheet(&self, id: &str) {
        self.add_spreadsheet(id, &["Shoes", "Entries"]);
    }

    /// Replace the data rows (below the header) of a tab.
    pub fn set_rows(&self, id: &str, tab: &str, rows: &[&[&str]]) {
        let mut state = self.state.lock().unwrap();
        let sheet = state.spreadsheets.get_mut(id).expect("unknown spreadsheet");
        let tab_rows = sheet.rows.entry(tab.to_string()).or_default();
        tab_rows.truncate(1);
        tab_rows.extend(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect::<Vec<_>>()),
        );
    }

    /// All rows of a tab, header included.
    pub fn rows(&self, id: &str, tab: &str) -> Vec<Vec<String>> {
        self.state.lock().unwrap().spreadsheets[id].rows[tab].clone()
    }

    pub fn appends(&self) -> Vec<AppendCall> {
        self.state.lock().unwrap().appends.clone()
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.state.lock().unwrap().fail_creates = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.state.lock().unwrap().fail_appends = fail;
    }

    /// Make a spreadsheet exist but refuse the test token (403).
    pub fn forbid(&self, id: &str) {
        self.state.lock().unwrap().forbidden.insert(id.to_string());
    }

    pub fn set_drive_page_size(&self, size: usize) {
        self.state.lock().unwrap().drive_page_size = Some(size);
    }

    pub fn drive_requests(&self) -> usize {
        self.state.lock().unwrap().drive_requests
    }

    pub fn has_spreadsheet(&self, id: &str) -> bool {
        self.state.lock().unwrap().spreadsheets.contains_key(id)
    }
}

/// Create a test app wired to a running fake.
#[allow(dead_code)]
pub fn create_test_app(fake: &FakeGoogle) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(fake.config()));
    (create_router(state.clone()), state)
}

/// Cookie header for a logged-in session, optionally with a spreadsheet.
#[allow(dead_code)]
pub fn session_cookie(spreadsheet_id: Option<&str>) -> String {
    match spreadsheet_id {
        Some(id) => format!("googleToken={}; spreadsheetId={}", TEST_TOKEN, id),
        None => format!("googleToken={}", TEST_TOKEN),
    }
}

/// Collect all Set-Cookie header values.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Find the Set-Cookie header for a cookie name.
#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ─── Fake API handlers ───────────────────────────────────────

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| h == format!("Bearer {}", TEST_TOKEN))
        .unwrap_or(false)
}

fn google_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": status.as_u16(), "message": message } })),
    )
        .into_response()
}

async fn create_spreadsheet(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Invalid Credentials");
    }
    let mut state = state.lock().unwrap();
    if state.fail_creates {
        return google_error(StatusCode::INTERNAL_SERVER_ERROR, "Backend error");
    }

    state.next_id += 1;
    let id = format!("fake-sheet-{}", state.next_id);

    let tabs: Vec<String> = body["sheets"]
        .as_array()
        .map(|sheets| {
            sheets
                .iter()
                .filter_map(|s| s["properties"]["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_else(|| vec!["Sheet1".to_string()]);

    let mut sheet = FakeSpreadsheet {
        title: body["properties"]["title"]
            .as_str()
            .unwrap_or("Untitled spreadsheet")
            .to_string(),
        ..Default::default()
    };
    for tab in &tabs {
        sheet.tabs.push(tab.clone());
        sheet.rows.insert(tab.clone(), Vec::new());
    }
    state.spreadsheets.insert(id.clone(), sheet);

    Json(json!({
        "spreadsheetId": id,
        "properties": { "title": body["properties"]["title"] },
        "sheets": tabs.iter().map(|t| json!({ "properties": { "title": t } })).collect::<Vec<_>>(),
    }))
    .into_response()
}

async fn get_spreadsheet(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Invalid Credentials");
    }
    let state = state.lock().unwrap();
    if state.forbidden.contains(&id) {
        return google_error(StatusCode::FORBIDDEN, "The caller does not have permission");
    }
    match state.spreadsheets.get(&id) {
        Some(sheet) => Json(json!({
            "sheets": sheet
                .tabs
                .iter()
                .map(|t| json!({ "properties": { "title": t } }))
                .collect::<Vec<_>>()
        }))
        .into_response(),
        None => google_error(StatusCode::NOT_FOUND, "Requested entity was not found."),
    }
}

async fn get_values(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
) -> Response {
    if !authorized(&headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Invalid Credentials");
    }
    let state = state.lock().unwrap();
    if state.fail_reads {
        return google_error(StatusCode::INTERNAL_SERVER_ERROR, "Backend error");
    }
    let Some(sheet) = state.spreadsheets.get(&id) else {
        return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
    };

    let tab = range.split('!').next().unwrap_or_default();
    let Some(rows) = sheet.rows.get(tab) else {
        return google_error(StatusCode::BAD_REQUEST, "Unable to parse range");
    };

    // Data ranges start at row 2.
    let data: Vec<Vec<String>> = rows
        .iter()
        .skip(1)
        .map(|row| {
            row.iter()
                .map(|cell| evaluate_cell(cell, row, sheet))
                .collect()
        })
        .collect();

    if data.is_empty() {
        return Json(json!({ "range": range, "majorDimension": "ROWS" })).into_response();
    }
    Json(json!({ "range": range, "majorDimension": "ROWS", "values": data })).into_response()
}

/// Evaluate the SUMIF formula the way Sheets would for a shoe row.
fn evaluate_cell(cell: &str, row: &[String], sheet: &FakeSpreadsheet) -> String {
    if !cell.starts_with("=SUMIF(") {
        return cell.to_string();
    }
    let shoe_id = row.first().cloned().unwrap_or_default();
    let total: f64 = sheet
        .rows
        .get("Entries")
        .map(|entries| {
            entries
                .iter()
                .skip(1)
                .filter(|e| e.get(1) == Some(&shoe_id))
                .filter_map(|e| e.get(3).and_then(|m| m.parse::<f64>().ok()))
                .sum()
        })
        .unwrap_or(0.0);

    let rendered = format!("{:.2}", total);
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

async fn append_values(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((id, range)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Invalid Credentials");
    }
    let Some(range) = range.strip_suffix(":append").map(str::to_string) else {
        return google_error(StatusCode::NOT_FOUND, "Unknown method");
    };
    if params.get("valueInputOption").map(String::as_str) != Some("USER_ENTERED") {
        return google_error(StatusCode::BAD_REQUEST, "valueInputOption required");
    }

    let rows: Vec<Vec<String>> = match serde_json::from_value(body["values"].clone()) {
        Ok(rows) => rows,
        Err(_) => return google_error(StatusCode::BAD_REQUEST, "Invalid values"),
    };

    let mut state = state.lock().unwrap();
    if state.fail_appends {
        return google_error(StatusCode::INTERNAL_SERVER_ERROR, "Backend error");
    }
    let tab = range.split('!').next().unwrap_or_default().to_string();
    {
        let Some(sheet) = state.spreadsheets.get_mut(&id) else {
            return google_error(StatusCode::NOT_FOUND, "Requested entity was not found.");
        };
        let Some(tab_rows) = sheet.rows.get_mut(&tab) else {
            return google_error(StatusCode::BAD_REQUEST, "Unable to parse range");
        };
        tab_rows.extend(rows.iter().cloned());
    }

    state.appends.push(AppendCall {
        spreadsheet_id: id.clone(),
        range: range.clone(),
        rows,
    });

    Json(json!({ "spreadsheetId": id, "tableRange": range })).into_response()
}

async fn list_files(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return google_error(StatusCode::UNAUTHORIZED, "Invalid Credentials");
    }
    let q = params.get("q").cloned().unwrap_or_default();
    if !q.contains("mimeType='application/vnd.google-apps.spreadsheet'")
        || !q.contains("trashed=false")
    {
        return google_error(StatusCode::BAD_REQUEST, "Unexpected query");
    }

    let mut state = state.lock().unwrap();
    state.drive_requests += 1;
    let mut files: Vec<Value> = state
        .spreadsheets
        .iter()
        .map(|(id, sheet)| json!({ "id": id, "name": sheet.title }))
        .collect();
    files.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));

    if files.is_empty() {
        return Json(json!({})).into_response();
    }

    // Page tokens are offsets into the sorted listing.
    let requested: usize = params
        .get("pageSize")
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);
    let page_size = state.drive_page_size.unwrap_or(requested).min(requested);
    let offset: usize = params
        .get("pageToken")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let end = (offset + page_size).min(files.len());
    let page: Vec<Value> = files[offset.min(end)..end].to_vec();

    if end < files.len() {
        Json(json!({ "files": page, "nextPageToken": end.to_string() })).into_response()
    } else {
        Json(json!({ "files": page })).into_response()
    }
}
