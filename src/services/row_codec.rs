// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversion between sheet rows and typed records.
//!
//! Both tabs use a fixed four-column layout:
//!
//! | Tab       | A  | B      | C        | D                    |
//! |-----------|----|--------|----------|----------------------|
//! | `Shoes`   | id | name   | archived | totalMiles (formula) |
//! | `Entries` | id | shoeId | date     | miles                |
//!
//! Decoding is lenient. Sheets omits trailing empty cells, so short rows
//! are normal; missing text decodes to "" and missing numbers to 0.

use crate::models::{Entry, Shoe};
use crate::services::mileage::TOTAL_MILES_FORMULA;
use serde_json::Value;

/// Header row written to the `Shoes` tab when a spreadsheet is created.
pub const SHOES_HEADER: [&str; 4] = ["id", "name", "archived", "totalMiles"];
/// Header row written to the `Entries` tab when a spreadsheet is created.
pub const ENTRIES_HEADER: [&str; 4] = ["id", "shoeId", "date", "miles"];

/// Decode a `Shoes` row.
pub fn decode_shoe(row: &[Value]) -> Shoe {
    Shoe {
        id: cell_text(row, 0),
        name: cell_text(row, 1),
        archived: cell_flag(row, 2),
        total_miles: cell_number(row, 3),
    }
}

/// Decode an `Entries` row.
pub fn decode_entry(row: &[Value]) -> Entry {
    Entry {
        id: cell_text(row, 0),
        shoe_id: cell_text(row, 1),
        date: cell_text(row, 2),
        miles: cell_number(row, 3),
    }
}

/// Decode all shoe rows of a range, skipping fully blank rows.
pub fn decode_shoes(rows: &[Vec<Value>]) -> Vec<Shoe> {
    rows.iter()
        .filter(|row| !is_blank(row))
        .map(|row| decode_shoe(row))
        .collect()
}

/// Decode all entry rows of a range, skipping fully blank rows.
pub fn decode_entries(rows: &[Vec<Value>]) -> Vec<Entry> {
    rows.iter()
        .filter(|row| !is_blank(row))
        .map(|row| decode_entry(row))
        .collect()
}

/// Encode a shoe for appending. Column D carries the aggregation formula,
/// never the current total.
pub fn encode_shoe(shoe: &Shoe) -> Vec<String> {
    vec![
        shoe.id.clone(),
        shoe.name.clone(),
        shoe.archived.to_string(),
        TOTAL_MILES_FORMULA.to_string(),
    ]
}

/// Encode an entry for appending.
pub fn encode_entry(entry: &Entry) -> Vec<String> {
    vec![
        entry.id.clone(),
        entry.shoe_id.clone(),
        entry.date.clone(),
        format_miles(entry.miles),
    ]
}

/// Miles are stored with one decimal place, halves rounded away from zero.
///
/// `{:.1}` rounds exact halfway values to even ("2.2" for 2.25). The only
/// binary values sitting exactly halfway between tenths are odd multiples
/// of 0.25, so those are rounded explicitly.
pub fn format_miles(miles: f64) -> String {
    let quarters = miles * 4.0;
    if quarters.fract() == 0.0 && quarters.rem_euclid(2.0) == 1.0 {
        return format!("{:.1}", (miles * 10.0).round() / 10.0);
    }
    format!("{:.1}", miles)
}

fn is_blank(row: &[Value]) -> bool {
    row.iter().all(|cell| match cell {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

fn cell_text(row: &[Value], index: usize) -> String {
    match row.get(index) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Sheets renders a `true` typed as USER_ENTERED as the boolean `TRUE`.
fn cell_flag(row: &[Value], index: usize) -> bool {
    match row.get(index) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn cell_number(row: &[Value], index: usize) -> f64 {
    match row.get(index) {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => parse_float_prefix(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Parse the longest leading decimal number of `s`, ignoring leading
/// whitespace and any trailing text ("12.5 mi" -> 12.5).
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        // "5." is a number, a lone "." is not.
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
