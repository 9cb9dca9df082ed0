// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-shoe mileage aggregation.
//!
//! The spreadsheet owns the totals: each shoe row carries a `SUMIF` formula
//! over the `Entries` tab. The join below computes the same sums from
//! decoded entries and is used to cross-check the sheet's values.

use std::collections::HashMap;

use crate::models::{Entry, Shoe};

/// Column D of every shoe row: sum of `Entries!D` where `Entries!B` equals
/// this row's id cell.
pub const TOTAL_MILES_FORMULA: &str = "=SUMIF(Entries!B:B,A:A,Entries!D:D)";

/// Sum entry miles per shoe id.
pub fn total_miles_by_shoe(entries: &[Entry]) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for entry in entries {
        *totals.entry(entry.shoe_id.clone()).or_insert(0.0) += entry.miles;
    }
    totals
}

/// Computed total for one shoe (0 when it has no entries).
pub fn computed_miles(totals: &HashMap<String, f64>, shoe: &Shoe) -> f64 {
    totals.get(&shoe.id).copied().unwrap_or(0.0)
}

/// Whether the sheet's total disagrees with the computed one by more than
/// display precision.
pub fn totals_diverge(sheet_total: f64, computed_total: f64) -> bool {
    (sheet_total - computed_total).abs() >= 0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, shoe_id: &str, miles: f64) -> Entry {
        Entry {
            id: id.to_string(),
            shoe_id: shoe_id.to_string(),
            date: "2024-01-01".to_string(),
            miles,
        }
    }

    #[test]
    fn test_totals_grouped_by_shoe() {
        let entries = vec![
            entry("e1", "s1", 5.0),
            entry("e2", "s2", 3.1),
            entry("e3", "s1", 10.5),
        ];
        let totals = total_miles_by_shoe(&entries);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["s1"], 15.5);
        assert_eq!(totals["s2"], 3.1);
    }

    #[test]
    fn test_shoe_without_entries_is_zero() {
        let totals = total_miles_by_shoe(&[entry("e1", "s1", 4.0)]);
        let shoe = Shoe::new("s2".to_string(), "Unworn".to_string());
        assert_eq!(computed_miles(&totals, &shoe), 0.0);
    }

    #[test]
    fn test_entries_for_unknown_shoes_still_counted() {
        let totals = total_miles_by_shoe(&[entry("e1", "ghost", 2.0)]);
        assert_eq!(totals.get("ghost"), Some(&2.0));
    }

    #[test]
    fn test_totals_diverge() {
        assert!(!totals_diverge(15.5, 15.5));
        assert!(!totals_diverge(15.5, 15.52));
        assert!(totals_diverge(15.5, 20.0));
    }

    #[test]
    fn test_formula_references_entry_columns() {
        assert!(TOTAL_MILES_FORMULA.starts_with("=SUMIF("));
        assert!(TOTAL_MILES_FORMULA.contains("Entries!B:B"));
        assert!(TOTAL_MILES_FORMULA.contains("Entries!D:D"));
    }
}
