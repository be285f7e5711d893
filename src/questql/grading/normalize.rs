//! Result Normalization
//!
//! Canonicalises result rows so that two results can be compared without
//! caring about row order, column order, alias qualification or whether a
//! number arrived as text.
//!
//! Per row:
//! - field names lose their `table.` / `alias.` qualifiers, including those
//!   inside call arguments (`SUM(h.gold)`), and are lower-cased
//! - when two fields collapse onto one name, the first non-null value wins;
//!   two different non-null values are both kept as a list
//! - numeric-looking strings become numbers and integral floats integers
//! - keys are sorted
//!
//! The rows are then serialised and sorted by their serialised form.

use crate::questql::sql::execution::types::{FieldValue, Row, dequalified};
use serde_json::Value;
use std::collections::BTreeMap;

/// A normalised row with sorted keys.
pub type CanonicalRow = BTreeMap<String, Value>;

pub struct ResultNormalizer;

impl ResultNormalizer {
    pub fn normalize_row(row: &Row) -> CanonicalRow {
        let mut out = CanonicalRow::new();
        for (key, value) in row.iter() {
            let name = dequalified(key).to_lowercase();
            let value = canonical_value(value);
            match out.get_mut(&name) {
                None => {
                    out.insert(name, value);
                }
                Some(existing) => merge(existing, value),
            }
        }
        out
    }

    /// Serialised canonical rows, sorted.
    pub fn normalize(rows: &[Row]) -> Vec<String> {
        let mut serialized: Vec<String> = rows
            .iter()
            .map(|row| {
                let object: serde_json::Map<String, Value> =
                    Self::normalize_row(row).into_iter().collect();
                Value::Object(object).to_string()
            })
            .collect();
        serialized.sort();
        serialized
    }

    /// The whole result as one canonical string.
    pub fn canonical_form(rows: &[Row]) -> String {
        format!("[{}]", Self::normalize(rows).join(","))
    }

    /// Whether two results are equal once normalised.
    pub fn equivalent(left: &[Row], right: &[Row]) -> bool {
        Self::canonical_form(left) == Self::canonical_form(right)
    }
}

fn canonical_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(s) => match value.as_f64() {
            Some(number) => FieldValue::normalize_number(number).to_json(),
            None => Value::String(s.clone()),
        },
        FieldValue::Float(f) => FieldValue::normalize_number(*f).to_json(),
        other => other.to_json(),
    }
}

fn merge(existing: &mut Value, value: Value) {
    if value.is_null() || *existing == value {
        return;
    }
    if existing.is_null() {
        *existing = value;
        return;
    }
    if let Value::Array(items) = existing {
        if !items.contains(&value) {
            items.push(value);
        }
        return;
    }
    let first = existing.take();
    *existing = Value::Array(vec![first, value]);
}
