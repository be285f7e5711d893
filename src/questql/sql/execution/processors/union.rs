//! UNION combination.

use crate::questql::sql::execution::types::{FieldValue, Row, dequalified};
use std::collections::HashSet;

pub struct UnionProcessor;

impl UnionProcessor {
    /// Concatenates branch results into one shape-compatible row set.
    ///
    /// Qualifiers are stripped from every field name and every row gets the
    /// union of all branch columns (first-seen order), missing ones NULL.
    /// Without ALL, rows equal to an earlier row are dropped.
    pub fn combine(branches: Vec<Vec<Row>>, all: bool) -> Vec<Row> {
        let stripped: Vec<Row> = branches
            .into_iter()
            .flatten()
            .map(|row| Self::strip_qualifiers(&row))
            .collect();

        let mut columns: Vec<String> = Vec::new();
        for row in &stripped {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(stripped.len());
        for row in stripped {
            let shaped = Row::from_pairs(columns.iter().map(|c| {
                (
                    c.clone(),
                    row.get(c).cloned().unwrap_or(FieldValue::Null),
                )
            }));
            if all || seen.insert(shaped.fingerprint()) {
                out.push(shaped);
            }
        }
        out
    }

    /// Drops `prefix.` from field names; the first of colliding names wins.
    fn strip_qualifiers(row: &Row) -> Row {
        let mut out = Row::with_capacity(row.len());
        for (key, value) in row.iter() {
            let bare = dequalified(key);
            if !out.contains_key(&bare) {
                out.insert(bare, value.clone());
            }
        }
        out
    }
}
