//! Column resolution against rows.
//!
//! Rows coming out of FROM / JOIN carry `prefix.column` names while player
//! queries mix qualified and bare references freely. Lookups are tried from
//! strictest to loosest:
//!
//! 1. exact name
//! 2. case-insensitive name
//! 3. bare reference `col`: a field whose part after the last `.` matches
//!    case-insensitively (`orders.col`); qualified reference `t.col`: an
//!    unqualified field named `col`
//! 4. only when asked for: a field whose alphanumeric characters equal the
//!    reference's, ignoring case (`first_name` ~ `FirstName`)
//!
//! A miss is not an error. Callers turn it into NULL.

use crate::questql::sql::execution::types::{FieldValue, Row, bare_name};

pub struct ColumnResolver;

impl ColumnResolver {
    /// Resolves `name` using rules 1-3.
    pub fn resolve<'r>(row: &'r Row, name: &str) -> Option<&'r FieldValue> {
        Self::resolve_key(row, name, false).and_then(|key| row.get(key))
    }

    /// Resolves `name` using rules 1-4.
    pub fn resolve_with_fallback<'r>(row: &'r Row, name: &str) -> Option<&'r FieldValue> {
        Self::resolve_key(row, name, true).and_then(|key| row.get(key))
    }

    /// The field name `name` resolves to.
    pub fn resolve_key<'r>(row: &'r Row, name: &str, alnum_fallback: bool) -> Option<&'r str> {
        let name = name.trim();
        if let Some(key) = row.keys().find(|k| *k == name) {
            return Some(key);
        }
        if let Some(key) = row.keys().find(|k| k.eq_ignore_ascii_case(name)) {
            return Some(key);
        }
        if name.contains('.') {
            let bare = bare_name(name);
            if let Some(key) = row
                .keys()
                .find(|k| !k.contains('.') && k.eq_ignore_ascii_case(bare))
            {
                return Some(key);
            }
        } else if let Some(key) = row
            .keys()
            .find(|k| bare_name(k).eq_ignore_ascii_case(name))
        {
            return Some(key);
        }
        if alnum_fallback {
            let wanted = alnum_only(name);
            if !wanted.is_empty() {
                return row.keys().find(|k| {
                    alnum_only(k) == wanted || alnum_only(bare_name(k)) == wanted
                });
            }
        }
        None
    }
}

fn alnum_only(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
