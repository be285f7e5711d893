//! Core emulation data types.
//!
//! - [`FieldValue`] - the scalar value stored in a row field
//! - [`Row`] - an ordered mapping of field name to value
//! - [`Database`] - lower-cased table name to ordered rows
//!
//! Rows keep their fields in insertion order. That order is the display order
//! of a result and the shape used when synthesising NULL rows for outer joins.

use crate::questql::sql::error::{SqlError, SqlResult};
use regex::Regex;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// A value in a row field.
///
/// Numbers are split into integers and floats; comparisons coerce between
/// the two so that `1` and `1.0` are equal.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// SQL NULL value
    Null,
    /// Boolean value (true/false)
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view of the value.
    ///
    /// Strings that parse as numbers are accepted, booleans are not.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
                }
            }
            _ => None,
        }
    }

    /// Truthiness used when an expression is used directly as a predicate.
    ///
    /// Returns `None` for NULL.
    pub fn truthy(&self) -> Option<bool> {
        match self {
            FieldValue::Null => None,
            FieldValue::Boolean(b) => Some(*b),
            FieldValue::Integer(i) => Some(*i != 0),
            FieldValue::Float(f) => Some(*f != 0.0),
            FieldValue::String(s) => Some(!s.is_empty()),
        }
    }

    /// Converts a float holding an integral value back to an integer.
    pub fn normalize_number(value: f64) -> FieldValue {
        if value.fract() == 0.0 && value.is_finite() && value.abs() < i64::MAX as f64 {
            FieldValue::Integer(value as i64)
        } else {
            FieldValue::Float(value)
        }
    }

    /// Renders the value as a SQL literal, used when subquery results are
    /// spliced back into predicate text.
    pub fn to_sql_literal(&self) -> String {
        match self {
            FieldValue::Null => "NULL".to_string(),
            FieldValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    /// Stable textual key, distinguishing types, for grouping and DISTINCT.
    pub fn key_string(&self) -> String {
        match self {
            FieldValue::Null => "\u{0}null".to_string(),
            FieldValue::Boolean(b) => format!("b:{}", b),
            FieldValue::Integer(i) => format!("n:{}", i),
            FieldValue::Float(f) => match FieldValue::normalize_number(*f) {
                FieldValue::Integer(i) => format!("n:{}", i),
                _ => format!("n:{}", f),
            },
            FieldValue::String(s) => format!("s:{}", s),
        }
    }

    /// Converts a JSON scalar; arrays and objects are rejected.
    pub fn from_json(value: &serde_json::Value) -> SqlResult<FieldValue> {
        match value {
            serde_json::Value::Null => Ok(FieldValue::Null),
            serde_json::Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Integer(i))
                } else {
                    Ok(FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Ok(FieldValue::String(s.clone())),
            other => Err(SqlError::schema_error(
                format!("unsupported nested value: {}", other),
                None,
            )),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Boolean(b) => serde_json::Value::Bool(*b),
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::String(s) => serializer.serialize_str(s),
        }
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a scalar value (null, boolean, number or string)")
    }

    fn visit_unit<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
        match i64::try_from(v) {
            Ok(i) => Ok(FieldValue::Integer(i)),
            Err(_) => Ok(FieldValue::Float(v as f64)),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FieldValue, E> {
        Ok(FieldValue::String(v))
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

/// A row: field name → value, in insertion order.
///
/// Field names may carry a `prefix.column` qualifier after FROM / JOIN
/// prefixing. `get` is an exact lookup; loose lookups go through
/// [`ColumnResolver`](super::resolver::ColumnResolver).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Builds a row from `(name, value)` pairs; later duplicates overwrite.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = Row::new();
        for (k, v) in pairs {
            row.insert(k, v.into());
        }
        row
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == name)
    }

    /// Inserts or overwrites a field, keeping the original position on overwrite.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let idx = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Appends all fields of `other`, overwriting existing names.
    pub fn extend_from(&mut self, other: &Row) {
        for (k, v) in &other.fields {
            self.insert(k.clone(), v.clone());
        }
    }

    /// Returns a copy with every field name prefixed by `prefix.`.
    ///
    /// Names that are already qualified are re-qualified on their bare column.
    pub fn qualified(&self, prefix: &str) -> Row {
        let mut row = Row::with_capacity(self.fields.len());
        for (k, v) in &self.fields {
            row.insert(format!("{}.{}", prefix, bare_name(k)), v.clone());
        }
        row
    }

    /// A row with the same field names as `self` and every value NULL.
    pub fn null_shaped(&self) -> Row {
        Row {
            fields: self
                .fields
                .iter()
                .map(|(k, _)| (k.clone(), FieldValue::Null))
                .collect(),
        }
    }

    /// Serialises the row to a deterministic string (field order preserved).
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.fields {
            out.push_str(k);
            out.push('=');
            out.push_str(&v.key_string());
            out.push('\u{1f}');
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.to_json());
        }
        serde_json::Value::Object(map)
    }
}

static ARGUMENT_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Za-z_][A-Za-z0-9_]*\.)+([A-Za-z_*])").expect("static regex is valid")
});

/// Strips a leading `table.` / `alias.` qualifier from a field name.
///
/// Only the text before the first `(` is searched, so `SUM(h.gold)` is
/// returned unchanged.
pub fn bare_name(name: &str) -> &str {
    let head = name.find('(').map_or(name, |paren| &name[..paren]);
    match head.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Like [`bare_name`], but also drops qualifiers inside call arguments:
/// `h.SUM(h.gold)` becomes `SUM(gold)`.
pub fn dequalified(name: &str) -> String {
    ARGUMENT_QUALIFIER.replace_all(bare_name(name), "$1").into_owned()
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a flat object of field values")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Row, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut row = Row::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
            row.insert(key, value);
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// An ordered sequence of rows.
pub type Table = Vec<Row>;

/// The mock dataset: lower-cased table name → rows.
///
/// The engine only ever reads from a database; INSERT synthesises its row
/// without touching the tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Database {
    tables: HashMap<String, Table>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a table; the name is lower-cased.
    pub fn with_table(mut self, name: &str, rows: Table) -> Self {
        self.insert_table(name, rows);
        self
    }

    pub fn insert_table(&mut self, name: &str, rows: Table) {
        self.tables.insert(name.to_lowercase(), rows);
    }

    /// Case-insensitive table lookup.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds a database from a JSON object of `table → [row, ...]`.
    ///
    /// Table names are lower-cased; rows keep the key order of the document.
    pub fn from_json(value: serde_json::Value) -> SqlResult<Database> {
        let parsed: HashMap<String, Table> = serde_json::from_value(value)
            .map_err(|e| SqlError::schema_error(format!("invalid database: {}", e), None))?;
        let mut db = Database::new();
        for (name, rows) in parsed {
            db.insert_table(&name, rows);
        }
        Ok(db)
    }

    pub fn from_json_str(text: &str) -> SqlResult<Database> {
        let parsed: HashMap<String, Table> = serde_json::from_str(text)
            .map_err(|e| SqlError::schema_error(format!("invalid database: {}", e), None))?;
        let mut db = Database::new();
        for (name, rows) in parsed {
            db.insert_table(&name, rows);
        }
        Ok(db)
    }
}
