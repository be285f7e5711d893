//! Structure for explaining a wrong answer.
//!
//! The engine itself never produces user-facing messages. [`Diagnostics`]
//! gathers what a UI needs to write one: the parsed statement, tables it names
//! that do not exist, selected columns no source row has, and the field names
//! of the first result row.

use crate::questql::sql::ast::{Expr, Statement};
use crate::questql::sql::error::SqlError;
use crate::questql::sql::execution::engine::SqlEmulator;
use crate::questql::sql::execution::resolver::ColumnResolver;
use crate::questql::sql::execution::types::{Database, Row};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub statement: Option<Statement>,
    pub parse_error: Option<String>,
    pub missing_tables: Vec<String>,
    pub unresolved_columns: Vec<String>,
    /// Field names of the first result row
    pub result_fields: Vec<String>,
    pub row_count: usize,
}

impl Diagnostics {
    pub fn collect(query: &str, emulator: &SqlEmulator, database: &Database) -> Self {
        let statement = match emulator.parse(query) {
            Ok(statement) => statement,
            Err(e) => {
                return Self {
                    parse_error: Some(e.to_string()),
                    ..Self::default()
                };
            }
        };

        let rows = emulator.emulate(query, database);
        let mut diagnostics = Self {
            result_fields: rows
                .first()
                .map(|r| r.keys().map(str::to_string).collect())
                .unwrap_or_default(),
            row_count: rows.len(),
            ..Self::default()
        };

        diagnostics.missing_tables = statement
            .referenced_tables()
            .into_iter()
            .filter(|t| !database.has_table(t))
            .map(str::to_string)
            .collect();

        let sample = Self::sample_row(&statement, database);
        if !sample.is_empty() {
            let mut columns: Vec<&str> = statement
                .select
                .iter()
                .filter_map(|item| match &item.expr {
                    Expr::Column(name) => Some(name.as_str()),
                    _ => None,
                })
                .collect();
            if let Some(keys) = &statement.group_by {
                columns.extend(keys.iter().map(String::as_str));
            }
            for column in columns {
                let known = ColumnResolver::resolve_with_fallback(&sample, column).is_some();
                if !known && !diagnostics.unresolved_columns.iter().any(|c| c == column) {
                    diagnostics.unresolved_columns.push(column.to_string());
                }
            }
        }

        diagnostics.statement = Some(statement);
        diagnostics
    }

    /// The first row of every source table, qualified and merged.
    fn sample_row(statement: &Statement, database: &Database) -> Row {
        let mut sample = Row::new();
        let sources = statement
            .from
            .iter()
            .chain(statement.joins.iter().map(|j| &j.table));
        for table in sources {
            if let Some(first) = database.table(&table.name).and_then(|rows| rows.first()) {
                sample.extend_from(&first.qualified(table.prefix()));
            }
        }
        sample
    }

    pub fn is_clean(&self) -> bool {
        self.parse_error.is_none()
            && self.missing_tables.is_empty()
            && self.unresolved_columns.is_empty()
    }

    /// Each problem found, as an error value.
    pub fn problems(&self) -> Vec<SqlError> {
        let mut problems = Vec::new();
        if let Some(message) = &self.parse_error {
            problems.push(SqlError::parse_error(message.clone(), None));
        }
        for table in &self.missing_tables {
            problems.push(SqlError::table_error(table, "table does not exist"));
        }
        for column in &self.unresolved_columns {
            problems.push(SqlError::schema_error(
                format!("column '{}' not found", column),
                Some(column.clone()),
            ));
        }
        problems
    }
}
