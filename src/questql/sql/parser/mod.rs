/*!
# Player SQL Parser

Turns the text a player typed into a [`Statement`]. The accepted language is a
small, forgiving subset of SQL:

```sql
INSERT INTO table (col, ...) VALUES (value, ...)

select_statement UNION [ALL] select_statement

SELECT [DISTINCT] projection, ...
FROM table [[AS] alias] [, table [[AS] alias]]
[[INNER | LEFT [OUTER] | RIGHT [OUTER] | CROSS] JOIN table [[AS] alias] [ON predicate]] ...
[WHERE predicate]
[GROUP BY column, ...]
[HAVING predicate]
[ORDER BY key [ASC | DESC], ...]
[LIMIT n]
```

Forms are tried in that priority order: an INSERT short-circuits everything
else, then the text is split at its first top-level UNION, and only then is it
treated as a single SELECT.

## Examples

```rust
use questql::questql::sql::SqlParser;

let parser = SqlParser::new();
let statement = parser
    .parse("SELECT name, COUNT(*) AS n FROM heroes GROUP BY name ORDER BY n DESC")
    .unwrap();
assert_eq!(statement.group_by, Some(vec!["name".to_string()]));
assert_eq!(statement.aggregate_calls[0].canonical_name(), "COUNT(*)");
```

Parsing never evaluates anything. Subqueries stay as text inside WHERE and are
resolved by the engine.
*/

pub mod expressions;
pub mod lexer;
pub mod projection;
pub mod select;
pub mod window_functions;

use crate::questql::sql::ast::{Expr, InsertStatement, SetOperation, Statement};
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::types::FieldValue;
use expressions::ExpressionParser;
use lexer::Scanner;
use regex::Regex;
use std::sync::LazyLock;

pub use lexer::{Lexer, Token, TokenType};

static INSERT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^INSERT\s+INTO\s+([\w.]+)\s*\(([^)]*)\)\s*VALUES\s*\((.*)\)$")
        .expect("static regex is valid")
});

/// Statement parser. Holds no state; one instance may parse any number of
/// statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlParser;

impl SqlParser {
    pub fn new() -> Self {
        SqlParser
    }

    /// Parses one statement.
    pub fn parse(&self, sql: &str) -> SqlResult<Statement> {
        let mut text = Scanner::collapse_whitespace(sql);
        while text.ends_with(';') {
            text.pop();
            text = text.trim_end().to_string();
        }
        if text.is_empty() {
            return Err(SqlError::parse_error("Empty statement", Some(0)));
        }

        if let Some(caps) = INSERT_PATTERN.captures(&text) {
            log::trace!("Detected INSERT statement");
            return parse_insert(&caps[1], &caps[2], &caps[3]);
        }

        if let Some(set_operation) = split_union(&text)? {
            log::trace!(
                "Detected UNION{} with {} branches",
                if set_operation.all { " ALL" } else { "" },
                set_operation.statements.len()
            );
            return Ok(Statement {
                set_operation: Some(set_operation),
                ..Statement::default()
            });
        }

        select::parse_select(&text)
    }
}

fn parse_insert(table: &str, columns: &str, values: &str) -> SqlResult<Statement> {
    let columns: Vec<String> = Scanner::split_top_level(columns, ',')
        .into_iter()
        .map(|c| projection::unquote_identifier(&c))
        .collect();
    if columns.iter().any(String::is_empty) {
        return Err(SqlError::parse_error("Empty column name in INSERT", None));
    }

    let values = Scanner::split_top_level(values, ',')
        .iter()
        .map(|v| parse_insert_value(v))
        .collect::<SqlResult<Vec<FieldValue>>>()?;

    if columns.len() != values.len() {
        return Err(SqlError::parse_error(
            format!(
                "INSERT lists {} columns but {} values",
                columns.len(),
                values.len()
            ),
            None,
        ));
    }

    Ok(Statement {
        insert: Some(InsertStatement {
            table: table.to_string(),
            columns,
            values,
        }),
        ..Statement::default()
    })
}

/// INSERT values are literals; a bare word is taken as text.
fn parse_insert_value(text: &str) -> SqlResult<FieldValue> {
    if text.is_empty() {
        return Err(SqlError::parse_error("Empty value in INSERT", None));
    }
    let mut windows = Vec::new();
    match ExpressionParser::parse_expression(text, &mut windows)? {
        Expr::Literal(value) => Ok(value),
        Expr::Column(word) => Ok(FieldValue::String(word)),
        _ => Err(SqlError::parse_error(
            format!("INSERT value '{}' is not a literal", text),
            None,
        )),
    }
}

/// Splits at the first top-level UNION. The right-hand text may itself hold
/// further UNIONs; it is parsed again when evaluated.
fn split_union(text: &str) -> SqlResult<Option<SetOperation>> {
    let Some((start, end)) = Scanner::find_keyword(text, "UNION", 0) else {
        return Ok(None);
    };
    let (all, rest_start) = match Scanner::find_keyword(text, "ALL", end) {
        Some((all_start, all_end)) if text[end..all_start].trim().is_empty() => (true, all_end),
        _ => (false, end),
    };
    let left = text[..start].trim();
    let right = text[rest_start..].trim();
    if left.is_empty() || right.is_empty() {
        return Err(SqlError::parse_error(
            "UNION needs a statement on both sides",
            Some(start),
        ));
    }
    Ok(Some(SetOperation {
        statements: vec![left.to_string(), right.to_string()],
        all,
    }))
}
