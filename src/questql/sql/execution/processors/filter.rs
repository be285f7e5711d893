//! WHERE processing.
//!
//! Before the WHERE predicate is compiled, its uncorrelated subqueries are
//! evaluated and spliced back as literals:
//!
//! | written                    | subquery rows | becomes               |
//! |----------------------------|---------------|-----------------------|
//! | `col [NOT] IN (SELECT ..)` | any           | `col [NOT] IN (v, ..)`|
//! | `col = (SELECT ..)`        | 1             | `col = v`             |
//! | `col = (SELECT ..)`        | many          | `col IN (v, ..)`      |
//! | `col = (SELECT ..)`        | 0             | `col IN ()`           |
//! | `col < (SELECT ..)` etc.   | 0 or 1        | `col < v` / `NULL`    |
//!
//! The value spliced for a row is the row's first column. `EXISTS (SELECT ..)`
//! is left as written for the predicate evaluator.

use super::context::ProcessorContext;
use crate::questql::sql::ast::Statement;
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::condition::ConditionEvaluator;
use crate::questql::sql::execution::expression::SubqueryExecutor;
use crate::questql::sql::execution::types::{FieldValue, Row};
use crate::questql::sql::parser::lexer::Scanner;

pub struct WhereProcessor;

impl WhereProcessor {
    pub fn process(
        rows: Vec<Row>,
        statement: &Statement,
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        let Some(text) = statement.where_clause.as_deref() else {
            return Ok(rows);
        };
        let text = Self::rewrite_subqueries(text, context)?;
        let condition = ConditionEvaluator::compile(&text)?;
        ConditionEvaluator::new(context.evaluator()).filter(rows, &condition)
    }

    /// Replaces IN / comparison subqueries in predicate text with literals.
    pub fn rewrite_subqueries(text: &str, executor: &dyn SubqueryExecutor) -> SqlResult<String> {
        let subqueries = Scanner::find_subqueries(text);
        if subqueries.is_empty() {
            return Ok(text.to_string());
        }

        let mut out = text.to_string();
        // Right to left so earlier offsets stay valid
        for (open, close) in subqueries.into_iter().rev() {
            let before = text[..open].trim_end();
            let inner = text[open + 1..close].trim();
            let Some(operator) = SubqueryPosition::detect(before) else {
                continue;
            };
            let values = executor.execute_column_subquery(inner)?;
            let literals = values
                .iter()
                .map(FieldValue::to_sql_literal)
                .collect::<Vec<_>>()
                .join(", ");

            let (start, replacement) = match operator {
                SubqueryPosition::InList => (open, format!("({})", literals)),
                SubqueryPosition::Equality { operator_start } => match values.len() {
                    1 => (open, literals),
                    _ => (operator_start, format!("IN ({})", literals)),
                },
                SubqueryPosition::Scalar => match values.len() {
                    0 => (open, "NULL".to_string()),
                    1 => (open, literals),
                    n => {
                        return Err(SqlError::execution_error(
                            format!("scalar subquery returned {} rows", n),
                            Some(inner.to_string()),
                        ));
                    }
                },
            };
            log::trace!("Subquery '{}' rewritten to '{}'", inner, replacement);
            out.replace_range(start..=close, &replacement);
        }
        Ok(out)
    }
}

/// Where a subquery sits in the predicate, judged from the text before it.
enum SubqueryPosition {
    InList,
    Equality { operator_start: usize },
    Scalar,
}

impl SubqueryPosition {
    fn detect(before: &str) -> Option<SubqueryPosition> {
        let last_word: String = before
            .chars()
            .rev()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if last_word.eq_ignore_ascii_case("NI") {
            return Some(SubqueryPosition::InList);
        }
        if last_word.eq_ignore_ascii_case("STSIXE") {
            return None;
        }
        let mut ops = before.char_indices().rev();
        match ops.next() {
            Some((idx, '=')) => match ops.next() {
                Some((_, '<' | '>' | '!')) => Some(SubqueryPosition::Scalar),
                Some((_, '=')) => Some(SubqueryPosition::Equality {
                    operator_start: idx - 1,
                }),
                _ => Some(SubqueryPosition::Equality {
                    operator_start: idx,
                }),
            },
            Some((_, '<' | '>')) => Some(SubqueryPosition::Scalar),
            _ => None,
        }
    }
}
