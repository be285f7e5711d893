//! Predicate evaluation with SQL three-valued logic.
//!
//! A predicate evaluates to `Some(true)`, `Some(false)` or `None` (unknown,
//! from a NULL operand). Filters keep a row only on `Some(true)`.

use crate::questql::sql::ast::{CompareOp, Condition, Expr};
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::expression::ExpressionEvaluator;
use crate::questql::sql::execution::types::{FieldValue, Row};
use crate::questql::sql::execution::utils::FieldValueComparator;
use crate::questql::sql::parser::expressions::ExpressionParser;
use crate::questql::sql::parser::projection::normalize_function_names;
use regex::Regex;

pub struct ConditionEvaluator<'a> {
    expressions: ExpressionEvaluator<'a>,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(expressions: ExpressionEvaluator<'a>) -> Self {
        Self { expressions }
    }

    /// Parses predicate text stored on a statement.
    pub fn compile(text: &str) -> SqlResult<Condition> {
        ExpressionParser::parse_condition(&normalize_function_names(text))
    }

    pub fn evaluate(&self, condition: &Condition, row: &Row) -> SqlResult<Option<bool>> {
        self.evaluate_with_windows(condition, row, &[])
    }

    /// Whether the row satisfies the predicate; unknown counts as no.
    pub fn matches(&self, condition: &Condition, row: &Row) -> SqlResult<bool> {
        Ok(self.evaluate(condition, row)? == Some(true))
    }

    /// Rows satisfying the predicate, in order.
    pub fn filter(&self, rows: Vec<Row>, condition: &Condition) -> SqlResult<Vec<Row>> {
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if self.matches(condition, &row)? {
                kept.push(row);
            }
        }
        Ok(kept)
    }

    pub fn evaluate_with_windows(
        &self,
        condition: &Condition,
        row: &Row,
        windows: &[FieldValue],
    ) -> SqlResult<Option<bool>> {
        let value = |expr: &Expr| self.expressions.evaluate_with_windows(expr, row, windows);
        match condition {
            Condition::Compare { left, op, right } => Ok(FieldValueComparator::compare_for_boolean(
                &value(left)?,
                &value(right)?,
                *op,
            )),
            Condition::Like {
                expr,
                pattern,
                negated,
            } => {
                let text = value(expr)?;
                let pattern = value(pattern)?;
                if text.is_null() || pattern.is_null() {
                    return Ok(None);
                }
                let matched = like_matches(&text.to_string(), &pattern.to_string())?;
                Ok(Some(matched != *negated))
            }
            Condition::InList {
                expr,
                values,
                negated,
            } => {
                let needle = value(expr)?;
                if needle.is_null() {
                    return Ok(None);
                }
                let mut saw_null = false;
                for candidate in values {
                    let candidate = value(candidate)?;
                    if candidate.is_null() {
                        saw_null = true;
                    } else if FieldValueComparator::values_equal_with_coercion(&needle, &candidate)
                    {
                        return Ok(Some(!*negated));
                    }
                }
                Ok(if saw_null { None } else { Some(*negated) })
            }
            Condition::IsNull { expr, negated } => Ok(Some(value(expr)?.is_null() != *negated)),
            Condition::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let v = value(expr)?;
                let above =
                    FieldValueComparator::compare_for_boolean(&v, &value(low)?, CompareOp::GtEq);
                let below =
                    FieldValueComparator::compare_for_boolean(&v, &value(high)?, CompareOp::LtEq);
                Ok(and3(above, below).map(|inside| inside != *negated))
            }
            Condition::Exists { subquery, negated } => {
                let executor = self.expressions.subqueries().ok_or_else(|| {
                    SqlError::execution_error(
                        "EXISTS needs a subquery executor",
                        Some(subquery.clone()),
                    )
                })?;
                Ok(Some(executor.execute_exists_subquery(subquery)? != *negated))
            }
            Condition::Truthy(expr) => Ok(value(expr)?.truthy()),
            Condition::And(a, b) => {
                let left = self.evaluate_with_windows(a, row, windows)?;
                if left == Some(false) {
                    return Ok(Some(false));
                }
                Ok(and3(left, self.evaluate_with_windows(b, row, windows)?))
            }
            Condition::Or(a, b) => {
                let left = self.evaluate_with_windows(a, row, windows)?;
                if left == Some(true) {
                    return Ok(Some(true));
                }
                let right = self.evaluate_with_windows(b, row, windows)?;
                Ok(match (left, right) {
                    (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                })
            }
            Condition::Not(inner) => Ok(self.evaluate_with_windows(inner, row, windows)?.map(|b| !b)),
        }
    }
}

fn and3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Case-insensitive LIKE: `%` is any run, `_` any single character.
pub fn like_matches(text: &str, pattern: &str) -> SqlResult<bool> {
    let mut regex_pattern = String::with_capacity(pattern.len() + 8);
    regex_pattern.push_str("(?is)^");
    for c in pattern.chars() {
        match c {
            '%' => regex_pattern.push_str(".*"),
            '_' => regex_pattern.push('.'),
            other => regex_pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    regex_pattern.push('$');
    let re = Regex::new(&regex_pattern).map_err(|e| {
        SqlError::execution_error(format!("Invalid LIKE pattern '{}': {}", pattern, e), None)
    })?;
    Ok(re.is_match(text))
}
