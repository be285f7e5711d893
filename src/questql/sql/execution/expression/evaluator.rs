//! Expression evaluator for player SQL.
//!
//! Evaluates [`Expr`] trees against a single row. Predicates are evaluated
//! by [`ConditionEvaluator`], which calls back into this type for operands.

use super::subquery_executor::SubqueryExecutor;
use crate::questql::sql::ast::Expr;
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::condition::ConditionEvaluator;
use crate::questql::sql::execution::resolver::ColumnResolver;
use crate::questql::sql::execution::types::{FieldValue, Row};

/// Evaluates value expressions.
///
/// Column misses evaluate to NULL. Window references read from the values
/// precomputed for the current row.
#[derive(Clone, Copy, Default)]
pub struct ExpressionEvaluator<'a> {
    subqueries: Option<&'a dyn SubqueryExecutor>,
    alnum_fallback: bool,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new() -> Self {
        Self {
            subqueries: None,
            alnum_fallback: false,
        }
    }

    pub fn with_subqueries(mut self, executor: &'a dyn SubqueryExecutor) -> Self {
        self.subqueries = Some(executor);
        self
    }

    pub fn with_alnum_fallback(mut self, enabled: bool) -> Self {
        self.alnum_fallback = enabled;
        self
    }

    pub fn subqueries(&self) -> Option<&'a dyn SubqueryExecutor> {
        self.subqueries
    }

    pub fn evaluate(&self, expr: &Expr, row: &Row) -> SqlResult<FieldValue> {
        self.evaluate_with_windows(expr, row, &[])
    }

    /// Evaluates `expr` with `windows[i]` standing for `Expr::Window(i)`.
    pub fn evaluate_with_windows(
        &self,
        expr: &Expr,
        row: &Row,
        windows: &[FieldValue],
    ) -> SqlResult<FieldValue> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Column(name) => Ok(self.resolve_column(row, name)),
            // Aggregates were folded into the row under their canonical name
            Expr::Aggregate(call) => Ok(ColumnResolver::resolve(row, &call.canonical_name())
                .cloned()
                .unwrap_or(FieldValue::Null)),
            Expr::Window(idx) => windows.get(*idx).cloned().ok_or_else(|| {
                SqlError::execution_error(
                    format!("window function #{} was not computed", idx),
                    None,
                )
            }),
            Expr::Case {
                branches,
                else_result,
            } => {
                let conditions = ConditionEvaluator::new(*self);
                for (condition, result) in branches {
                    if conditions.evaluate_with_windows(condition, row, windows)? == Some(true) {
                        return self.evaluate_with_windows(result, row, windows);
                    }
                }
                match else_result {
                    Some(e) => self.evaluate_with_windows(e, row, windows),
                    None => Ok(FieldValue::Null),
                }
            }
            Expr::Function { name, args } => {
                let values = args
                    .iter()
                    .map(|a| self.evaluate_with_windows(a, row, windows))
                    .collect::<SqlResult<Vec<_>>>()?;
                call_function(name, values)
            }
            Expr::Wildcard | Expr::QualifiedWildcard(_) => Err(SqlError::execution_error(
                "wildcard is only valid as a projection",
                None,
            )),
        }
    }

    /// Column lookup; a miss is NULL.
    pub fn resolve_column(&self, row: &Row, name: &str) -> FieldValue {
        let found = if self.alnum_fallback {
            ColumnResolver::resolve_with_fallback(row, name)
        } else {
            ColumnResolver::resolve(row, name)
        };
        found.cloned().unwrap_or(FieldValue::Null)
    }
}

/// Scalar built-ins.
fn call_function(name: &str, args: Vec<FieldValue>) -> SqlResult<FieldValue> {
    let arity = |expected: usize| -> SqlResult<()> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(SqlError::execution_error(
                format!("{} expects {} argument(s), got {}", name, expected, args.len()),
                None,
            ))
        }
    };

    match name {
        "COALESCE" | "IFNULL" | "NVL" => Ok(args
            .iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(FieldValue::Null)),
        "UPPER" | "LOWER" => {
            arity(1)?;
            Ok(match &args[0] {
                FieldValue::Null => FieldValue::Null,
                v if name == "UPPER" => FieldValue::String(v.to_string().to_uppercase()),
                v => FieldValue::String(v.to_string().to_lowercase()),
            })
        }
        "LENGTH" => {
            arity(1)?;
            Ok(match &args[0] {
                FieldValue::Null => FieldValue::Null,
                v => FieldValue::Integer(v.to_string().chars().count() as i64),
            })
        }
        "ABS" => {
            arity(1)?;
            Ok(match &args[0] {
                FieldValue::Integer(i) => FieldValue::Integer(i.abs()),
                v => v
                    .as_f64()
                    .map(|f| FieldValue::Float(f.abs()))
                    .unwrap_or(FieldValue::Null),
            })
        }
        "ROUND" => {
            if args.is_empty() || args.len() > 2 {
                return Err(SqlError::execution_error(
                    "ROUND expects 1 or 2 arguments",
                    None,
                ));
            }
            let digits = args
                .get(1)
                .and_then(FieldValue::as_f64)
                .map(|d| d as i32)
                .unwrap_or(0);
            Ok(match args[0].as_f64() {
                Some(v) => {
                    let factor = 10f64.powi(digits);
                    let rounded = (v * factor).round() / factor;
                    if digits <= 0 {
                        FieldValue::normalize_number(rounded)
                    } else {
                        FieldValue::Float(rounded)
                    }
                }
                None => FieldValue::Null,
            })
        }
        "CONCAT" => {
            if args.iter().any(FieldValue::is_null) {
                return Ok(FieldValue::Null);
            }
            Ok(FieldValue::String(
                args.iter().map(|v| v.to_string()).collect::<String>(),
            ))
        }
        other => Err(SqlError::execution_error(
            format!("Unknown function {}", other),
            None,
        )),
    }
}
