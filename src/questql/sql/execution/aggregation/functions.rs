//! Aggregate function computation.
//!
//! Reducers work on the values one aggregate call selects from a row set.
//! NULLs never contribute: COUNT(col) counts non-null values, SUM/AVG/MIN/MAX
//! over no non-null values is NULL, and COUNT(*) counts rows.

use crate::questql::sql::ast::{AggregateCall, AggregateTarget, Expr};
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::expression::ExpressionEvaluator;
use crate::questql::sql::execution::types::{FieldValue, Row};
use crate::questql::sql::execution::utils::FieldValueComparator;
use crate::questql::sql::parser::expressions::ExpressionParser;
use std::collections::HashSet;

/// A built-in aggregate reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 5] = [
        AggregateFunction::Sum,
        AggregateFunction::Count,
        AggregateFunction::Avg,
        AggregateFunction::Min,
        AggregateFunction::Max,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "SUM" => Some(AggregateFunction::Sum),
            "COUNT" => Some(AggregateFunction::Count),
            "AVG" => Some(AggregateFunction::Avg),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// Reduces `values`. `row_count` is used by COUNT(*) instead of the
    /// values.
    pub fn reduce(&self, values: &[FieldValue], row_count: Option<usize>) -> FieldValue {
        let present: Vec<&FieldValue> = values.iter().filter(|v| !v.is_null()).collect();
        match self {
            AggregateFunction::Count => {
                FieldValue::Integer(row_count.unwrap_or(present.len()) as i64)
            }
            AggregateFunction::Sum => {
                let numbers: Vec<&FieldValue> =
                    present.into_iter().filter(|v| v.as_f64().is_some()).collect();
                if numbers.is_empty() {
                    return FieldValue::Null;
                }
                // Integer total unless a float is involved or the total overflows
                let integral = numbers
                    .iter()
                    .try_fold(0i64, |total, v| as_integer(v).and_then(|i| total.checked_add(i)));
                match integral {
                    Some(total) => FieldValue::Integer(total),
                    None => FieldValue::Float(numbers.iter().filter_map(|v| v.as_f64()).sum()),
                }
            }
            AggregateFunction::Avg => {
                let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
                if numbers.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
                }
            }
            AggregateFunction::Min => present
                .into_iter()
                .min_by(|a, b| FieldValueComparator::compare_values(a, b))
                .cloned()
                .unwrap_or(FieldValue::Null),
            AggregateFunction::Max => present
                .into_iter()
                .rev()
                .max_by(|a, b| FieldValueComparator::compare_values(a, b))
                .cloned()
                .unwrap_or(FieldValue::Null),
        }
    }
}

/// Integer view of an integral value, accepting integer-looking strings.
fn as_integer(value: &FieldValue) -> Option<i64> {
    match value {
        FieldValue::Integer(i) => Some(*i),
        FieldValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Applies aggregate calls to row sets.
pub struct AggregateFunctions;

impl AggregateFunctions {
    /// Evaluates `call` over `rows` with `function`.
    pub fn compute(
        function: AggregateFunction,
        call: &AggregateCall,
        rows: &[Row],
        evaluator: &ExpressionEvaluator,
    ) -> SqlResult<FieldValue> {
        match &call.target {
            AggregateTarget::Rows => Ok(function.reduce(&[], Some(rows.len()))),
            AggregateTarget::Column(argument) => {
                let values = Self::collect_values(argument, call.distinct, rows, evaluator)?;
                Ok(function.reduce(&values, None))
            }
        }
    }

    /// The argument's value in each row, de-duplicated for DISTINCT.
    pub fn collect_values(
        argument: &str,
        distinct: bool,
        rows: &[Row],
        evaluator: &ExpressionEvaluator,
    ) -> SqlResult<Vec<FieldValue>> {
        let mut windows = Vec::new();
        let expr = ExpressionParser::parse_expression(argument, &mut windows)
            .unwrap_or_else(|_| Expr::Column(argument.to_string()));
        if !windows.is_empty() || matches!(expr, Expr::Aggregate(_)) {
            return Err(SqlError::execution_error(
                format!("Nested aggregate or window in '{}'", argument),
                None,
            ));
        }

        let mut values = Vec::with_capacity(rows.len());
        let mut seen = HashSet::new();
        for row in rows {
            let value = evaluator.evaluate(&expr, row)?;
            if distinct && !seen.insert(value.key_string()) {
                continue;
            }
            values.push(value);
        }
        Ok(values)
    }
}
