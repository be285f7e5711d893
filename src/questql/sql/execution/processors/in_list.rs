//! Literal IN-list processing.

use crate::questql::sql::ast::{Condition, Expr, InListSpec};
use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::condition::ConditionEvaluator;
use crate::questql::sql::execution::expression::ExpressionEvaluator;
use crate::questql::sql::execution::types::Row;

pub struct InListProcessor;

impl InListProcessor {
    /// Keeps rows whose column is (or with NOT, is not) in the literal list.
    ///
    /// Membership uses loose equality, so `'3'` matches `3`. A NULL column
    /// never matches either way.
    pub fn process(rows: Vec<Row>, spec: Option<&InListSpec>) -> SqlResult<Vec<Row>> {
        let Some(spec) = spec else {
            return Ok(rows);
        };
        let condition = Condition::InList {
            expr: Expr::Column(spec.column.clone()),
            values: spec.values.iter().cloned().map(Expr::Literal).collect(),
            negated: spec.negated,
        };
        ConditionEvaluator::new(ExpressionEvaluator::new()).filter(rows, &condition)
    }
}
