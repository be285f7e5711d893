//! GROUP BY processing and the aggregate fold.

use super::context::ProcessorContext;
use crate::questql::sql::ast::{AggregateCall, Expr};
use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::aggregation::{AggregateFunction, AggregateFunctions};
use crate::questql::sql::execution::types::Row;
use crate::questql::sql::parser::expressions::ExpressionParser;
use std::collections::HashMap;

pub struct GroupByProcessor;

impl GroupByProcessor {
    /// Groups rows by the key columns and computes every aggregate per group.
    ///
    /// Groups come out in first-seen order. Each output row is the group's
    /// first input row with the aggregates added under their canonical names
    /// (`SUM(price)`, `COUNT(*)`). With no keys the whole input is folded into
    /// one row.
    pub fn group_and_aggregate(
        rows: Vec<Row>,
        keys: &[String],
        aggregates: &[(AggregateFunction, AggregateCall)],
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        if keys.is_empty() {
            return Self::fold(rows, aggregates, context).map(|row| vec![row]);
        }

        let evaluator = context.evaluator();
        let key_exprs: Vec<Expr> = keys.iter().map(|k| Self::key_expr(k)).collect();

        let mut groups: Vec<Vec<Row>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for row in rows {
            let mut parts = Vec::with_capacity(key_exprs.len());
            for expr in &key_exprs {
                parts.push(evaluator.evaluate(expr, &row)?.key_string());
            }
            let slot = *index.entry(parts.join("\u{1f}")).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row);
        }
        log::trace!("GROUP BY {:?} produced {} groups", keys, groups.len());

        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let mut row = group[0].clone();
            for (function, call) in aggregates {
                let value = AggregateFunctions::compute(*function, call, &group, &evaluator)?;
                row.insert(call.canonical_name(), value);
            }
            out.push(row);
        }
        Ok(out)
    }

    /// Folds the whole input into a single row of aggregates.
    ///
    /// The row keeps the first input row's fields so bare columns next to an
    /// aggregate still resolve; an empty input yields only the aggregates.
    pub fn fold(
        rows: Vec<Row>,
        aggregates: &[(AggregateFunction, AggregateCall)],
        context: &ProcessorContext,
    ) -> SqlResult<Row> {
        let evaluator = context.evaluator();
        let mut out = rows.first().cloned().unwrap_or_default();
        for (function, call) in aggregates {
            let value = AggregateFunctions::compute(*function, call, &rows, &evaluator)?;
            out.insert(call.canonical_name(), value);
        }
        Ok(out)
    }

    fn key_expr(key: &str) -> Expr {
        let mut windows = Vec::new();
        match ExpressionParser::parse_expression(key, &mut windows) {
            Ok(expr) if windows.is_empty() => expr,
            _ => Expr::Column(key.to_string()),
        }
    }
}
