//! ORDER BY processing.

use super::context::ProcessorContext;
use crate::questql::sql::ast::{Expr, OrderDirection, Statement};
use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::expression::WindowFunctions;
use crate::questql::sql::execution::types::{FieldValue, Row};
use crate::questql::sql::execution::utils::FieldValueComparator;
use std::cmp::Ordering;

pub struct OrderProcessor;

impl OrderProcessor {
    /// Stable sort by the ORDER BY keys.
    ///
    /// A key naming a SELECT alias sorts by that item's expression. NULL sorts
    /// first ascending and last descending.
    pub fn process(
        rows: Vec<Row>,
        statement: &Statement,
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        let Some(order_by) = statement.order_by.as_ref() else {
            return Ok(rows);
        };
        let keys: Vec<(&Expr, OrderDirection)> = order_by
            .iter()
            .map(|o| (Self::resolve_alias(&o.expr, statement), o.direction))
            .collect();

        let evaluator = context.evaluator();
        let windows = if keys.iter().any(|(expr, _)| uses_window(expr)) {
            WindowFunctions::compute(
                &rows,
                &statement.windows,
                &evaluator,
                &|name: &str| context.aggregate_function(name),
                &context.config().null_partition_key,
            )?
        } else {
            vec![Vec::new(); rows.len()]
        };

        let mut keyed = Vec::with_capacity(rows.len());
        for (row, row_windows) in rows.into_iter().zip(&windows) {
            let values = keys
                .iter()
                .map(|(expr, _)| evaluator.evaluate_with_windows(expr, &row, row_windows))
                .collect::<SqlResult<Vec<FieldValue>>>()?;
            keyed.push((values, row));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            for ((left, right), (_, direction)) in a.iter().zip(b).zip(&keys) {
                let ordering = FieldValueComparator::compare_values(left, right);
                let ordering = match direction {
                    OrderDirection::Asc => ordering,
                    OrderDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }

    fn resolve_alias<'s>(expr: &'s Expr, statement: &'s Statement) -> &'s Expr {
        if let Expr::Column(name) = expr {
            if let Some(item) = statement.select.iter().find(|item| {
                item.alias
                    .as_deref()
                    .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
            }) {
                return &item.expr;
            }
        }
        expr
    }
}

fn uses_window(expr: &Expr) -> bool {
    match expr {
        Expr::Window(_) => true,
        Expr::Function { args, .. } => args.iter().any(uses_window),
        Expr::Case {
            branches,
            else_result,
        } => {
            let mut found = false;
            for (condition, result) in branches {
                condition.for_each_expr(&mut |e| found |= uses_window(e));
                found |= uses_window(result);
            }
            found || else_result.as_deref().is_some_and(uses_window)
        }
        _ => false,
    }
}
