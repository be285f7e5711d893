//! HAVING processing.

use super::context::ProcessorContext;
use crate::questql::sql::ast::{Expr, Statement};
use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::condition::ConditionEvaluator;
use crate::questql::sql::execution::types::Row;

pub struct HavingProcessor;

impl HavingProcessor {
    /// Keeps grouped rows satisfying the HAVING predicate.
    ///
    /// Aggregates resolve against their canonical names in the grouped row.
    /// Aliases of aggregate projections (`COUNT(*) AS n`) are visible too.
    pub fn process(
        rows: Vec<Row>,
        statement: &Statement,
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        let Some(text) = statement.having.as_deref() else {
            return Ok(rows);
        };
        let condition = ConditionEvaluator::compile(text)?;
        let evaluator = ConditionEvaluator::new(context.evaluator());

        let aliases: Vec<(&str, String)> = statement
            .select
            .iter()
            .filter_map(|item| match (&item.alias, &item.expr) {
                (Some(alias), Expr::Aggregate(call)) => {
                    Some((alias.as_str(), call.canonical_name()))
                }
                _ => None,
            })
            .collect();

        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            let matched = if aliases.is_empty() {
                evaluator.matches(&condition, &row)?
            } else {
                let mut view = row.clone();
                for (alias, canonical) in &aliases {
                    if let Some(value) = row.get(canonical) {
                        view.insert(*alias, value.clone());
                    }
                }
                evaluator.matches(&condition, &view)?
            };
            if matched {
                kept.push(row);
            }
        }
        Ok(kept)
    }
}
