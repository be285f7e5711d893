//! SELECT projection.

use super::context::ProcessorContext;
use crate::questql::sql::ast::{Expr, Statement};
use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::expression::WindowFunctions;
use crate::questql::sql::execution::types::{Row, bare_name};
use std::collections::{HashMap, HashSet};

pub struct SelectProcessor;

impl SelectProcessor {
    /// Projects every row through the SELECT list, then applies DISTINCT.
    ///
    /// - `*` copies all fields; a qualified name is shortened to its bare
    ///   column when no other field shares that bare name
    /// - `t.*` copies the fields qualified with `t`, under their bare names
    /// - anything else is evaluated and stored under the item's output name
    ///
    /// Window values are computed once over the whole input before projection.
    pub fn process(
        rows: Vec<Row>,
        statement: &Statement,
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        let evaluator = context.projection_evaluator();
        let windows = if statement.windows.is_empty() {
            vec![Vec::new(); rows.len()]
        } else {
            WindowFunctions::compute(
                &rows,
                &statement.windows,
                &context.evaluator(),
                &|name: &str| context.aggregate_function(name),
                &context.config().null_partition_key,
            )?
        };

        let mut projected = Vec::with_capacity(rows.len());
        for (row, row_windows) in rows.iter().zip(&windows) {
            let mut out = Row::with_capacity(statement.select.len());
            for item in &statement.select {
                match &item.expr {
                    Expr::Wildcard => Self::copy_all(row, &mut out),
                    Expr::QualifiedWildcard(prefix) => Self::copy_prefixed(row, prefix, &mut out),
                    expr => {
                        let value = evaluator.evaluate_with_windows(expr, row, row_windows)?;
                        out.insert(item.output_name(), value);
                    }
                }
            }
            projected.push(out);
        }

        if statement.distinct {
            let mut seen = HashSet::new();
            projected.retain(|row| seen.insert(row.fingerprint()));
        }
        Ok(projected)
    }

    fn copy_all(row: &Row, out: &mut Row) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for key in row.keys() {
            *counts.entry(bare_name(key).to_ascii_lowercase()).or_default() += 1;
        }
        for (key, value) in row.iter() {
            let bare = bare_name(key);
            if counts.get(&bare.to_ascii_lowercase()) == Some(&1) {
                out.insert(bare, value.clone());
            } else {
                out.insert(key, value.clone());
            }
        }
    }

    fn copy_prefixed(row: &Row, prefix: &str, out: &mut Row) {
        for (key, value) in row.iter() {
            let qualified = key
                .rsplit_once('.')
                .is_some_and(|(p, _)| p.eq_ignore_ascii_case(prefix));
            if qualified {
                out.insert(bare_name(key), value.clone());
            }
        }
    }
}
