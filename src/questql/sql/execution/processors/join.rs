//! Nested-loop joins.
//!
//! Joined rows are the accumulated left row extended with the right row's
//! fields qualified by the joined table's alias (or name). An unmatched side
//! of an outer join is padded with a row of NULLs shaped like the first row of
//! the other table.

use super::context::ProcessorContext;
use crate::questql::sql::ast::{Condition, JoinClause, JoinKind};
use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::condition::ConditionEvaluator;
use crate::questql::sql::execution::types::Row;

pub struct JoinProcessor;

impl JoinProcessor {
    /// Joins `left` with the joined table's rows.
    ///
    /// `right` is `None` when the table does not exist: LEFT joins are then
    /// skipped, every other kind yields no rows.
    pub fn process(
        left: Vec<Row>,
        join: &JoinClause,
        right: Option<&[Row]>,
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        let Some(right) = right else {
            return Ok(match join.kind {
                JoinKind::LeftOuter => {
                    log::debug!("LEFT JOIN table '{}' not found; skipped", join.table.name);
                    left
                }
                _ => {
                    log::debug!("JOIN table '{}' not found; no rows", join.table.name);
                    Vec::new()
                }
            });
        };

        let prefix = join.table.prefix();
        let right: Vec<Row> = right.iter().map(|r| r.qualified(prefix)).collect();
        let predicate = match (&join.kind, &join.predicate) {
            (JoinKind::Cross, _) | (_, None) => None,
            (_, Some(text)) => Some(ConditionEvaluator::compile(text)?),
        };
        let joiner = Joiner {
            predicate: predicate.as_ref(),
            conditions: ConditionEvaluator::new(context.evaluator()),
        };

        match join.kind {
            JoinKind::Inner | JoinKind::Cross => joiner.inner(&left, &right),
            JoinKind::LeftOuter => joiner.left_outer(&left, &right),
            JoinKind::RightOuter => joiner.right_outer(&left, &right),
        }
    }
}

struct Joiner<'p, 'a> {
    predicate: Option<&'p Condition>,
    conditions: ConditionEvaluator<'a>,
}

impl Joiner<'_, '_> {
    fn combine(&self, left: &Row, right: &Row) -> SqlResult<Option<Row>> {
        let mut row = left.clone();
        row.extend_from(right);
        let keep = match self.predicate {
            Some(predicate) => self.conditions.matches(predicate, &row)?,
            None => true,
        };
        Ok(keep.then_some(row))
    }

    fn inner(&self, left: &[Row], right: &[Row]) -> SqlResult<Vec<Row>> {
        let mut out = Vec::new();
        for l in left {
            for r in right {
                out.extend(self.combine(l, r)?);
            }
        }
        Ok(out)
    }

    fn left_outer(&self, left: &[Row], right: &[Row]) -> SqlResult<Vec<Row>> {
        let padding = right.first().map(Row::null_shaped).unwrap_or_default();
        let mut out = Vec::new();
        for l in left {
            let before = out.len();
            for r in right {
                out.extend(self.combine(l, r)?);
            }
            if out.len() == before {
                let mut row = l.clone();
                row.extend_from(&padding);
                out.push(row);
            }
        }
        Ok(out)
    }

    fn right_outer(&self, left: &[Row], right: &[Row]) -> SqlResult<Vec<Row>> {
        let padding = left.first().map(Row::null_shaped).unwrap_or_default();
        let mut out = Vec::new();
        for r in right {
            let before = out.len();
            for l in left {
                out.extend(self.combine(l, r)?);
            }
            if out.len() == before {
                let mut row = padding.clone();
                row.extend_from(r);
                out.push(row);
            }
        }
        Ok(out)
    }
}
