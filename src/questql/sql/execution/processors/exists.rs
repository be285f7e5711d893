//! EXISTS processing.

use super::context::ProcessorContext;
use crate::questql::sql::ast::ExistsSpec;
use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::expression::SubqueryExecutor;
use crate::questql::sql::execution::types::Row;

pub struct ExistsProcessor;

impl ExistsProcessor {
    /// Keeps every row when the (uncorrelated) subquery returns rows, none
    /// otherwise. `NOT EXISTS` inverts this.
    pub fn process(
        rows: Vec<Row>,
        spec: Option<&ExistsSpec>,
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        let Some(spec) = spec else {
            return Ok(rows);
        };
        let exists = context.execute_exists_subquery(&spec.subquery)?;
        if exists != spec.negated {
            Ok(rows)
        } else {
            log::debug!(
                "{}EXISTS ({}) is false; dropping {} rows",
                if spec.negated { "NOT " } else { "" },
                spec.subquery,
                rows.len()
            );
            Ok(Vec::new())
        }
    }
}
