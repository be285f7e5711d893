//! INSERT processing.

use super::context::ProcessorContext;
use crate::questql::sql::ast::InsertStatement;
use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::types::Row;

pub struct InsertProcessor;

impl InsertProcessor {
    /// Returns the row the INSERT would add. The database is never written.
    pub fn process(insert: &InsertStatement, context: &ProcessorContext) -> SqlResult<Vec<Row>> {
        if !context.database.has_table(&insert.table) {
            log::debug!("INSERT into unknown table '{}'", insert.table);
        }
        let row = Row::from_pairs(
            insert
                .columns
                .iter()
                .cloned()
                .zip(insert.values.iter().cloned()),
        );
        Ok(vec![row])
    }
}
