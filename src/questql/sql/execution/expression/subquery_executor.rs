/*!
# Subquery Execution Trait

Lets predicate evaluation run nested `SELECT`s without knowing about the
engine. The engine's processor context implements it, so a predicate only
ever sees this trait.

Subqueries are uncorrelated: they are evaluated against the database alone,
never against the row currently being filtered, so one result per subquery
text is enough for a whole statement.
*/

use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::types::{FieldValue, Row};

pub trait SubqueryExecutor {
    /// Runs a subquery and returns all of its rows.
    fn execute_subquery(&self, sql: &str) -> SqlResult<Vec<Row>>;

    /// Whether the subquery returns at least one row.
    fn execute_exists_subquery(&self, sql: &str) -> SqlResult<bool> {
        Ok(!self.execute_subquery(sql)?.is_empty())
    }

    /// The first column of every row the subquery returns.
    fn execute_column_subquery(&self, sql: &str) -> SqlResult<Vec<FieldValue>> {
        Ok(self
            .execute_subquery(sql)?
            .iter()
            .map(|row| row.values().next().cloned().unwrap_or(FieldValue::Null))
            .collect())
    }
}
