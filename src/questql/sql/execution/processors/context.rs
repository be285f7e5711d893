//! Processor execution context

use crate::questql::sql::error::SqlResult;
use crate::questql::sql::execution::aggregation::AggregateFunction;
use crate::questql::sql::execution::config::EmulatorConfig;
use crate::questql::sql::execution::engine::SqlEmulator;
use crate::questql::sql::execution::expression::{ExpressionEvaluator, SubqueryExecutor};
use crate::questql::sql::execution::registry::Registry;
use crate::questql::sql::execution::types::{Database, Row};
use std::cell::RefCell;
use std::collections::HashMap;

/// State shared by the processors of one statement evaluation.
///
/// Holds the database being read and caches subquery results by their text,
/// so a subquery repeated in a predicate runs once per statement.
pub struct ProcessorContext<'a> {
    pub emulator: &'a SqlEmulator,
    pub database: &'a Database,
    subquery_cache: RefCell<HashMap<String, Vec<Row>>>,
}

impl<'a> ProcessorContext<'a> {
    pub fn new(emulator: &'a SqlEmulator, database: &'a Database) -> Self {
        Self {
            emulator,
            database,
            subquery_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.emulator.config
    }

    pub fn registry(&self) -> &Registry {
        &self.emulator.registry
    }

    /// Evaluator for predicates and keys.
    pub fn evaluator(&self) -> ExpressionEvaluator<'_> {
        ExpressionEvaluator::new().with_subqueries(self)
    }

    /// Evaluator for SELECT projections, honouring the alnum fallback.
    pub fn projection_evaluator(&self) -> ExpressionEvaluator<'_> {
        self.evaluator()
            .with_alnum_fallback(self.config().alnum_fallback)
    }

    /// The reducer registered for an aggregate name, or the built-in one.
    pub fn aggregate_function(&self, name: &str) -> Option<AggregateFunction> {
        self.registry().aggregate(name).or_else(|| {
            let builtin = AggregateFunction::from_name(name);
            if builtin.is_some() {
                log::debug!("Aggregate {} not registered, using built-in", name);
            }
            builtin
        })
    }

    pub fn cached_subqueries(&self) -> usize {
        self.subquery_cache.borrow().len()
    }
}

impl SubqueryExecutor for ProcessorContext<'_> {
    fn execute_subquery(&self, sql: &str) -> SqlResult<Vec<Row>> {
        if let Some(rows) = self.subquery_cache.borrow().get(sql) {
            return Ok(rows.clone());
        }
        log::trace!("Running subquery: {}", sql);
        let rows = self.emulator.try_emulate(sql, self.database)?;
        self.subquery_cache
            .borrow_mut()
            .insert(sql.to_string(), rows.clone());
        Ok(rows)
    }
}
