/*!
# SQL Emulation Engine

The entry point for running player SQL against an in-memory [`Database`].

## Pipeline

1. **UNION**: every branch is emulated on its own and the results combined.
2. **INSERT**: the inserted row is synthesised and returned; nothing is stored.
3. **FROM / JOIN**: the FROM table's fields are qualified with its alias (or
   name), then each join runs in declaration order.
4. **Phases**: the registry's [`phase_order`](Registry::phase_order), normally
   WHERE → GROUP BY → HAVING → IN → ORDER BY → extensions → SELECT. A phase
   runs only when its keyword is registered and the statement uses it.
   Grouping, or the single-row aggregate fold when there is no GROUP BY,
   happens at the GROUP BY position. IN and EXISTS only run when WHERE did
   not, since their specs are conjuncts of the WHERE condition.
5. **LIMIT** truncates the projected rows.

## Error Handling

[`SqlEmulator::try_emulate`] reports every failure. [`SqlEmulator::emulate`]
is the forgiving variant used for player input: any error is logged at debug
level and turned into an empty result.

## Example

```rust
use questql::questql::sql::{Database, SqlEmulator};
use serde_json::json;

let db = Database::from_json(json!({
    "heroes": [
        {"name": "Ayla", "guild": "red"},
        {"name": "Bram", "guild": "blue"},
        {"name": "Cyd", "guild": "red"}
    ]
}))
.unwrap();

let emulator = SqlEmulator::with_builtins();
let rows = emulator
    .try_emulate("SELECT guild, COUNT(*) AS n FROM heroes GROUP BY guild ORDER BY n DESC", &db)
    .unwrap();
assert_eq!(rows[0].get("guild").unwrap().to_string(), "red");
```
*/

use super::config::EmulatorConfig;
use super::processors::{ClausePlugin, ClauseSpec, GroupByProcessor, ProcessorContext};
use super::registry::Registry;
use super::types::{Database, Row};
use crate::questql::sql::ast::Statement;
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::parser::SqlParser;

/// Evaluates statements with a registry of clause plugins.
#[derive(Debug, Clone)]
pub struct SqlEmulator {
    pub registry: Registry,
    pub config: EmulatorConfig,
    parser: SqlParser,
}

impl Default for SqlEmulator {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl SqlEmulator {
    pub fn new(registry: Registry, config: EmulatorConfig) -> Self {
        Self {
            registry,
            config,
            parser: SqlParser::new(),
        }
    }

    /// An emulator with every built-in clause and the default config.
    pub fn with_builtins() -> Self {
        Self::new(Registry::with_builtins(), EmulatorConfig::default())
    }

    pub fn with_config(mut self, config: EmulatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn parse(&self, sql: &str) -> SqlResult<Statement> {
        self.parser.parse(sql)
    }

    /// Runs a query, returning an empty result on any failure.
    pub fn emulate(&self, sql: &str, database: &Database) -> Vec<Row> {
        match self.try_emulate(sql, database) {
            Ok(rows) => rows,
            Err(e) => {
                log::debug!("Query failed, returning empty result: {}", e);
                Vec::new()
            }
        }
    }

    /// Parses and runs a query.
    pub fn try_emulate(&self, sql: &str, database: &Database) -> SqlResult<Vec<Row>> {
        let statement = self.parse(sql)?;
        self.execute(&statement, database)
    }

    /// Runs an already parsed statement.
    pub fn execute(&self, statement: &Statement, database: &Database) -> SqlResult<Vec<Row>> {
        let context = ProcessorContext::new(self, database);

        if let Some(set) = &statement.set_operation {
            let branches = set
                .statements
                .iter()
                .map(|branch| self.try_emulate(branch, database))
                .collect::<SqlResult<Vec<_>>>()?;
            let plugin = self.structural("UNION", ClausePlugin::Union);
            return plugin.apply(
                Vec::new(),
                ClauseSpec::SetOperation {
                    branches,
                    all: set.all,
                },
                &context,
            );
        }

        if let Some(insert) = &statement.insert {
            let plugin = self.structural("INSERT", ClausePlugin::Insert);
            return plugin.apply(Vec::new(), ClauseSpec::Insert(insert), &context);
        }

        let mut rows = self.scan(statement, &context)?;

        let mut aggregated = false;
        let mut where_applied = false;
        for keyword in self.registry.phase_order() {
            if keyword != "WHERE" && !aggregated {
                rows = self.aggregate(rows, statement, &context)?;
                aggregated = true;
            }
            if keyword == "GROUP BY" {
                continue;
            }
            let Some(plugin) = self.registry.clause(keyword) else {
                continue;
            };
            if !plugin.is_present(statement) {
                continue;
            }
            // IN and EXISTS specs are WHERE conjuncts; past the fold their
            // columns are gone.
            if where_applied && matches!(plugin, ClausePlugin::In | ClausePlugin::Exists) {
                log::trace!("{} already enforced by WHERE", keyword);
                continue;
            }
            rows = plugin.apply(rows, ClauseSpec::Query(statement), &context)?;
            where_applied |= matches!(plugin, ClausePlugin::Where);
            self.trace_phase(keyword, &rows);
        }
        if !aggregated {
            rows = self.aggregate(rows, statement, &context)?;
        }

        if let Some(limit) = statement.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    /// FROM and JOIN: builds the accumulated row set.
    fn scan(&self, statement: &Statement, context: &ProcessorContext) -> SqlResult<Vec<Row>> {
        let from = statement
            .from
            .as_ref()
            .ok_or_else(|| SqlError::parse_error("statement has no FROM table", None))?;
        let table = context
            .database
            .table(&from.name)
            .ok_or_else(|| SqlError::table_error(&from.name, "table does not exist"))?;
        let mut rows: Vec<Row> = table.iter().map(|r| r.qualified(from.prefix())).collect();
        self.trace_phase("FROM", &rows);

        for join in &statement.joins {
            let plugin = self.structural(join.kind.keyword(), ClausePlugin::for_join(join.kind));
            let right = context.database.table(&join.table.name).map(Vec::as_slice);
            rows = plugin.apply(rows, ClauseSpec::Join { join, right }, context)?;
            self.trace_phase(join.kind.keyword(), &rows);
        }
        Ok(rows)
    }

    /// GROUP BY, or the single-row fold when aggregates appear without it.
    fn aggregate(
        &self,
        rows: Vec<Row>,
        statement: &Statement,
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        let aggregates = ClausePlugin::resolve_aggregates(&statement.aggregate_calls, context)?;
        let rows = match (&statement.group_by, self.registry.clause("GROUP BY")) {
            (Some(keys), Some(ClausePlugin::GroupBy)) => {
                ClausePlugin::GroupBy.group_and_aggregate(rows, keys, &aggregates, context)?
            }
            (Some(_), Some(plugin)) => plugin.apply(rows, ClauseSpec::Query(statement), context)?,
            (Some(_), None) if !statement.has_aggregates() => {
                log::debug!("GROUP BY is not registered; rows left ungrouped");
                rows
            }
            (_, _) if statement.has_aggregates() => {
                vec![GroupByProcessor::fold(rows, &aggregates, context)?]
            }
            _ => return Ok(rows),
        };
        self.trace_phase("GROUP BY", &rows);
        Ok(rows)
    }

    /// The plugin registered for a structural keyword, else the built-in.
    fn structural(&self, keyword: &str, builtin: ClausePlugin) -> ClausePlugin {
        match self.registry.clause(keyword) {
            Some(plugin) => plugin.clone(),
            None => {
                log::debug!("{} not registered, using built-in", keyword);
                builtin
            }
        }
    }

    fn trace_phase(&self, phase: &str, rows: &[Row]) {
        if self.config.trace_phases {
            log::debug!("Phase {}: {} rows", phase, rows.len());
        }
    }
}
