//! Clause processors for statement evaluation
//!
//! One processor per SQL clause, plus [`ClausePlugin`], the closed set of
//! clause implementations the registry can hand out:
//! - SELECT projection, DISTINCT
//! - WHERE filtering and subquery rewriting
//! - GROUP BY grouping and the aggregate fold
//! - HAVING, IN, EXISTS filters
//! - ORDER BY sorting
//! - INNER / LEFT / RIGHT / CROSS joins
//! - INSERT row synthesis
//! - UNION combination

pub mod context;
pub mod exists;
pub mod filter;
pub mod group_by;
pub mod having;
pub mod in_list;
pub mod insert;
pub mod join;
pub mod order;
pub mod select;
pub mod union;

pub use context::ProcessorContext;
pub use exists::ExistsProcessor;
pub use filter::WhereProcessor;
pub use group_by::GroupByProcessor;
pub use having::HavingProcessor;
pub use in_list::InListProcessor;
pub use insert::InsertProcessor;
pub use join::JoinProcessor;
pub use order::OrderProcessor;
pub use select::SelectProcessor;
pub use union::UnionProcessor;

use crate::questql::sql::ast::{AggregateCall, InsertStatement, JoinClause, JoinKind, Statement};
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::aggregation::AggregateFunction;
use crate::questql::sql::execution::types::Row;

/// What a clause plugin is applied with.
pub enum ClauseSpec<'a> {
    /// The statement whose clause is being evaluated
    Query(&'a Statement),
    /// One join, with the joined table's rows when the table exists
    Join {
        join: &'a JoinClause,
        right: Option<&'a [Row]>,
    },
    Insert(&'a InsertStatement),
    /// Evaluated branch results of a set operation
    SetOperation { branches: Vec<Vec<Row>>, all: bool },
}

impl ClauseSpec<'_> {
    fn kind(&self) -> &'static str {
        match self {
            ClauseSpec::Query(_) => "query",
            ClauseSpec::Join { .. } => "join",
            ClauseSpec::Insert(_) => "insert",
            ClauseSpec::SetOperation { .. } => "set operation",
        }
    }
}

/// A clause implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClausePlugin {
    Select,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Insert,
    /// Inner and cross joins
    InnerJoin,
    /// Left and right outer joins
    OuterJoin,
    In,
    Exists,
    Union,
    /// A manifest entry with no built-in implementation. Rows pass through.
    Extension { keyword: String, locator: String },
}

impl ClausePlugin {
    /// Every built-in plugin.
    pub const BUILTINS: [ClausePlugin; 11] = [
        ClausePlugin::Select,
        ClausePlugin::Where,
        ClausePlugin::GroupBy,
        ClausePlugin::Having,
        ClausePlugin::OrderBy,
        ClausePlugin::Insert,
        ClausePlugin::InnerJoin,
        ClausePlugin::OuterJoin,
        ClausePlugin::In,
        ClausePlugin::Exists,
        ClausePlugin::Union,
    ];

    /// Looks up a built-in plugin by a normalised name such as `groupby`.
    pub fn builtin(stem: &str) -> Option<ClausePlugin> {
        let plugin = match stem {
            "select" => ClausePlugin::Select,
            "where" | "filter" => ClausePlugin::Where,
            "groupby" => ClausePlugin::GroupBy,
            "having" => ClausePlugin::Having,
            "orderby" | "order" => ClausePlugin::OrderBy,
            "insert" => ClausePlugin::Insert,
            "join" | "innerjoin" => ClausePlugin::InnerJoin,
            "leftjoin" | "outerjoin" | "leftouterjoin" => ClausePlugin::OuterJoin,
            "in" | "inlist" => ClausePlugin::In,
            "exists" => ClausePlugin::Exists,
            "union" => ClausePlugin::Union,
            _ => return None,
        };
        Some(plugin)
    }

    /// The built-in plugin for a join kind.
    pub fn for_join(kind: JoinKind) -> ClausePlugin {
        match kind {
            JoinKind::Inner | JoinKind::Cross => ClausePlugin::InnerJoin,
            JoinKind::LeftOuter | JoinKind::RightOuter => ClausePlugin::OuterJoin,
        }
    }

    /// Registry keyword this plugin is normally registered under.
    pub fn keyword(&self) -> &str {
        match self {
            ClausePlugin::Select => "SELECT",
            ClausePlugin::Where => "WHERE",
            ClausePlugin::GroupBy => "GROUP BY",
            ClausePlugin::Having => "HAVING",
            ClausePlugin::OrderBy => "ORDER BY",
            ClausePlugin::Insert => "INSERT",
            ClausePlugin::InnerJoin => "INNER JOIN",
            ClausePlugin::OuterJoin => "LEFT JOIN",
            ClausePlugin::In => "IN",
            ClausePlugin::Exists => "EXISTS",
            ClausePlugin::Union => "UNION",
            ClausePlugin::Extension { keyword, .. } => keyword,
        }
    }

    /// One-line summary for logs.
    pub fn describe(&self) -> String {
        let summary = match self {
            ClausePlugin::Select => "projection and DISTINCT",
            ClausePlugin::Where => "row filter",
            ClausePlugin::GroupBy => "grouping with aggregates",
            ClausePlugin::Having => "group filter",
            ClausePlugin::OrderBy => "stable sort",
            ClausePlugin::Insert => "row synthesis",
            ClausePlugin::InnerJoin => "inner or cross join",
            ClausePlugin::OuterJoin => "left or right outer join",
            ClausePlugin::In => "literal list filter",
            ClausePlugin::Exists => "EXISTS filter",
            ClausePlugin::Union => "set union",
            ClausePlugin::Extension { locator, .. } => {
                return format!("pass-through extension from {}", locator);
            }
        };
        summary.to_string()
    }

    /// Whether the statement populates this plugin's clause.
    pub fn is_present(&self, statement: &Statement) -> bool {
        match self {
            ClausePlugin::Select => !statement.select.is_empty(),
            ClausePlugin::Where => statement.where_clause.is_some(),
            ClausePlugin::GroupBy => statement.group_by.is_some(),
            ClausePlugin::Having => statement.having.is_some(),
            ClausePlugin::OrderBy => statement.order_by.is_some(),
            ClausePlugin::Insert => statement.insert.is_some(),
            ClausePlugin::InnerJoin | ClausePlugin::OuterJoin => !statement.joins.is_empty(),
            ClausePlugin::In => statement.in_list.is_some(),
            ClausePlugin::Exists => statement.exists.is_some(),
            ClausePlugin::Union => statement.set_operation.is_some(),
            ClausePlugin::Extension { .. } => true,
        }
    }

    /// Applies the clause to `rows`.
    pub fn apply(
        &self,
        rows: Vec<Row>,
        spec: ClauseSpec,
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        match (self, spec) {
            (ClausePlugin::Select, ClauseSpec::Query(statement)) => {
                SelectProcessor::process(rows, statement, context)
            }
            (ClausePlugin::Where, ClauseSpec::Query(statement)) => {
                WhereProcessor::process(rows, statement, context)
            }
            (ClausePlugin::GroupBy, ClauseSpec::Query(statement)) => {
                let keys = statement.group_by.clone().unwrap_or_default();
                let aggregates = Self::resolve_aggregates(&statement.aggregate_calls, context)?;
                GroupByProcessor::group_and_aggregate(rows, &keys, &aggregates, context)
            }
            (ClausePlugin::Having, ClauseSpec::Query(statement)) => {
                HavingProcessor::process(rows, statement, context)
            }
            (ClausePlugin::OrderBy, ClauseSpec::Query(statement)) => {
                OrderProcessor::process(rows, statement, context)
            }
            (ClausePlugin::In, ClauseSpec::Query(statement)) => {
                InListProcessor::process(rows, statement.in_list.as_ref())
            }
            (ClausePlugin::Exists, ClauseSpec::Query(statement)) => {
                ExistsProcessor::process(rows, statement.exists.as_ref(), context)
            }
            (ClausePlugin::Insert, ClauseSpec::Insert(insert)) => {
                InsertProcessor::process(insert, context)
            }
            (ClausePlugin::InnerJoin | ClausePlugin::OuterJoin, ClauseSpec::Join { join, right }) => {
                JoinProcessor::process(rows, join, right, context)
            }
            (ClausePlugin::Union, ClauseSpec::SetOperation { branches, all }) => {
                Ok(UnionProcessor::combine(branches, all))
            }
            (ClausePlugin::Extension { keyword, locator }, _) => {
                log::debug!(
                    "Extension clause '{}' ({}) has no behaviour; {} rows pass through",
                    keyword,
                    locator,
                    rows.len()
                );
                Ok(rows)
            }
            (plugin, spec) => Err(SqlError::execution_error(
                format!(
                    "{} plugin cannot be applied to a {}",
                    plugin.keyword(),
                    spec.kind()
                ),
                None,
            )),
        }
    }

    /// Groups `rows` by `keys` and computes `aggregates` per group. Only the
    /// GROUP BY plugin supports this.
    pub fn group_and_aggregate(
        &self,
        rows: Vec<Row>,
        keys: &[String],
        aggregates: &[(AggregateFunction, AggregateCall)],
        context: &ProcessorContext,
    ) -> SqlResult<Vec<Row>> {
        match self {
            ClausePlugin::GroupBy => {
                GroupByProcessor::group_and_aggregate(rows, keys, aggregates, context)
            }
            other => Err(SqlError::execution_error(
                format!("{} does not support grouping", other.keyword()),
                None,
            )),
        }
    }

    /// Pairs every aggregate call with its reducer.
    pub fn resolve_aggregates(
        calls: &[AggregateCall],
        context: &ProcessorContext,
    ) -> SqlResult<Vec<(AggregateFunction, AggregateCall)>> {
        calls
            .iter()
            .map(|call| {
                context
                    .aggregate_function(&call.function)
                    .map(|f| (f, call.clone()))
                    .ok_or_else(|| {
                        SqlError::registry_error(&call.function, "no aggregate registered")
                    })
            })
            .collect()
    }
}
