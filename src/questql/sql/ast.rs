/*!
# Statement Representation

Structured description of one parsed query. A [`Statement`] is produced per
emulation call and dropped once the result rows exist.

Clause bodies that are evaluated against rows (WHERE, HAVING, join predicates)
are kept as predicate text and compiled into a [`Condition`] when their phase
runs; this keeps the statement printable and lets WHERE pre-processing rewrite
subqueries textually. Projection items, ORDER BY keys and window specifications
are parsed into [`Expr`] trees up front.
*/

use crate::questql::sql::execution::types::{FieldValue, bare_name};
use serde::Serialize;
use std::fmt;

/// A parsed query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statement {
    /// Projection list in source order
    pub select: Vec<SelectItem>,
    pub distinct: bool,
    pub from: Option<TableRef>,
    /// Joins in declaration order
    pub joins: Vec<JoinClause>,
    /// WHERE predicate text
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
    pub group_by: Option<Vec<String>>,
    /// HAVING predicate text
    pub having: Option<String>,
    pub order_by: Option<Vec<OrderByExpr>>,
    pub limit: Option<usize>,
    /// Aggregate calls found in the projection list, HAVING and ORDER BY
    pub aggregate_calls: Vec<AggregateCall>,
    /// Window specifications, referenced by index from [`Expr::Window`]
    pub windows: Vec<WindowSpec>,
    /// Literal `col IN (...)` conjunct pre-extracted from WHERE
    pub in_list: Option<InListSpec>,
    /// `EXISTS (SELECT ...)` conjunct pre-extracted from WHERE
    pub exists: Option<ExistsSpec>,
    pub insert: Option<InsertStatement>,
    pub set_operation: Option<SetOperation>,
}

impl Statement {
    pub fn has_aggregates(&self) -> bool {
        !self.aggregate_calls.is_empty()
    }

    /// Every table name referenced by FROM and JOIN, in order.
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut tables = Vec::new();
        if let Some(from) = &self.from {
            tables.push(from.name.as_str());
        }
        for join in &self.joins {
            tables.push(join.table.name.as_str());
        }
        tables
    }
}

/// A table in FROM or JOIN with its optional alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// The prefix used to qualify this table's fields.
    pub fn prefix(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// One projection item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectItem {
    /// Expression text as written (function names upper-cased)
    pub text: String,
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    /// The output field name for this item.
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.expr {
            Expr::Column(name) => bare_name(name).to_string(),
            Expr::Aggregate(call) => call.canonical_name(),
            _ => self.text.clone(),
        }
    }
}

/// Kind of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    /// `FROM a, b`
    Cross,
}

impl JoinKind {
    /// Registry keyword of the clause plugin that evaluates this join.
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner | JoinKind::Cross => "INNER JOIN",
            JoinKind::LeftOuter | JoinKind::RightOuter => "LEFT JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: TableRef,
    /// ON predicate text; `None` for cross joins
    pub predicate: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderByExpr {
    /// Key text as written
    pub column: String,
    pub expr: Expr,
    pub direction: OrderDirection,
}

/// Aggregate function names understood by the parser.
pub const AGGREGATE_FUNCTIONS: &[&str] = &["SUM", "COUNT", "AVG", "MIN", "MAX"];

pub fn is_aggregate_function(name: &str) -> bool {
    AGGREGATE_FUNCTIONS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(name))
}

/// What an aggregate reduces over.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateTarget {
    /// `COUNT(*)` or `COUNT(1)`: count rows
    Rows,
    Column(String),
}

/// `FUNC([DISTINCT] arg)` extracted from the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateCall {
    /// Upper-cased function name
    pub function: String,
    pub target: AggregateTarget,
    pub distinct: bool,
    /// Argument as written (`*`, `1`, `price`, `o.total`)
    pub argument: String,
}

impl AggregateCall {
    /// Canonical result field name, e.g. `SUM(price)` or `COUNT(DISTINCT c)`.
    pub fn canonical_name(&self) -> String {
        if self.distinct {
            format!("{}(DISTINCT {})", self.function, self.argument)
        } else {
            format!("{}({})", self.function, self.argument)
        }
    }
}

/// Window function call with its OVER clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSpec {
    /// Upper-cased function name (ROW_NUMBER, RANK, SUM, ...)
    pub function: String,
    /// Function argument; ignored by ranking functions
    pub argument: Option<Expr>,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<WindowOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowOrder {
    pub expr: Expr,
    pub direction: OrderDirection,
}

/// Literal list membership pre-extracted from WHERE.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InListSpec {
    pub column: String,
    pub values: Vec<FieldValue>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistsSpec {
    /// Subquery text between the parentheses
    pub subquery: String,
    pub negated: bool,
}

/// `INSERT INTO table (cols) VALUES (vals)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<FieldValue>,
}

/// `a UNION [ALL] b`. Branches are raw statement texts parsed recursively.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetOperation {
    pub statements: Vec<String>,
    pub all: bool,
}

/// Value expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Expr {
    /// Column reference, possibly qualified
    Column(String),
    Literal(FieldValue),
    /// `*`
    Wildcard,
    /// `alias.*`
    QualifiedWildcard(String),
    Aggregate(AggregateCall),
    /// Scalar function call (COALESCE, UPPER, ...)
    Function { name: String, args: Vec<Expr> },
    Case {
        branches: Vec<(Condition, Expr)>,
        else_result: Option<Box<Expr>>,
    },
    /// Index into [`Statement::windows`]
    Window(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(s)
    }
}

/// Boolean predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Condition {
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    Like {
        expr: Expr,
        pattern: Expr,
        negated: bool,
    },
    InList {
        expr: Expr,
        values: Vec<Expr>,
        negated: bool,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    Between {
        expr: Expr,
        low: Expr,
        high: Expr,
        negated: bool,
    },
    Exists {
        subquery: String,
        negated: bool,
    },
    /// An expression used directly as a predicate
    Truthy(Expr),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Visits every expression in the condition tree.
    pub fn for_each_expr<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        match self {
            Condition::Compare { left, right, .. } => {
                f(left);
                f(right);
            }
            Condition::Like { expr, pattern, .. } => {
                f(expr);
                f(pattern);
            }
            Condition::InList { expr, values, .. } => {
                f(expr);
                values.iter().for_each(|v| f(v));
            }
            Condition::IsNull { expr, .. } | Condition::Truthy(expr) => f(expr),
            Condition::Between {
                expr, low, high, ..
            } => {
                f(expr);
                f(low);
                f(high);
            }
            Condition::Exists { .. } => {}
            Condition::And(a, b) | Condition::Or(a, b) => {
                a.for_each_expr(f);
                b.for_each_expr(f);
            }
            Condition::Not(inner) => inner.for_each_expr(f),
        }
    }
}

impl Expr {
    /// Collects aggregate calls inside this expression (not inside windows).
    pub fn collect_aggregates(&self, out: &mut Vec<AggregateCall>) {
        match self {
            Expr::Aggregate(call) => {
                if !out.contains(call) {
                    out.push(call.clone());
                }
            }
            Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_aggregates(out);
                }
            }
            Expr::Case {
                branches,
                else_result,
            } => {
                for (cond, result) in branches {
                    cond.for_each_expr(&mut |e| e.collect_aggregates(out));
                    result.collect_aggregates(out);
                }
                if let Some(e) = else_result {
                    e.collect_aggregates(out);
                }
            }
            _ => {}
        }
    }
}
