/*!
SELECT statement parsing.

The statement text is segmented with the top-level [`Scanner`]:

```text
SELECT [DISTINCT] <projections>
FROM <table> [[AS] alias] {, <table> [[AS] alias]}
{ [INNER | LEFT [OUTER] | RIGHT [OUTER] | CROSS] JOIN <table> [[AS] alias] [ON <predicate>] }
[WHERE <predicate>] [GROUP BY <keys>] [HAVING <predicate>] [ORDER BY <keys>] [LIMIT n]
```

Each tail clause runs until the next recognised tail keyword or the end of the
text. Keywords inside parentheses or quotes never delimit a clause.
*/

use super::expressions::ExpressionParser;
use super::lexer::Scanner;
use super::projection::{
    extract_aggregate_calls, parse_order_by, parse_select_item, split_projections,
    unquote_identifier,
};
use crate::questql::sql::ast::{
    Condition, ExistsSpec, Expr, InListSpec, JoinClause, JoinKind, Statement, TableRef,
};
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::types::FieldValue;
use regex::Regex;
use std::sync::LazyLock;

static INTEGER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("static regex is valid"));

/// Tail clause keywords in their required order.
const TAIL_KEYWORDS: &[&str] = &["WHERE", "GROUP BY", "HAVING", "ORDER BY", "LIMIT"];

/// Words that may never be taken as a table alias.
const RESERVED: &[&str] = &[
    "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "JOIN", "INNER", "LEFT", "RIGHT", "CROSS",
    "OUTER", "ON", "UNION", "SELECT", "FROM",
];

/// A located JOIN keyword with its modifier.
struct JoinMarker {
    start: usize,
    body_start: usize,
    kind: JoinKind,
}

pub fn parse_select(text: &str) -> SqlResult<Statement> {
    let (_, select_end) = match Scanner::find_keyword(text, "SELECT", 0) {
        Some((0, end)) => (0, end),
        _ => return Err(SqlError::parse_error("Expected SELECT", Some(0))),
    };

    let mut statement = Statement::default();
    let mut projection_start = select_end;
    if let Some((start, end)) = Scanner::find_keyword(text, "DISTINCT", select_end) {
        if text[select_end..start].trim().is_empty() {
            statement.distinct = true;
            projection_start = end;
        }
    }

    let (from_start, from_end) = Scanner::find_keyword(text, "FROM", projection_start)
        .ok_or_else(|| SqlError::parse_error("Missing FROM clause", None))?;

    let projection_text = text[projection_start..from_start].trim();
    if projection_text.is_empty() {
        return Err(SqlError::parse_error(
            "Missing projection list",
            Some(projection_start),
        ));
    }

    // Tail keyword positions after FROM
    let tails: Vec<(&str, usize, usize)> = TAIL_KEYWORDS
        .iter()
        .filter_map(|kw| {
            Scanner::find_keyword(text, kw, from_end).map(|(start, end)| (*kw, start, end))
        })
        .collect();
    let first_tail = tails.iter().map(|(_, s, _)| *s).min().unwrap_or(text.len());

    let joins = locate_joins(text, from_end, first_tail);
    let from_segment_end = joins.first().map(|j| j.start).unwrap_or(first_tail);
    let from_segment = text[from_end..from_segment_end].trim();
    if from_segment.is_empty() {
        return Err(SqlError::parse_error(
            "Missing table after FROM",
            Some(from_end),
        ));
    }

    let mut tables = Scanner::split_top_level(from_segment, ',').into_iter();
    let first = tables.next().unwrap_or_default();
    statement.from = Some(parse_table_ref(&first, from_end)?);
    for extra in tables {
        statement.joins.push(JoinClause {
            kind: JoinKind::Cross,
            table: parse_table_ref(&extra, from_end)?,
            predicate: None,
        });
    }

    for (i, marker) in joins.iter().enumerate() {
        let segment_end = joins.get(i + 1).map(|j| j.start).unwrap_or(first_tail);
        statement
            .joins
            .push(parse_join(text, marker, segment_end)?);
    }

    let clause_text = |keyword: &str| -> Option<String> {
        let (_, start, end) = tails.iter().find(|(kw, _, _)| *kw == keyword)?;
        let stop = tails
            .iter()
            .map(|(_, s, _)| *s)
            .filter(|s| s > start)
            .min()
            .unwrap_or(text.len());
        Some(text[*end..stop].trim().to_string())
    };

    let mut windows = Vec::new();
    statement.select = split_projections(projection_text)
        .iter()
        .map(|item| parse_select_item(item, &mut windows))
        .collect();

    if let Some(where_text) = clause_text("WHERE").filter(|t| !t.is_empty()) {
        match ExpressionParser::parse_condition(&where_text) {
            Ok(condition) => {
                statement.in_list = extract_in_list(&condition);
                statement.exists = extract_exists(&condition);
            }
            Err(e) => log::trace!("WHERE not pre-parsed ({}), leaving it to evaluation", e),
        }
        statement.where_clause = Some(where_text);
    }

    if let Some(group_text) = clause_text("GROUP BY") {
        let keys: Vec<String> = Scanner::split_top_level(&group_text, ',')
            .into_iter()
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(SqlError::parse_error("Empty GROUP BY list", None));
        }
        statement.group_by = Some(keys);
    }

    let mut having_condition = None;
    if let Some(having_text) = clause_text("HAVING").filter(|t| !t.is_empty()) {
        let having_text = super::projection::normalize_function_names(&having_text);
        having_condition = ExpressionParser::parse_condition(&having_text).ok();
        statement.having = Some(having_text);
    }

    if let Some(order_text) = clause_text("ORDER BY") {
        let keys = parse_order_by(&order_text, &mut windows);
        if keys.is_empty() {
            return Err(SqlError::parse_error("Empty ORDER BY list", None));
        }
        statement.order_by = Some(keys);
    }

    if let Some(limit_text) = clause_text("LIMIT") {
        let limit = limit_text.parse::<usize>().map_err(|_| {
            SqlError::parse_error(format!("Invalid LIMIT '{}'", limit_text), None)
        })?;
        statement.limit = Some(limit);
    }

    statement.aggregate_calls = extract_aggregate_calls(
        &statement.select,
        having_condition.as_ref(),
        statement.order_by.as_deref(),
        &windows,
    );
    statement.windows = windows;

    log::trace!(
        "Parsed SELECT: {} projections, {} joins, {} aggregates, {} windows",
        statement.select.len(),
        statement.joins.len(),
        statement.aggregate_calls.len(),
        statement.windows.len()
    );
    Ok(statement)
}

/// Finds top-level JOIN keywords between FROM and the first tail clause.
fn locate_joins(text: &str, from: usize, limit: usize) -> Vec<JoinMarker> {
    Scanner::find_all_keywords(&text[..limit], "JOIN")
        .into_iter()
        .filter(|(start, _)| *start >= from)
        .map(|(start, end)| {
            let before = text[from..start].trim_end();
            let words: Vec<&str> = before.rsplit(' ').take(2).collect();
            let last = words.first().map(|w| w.to_ascii_uppercase()).unwrap_or_default();
            let second = words.get(1).map(|w| w.to_ascii_uppercase()).unwrap_or_default();
            let (kind, modifier_words) = match (second.as_str(), last.as_str()) {
                ("LEFT", "OUTER") => (JoinKind::LeftOuter, 2),
                ("RIGHT", "OUTER") => (JoinKind::RightOuter, 2),
                ("FULL", "OUTER") => (JoinKind::LeftOuter, 2),
                (_, "LEFT") => (JoinKind::LeftOuter, 1),
                (_, "RIGHT") => (JoinKind::RightOuter, 1),
                (_, "INNER") => (JoinKind::Inner, 1),
                (_, "CROSS") => (JoinKind::Cross, 1),
                _ => (JoinKind::Inner, 0),
            };
            let mut marker_start = start;
            for word in words.iter().take(modifier_words) {
                if let Some(idx) = text[from..marker_start].rfind(word) {
                    marker_start = from + idx;
                }
            }
            JoinMarker {
                start: marker_start,
                body_start: end,
                kind,
            }
        })
        .collect()
}

fn parse_join(text: &str, marker: &JoinMarker, segment_end: usize) -> SqlResult<JoinClause> {
    let body = &text[marker.body_start..segment_end];
    let (table_text, predicate) = match Scanner::find_keyword(body, "ON", 0) {
        Some((start, end)) => (&body[..start], Some(body[end..].trim().to_string())),
        None => (body, None),
    };
    let table = parse_table_ref(table_text, marker.body_start)?;
    let predicate = predicate.filter(|p| !p.is_empty());
    let kind = if predicate.is_none() && marker.kind == JoinKind::Inner {
        JoinKind::Cross
    } else {
        marker.kind
    };
    Ok(JoinClause {
        kind,
        table,
        predicate,
    })
}

/// `name`, `name alias` or `name AS alias`.
fn parse_table_ref(text: &str, position: usize) -> SqlResult<TableRef> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let (name, alias) = match words.as_slice() {
        [name] => (*name, None),
        [name, alias] => (*name, Some(*alias)),
        [name, as_kw, alias] if as_kw.eq_ignore_ascii_case("AS") => (*name, Some(*alias)),
        [] => return Err(SqlError::parse_error("Missing table name", Some(position))),
        _ => {
            return Err(SqlError::parse_error(
                format!("Unsupported table reference '{}'", text.trim()),
                Some(position),
            ));
        }
    };
    if name.starts_with('(') {
        return Err(SqlError::parse_error(
            "Derived tables are not supported",
            Some(position),
        ));
    }
    if let Some(alias) = alias {
        if RESERVED.iter().any(|r| r.eq_ignore_ascii_case(alias)) {
            return Err(SqlError::parse_error(
                format!("Unexpected keyword '{}' after table name", alias),
                Some(position),
            ));
        }
    }
    Ok(TableRef {
        name: unquote_identifier(name),
        alias: alias.map(unquote_identifier),
    })
}

/// Walks the top-level AND chain of a condition.
fn top_level_conjuncts(condition: &Condition) -> Vec<&Condition> {
    match condition {
        Condition::And(left, right) => {
            let mut out = top_level_conjuncts(left);
            out.extend(top_level_conjuncts(right));
            out
        }
        other => vec![other],
    }
}

/// First `column [NOT] IN (literal, ...)` conjunct, with integer-looking
/// values coerced to numbers.
fn extract_in_list(condition: &Condition) -> Option<InListSpec> {
    top_level_conjuncts(condition)
        .into_iter()
        .find_map(|conjunct| match conjunct {
            Condition::InList {
                expr: Expr::Column(column),
                values,
                negated,
            } => {
                let literals: Option<Vec<FieldValue>> = values
                    .iter()
                    .map(|v| match v {
                        Expr::Literal(FieldValue::String(s)) if INTEGER_PATTERN.is_match(s) => {
                            s.parse::<i64>().ok().map(FieldValue::Integer)
                        }
                        Expr::Literal(value) => Some(value.clone()),
                        _ => None,
                    })
                    .collect();
                literals.map(|values| InListSpec {
                    column: column.clone(),
                    values,
                    negated: *negated,
                })
            }
            _ => None,
        })
}

fn extract_exists(condition: &Condition) -> Option<ExistsSpec> {
    top_level_conjuncts(condition)
        .into_iter()
        .find_map(|conjunct| match conjunct {
            Condition::Exists { subquery, negated } => Some(ExistsSpec {
                subquery: subquery.clone(),
                negated: *negated,
            }),
            _ => None,
        })
}
