//! Projection list handling.
//!
//! The projection list is comma-split and then re-merged wherever a split
//! point landed inside unbalanced parentheses or an open quote, so items like
//! `COALESCE(a, 'x, y')` survive as one piece.

use super::expressions::ExpressionParser;
use super::lexer::Scanner;
use crate::questql::sql::ast::{
    AggregateCall, Condition, Expr, OrderByExpr, OrderDirection, SelectItem, WindowSpec,
};
use regex::Regex;
use std::sync::LazyLock;

static AGGREGATE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(sum|count|avg|min|max)\s*\(").expect("static regex is valid")
});

/// Splits a projection list on commas and re-merges broken pieces.
pub fn split_projections(text: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;
    for piece in text.split(',') {
        let merged = match pending.take() {
            Some(prev) => format!("{},{}", prev, piece),
            None => piece.to_string(),
        };
        if Scanner::is_balanced(&merged) {
            items.push(merged.trim().to_string());
        } else {
            pending = Some(merged);
        }
    }
    if let Some(rest) = pending {
        items.push(rest.trim().to_string());
    }
    items.retain(|item| !item.is_empty());
    items
}

/// Upper-cases aggregate function names in place.
pub fn normalize_function_names(text: &str) -> String {
    AGGREGATE_NAME
        .replace_all(text, |caps: &regex::Captures| {
            format!("{}(", caps[1].to_uppercase())
        })
        .into_owned()
}

/// Splits `expr AS alias` at the last top-level AS.
fn split_alias(text: &str) -> (String, Option<String>) {
    if let Some(&(start, end)) = Scanner::find_all_keywords(text, "AS").last() {
        let expr = text[..start].trim();
        let alias = text[end..].trim();
        if !expr.is_empty() && !alias.is_empty() && !alias.contains(' ') {
            return (expr.to_string(), Some(unquote_identifier(alias)));
        }
    }
    (text.to_string(), None)
}

/// Removes surrounding quotes or backticks from an identifier.
pub fn unquote_identifier(text: &str) -> String {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

/// Parses one projection item.
///
/// An item that does not parse as an expression is kept as a column
/// reference on its raw text, which the resolver may still match.
pub fn parse_select_item(text: &str, windows: &mut Vec<WindowSpec>) -> SelectItem {
    let (expr_text, alias) = split_alias(text);
    let expr_text = normalize_function_names(&expr_text);
    let expr = match ExpressionParser::parse_expression(&expr_text, windows) {
        Ok(expr) => expr,
        Err(e) => {
            log::debug!("Projection '{}' kept as raw column: {}", expr_text, e);
            Expr::Column(expr_text.clone())
        }
    };
    SelectItem {
        text: expr_text,
        expr,
        alias,
    }
}

/// Parses an ORDER BY list.
pub fn parse_order_by(text: &str, windows: &mut Vec<WindowSpec>) -> Vec<OrderByExpr> {
    Scanner::split_top_level(text, ',')
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, direction) = strip_direction(&part);
            let key = normalize_function_names(key);
            let expr = ExpressionParser::parse_expression(&key, windows)
                .unwrap_or_else(|_| Expr::Column(key.clone()));
            OrderByExpr {
                column: key,
                expr,
                direction,
            }
        })
        .collect()
}

fn strip_direction(part: &str) -> (&str, OrderDirection) {
    let trimmed = part.trim();
    let upper = trimmed.to_ascii_uppercase();
    if upper.ends_with(" DESC") {
        (trimmed[..trimmed.len() - 5].trim(), OrderDirection::Desc)
    } else if upper.ends_with(" ASC") {
        (trimmed[..trimmed.len() - 4].trim(), OrderDirection::Asc)
    } else {
        (trimmed, OrderDirection::Asc)
    }
}

/// Collects aggregate calls from projections, HAVING, ORDER BY and the
/// PARTITION BY / ORDER BY keys of windows.
///
/// Projection aggregates come first, in order of appearance; duplicates are
/// dropped.
pub fn extract_aggregate_calls(
    select: &[SelectItem],
    having: Option<&Condition>,
    order_by: Option<&[OrderByExpr]>,
    windows: &[WindowSpec],
) -> Vec<AggregateCall> {
    let mut calls = Vec::new();
    for item in select {
        item.expr.collect_aggregates(&mut calls);
    }
    if let Some(condition) = having {
        condition.for_each_expr(&mut |e| e.collect_aggregates(&mut calls));
    }
    for key in order_by.unwrap_or(&[]) {
        key.expr.collect_aggregates(&mut calls);
    }
    for window in windows {
        for expr in &window.partition_by {
            expr.collect_aggregates(&mut calls);
        }
        for key in &window.order_by {
            key.expr.collect_aggregates(&mut calls);
        }
    }
    calls
}
