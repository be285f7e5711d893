/// Field Value Comparison Utilities
///
/// Equality and ordering between FieldValue instances. These are pure
/// functions with no engine state dependency.
use crate::questql::sql::ast::CompareOp;
use crate::questql::sql::execution::types::FieldValue;
use std::cmp::Ordering;

/// Utility class for comparing FieldValue instances
pub struct FieldValueComparator;

impl FieldValueComparator {
    /// Strict equality: same type (Integer and Float count as one numeric type)
    pub fn values_equal(left: &FieldValue, right: &FieldValue) -> bool {
        match (left, right) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => (a - b).abs() < f64::EPSILON,
            (FieldValue::Integer(a), FieldValue::Float(b))
            | (FieldValue::Float(b), FieldValue::Integer(a)) => (*a as f64 - b).abs() < f64::EPSILON,
            (FieldValue::String(a), FieldValue::String(b)) => a == b,
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::Null, FieldValue::Null) => true,
            _ => false,
        }
    }

    /// Loose equality used by predicates: a number equals a string holding
    /// the same number, and booleans equal their textual form.
    pub fn values_equal_with_coercion(left: &FieldValue, right: &FieldValue) -> bool {
        if Self::values_equal(left, right) {
            return true;
        }
        match (left, right) {
            (FieldValue::Null, _) | (_, FieldValue::Null) => false,
            (FieldValue::String(_), FieldValue::Integer(_) | FieldValue::Float(_))
            | (FieldValue::Integer(_) | FieldValue::Float(_), FieldValue::String(_)) => {
                match (left.as_f64(), right.as_f64()) {
                    (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
                    _ => false,
                }
            }
            (FieldValue::Boolean(b), FieldValue::String(s))
            | (FieldValue::String(s), FieldValue::Boolean(b)) => s.eq_ignore_ascii_case(&b.to_string()),
            _ => false,
        }
    }

    /// Total order used for sorting. NULL is the smallest value; numbers
    /// (including numeric strings) compare numerically; everything else
    /// compares by its text.
    pub fn compare_values(left: &FieldValue, right: &FieldValue) -> Ordering {
        match (left, right) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Less,
            (_, FieldValue::Null) => Ordering::Greater,
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a.cmp(b),
            (FieldValue::String(a), FieldValue::String(b)) => a.cmp(b),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => left.to_string().cmp(&right.to_string()),
            },
        }
    }

    /// Evaluates `left op right` with three-valued logic: any NULL operand
    /// yields `None`.
    pub fn compare_for_boolean(
        left: &FieldValue,
        right: &FieldValue,
        op: CompareOp,
    ) -> Option<bool> {
        if left.is_null() || right.is_null() {
            return None;
        }
        let result = match op {
            CompareOp::Eq => Self::values_equal_with_coercion(left, right),
            CompareOp::NotEq => !Self::values_equal_with_coercion(left, right),
            CompareOp::Lt => Self::ordering(left, right) == Ordering::Less,
            CompareOp::LtEq => Self::ordering(left, right) != Ordering::Greater,
            CompareOp::Gt => Self::ordering(left, right) == Ordering::Greater,
            CompareOp::GtEq => Self::ordering(left, right) != Ordering::Less,
        };
        Some(result)
    }

    /// Ordering for range predicates: numeric when both sides are numeric,
    /// otherwise by text.
    fn ordering(left: &FieldValue, right: &FieldValue) -> Ordering {
        match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) if !matches!((left, right), (FieldValue::String(_), FieldValue::String(_))) => {
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            _ => Self::compare_values(left, right),
        }
    }
}
