/*!
# Window Functions

Computes every window function of a statement over the current row set in one
pass per window. The result holds, for each row, one value per window in the
statement's window order, which is what [`Expr::Window`] indexes into.

## Supported Window Functions

### Ranking
- **ROW_NUMBER()** - sequential numbering within the partition, from 1
- **RANK()** - competition ranking; rows whose whole ORDER BY tuple is equal
  share a rank and the next distinct tuple skips ahead (`10, 10, 20` → `1, 1, 3`)

### Aggregate Windows
- **SUM / COUNT / AVG / MIN / MAX** - a running (prefix) value in sorted order
  when the window has ORDER BY, otherwise one whole-partition value broadcast
  to every row of the partition. `COUNT(*)` counts rows, `COUNT(expr)` counts
  non-null values.

## Partitioning and Ordering

The partition key is the `||`-joined text of the PARTITION BY values, with NULL
written as the configured sentinel. Without PARTITION BY there is a single
partition. Inside a partition rows are stably sorted by the ORDER BY keys;
NULL sorts first ascending and last descending.
*/

use super::evaluator::ExpressionEvaluator;
use crate::questql::sql::ast::{OrderDirection, WindowSpec};
use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::aggregation::AggregateFunction;
use crate::questql::sql::execution::types::{FieldValue, Row};
use crate::questql::sql::execution::utils::FieldValueComparator;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Window function evaluator over a whole row set
pub struct WindowFunctions;

/// Resolves an aggregate window function name to its reducer.
pub type AggregateLookup<'a> = dyn Fn(&str) -> Option<AggregateFunction> + 'a;

impl WindowFunctions {
    /// Computes all `specs` over `rows`.
    ///
    /// Returns `values[row][window]`, aligned with the input row order.
    pub fn compute(
        rows: &[Row],
        specs: &[WindowSpec],
        evaluator: &ExpressionEvaluator,
        aggregates: &AggregateLookup<'_>,
        null_partition_key: &str,
    ) -> SqlResult<Vec<Vec<FieldValue>>> {
        let mut values = vec![Vec::with_capacity(specs.len()); rows.len()];
        for spec in specs {
            let column = Self::compute_one(rows, spec, evaluator, aggregates, null_partition_key)?;
            for (row_values, value) in values.iter_mut().zip(column) {
                row_values.push(value);
            }
        }
        Ok(values)
    }

    /// Computes one window, returning a value per input row.
    pub fn compute_one(
        rows: &[Row],
        spec: &WindowSpec,
        evaluator: &ExpressionEvaluator,
        aggregates: &AggregateLookup<'_>,
        null_partition_key: &str,
    ) -> SqlResult<Vec<FieldValue>> {
        let mut out = vec![FieldValue::Null; rows.len()];
        for partition in Self::partitions(rows, spec, evaluator, null_partition_key)? {
            let sorted = Self::sort_partition(rows, partition, spec, evaluator)?;
            match spec.function.as_str() {
                "ROW_NUMBER" => {
                    for (position, (idx, _)) in sorted.iter().enumerate() {
                        out[*idx] = FieldValue::Integer(position as i64 + 1);
                    }
                }
                "RANK" => {
                    let mut rank = 1;
                    for (position, (idx, keys)) in sorted.iter().enumerate() {
                        if position > 0 && !Self::keys_equal(&sorted[position - 1].1, keys) {
                            rank = position as i64 + 1;
                        }
                        out[*idx] = FieldValue::Integer(rank);
                    }
                }
                name => {
                    let function = aggregates(name).ok_or_else(|| {
                        SqlError::execution_error(
                            format!("Unsupported window function: '{}'", name),
                            None,
                        )
                    })?;
                    Self::aggregate_window(rows, &sorted, spec, function, evaluator, &mut out)?;
                }
            }
        }
        Ok(out)
    }

    /// Row indices grouped by partition key, partitions in first-seen order.
    fn partitions(
        rows: &[Row],
        spec: &WindowSpec,
        evaluator: &ExpressionEvaluator,
        null_partition_key: &str,
    ) -> SqlResult<Vec<Vec<usize>>> {
        if spec.partition_by.is_empty() {
            return Ok(vec![(0..rows.len()).collect()]);
        }
        let mut order: Vec<Vec<usize>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let mut parts = Vec::with_capacity(spec.partition_by.len());
            for expr in &spec.partition_by {
                let value = evaluator.evaluate(expr, row)?;
                parts.push(if value.is_null() {
                    null_partition_key.to_string()
                } else {
                    value.to_string()
                });
            }
            let key = parts.join("||");
            let slot = *index.entry(key).or_insert_with(|| {
                order.push(Vec::new());
                order.len() - 1
            });
            order[slot].push(idx);
        }
        Ok(order)
    }

    /// Stable sort of a partition by the window's ORDER BY keys. Returns the
    /// row index with its evaluated key tuple.
    fn sort_partition(
        rows: &[Row],
        partition: Vec<usize>,
        spec: &WindowSpec,
        evaluator: &ExpressionEvaluator,
    ) -> SqlResult<Vec<(usize, Vec<FieldValue>)>> {
        let mut keyed = Vec::with_capacity(partition.len());
        for idx in partition {
            let keys = spec
                .order_by
                .iter()
                .map(|o| evaluator.evaluate(&o.expr, &rows[idx]))
                .collect::<SqlResult<Vec<_>>>()?;
            keyed.push((idx, keys));
        }
        if !spec.order_by.is_empty() {
            keyed.sort_by(|(_, a), (_, b)| {
                for ((left, right), order) in a.iter().zip(b).zip(&spec.order_by) {
                    let ordering = FieldValueComparator::compare_values(left, right);
                    let ordering = match order.direction {
                        OrderDirection::Asc => ordering,
                        OrderDirection::Desc => ordering.reverse(),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }
        Ok(keyed)
    }

    fn keys_equal(a: &[FieldValue], b: &[FieldValue]) -> bool {
        a.iter()
            .zip(b)
            .all(|(x, y)| FieldValueComparator::compare_values(x, y) == Ordering::Equal)
    }

    fn aggregate_window(
        rows: &[Row],
        sorted: &[(usize, Vec<FieldValue>)],
        spec: &WindowSpec,
        function: AggregateFunction,
        evaluator: &ExpressionEvaluator,
        out: &mut [FieldValue],
    ) -> SqlResult<()> {
        let values = match &spec.argument {
            Some(expr) => sorted
                .iter()
                .map(|(idx, _)| evaluator.evaluate(expr, &rows[*idx]))
                .collect::<SqlResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        let reduce = |len: usize| -> FieldValue {
            match &spec.argument {
                Some(_) => function.reduce(&values[..len], None),
                None => function.reduce(&[], Some(len)),
            }
        };

        if spec.order_by.is_empty() {
            let whole = reduce(sorted.len());
            for (idx, _) in sorted {
                out[*idx] = whole.clone();
            }
        } else {
            for (position, (idx, _)) in sorted.iter().enumerate() {
                out[*idx] = reduce(position + 1);
            }
        }
        Ok(())
    }
}
