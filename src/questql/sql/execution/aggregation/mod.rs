//! Aggregation for player queries.
//!
//! - [`AggregateFunction`] - the SUM / COUNT / AVG / MIN / MAX reducers
//! - [`AggregateFunctions`] - applies an extracted aggregate call to a row set
//!
//! The same reducers back GROUP BY, the no-GROUP-BY fold and aggregate
//! window functions.

pub mod functions;

pub use functions::{AggregateFunction, AggregateFunctions};
