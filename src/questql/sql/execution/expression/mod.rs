//! Expression evaluation.
//!
//! - [`ExpressionEvaluator`] evaluates value expressions and predicates
//!   against one row
//! - [`WindowFunctions`] computes window values over a whole row set
//! - [`SubqueryExecutor`] is the seam through which predicates run nested
//!   queries

pub mod evaluator;
pub mod subquery_executor;
pub mod window_functions;

pub use evaluator::ExpressionEvaluator;
pub use subquery_executor::SubqueryExecutor;
pub use window_functions::WindowFunctions;
