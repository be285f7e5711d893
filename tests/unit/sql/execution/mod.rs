//! Execution engine tests
//!
//! End-to-end queries through `SqlEmulator` against the shared fixture
//! database, grouped by the pipeline phase they exercise.

pub mod join_test;
pub mod pipeline_test;
pub mod registry_test;
pub mod set_operation_test;
pub mod subquery_test;
pub mod window_test;
