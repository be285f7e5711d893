pub mod grading;
pub mod sql;
