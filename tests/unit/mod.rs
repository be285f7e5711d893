pub mod common;
pub mod grading;
pub mod sql;
