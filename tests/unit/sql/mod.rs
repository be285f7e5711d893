pub mod config_test;
pub mod execution;
pub mod parser_test;
