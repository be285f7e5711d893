// SQL emulation module for questql
// Parses loosely written SQL and evaluates it against in-memory tables

pub mod ast;
pub mod config;
pub mod error;
pub mod execution;
pub mod parser;

// Re-export main API
pub use ast::Statement;
pub use error::{SqlError, SqlResult};
pub use execution::config::EmulatorConfig;
pub use execution::engine::SqlEmulator;
pub use execution::registry::{Manifest, Registry};
pub use execution::types::{Database, FieldValue, Row};
pub use parser::SqlParser;

// Version and feature info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FEATURES: &[&str] = &[
    "select",
    "distinct",
    "joins",                 // INNER, LEFT, RIGHT and comma cross joins
    "subqueries",            // IN (SELECT ...), = (SELECT ...), EXISTS (SELECT ...)
    "aggregate_functions",   // COUNT, SUM, AVG, MIN, MAX with optional DISTINCT
    "having_clause",
    "window_functions",      // ROW_NUMBER, RANK and aggregates with OVER
    "conditional_functions", // CASE WHEN, COALESCE
    "union",                 // UNION and UNION ALL
    "insert",                // non-persisting INSERT ... VALUES
];
