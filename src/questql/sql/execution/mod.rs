//! Statement evaluation.
//!
//! [`SqlEmulator`] drives a parsed statement through the clause
//! [`processors`] in the order the [`Registry`] prescribes. Supporting pieces:
//!
//! - [`types`] - the value, row and database model
//! - [`resolver`] - loose column lookup across qualifiers and case
//! - [`condition`] - three-valued predicate evaluation
//! - [`expression`] - value expressions, window functions and subqueries
//! - [`aggregation`] - SUM / COUNT / AVG / MIN / MAX

pub mod aggregation;
pub mod condition;
pub mod config;
pub mod engine;
pub mod expression;
pub mod processors;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod utils;

pub use config::EmulatorConfig;
pub use engine::SqlEmulator;
pub use registry::{Manifest, Registry};
pub use types::{Database, FieldValue, Row, Table};
