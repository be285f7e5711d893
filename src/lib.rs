//! # questql
//!
//! An in-memory SQL emulation engine for SQL puzzle games.
//!
//! Player queries are parsed by a small hand-written parser, evaluated against
//! row-oriented mock tables by a phased clause pipeline, and graded by
//! comparing the normalised result with the result of a reference answer.
//!
//! ## Features
//!
//! - **Loose parsing**: SELECT / INSERT / UNION shapes, joins, subqueries in `IN (...)`
//!   and `= (...)` and `EXISTS (...)`, CASE, COALESCE and window functions
//! - **Phased evaluation**: WHERE → GROUP BY → HAVING → IN → ORDER BY → SELECT, driven
//!   by a [`Registry`](questql::sql::execution::registry::Registry) of clause plugins
//! - **Grading**: order and alias insensitive result comparison
//!
//! ## Quick Start
//!
//! ```rust
//! use questql::questql::sql::{Database, SqlEmulator};
//! use serde_json::json;
//!
//! let db = Database::from_json(json!({
//!     "potions": [
//!         {"name": "Ember", "price": 12},
//!         {"name": "Frost", "price": 8}
//!     ]
//! }))
//! .unwrap();
//!
//! let emulator = SqlEmulator::with_builtins();
//! let rows = emulator.emulate("SELECT name FROM potions WHERE price > 10", &db);
//! assert_eq!(rows.len(), 1);
//! ```

#![allow(clippy::collapsible_if)]
#![allow(clippy::large_enum_variant)]

pub mod questql;
