/*!
# SQL Error Handling

Error types for parsing and evaluating player queries.

## Error Categories

- **Parse Errors**: the text is not a recognisable INSERT / SELECT / UNION shape
- **Schema Errors**: a referenced column cannot be resolved (diagnostics only, the
  pipeline itself substitutes NULL)
- **Table Errors**: a FROM or JOIN table is missing from the database
- **Execution Errors**: anything else that goes wrong while evaluating
- **Registry Errors**: a manifest names a plugin that cannot be resolved

The emulation entry point never surfaces these to the player. [`SqlEmulator::emulate`]
turns every error into an empty result; [`SqlEmulator::try_emulate`] exposes them for
tooling and tests.

[`SqlEmulator::emulate`]: crate::questql::sql::SqlEmulator::emulate
[`SqlEmulator::try_emulate`]: crate::questql::sql::SqlEmulator::try_emulate

## Examples

```rust
use questql::questql::sql::error::SqlError;

let error = SqlError::parse_error("Expected FROM clause", Some(42));
assert_eq!(
    error.to_string(),
    "SQL parse error at position 42: Expected FROM clause"
);
```
*/

use std::fmt;

/// Error types for SQL parsing and emulation.
///
/// Each variant carries the context needed by a front end to explain the
/// failure to a player (which table, which column, where in the text).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlError {
    /// The query text does not match a supported statement shape.
    ParseError {
        /// Human-readable error message
        message: String,
        /// Byte position in the query text where the problem was detected
        position: Option<usize>,
    },

    /// A column reference could not be resolved against the row shape.
    SchemaError {
        message: String,
        column: Option<String>,
    },

    /// A FROM or JOIN table is not present in the database.
    TableError { table_name: String, message: String },

    /// Runtime failure while evaluating a parsed statement.
    ExecutionError {
        message: String,
        /// Query text that caused the error, if available
        query: Option<String>,
    },

    /// A manifest entry or plugin lookup failed.
    RegistryError { keyword: String, message: String },
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlError::ParseError { message, position } => {
                if let Some(pos) = position {
                    write!(f, "SQL parse error at position {}: {}", pos, message)
                } else {
                    write!(f, "SQL parse error: {}", message)
                }
            }
            SqlError::SchemaError { message, column } => {
                if let Some(col) = column {
                    write!(f, "Schema error for column '{}': {}", col, message)
                } else {
                    write!(f, "Schema error: {}", message)
                }
            }
            SqlError::TableError {
                table_name,
                message,
            } => write!(f, "Table error for '{}': {}", table_name, message),
            SqlError::ExecutionError { message, query } => {
                if let Some(q) = query {
                    write!(f, "Query execution error in '{}': {}", q, message)
                } else {
                    write!(f, "Query execution error: {}", message)
                }
            }
            SqlError::RegistryError { keyword, message } => {
                write!(f, "Registry error for '{}': {}", keyword, message)
            }
        }
    }
}

impl std::error::Error for SqlError {}

impl SqlError {
    /// Create a parse error with position
    pub fn parse_error(message: impl Into<String>, position: Option<usize>) -> Self {
        SqlError::ParseError {
            message: message.into(),
            position,
        }
    }

    /// Create a schema error
    pub fn schema_error(message: impl Into<String>, column: Option<String>) -> Self {
        SqlError::SchemaError {
            message: message.into(),
            column,
        }
    }

    /// Create a table error
    pub fn table_error(table_name: impl Into<String>, message: impl Into<String>) -> Self {
        SqlError::TableError {
            table_name: table_name.into(),
            message: message.into(),
        }
    }

    /// Create an execution error
    pub fn execution_error(message: impl Into<String>, query: Option<String>) -> Self {
        SqlError::ExecutionError {
            message: message.into(),
            query,
        }
    }

    /// Create a registry error
    pub fn registry_error(keyword: impl Into<String>, message: impl Into<String>) -> Self {
        SqlError::RegistryError {
            keyword: keyword.into(),
            message: message.into(),
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, SqlError::ParseError { .. })
    }
}

/// Result type for SQL operations
pub type SqlResult<T> = Result<T, SqlError>;
