//! Configuration for the emulation engine
//!
//! Engine behaviour that used to hang off module-level flags is carried in an
//! explicit value handed to [`SqlEmulator`](super::engine::SqlEmulator) at
//! construction.

use serde::{Deserialize, Serialize};

/// Engine options.
///
/// Every field has a default, so a partial YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Log every pipeline phase with its row count at debug level
    /// Default: false
    pub trace_phases: bool,

    /// Let SELECT match a column whose name equals the requested one after
    /// dropping every non-alphanumeric character (`first_name` ~ `FirstName`)
    /// Default: true
    pub alnum_fallback: bool,

    /// Text standing in for NULL inside window partition keys
    /// Default: "<null>"
    pub null_partition_key: String,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            trace_phases: false,
            alnum_fallback: true,
            null_partition_key: "<null>".to_string(),
        }
    }
}

impl EmulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict resolution: no alnum-only projection fallback.
    pub fn strict() -> Self {
        Self {
            alnum_fallback: false,
            ..Self::default()
        }
    }

    pub fn with_trace_phases(mut self, enabled: bool) -> Self {
        self.trace_phases = enabled;
        self
    }

    pub fn with_alnum_fallback(mut self, enabled: bool) -> Self {
        self.alnum_fallback = enabled;
        self
    }

    pub fn with_null_partition_key(mut self, key: impl Into<String>) -> Self {
        self.null_partition_key = key.into();
        self
    }
}
