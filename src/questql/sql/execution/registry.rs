/*!
# Clause and Aggregate Registry

Maps clause keywords (`WHERE`, `GROUP BY`, ...) to [`ClausePlugin`]s and
aggregate names to [`AggregateFunction`]s. A registry is populated once from a
[`Manifest`] and is read-only afterwards; a second `initialize` is a no-op.

## Locators

A manifest maps each keyword to a locator naming the implementation. Only the
locator's stem matters: the text after the last `/` or `:`, without extension,
lower-cased, with `_`, `-` and spaces removed. So `plugins/group_by.js`,
`builtin:group-by` and `GroupBy` all name the GROUP BY plugin.

```yaml
clauses:
  SELECT: plugins/select.js
  WHERE: builtin:where
  PIVOT: plugins/pivot.js      # unknown stem, registered as a pass-through extension
aggregates:
  COUNT: builtin:count
```

Unknown clause stems become [`ClausePlugin::Extension`]; unknown aggregate
stems are a registry error.

## Phase Order

[`Registry::phase_order`] lists the registered row-set phases in evaluation
order: WHERE, GROUP BY, HAVING, IN, ORDER BY, then every other registered
keyword alphabetically, then SELECT. Structural keywords (INSERT, the joins,
UNION) are not phases.
*/

use crate::questql::sql::error::{SqlError, SqlResult};
use crate::questql::sql::execution::aggregation::AggregateFunction;
use crate::questql::sql::execution::processors::ClausePlugin;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Phases with a fixed position, in order.
const FIXED_PHASES: [&str; 5] = ["WHERE", "GROUP BY", "HAVING", "IN", "ORDER BY"];

/// Keywords evaluated outside the phase loop.
const STRUCTURAL_KEYWORDS: [&str; 4] = ["INSERT", "INNER JOIN", "LEFT JOIN", "UNION"];

/// Declarative registry contents: keyword → locator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub clauses: BTreeMap<String, String>,
    #[serde(default)]
    pub aggregates: BTreeMap<String, String>,
}

impl Manifest {
    /// A manifest naming every built-in clause and aggregate.
    pub fn builtin() -> Self {
        let clauses = ClausePlugin::BUILTINS
            .iter()
            .map(|p| {
                let keyword = p.keyword().to_string();
                let locator = format!("builtin:{}", keyword.to_lowercase().replace(' ', "_"));
                (keyword, locator)
            })
            .collect();
        let aggregates = AggregateFunction::ALL
            .iter()
            .map(|f| (f.name().to_string(), format!("builtin:{}", f.name().to_lowercase())))
            .collect();
        Self {
            clauses,
            aggregates,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    clauses: HashMap<String, ClausePlugin>,
    aggregates: HashMap<String, AggregateFunction>,
    initialized: bool,
}

impl Registry {
    /// An empty, uninitialised registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in clause and aggregate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for plugin in ClausePlugin::BUILTINS {
            registry.register_clause(plugin.keyword().to_string(), plugin);
        }
        for function in AggregateFunction::ALL {
            registry.register_aggregate(function.name(), function);
        }
        registry.initialized = true;
        registry
    }

    /// The minimal set used when no manifest is available: SELECT, WHERE,
    /// GROUP BY and ORDER BY plus the built-in aggregates.
    pub fn fallback() -> Self {
        log::warn!("No clause manifest available, using fallback registry");
        let mut registry = Self::new();
        for plugin in [
            ClausePlugin::Select,
            ClausePlugin::Where,
            ClausePlugin::GroupBy,
            ClausePlugin::OrderBy,
        ] {
            registry.register_clause(plugin.keyword().to_string(), plugin);
        }
        for function in AggregateFunction::ALL {
            registry.register_aggregate(function.name(), function);
        }
        registry.initialized = true;
        registry
    }

    /// Populates the registry from a manifest.
    ///
    /// Returns `Ok(false)` without changes if the registry was already
    /// initialised. Every entry is resolved before anything is registered, so
    /// a bad manifest leaves the registry untouched.
    pub fn initialize(&mut self, manifest: &Manifest) -> SqlResult<bool> {
        if self.initialized {
            log::debug!("Registry already initialised; manifest ignored");
            return Ok(false);
        }

        let mut clauses = Vec::with_capacity(manifest.clauses.len());
        for (keyword, locator) in &manifest.clauses {
            let keyword = normalize_keyword(keyword);
            let plugin = ClausePlugin::builtin(&locator_stem(locator)).unwrap_or_else(|| {
                log::warn!(
                    "Clause '{}' has no built-in for '{}'; registered as pass-through",
                    keyword,
                    locator
                );
                ClausePlugin::Extension {
                    keyword: keyword.clone(),
                    locator: locator.clone(),
                }
            });
            clauses.push((keyword, plugin));
        }

        let mut aggregates = Vec::with_capacity(manifest.aggregates.len());
        for (name, locator) in &manifest.aggregates {
            let function = AggregateFunction::from_name(&locator_stem(locator)).ok_or_else(|| {
                SqlError::registry_error(name, format!("unknown aggregate locator '{}'", locator))
            })?;
            aggregates.push((name.clone(), function));
        }

        for (keyword, plugin) in clauses {
            log::debug!("Clause {}: {}", keyword, plugin.describe());
            self.register_clause(keyword, plugin);
        }
        for (name, function) in aggregates {
            self.register_aggregate(&name, function);
        }
        self.initialized = true;
        log::debug!(
            "Registry initialised with {} clauses and {} aggregates",
            self.clauses.len(),
            self.aggregates.len()
        );
        Ok(true)
    }

    pub fn register_clause(&mut self, keyword: String, plugin: ClausePlugin) {
        self.clauses.insert(normalize_keyword(&keyword), plugin);
    }

    pub fn register_aggregate(&mut self, name: &str, function: AggregateFunction) {
        self.aggregates.insert(name.trim().to_uppercase(), function);
    }

    /// The plugin registered under a keyword (case and spacing insensitive).
    pub fn clause(&self, keyword: &str) -> Option<&ClausePlugin> {
        self.clauses.get(&normalize_keyword(keyword))
    }

    pub fn aggregate(&self, name: &str) -> Option<AggregateFunction> {
        self.aggregates.get(&name.trim().to_uppercase()).copied()
    }

    /// Registered clause keywords, sorted.
    pub fn clause_keywords(&self) -> Vec<&str> {
        let mut keywords: Vec<&str> = self.clauses.keys().map(String::as_str).collect();
        keywords.sort_unstable();
        keywords
    }

    /// Registered row-set phases in evaluation order.
    pub fn phase_order(&self) -> Vec<&str> {
        let mut phases: Vec<&str> = FIXED_PHASES
            .iter()
            .copied()
            .filter(|k| self.clauses.contains_key(*k))
            .collect();
        phases.extend(self.clause_keywords().into_iter().filter(|k| {
            *k != "SELECT" && !FIXED_PHASES.contains(k) && !STRUCTURAL_KEYWORDS.contains(k)
        }));
        if self.clauses.contains_key("SELECT") {
            phases.push("SELECT");
        }
        phases
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Upper-cases a keyword and collapses internal whitespace.
fn normalize_keyword(keyword: &str) -> String {
    keyword
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// The implementation name a locator points at.
fn locator_stem(locator: &str) -> String {
    let tail = locator
        .rsplit(['/', ':', '\\'])
        .next()
        .unwrap_or(locator);
    let stem = match tail.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => tail,
    };
    stem.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect::<String>()
        .to_lowercase()
}
