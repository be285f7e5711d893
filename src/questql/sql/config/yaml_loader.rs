//! YAML Configuration Loader with Extends Support
//!
//! Manifests and engine configs are small YAML documents. A document may
//! name a base document with `extends:`; mappings are merged key by key with
//! the extending document winning, anything else is replaced outright.
//!
//! ```yaml
//! # base_manifest.yaml
//! clauses:
//!   SELECT: plugins/select.js
//!   WHERE: plugins/where.js
//! aggregates:
//!   COUNT: builtin:count
//!
//! # chapter_two.yaml
//! extends: base_manifest.yaml
//! clauses:
//!   GROUP BY: builtin:group_by
//! ```
//!
//! JSON documents are valid YAML and load the same way.

use crate::questql::sql::error::SqlError;
use crate::questql::sql::execution::config::EmulatorConfig;
use crate::questql::sql::execution::registry::{Manifest, Registry};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("YAML parsing error in {file}: {error}")]
    ParseError {
        file: PathBuf,
        error: serde_yaml::Error,
    },

    #[error("IO error reading {file}: {error}")]
    IoError {
        file: PathBuf,
        error: std::io::Error,
    },

    #[error("Circular extends chain: {chain:?}")]
    CircularDependency { chain: Vec<PathBuf> },

    #[error("Unknown plugin for '{keyword}': {message}")]
    UnknownPlugin { keyword: String, message: String },
}

impl From<SqlError> for ConfigError {
    fn from(error: SqlError) -> Self {
        match error {
            SqlError::RegistryError { keyword, message } => {
                ConfigError::UnknownPlugin { keyword, message }
            }
            other => ConfigError::UnknownPlugin {
                keyword: String::new(),
                message: other.to_string(),
            },
        }
    }
}

/// Loads YAML documents, resolving `extends` chains.
pub struct YamlConfigLoader {
    loading_stack: Vec<PathBuf>,
}

impl Default for YamlConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl YamlConfigLoader {
    pub fn new() -> Self {
        Self {
            loading_stack: Vec::new(),
        }
    }

    /// Loads `path` and every document it extends, merged.
    pub fn load_value<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<serde_yaml::Value, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let canonical = path.canonicalize().map_err(|e| ConfigError::IoError {
            file: path.to_path_buf(),
            error: e,
        })?;
        if self.loading_stack.contains(&canonical) {
            let mut chain = self.loading_stack.clone();
            chain.push(canonical);
            return Err(ConfigError::CircularDependency { chain });
        }

        let content = fs::read_to_string(&canonical).map_err(|e| ConfigError::IoError {
            file: canonical.clone(),
            error: e,
        })?;
        let mut value: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                file: canonical.clone(),
                error: e,
            })?;

        let extends = match &mut value {
            serde_yaml::Value::Mapping(map) => map
                .remove("extends")
                .and_then(|v| v.as_str().map(str::to_string)),
            _ => None,
        };

        let Some(extends) = extends else {
            return Ok(value);
        };

        let base_path = match canonical.parent() {
            Some(parent) if Path::new(&extends).is_relative() => parent.join(&extends),
            _ => PathBuf::from(&extends),
        };
        log::debug!("{} extends {}", canonical.display(), base_path.display());

        self.loading_stack.push(canonical);
        let base = self.load_value(&base_path);
        self.loading_stack.pop();
        Ok(merge_values(&base?, &value))
    }

    /// Loads and deserializes `path`.
    pub fn load<T: DeserializeOwned, P: AsRef<Path>>(&mut self, path: P) -> Result<T, ConfigError> {
        let path = path.as_ref();
        let value = self.load_value(path)?;
        serde_yaml::from_value(value).map_err(|e| ConfigError::ParseError {
            file: path.to_path_buf(),
            error: e,
        })
    }
}

/// Merges `derived` over `base`; mappings merge recursively.
fn merge_values(base: &serde_yaml::Value, derived: &serde_yaml::Value) -> serde_yaml::Value {
    match (base, derived) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(derived_map)) => {
            let mut merged = base_map.clone();
            for (key, derived_value) in derived_map {
                let value = match base_map.get(key) {
                    Some(base_value) => merge_values(base_value, derived_value),
                    None => derived_value.clone(),
                };
                merged.insert(key.clone(), value);
            }
            serde_yaml::Value::Mapping(merged)
        }
        _ => derived.clone(),
    }
}

/// Loads any deserializable document.
pub fn load_typed<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ConfigError> {
    YamlConfigLoader::new().load(path)
}

pub fn load_emulator_config<P: AsRef<Path>>(path: P) -> Result<EmulatorConfig, ConfigError> {
    load_typed(path)
}

pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Manifest, ConfigError> {
    load_typed(path)
}

/// Loads a manifest and initialises a registry from it.
pub fn load_registry<P: AsRef<Path>>(path: P) -> Result<Registry, ConfigError> {
    let manifest = load_manifest(path)?;
    let mut registry = Registry::new();
    registry.initialize(&manifest)?;
    Ok(registry)
}
