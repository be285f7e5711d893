//! Loading of engine configuration, registry manifests and floor specs from
//! YAML files.

pub mod yaml_loader;

pub use yaml_loader::{
    ConfigError, YamlConfigLoader, load_emulator_config, load_manifest, load_registry,
    load_typed,
};
