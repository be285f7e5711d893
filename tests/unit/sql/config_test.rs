use questql::questql::sql::config::{
    ConfigError, load_emulator_config, load_manifest, load_registry,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_emulator_config_from_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "engine.yaml",
            "trace_phases: true\nnull_partition_key: \"~\"\n",
        );
        let config = load_emulator_config(&path).unwrap();
        assert!(config.trace_phases);
        assert!(config.alnum_fallback, "unset fields keep their defaults");
        assert_eq!(config.null_partition_key, "~");
    }

    #[test]
    fn test_manifest_extends_merges_clause_maps() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "base.yaml",
            "clauses:\n  SELECT: plugins/select.js\n  WHERE: plugins/where.js\naggregates:\n  COUNT: builtin:count\n",
        );
        let chapter = write(
            dir.path(),
            "chapter.yaml",
            "extends: base.yaml\nclauses:\n  GROUP BY: plugins/group_by.js\n",
        );

        let manifest = load_manifest(&chapter).unwrap();
        assert_eq!(
            manifest.clauses.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["GROUP BY", "SELECT", "WHERE"]
        );
        assert_eq!(manifest.aggregates.len(), 1);

        let registry = load_registry(&chapter).unwrap();
        assert_eq!(registry.phase_order(), vec!["WHERE", "GROUP BY", "SELECT"]);
    }

    #[test]
    fn test_json_manifest_loads() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "manifest.json",
            r#"{"clauses": {"SELECT": "builtin:select", "ORDER BY": "builtin:order_by"}}"#,
        );
        let registry = load_registry(&path).unwrap();
        assert_eq!(registry.clause_keywords(), vec!["ORDER BY", "SELECT"]);
    }

    #[test]
    fn test_circular_extends_is_reported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.yaml", "extends: b.yaml\n");
        let b = write(dir.path(), "b.yaml", "extends: a.yaml\n");
        let result = load_manifest(&b);
        assert!(
            matches!(result, Err(ConfigError::CircularDependency { .. })),
            "expected circular dependency, got {:?}",
            result
        );
    }

    #[test]
    fn test_missing_file_and_bad_aggregate() {
        let dir = TempDir::new().unwrap();
        let result = load_manifest(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let path = write(dir.path(), "bad.yaml", "aggregates:\n  MEDIAN: builtin:median\n");
        let result = load_registry(&path);
        assert!(
            matches!(result, Err(ConfigError::UnknownPlugin { ref keyword, .. }) if keyword == "MEDIAN"),
            "expected unknown plugin, got {:?}",
            result
        );
    }
}
