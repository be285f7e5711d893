use crate::unit::common::{column, field, guild_hall, init_logging};
use questql::questql::sql::execution::aggregation::AggregateFunction;
use questql::questql::sql::execution::processors::ClausePlugin;
use questql::questql::sql::{EmulatorConfig, FieldValue, Manifest, Registry, Row, SqlEmulator, SqlError};
use std::collections::BTreeMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(clauses: &[(&str, &str)], aggregates: &[(&str, &str)]) -> Manifest {
        let to_map = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Manifest {
            clauses: to_map(clauses),
            aggregates: to_map(aggregates),
        }
    }

    fn emulate_with(registry: Registry, sql: &str) -> Vec<Row> {
        init_logging();
        SqlEmulator::new(registry, EmulatorConfig::default()).emulate(sql, &guild_hall())
    }

    #[test]
    fn test_builtin_manifest_round_trips_through_initialize() {
        let mut registry = Registry::new();
        let changed = registry.initialize(&Manifest::builtin());
        assert!(matches!(changed, Ok(true)), "initialize failed: {:?}", changed);
        assert_eq!(
            registry.clause_keywords(),
            Registry::with_builtins().clause_keywords()
        );
        assert_eq!(registry.aggregate("avg"), Some(AggregateFunction::Avg));
    }

    #[test]
    fn test_unregistered_clauses_are_skipped() {
        let mut registry = Registry::new();
        registry
            .initialize(&manifest(
                &[("SELECT", "plugins/select.js"), ("WHERE", "plugins/where.js")],
                &[],
            ))
            .unwrap();

        let rows = emulate_with(
            registry,
            "SELECT name FROM heroes WHERE level > 5 ORDER BY level DESC",
        );
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Bram", "Cyd", "Dara"]);
    }

    #[test]
    fn test_unregistered_where_keeps_every_row() {
        let mut registry = Registry::new();
        registry
            .initialize(&manifest(&[("select", "builtin:select")], &[]))
            .unwrap();

        let rows = emulate_with(registry, "SELECT name FROM heroes WHERE level > 100");
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_fallback_registry_has_no_having() {
        let registry = Registry::fallback();
        assert!(registry.clause("HAVING").is_none());
        assert!(registry.clause("order   by").is_some());

        let rows = emulate_with(
            registry,
            "SELECT class, COUNT(*) AS n FROM heroes GROUP BY class HAVING COUNT(*) > 1",
        );
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_structural_keywords_fall_back_to_builtins() {
        let registry = Registry::fallback();
        let rows = emulate_with(
            registry,
            "SELECT h.name FROM heroes h LEFT JOIN guilds g ON h.guild_id = g.id",
        );
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_aggregate_locator_selects_the_reducer() {
        let mut registry = Registry::new();
        registry
            .initialize(&manifest(
                &[("SELECT", "builtin:select")],
                &[("SUM", "aggregates/max.js")],
            ))
            .unwrap();

        let rows = emulate_with(registry, "SELECT SUM(level) AS s, MIN(level) AS m FROM heroes");
        assert_eq!(field(&rows[0], "s"), FieldValue::Integer(15));
        assert_eq!(field(&rows[0], "m"), FieldValue::Integer(8));
    }

    #[test]
    fn test_window_aggregates_use_the_registered_reducer() {
        let mut registry = Registry::new();
        registry
            .initialize(&manifest(
                &[("SELECT", "builtin:select")],
                &[("SUM", "aggregates/max.js")],
            ))
            .unwrap();

        let rows = emulate_with(registry, "SELECT name, SUM(level) OVER () AS s FROM heroes");
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(field(row, "s"), FieldValue::Integer(15));
        }
    }

    #[test]
    fn test_unknown_aggregate_locator_is_rejected() {
        let mut registry = Registry::new();
        let result = registry.initialize(&manifest(
            &[("SELECT", "builtin:select")],
            &[("MEDIAN", "aggregates/median.js")],
        ));
        assert!(
            matches!(result, Err(SqlError::RegistryError { ref keyword, .. }) if keyword == "MEDIAN"),
            "expected registry error, got {:?}",
            result
        );
        assert!(!registry.is_initialized());
        assert!(registry.clause("SELECT").is_none());
    }

    #[test]
    fn test_unknown_clause_is_a_pass_through_extension() {
        let mut registry = Registry::new();
        registry
            .initialize(&manifest(
                &[
                    ("SELECT", "builtin:select"),
                    ("WHERE", "builtin:where"),
                    ("PIVOT", "plugins/pivot.js"),
                ],
                &[],
            ))
            .unwrap();
        assert!(matches!(
            registry.clause("PIVOT"),
            Some(ClausePlugin::Extension { .. })
        ));
        assert_eq!(registry.phase_order(), vec!["WHERE", "PIVOT", "SELECT"]);

        let rows = emulate_with(registry, "SELECT name FROM heroes WHERE level > 10");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd"]);
    }

    #[test]
    fn test_initialize_runs_once() {
        let mut registry = Registry::with_builtins();
        let second = registry.initialize(&manifest(&[("SELECT", "builtin:select")], &[]));
        assert!(matches!(second, Ok(false)));
        assert!(registry.clause("HAVING").is_some());
    }
}
