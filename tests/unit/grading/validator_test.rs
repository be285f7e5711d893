use crate::unit::common::{guild_hall, init_logging};
use questql::questql::grading::{FloorSpec, QueryValidator, SpecialValidation, validate};
use questql::questql::sql::SqlEmulator;

#[cfg(test)]
mod tests {
    use super::*;

    fn passes(query: &str, floor: &FloorSpec) -> bool {
        init_logging();
        validate(query, floor, &guild_hall())
    }

    #[test]
    fn test_answer_accepts_equivalent_query() {
        let floor = FloorSpec::with_answer("SELECT name, level FROM heroes WHERE level > 10");
        assert!(passes(
            "SELECT h.level, h.name FROM heroes h WHERE h.level >= 12 ORDER BY name DESC",
            &floor
        ));
        assert!(!passes("SELECT name FROM heroes WHERE level > 10", &floor));
        assert!(!passes("SELECT name, level FROM heroes", &floor));
    }

    #[test]
    fn test_answer_accepts_qualified_aggregate() {
        let floor = FloorSpec::with_answer("SELECT class, SUM(gold) FROM heroes GROUP BY class");
        assert!(passes(
            "SELECT h.class, SUM(h.gold) FROM heroes h GROUP BY h.class",
            &floor
        ));
    }

    #[test]
    fn test_empty_answer_accepts_only_empty_results() {
        let floor = FloorSpec::with_answer("SELECT name FROM heroes WHERE level > 100");
        assert!(passes("SELECT name FROM heroes WHERE level > 200", &floor));
        assert!(passes("SELECT name FROM dragons", &floor), "failing queries are empty results");
        assert!(!passes("SELECT name FROM heroes", &floor));
    }

    #[test]
    fn test_join_query_special_validation() {
        let floor = FloorSpec::with_special(SpecialValidation::JoinQuery);
        assert!(passes(
            "SELECT h.name FROM heroes h JOIN guilds g ON h.guild_id = g.id",
            &floor
        ));
        assert!(!passes("SELECT name FROM heroes", &floor));
        assert!(!passes(
            "SELECT h.name FROM heroes h JOIN guilds g ON h.guild_id = g.id WHERE h.level > 100",
            &floor
        ));
    }

    #[test]
    fn test_boss_query_special_validation() {
        let floor = FloorSpec::with_special(SpecialValidation::BossQuery);
        assert!(passes(
            "SELECT class, COUNT(*) FROM heroes GROUP BY class HAVING COUNT(*) > 1 ORDER BY class",
            &floor
        ));
        assert!(!passes("SELECT class, COUNT(*) FROM heroes GROUP BY class ORDER BY class", &floor));
    }

    #[test]
    fn test_patterns_must_all_match() {
        let floor = FloorSpec::with_patterns([r"\bWHERE\b", "level"]);
        assert!(passes("select name from heroes where level > 3", &floor));
        assert!(!passes("SELECT name FROM heroes WHERE gold > 3", &floor));
    }

    #[test]
    fn test_invalid_pattern_fails_the_floor() {
        let floor = FloorSpec::with_patterns(["("]);
        assert!(!passes("SELECT (1) FROM heroes", &floor));
    }

    #[test]
    fn test_floor_without_strategy_rejects() {
        assert!(!passes("SELECT name FROM heroes", &FloorSpec::default()));
    }

    #[test]
    fn test_grade_report_describes_the_verdict() {
        init_logging();
        let emulator = SqlEmulator::with_builtins();
        let validator = QueryValidator::new(&emulator);
        let floor = FloorSpec::with_answer("SELECT name FROM heroes WHERE class = 'mage'");

        let report = validator.grade("SELECT name FROM heroes", &floor, &guild_hall());
        assert!(!report.passed);
        assert_eq!(report.strategy, "answer");
        assert_eq!(report.actual_rows, 4);
        assert_eq!(report.expected_rows, Some(2));
        assert_eq!(report.notes.len(), 1);

        let report = validator.grade(
            "SELECT name FROM heroes WHERE class LIKE 'MAGE'",
            &floor,
            &guild_hall(),
        );
        assert!(report.passed, "notes: {:?}", report.notes);
    }

    #[test]
    fn test_floor_documents_deserialize() {
        let floor: FloorSpec =
            serde_json::from_str(r#"{"specialValidation": "joinQuery"}"#).unwrap();
        assert!(passes(
            "SELECT h.name FROM heroes h INNER JOIN quests q ON q.hero_id = h.id",
            &floor
        ));

        let floor: FloorSpec = serde_yaml::from_str("answer: \"  \"\npatterns: [GROUP]\n").unwrap();
        assert!(passes("SELECT class FROM heroes GROUP BY class", &floor));
    }
}
