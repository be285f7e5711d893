use crate::unit::common::{column, field, guild_hall, int_column, run};
use questql::questql::sql::{EmulatorConfig, FieldValue, SqlEmulator, SqlError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_filters_rows_in_table_order() {
        let rows = run("SELECT name FROM heroes WHERE level > 10");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd"]);
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_numeric_string_compares_as_number() {
        let rows = run("SELECT name FROM heroes WHERE gold < 50");
        assert_eq!(column(&rows, "name"), vec!["Dara"]);

        let rows = run("SELECT name FROM heroes WHERE gold = 45");
        assert_eq!(column(&rows, "name"), vec!["Dara"]);
    }

    #[test]
    fn test_null_comparison_is_never_true() {
        let rows = run("SELECT name FROM heroes WHERE guild_id <> 1");
        assert_eq!(column(&rows, "name"), vec!["Bram"]);

        let rows = run("SELECT name FROM heroes WHERE guild_id IS NULL");
        assert_eq!(column(&rows, "name"), vec!["Dara"]);
    }

    #[test]
    fn test_like_is_case_insensitive() {
        let rows = run("SELECT name FROM heroes WHERE name LIKE 'a%'");
        assert_eq!(column(&rows, "name"), vec!["Ayla"]);

        let rows = run("SELECT name FROM guilds WHERE city LIKE '%fall'");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_and_or_with_parentheses() {
        let rows = run(
            "SELECT name FROM heroes WHERE (class = 'mage' AND level > 12) OR class = 'rogue'",
        );
        assert_eq!(column(&rows, "name"), vec!["Cyd", "Dara"]);
    }

    #[test]
    fn test_between_and_not_like() {
        let rows = run("SELECT name FROM heroes WHERE level BETWEEN 8 AND 12 AND name NOT LIKE 'b%'");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Dara"]);
    }

    #[test]
    fn test_literal_in_list_and_negation() {
        let rows = run("SELECT name FROM heroes WHERE class IN ('mage', 'rogue')");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd", "Dara"]);

        let rows = run("SELECT name FROM heroes WHERE id NOT IN (1, 2)");
        assert_eq!(column(&rows, "name"), vec!["Cyd", "Dara"]);
    }

    #[test]
    fn test_in_list_survives_aggregation() {
        let rows = run("SELECT COUNT(*) FROM heroes WHERE id IN (7, 8)");
        assert_eq!(rows, run("SELECT COUNT(*) FROM heroes WHERE id = 7"));
        assert_eq!(int_column(&rows, "COUNT(*)"), vec![0]);

        let rows = run("SELECT class, COUNT(*) AS n FROM heroes WHERE id IN (1, 3) GROUP BY class");
        assert_eq!(column(&rows, "class"), vec!["mage"]);
        assert_eq!(int_column(&rows, "n"), vec![2]);
    }

    #[test]
    fn test_order_by_null_placement() {
        let ascending = run("SELECT name, guild_id FROM heroes ORDER BY guild_id");
        assert_eq!(column(&ascending, "name"), vec!["Dara", "Ayla", "Cyd", "Bram"]);

        let descending = run("SELECT name, guild_id FROM heroes ORDER BY guild_id DESC");
        assert_eq!(column(&descending, "name"), vec!["Bram", "Ayla", "Cyd", "Dara"]);
    }

    #[test]
    fn test_order_by_multiple_keys_and_alias() {
        let rows = run("SELECT name, level AS lvl FROM heroes ORDER BY lvl DESC, name DESC");
        assert_eq!(column(&rows, "name"), vec!["Cyd", "Ayla", "Dara", "Bram"]);
    }

    #[test]
    fn test_order_by_column_not_selected() {
        let rows = run("SELECT name FROM heroes ORDER BY gold DESC");
        assert_eq!(column(&rows, "name"), vec!["Cyd", "Ayla", "Bram", "Dara"]);
    }

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let rows = run("SELECT DISTINCT class FROM heroes");
        assert_eq!(column(&rows, "class"), vec!["mage", "warrior", "rogue"]);
    }

    #[test]
    fn test_limit_truncates_sorted_result() {
        let rows = run("SELECT name FROM heroes ORDER BY level DESC LIMIT 2");
        assert_eq!(column(&rows, "name"), vec!["Cyd", "Ayla"]);
    }

    #[test]
    fn test_wildcard_drops_qualifiers_for_single_table() {
        let rows = run("SELECT * FROM heroes WHERE id = 1");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].keys().collect::<Vec<_>>(),
            vec!["id", "name", "class", "level", "gold", "guild_id"]
        );
    }

    #[test]
    fn test_case_and_coalesce_projection() {
        let rows = run(
            "SELECT name, CASE WHEN level >= 10 THEN 'veteran' ELSE 'novice' END AS tier, \
             COALESCE(guild_id, 0) AS guild FROM heroes",
        );
        assert_eq!(column(&rows, "tier"), vec!["veteran", "novice", "veteran", "novice"]);
        assert_eq!(int_column(&rows, "guild"), vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_table_alias_qualified_columns() {
        let rows = run("SELECT h.name FROM heroes AS h WHERE h.level = 8");
        assert_eq!(column(&rows, "name"), vec!["Bram", "Dara"]);
    }

    #[test]
    fn test_alnum_fallback_follows_config() {
        let db = guild_hall();
        let loose = SqlEmulator::with_builtins().emulate("SELECT guildid FROM heroes", &db);
        assert_eq!(field(&loose[0], "guildid"), FieldValue::Integer(1));

        let strict = SqlEmulator::with_builtins()
            .with_config(EmulatorConfig::strict())
            .emulate("SELECT guildid FROM heroes", &db);
        assert_eq!(field(&strict[0], "guildid"), FieldValue::Null);
    }

    #[test]
    fn test_emulation_is_idempotent() {
        let db = guild_hall();
        let emulator = SqlEmulator::with_builtins();
        let sql = "SELECT class, COUNT(*) AS n FROM heroes WHERE level > 5 GROUP BY class ORDER BY n DESC";
        let first = emulator.emulate(sql, &db);
        let second = emulator.emulate(sql, &db);
        assert_eq!(first, second);
        assert_eq!(db, guild_hall(), "emulation must not touch the database");
    }

    #[test]
    fn test_failures_produce_empty_results() {
        assert!(run("SELEC name FROM heroes").is_empty());
        assert!(run("SELECT name FROM dragons").is_empty());
        assert!(run("").is_empty());
        assert!(run("SELECT name").is_empty());
    }

    #[test]
    fn test_try_emulate_reports_error_kinds() {
        let db = guild_hall();
        let emulator = SqlEmulator::with_builtins();

        let missing = emulator.try_emulate("SELECT name FROM dragons", &db);
        assert!(
            matches!(missing, Err(SqlError::TableError { ref table_name, .. }) if table_name == "dragons"),
            "expected table error, got {:?}",
            missing
        );

        let malformed = emulator.try_emulate("SELECT name", &db);
        assert!(
            matches!(malformed, Err(SqlError::ParseError { .. })),
            "expected parse error, got {:?}",
            malformed
        );
    }
}
