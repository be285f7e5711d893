use crate::unit::common::{column, field, guild_hall, init_logging, int_column, run};
use questql::questql::sql::{Database, FieldValue, SqlEmulator};
use serde_json::json;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_removes_duplicates() {
        let rows = run("SELECT class FROM heroes UNION SELECT class FROM heroes");
        assert_eq!(column(&rows, "class"), vec!["mage", "warrior", "rogue"]);
    }

    #[test]
    fn test_union_all_keeps_duplicates() {
        let rows = run("SELECT class FROM heroes UNION ALL SELECT class FROM heroes");
        assert_eq!(rows.len(), 8);
    }

    #[test]
    fn test_union_fills_missing_columns_with_null() {
        init_logging();
        let db = Database::from_json(json!({"x": [{"a": 1}], "y": [{"b": 2}]})).unwrap();
        let rows = SqlEmulator::with_builtins().emulate("SELECT a FROM x UNION SELECT b FROM y", &db);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        }
        assert_eq!(field(&rows[0], "b"), FieldValue::Null);
        assert_eq!(field(&rows[1], "a"), FieldValue::Null);
        assert_eq!(field(&rows[1], "b"), FieldValue::Integer(2));
    }

    #[test]
    fn test_union_branches_keep_their_own_clauses() {
        let rows = run(
            "SELECT name FROM heroes WHERE level > 12 UNION SELECT name FROM guilds WHERE city = 'Saltmere'",
        );
        assert_eq!(column(&rows, "name"), vec!["Cyd", "Blue Tide"]);
    }

    #[test]
    fn test_union_with_failing_branch_is_empty() {
        let rows = run("SELECT name FROM heroes UNION SELECT name FROM dragons");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_insert_returns_the_new_row() {
        let rows = run("INSERT INTO heroes (id, name, level) VALUES (5, 'Eve', 3)");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["id", "name", "level"]);
        assert_eq!(field(&rows[0], "name"), FieldValue::from("Eve"));
        assert_eq!(int_column(&rows, "level"), vec![3]);
    }

    #[test]
    fn test_insert_synthesises_without_mutating() {
        init_logging();
        let db = Database::from_json(json!({"t": [{"id": 1}]})).unwrap();
        let emulator = SqlEmulator::with_builtins();

        let inserted = emulator.emulate("INSERT INTO t (id) VALUES (2)", &db);
        assert_eq!(int_column(&inserted, "id"), vec![2]);

        let rows = emulator.emulate("SELECT * FROM t", &db);
        assert_eq!(int_column(&rows, "id"), vec![1]);
    }

    #[test]
    fn test_insert_does_not_persist() {
        init_logging();
        let db = guild_hall();
        let emulator = SqlEmulator::with_builtins();
        emulator.emulate("INSERT INTO heroes (id, name) VALUES (5, 'Eve');", &db);
        let rows = emulator.emulate("SELECT id FROM heroes", &db);
        assert_eq!(int_column(&rows, "id"), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_insert_into_unknown_table_still_returns_row() {
        let rows = run("INSERT INTO dragons (name) VALUES ('Smaug')");
        assert_eq!(column(&rows, "name"), vec!["Smaug"]);
    }

    #[test]
    fn test_insert_value_count_mismatch_is_empty() {
        assert!(run("INSERT INTO heroes (id, name) VALUES (5)").is_empty());
    }
}
