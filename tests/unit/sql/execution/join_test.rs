use crate::unit::common::{column, field, int_column, run};
use questql::questql::sql::FieldValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_join_drops_unmatched_rows() {
        let rows = run(
            "SELECT h.name, g.name AS guild FROM heroes h INNER JOIN guilds g ON h.guild_id = g.id",
        );
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Bram", "Cyd"]);
        assert_eq!(column(&rows, "guild"), vec!["Red Fang", "Blue Tide", "Red Fang"]);
    }

    #[test]
    fn test_bare_join_is_inner() {
        let rows = run("SELECT h.name FROM heroes h JOIN quests q ON q.hero_id = h.id WHERE q.reward > 30");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Ayla"]);
    }

    #[test]
    fn test_left_join_pads_with_nulls() {
        let rows = run("SELECT h.name, g.city FROM heroes h LEFT JOIN guilds g ON h.guild_id = g.id");
        assert_eq!(rows.len(), 4);
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Bram", "Cyd", "Dara"]);
        assert_eq!(field(&rows[3], "city"), FieldValue::Null);
    }

    #[test]
    fn test_left_join_where_is_null_finds_orphans() {
        let rows = run(
            "SELECT g.name FROM guilds g LEFT OUTER JOIN heroes h ON h.guild_id = g.id WHERE h.id IS NULL",
        );
        assert_eq!(column(&rows, "name"), vec!["Grey Ward"]);
    }

    #[test]
    fn test_right_join_keeps_every_right_row() {
        let rows = run(
            "SELECT h.name, g.name AS guild FROM heroes h RIGHT JOIN guilds g ON h.guild_id = g.id",
        );
        assert_eq!(column(&rows, "guild"), vec!["Red Fang", "Red Fang", "Blue Tide", "Grey Ward"]);
        assert_eq!(field(&rows[3], "name"), FieldValue::Null);
    }

    #[test]
    fn test_comma_join_is_cartesian() {
        let rows = run("SELECT COUNT(*) AS n FROM heroes h, guilds g");
        assert_eq!(int_column(&rows, "n"), vec![12]);

        let rows = run("SELECT COUNT(*) AS n FROM heroes CROSS JOIN guilds");
        assert_eq!(int_column(&rows, "n"), vec![12]);

        let rows = run("SELECT h.name FROM heroes h, guilds g WHERE h.guild_id = g.id AND g.city = 'Saltmere'");
        assert_eq!(column(&rows, "name"), vec!["Bram"]);
    }

    #[test]
    fn test_missing_join_table_policy() {
        let inner = run("SELECT h.name FROM heroes h INNER JOIN dragons d ON h.id = d.hero_id");
        assert!(inner.is_empty(), "inner join with a missing table must be empty");

        let left = run("SELECT h.name FROM heroes h LEFT JOIN dragons d ON h.id = d.hero_id");
        assert_eq!(column(&left, "name"), vec!["Ayla", "Bram", "Cyd", "Dara"]);
    }

    #[test]
    fn test_wildcard_over_join_keeps_colliding_names_qualified() {
        let rows = run("SELECT * FROM heroes h JOIN guilds g ON h.guild_id = g.id WHERE h.id = 1");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(field(row, "h.name"), FieldValue::from("Ayla"));
        assert_eq!(field(row, "g.name"), FieldValue::from("Red Fang"));
        assert_eq!(field(row, "city"), FieldValue::from("Emberfall"));
        assert!(row.get("name").is_none(), "ambiguous bare name must not be emitted");
    }

    #[test]
    fn test_qualified_wildcard_selects_one_side() {
        let rows = run("SELECT g.* FROM heroes h JOIN guilds g ON h.guild_id = g.id WHERE h.id = 2");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["id", "name", "city"]);
    }

    #[test]
    fn test_join_then_group() {
        let rows = run(
            "SELECT h.name, SUM(q.reward) AS total FROM heroes h JOIN quests q ON q.hero_id = h.id \
             GROUP BY h.name ORDER BY total DESC",
        );
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd"]);
        assert_eq!(int_column(&rows, "total"), vec![120, 20]);
    }
}
