use crate::unit::common::{column, init_logging, int_column, run};
use questql::questql::sql::{Database, EmulatorConfig, SqlEmulator};
use serde_json::json;

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> Database {
        Database::from_json(json!({"nums": [{"x": 1}, {"x": 2}, {"x": 3}]})).unwrap()
    }

    #[test]
    fn test_rank_shares_ties_row_number_does_not() {
        let rows = run(
            "SELECT player, RANK() OVER (ORDER BY pts) AS r, ROW_NUMBER() OVER (ORDER BY pts) AS rn \
             FROM scores WHERE team = 'x'",
        );
        assert_eq!(column(&rows, "player"), vec!["a", "b", "c"]);
        assert_eq!(int_column(&rows, "r"), vec![1, 1, 3]);
        assert_eq!(int_column(&rows, "rn"), vec![1, 2, 3]);
    }

    #[test]
    fn test_running_sum_needs_window_order() {
        init_logging();
        let emulator = SqlEmulator::with_builtins();

        let running = emulator.emulate("SELECT x, SUM(x) OVER (ORDER BY x) AS s FROM nums", &numbers());
        assert_eq!(int_column(&running, "s"), vec![1, 3, 6]);

        let whole = emulator.emulate("SELECT x, SUM(x) OVER () AS s FROM nums", &numbers());
        assert_eq!(int_column(&whole, "s"), vec![6, 6, 6]);
    }

    #[test]
    fn test_partitions_number_independently() {
        let rows = run(
            "SELECT player, ROW_NUMBER() OVER (PARTITION BY team ORDER BY pts DESC) AS rn FROM scores",
        );
        assert_eq!(column(&rows, "player"), vec!["a", "b", "c", "d"]);
        assert_eq!(int_column(&rows, "rn"), vec![2, 3, 1, 1]);
    }

    #[test]
    fn test_partition_aggregate_without_order() {
        let rows = run("SELECT player, COUNT(*) OVER (PARTITION BY team) AS size FROM scores");
        assert_eq!(int_column(&rows, "size"), vec![3, 3, 3, 1]);
    }

    #[test]
    fn test_order_by_window_alias() {
        let rows = run(
            "SELECT player, RANK() OVER (ORDER BY pts DESC) AS r FROM scores ORDER BY r, player",
        );
        assert_eq!(column(&rows, "player"), vec!["c", "a", "b", "d"]);
        assert_eq!(int_column(&rows, "r"), vec![1, 2, 2, 4]);
    }

    #[test]
    fn test_window_over_grouped_rows() {
        let rows = run(
            "SELECT team, SUM(pts) AS total, RANK() OVER (ORDER BY SUM(pts) DESC) AS place \
             FROM scores GROUP BY team",
        );
        assert_eq!(column(&rows, "team"), vec!["x", "y"]);
        assert_eq!(int_column(&rows, "place"), vec![1, 2]);
    }

    #[test]
    fn test_null_partition_key_is_configurable() {
        init_logging();
        let db = Database::from_json(json!({
            "crew": [{"p": "a", "team": null}, {"p": "b", "team": "<null>"}]
        }))
        .unwrap();
        let sql = "SELECT p, COUNT(*) OVER (PARTITION BY team) AS n FROM crew";

        let shared = SqlEmulator::with_builtins().emulate(sql, &db);
        assert_eq!(int_column(&shared, "n"), vec![2, 2]);

        let config = EmulatorConfig::new().with_null_partition_key("#none#");
        let split = SqlEmulator::with_builtins().with_config(config).emulate(sql, &db);
        assert_eq!(int_column(&split, "n"), vec![1, 1]);
    }
}
