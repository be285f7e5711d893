//! Shared fixtures for the unit tests.

use questql::questql::sql::{Database, FieldValue, Row, SqlEmulator};
use serde_json::json;

/// Enables `RUST_LOG` output for a test; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The guild-hall database most tests run against.
///
/// Dara has no guild and stores gold as a string, which exercises null
/// handling and loose numeric comparison.
pub fn guild_hall() -> Database {
    Database::from_json(json!({
        "heroes": [
            {"id": 1, "name": "Ayla", "class": "mage", "level": 12, "gold": 150, "guild_id": 1},
            {"id": 2, "name": "Bram", "class": "warrior", "level": 8, "gold": 90, "guild_id": 2},
            {"id": 3, "name": "Cyd", "class": "mage", "level": 15, "gold": 300, "guild_id": 1},
            {"id": 4, "name": "Dara", "class": "rogue", "level": 8, "gold": "45", "guild_id": null}
        ],
        "guilds": [
            {"id": 1, "name": "Red Fang", "city": "Emberfall"},
            {"id": 2, "name": "Blue Tide", "city": "Saltmere"},
            {"id": 3, "name": "Grey Ward", "city": "Emberfall"}
        ],
        "quests": [
            {"quest_id": 10, "hero_id": 1, "reward": 50},
            {"quest_id": 11, "hero_id": 1, "reward": 70},
            {"quest_id": 12, "hero_id": 3, "reward": 20}
        ],
        "bans": [
            {"hero_id": 2}
        ],
        "scores": [
            {"player": "a", "team": "x", "pts": 10},
            {"player": "b", "team": "x", "pts": 10},
            {"player": "c", "team": "x", "pts": 20},
            {"player": "d", "team": "y", "pts": 5}
        ]
    }))
    .expect("fixture database is valid")
}

/// Runs `sql` with the built-in registry against [`guild_hall`].
pub fn run(sql: &str) -> Vec<Row> {
    init_logging();
    SqlEmulator::with_builtins().emulate(sql, &guild_hall())
}

pub fn make_row(pairs: &[(&str, FieldValue)]) -> Row {
    Row::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
}

/// The value of `field` in `row`, or NULL when absent.
pub fn field(row: &Row, name: &str) -> FieldValue {
    row.get(name).cloned().unwrap_or(FieldValue::Null)
}

/// Display text of `field` across `rows`.
pub fn column(rows: &[Row], name: &str) -> Vec<String> {
    rows.iter().map(|r| field(r, name).to_string()).collect()
}

/// Integer values of `field` across `rows`; panics on anything else.
pub fn int_column(rows: &[Row], name: &str) -> Vec<i64> {
    rows.iter()
        .map(|r| match field(r, name) {
            FieldValue::Integer(i) => i,
            other => panic!("expected integer in '{}', got {:?}", name, other),
        })
        .collect()
}
