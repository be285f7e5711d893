use crate::unit::common::{column, guild_hall, run};
use questql::questql::sql::{SqlEmulator, SqlError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_subquery() {
        let rows = run("SELECT name FROM heroes WHERE id IN (SELECT hero_id FROM quests)");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd"]);
    }

    #[test]
    fn test_not_in_subquery() {
        let rows = run("SELECT name FROM heroes WHERE id NOT IN (SELECT hero_id FROM bans)");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd", "Dara"]);
    }

    #[test]
    fn test_equality_with_single_value_subquery() {
        let rows = run("SELECT name FROM heroes WHERE level = (SELECT MAX(level) FROM heroes)");
        assert_eq!(column(&rows, "name"), vec!["Cyd"]);
    }

    #[test]
    fn test_equality_with_multi_value_subquery_acts_as_in() {
        let rows = run("SELECT name FROM heroes WHERE id = (SELECT hero_id FROM quests)");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd"]);
    }

    #[test]
    fn test_equality_with_empty_subquery_matches_nothing() {
        let rows = run("SELECT name FROM heroes WHERE id = (SELECT hero_id FROM quests WHERE reward > 1000)");
        assert!(rows.is_empty());
    }

    #[test]
    fn test_scalar_comparison_subquery() {
        let rows = run("SELECT name FROM heroes WHERE gold > (SELECT AVG(gold) FROM heroes)");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd"]);
    }

    #[test]
    fn test_scalar_comparison_with_many_rows_fails() {
        let result = SqlEmulator::with_builtins().try_emulate(
            "SELECT name FROM heroes WHERE gold > (SELECT gold FROM heroes)",
            &guild_hall(),
        );
        assert!(
            matches!(result, Err(SqlError::ExecutionError { .. })),
            "expected execution error, got {:?}",
            result
        );
    }

    #[test]
    fn test_subquery_with_alias_and_join() {
        let rows = run(
            "SELECT name FROM heroes WHERE guild_id IN \
             (SELECT g.id FROM guilds g WHERE g.city = 'Emberfall')",
        );
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd"]);
    }

    #[test]
    fn test_exists_and_not_exists() {
        let rows = run("SELECT name FROM heroes WHERE EXISTS (SELECT hero_id FROM bans)");
        assert_eq!(rows.len(), 4);

        let rows = run("SELECT name FROM heroes WHERE NOT EXISTS (SELECT hero_id FROM bans)");
        assert!(rows.is_empty());

        let rows = run("SELECT name FROM heroes WHERE NOT EXISTS (SELECT hero_id FROM bans WHERE hero_id = 99)");
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_exists_combined_with_other_predicates() {
        let rows = run("SELECT name FROM heroes WHERE level > 10 AND EXISTS (SELECT quest_id FROM quests)");
        assert_eq!(column(&rows, "name"), vec!["Ayla", "Cyd"]);
    }

    #[test]
    fn test_failing_subquery_empties_the_result() {
        let rows = run("SELECT name FROM heroes WHERE id IN (SELECT hero_id FROM dragons)");
        assert!(rows.is_empty());
    }
}
