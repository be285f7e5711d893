use questql::questql::sql::ast::{
    AggregateTarget, Expr, JoinKind, OrderDirection, Statement,
};
use questql::questql::sql::{FieldValue, SqlError, SqlParser};

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Statement {
        SqlParser::new()
            .parse(sql)
            .unwrap_or_else(|e| panic!("failed to parse '{}': {}", sql, e))
    }

    #[test]
    fn test_clauses_are_split_at_top_level() {
        let statement = parse(
            "select distinct h.name as hero, level from heroes h \
             where level > 3 and id in (select hero_id from quests where reward > 10) \
             group by h.name, level having count(*) > 1 order by level desc limit 5;",
        );
        assert!(statement.distinct);
        assert_eq!(statement.select.len(), 2);
        assert_eq!(statement.select[0].alias.as_deref(), Some("hero"));
        assert_eq!(statement.select[0].output_name(), "hero");
        assert_eq!(statement.select[1].output_name(), "level");

        let from = statement.from.as_ref().unwrap();
        assert_eq!(from.name, "heroes");
        assert_eq!(from.prefix(), "h");

        assert_eq!(
            statement.where_clause.as_deref(),
            Some("level > 3 and id in (select hero_id from quests where reward > 10)")
        );
        assert_eq!(
            statement.group_by,
            Some(vec!["h.name".to_string(), "level".to_string()])
        );
        assert!(statement.having.is_some());
        let order_by = statement.order_by.as_ref().unwrap();
        assert_eq!(order_by[0].direction, OrderDirection::Desc);
        assert_eq!(statement.limit, Some(5));
    }

    #[test]
    fn test_join_kinds() {
        let statement = parse(
            "SELECT * FROM a JOIN b ON a.id = b.a_id LEFT OUTER JOIN c ON c.id = b.c_id \
             RIGHT JOIN d ON d.id = a.d_id",
        );
        let kinds: Vec<JoinKind> = statement.joins.iter().map(|j| j.kind).collect();
        assert_eq!(
            kinds,
            vec![JoinKind::Inner, JoinKind::LeftOuter, JoinKind::RightOuter]
        );
        assert_eq!(statement.joins[1].predicate.as_deref(), Some("c.id = b.c_id"));
        assert_eq!(statement.referenced_tables(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_comma_join_is_cross() {
        let statement = parse("SELECT * FROM heroes h, guilds AS g WHERE h.guild_id = g.id");
        assert_eq!(statement.joins.len(), 1);
        assert_eq!(statement.joins[0].kind, JoinKind::Cross);
        assert_eq!(statement.joins[0].table.prefix(), "g");
        assert!(statement.joins[0].predicate.is_none());
    }

    #[test]
    fn test_aggregates_are_collected_once() {
        let statement = parse(
            "SELECT class, COUNT(*), SUM(gold) AS purse FROM heroes GROUP BY class \
             HAVING COUNT(*) > 1 ORDER BY AVG(level)",
        );
        let names: Vec<String> = statement
            .aggregate_calls
            .iter()
            .map(|c| c.canonical_name())
            .collect();
        assert_eq!(names, vec!["COUNT(*)", "SUM(gold)", "AVG(level)"]);
        assert_eq!(statement.aggregate_calls[0].target, AggregateTarget::Rows);
    }

    #[test]
    fn test_count_one_counts_rows() {
        let statement = parse("SELECT COUNT(1), COUNT('1') FROM t");
        assert_eq!(statement.aggregate_calls[0].target, AggregateTarget::Rows);
        assert!(matches!(
            statement.aggregate_calls[1].target,
            AggregateTarget::Column(_)
        ));
    }

    #[test]
    fn test_literal_in_list_is_pre_extracted() {
        let statement = parse("SELECT name FROM heroes WHERE level > 2 AND id NOT IN ('3', 4, 'x')");
        let in_list = statement.in_list.expect("IN list extracted");
        assert_eq!(in_list.column, "id");
        assert!(in_list.negated);
        assert_eq!(
            in_list.values,
            vec![
                FieldValue::Integer(3),
                FieldValue::Integer(4),
                FieldValue::String("x".to_string())
            ]
        );
        assert!(statement.where_clause.is_some(), "WHERE text is kept");
    }

    #[test]
    fn test_exists_is_pre_extracted() {
        let statement = parse("SELECT name FROM heroes WHERE NOT EXISTS (SELECT 1 FROM bans)");
        let exists = statement.exists.expect("EXISTS extracted");
        assert!(exists.negated);
        assert_eq!(exists.subquery, "SELECT 1 FROM bans");
    }

    #[test]
    fn test_window_in_projection() {
        let statement = parse(
            "SELECT name, ROW_NUMBER() OVER (PARTITION BY class ORDER BY level DESC) AS rn FROM heroes",
        );
        assert_eq!(statement.windows.len(), 1);
        assert_eq!(statement.select[1].expr, Expr::Window(0));
        assert_eq!(statement.select[1].output_name(), "rn");
    }

    #[test]
    fn test_union_splits_at_first_occurrence() {
        let statement = parse("SELECT a FROM x UNION ALL SELECT b FROM y UNION SELECT c FROM z");
        let set = statement.set_operation.expect("set operation");
        assert!(set.all);
        assert_eq!(set.statements[0], "SELECT a FROM x");
        assert_eq!(set.statements[1], "SELECT b FROM y UNION SELECT c FROM z");
    }

    #[test]
    fn test_quoted_strings_hide_keywords() {
        let statement = parse("SELECT name FROM guilds WHERE motto = 'order by the sword'");
        assert!(statement.order_by.is_none());
        assert_eq!(
            statement.where_clause.as_deref(),
            Some("motto = 'order by the sword'")
        );
    }

    #[test]
    fn test_malformed_statements_are_parse_errors() {
        for sql in [
            "",
            ";",
            "DELETE FROM heroes",
            "SELECT FROM heroes",
            "SELECT name heroes",
            "SELECT a FROM x UNION",
            "INSERT INTO heroes (id, name) VALUES (1)",
        ] {
            let result = SqlParser::new().parse(sql);
            assert!(
                matches!(result, Err(SqlError::ParseError { .. })),
                "expected parse error for '{}', got {:?}",
                sql,
                result
            );
        }
    }
}
