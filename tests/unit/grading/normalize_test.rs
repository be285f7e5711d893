use crate::unit::common::{make_row, run};
use questql::questql::grading::ResultNormalizer;
use questql::questql::sql::FieldValue;
use serde_json::json;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_and_column_order_do_not_matter() {
        let left = vec![
            make_row(&[("name", "Ayla".into()), ("level", 12i64.into())]),
            make_row(&[("name", "Cyd".into()), ("level", 15i64.into())]),
        ];
        let right = vec![
            make_row(&[("level", 15i64.into()), ("name", "Cyd".into())]),
            make_row(&[("level", 12i64.into()), ("name", "Ayla".into())]),
        ];
        assert!(ResultNormalizer::equivalent(&left, &right));
    }

    #[test]
    fn test_qualifiers_and_case_are_ignored() {
        let left = vec![make_row(&[("h.Name", "Ayla".into())])];
        let right = vec![make_row(&[("name", "Ayla".into())])];
        assert!(ResultNormalizer::equivalent(&left, &right));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let left = vec![make_row(&[("gold", "45".into()), ("avg", FieldValue::Float(2.0))])];
        let right = vec![make_row(&[("gold", 45i64.into()), ("avg", 2i64.into())])];
        assert!(ResultNormalizer::equivalent(&left, &right));

        let different = vec![make_row(&[("gold", 46i64.into()), ("avg", 2i64.into())])];
        assert!(!ResultNormalizer::equivalent(&left, &different));
    }

    #[test]
    fn test_collapsed_names_keep_both_values() {
        let row = make_row(&[
            ("h.name", "Ayla".into()),
            ("g.name", "Red Fang".into()),
            ("g.id", FieldValue::Null),
            ("h.id", 1i64.into()),
        ]);
        let canonical = ResultNormalizer::normalize_row(&row);
        assert_eq!(canonical["name"], json!(["Ayla", "Red Fang"]));
        assert_eq!(canonical["id"], json!(1));
    }

    #[test]
    fn test_duplicate_rows_are_significant() {
        let once = vec![make_row(&[("a", 1i64.into())])];
        let twice = vec![make_row(&[("a", 1i64.into())]), make_row(&[("a", 1i64.into())])];
        assert!(!ResultNormalizer::equivalent(&once, &twice));
    }

    #[test]
    fn test_queries_differing_only_in_order_and_alias_normalise_equal() {
        let expected = run("SELECT name, level FROM heroes WHERE level > 10");
        let actual = run("SELECT h.level, h.name FROM heroes h WHERE h.level >= 12 ORDER BY h.name DESC");
        assert_eq!(
            ResultNormalizer::normalize(&expected),
            ResultNormalizer::normalize(&actual)
        );
        assert_eq!(
            ResultNormalizer::canonical_form(&expected),
            r#"[{"level":12,"name":"Ayla"},{"level":15,"name":"Cyd"}]"#
        );
    }

    #[test]
    fn test_function_call_names_lose_argument_qualifiers() {
        let qualified = vec![make_row(&[("SUM(h.gold)", 30i64.into()), ("COUNT(*)", 2i64.into())])];
        let bare = vec![make_row(&[("sum(gold)", 30i64.into()), ("count(*)", 2i64.into())])];
        assert!(ResultNormalizer::equivalent(&qualified, &bare));
        assert_eq!(
            ResultNormalizer::normalize_row(&qualified[0]).keys().collect::<Vec<_>>(),
            vec!["count(*)", "sum(gold)"]
        );

        let other_column = vec![make_row(&[("SUM(level)", 30i64.into()), ("COUNT(*)", 2i64.into())])];
        assert!(!ResultNormalizer::equivalent(&qualified, &other_column));
    }

    #[test]
    fn test_aggregate_over_alias_matches_unqualified_aggregate() {
        let expected = run("SELECT SUM(gold) FROM heroes");
        let actual = run("SELECT SUM(h.gold) FROM heroes h");
        assert_eq!(actual.len(), 1);
        assert!(ResultNormalizer::equivalent(&expected, &actual));
        assert_eq!(ResultNormalizer::canonical_form(&actual), r#"[{"sum(gold)":585}]"#);
    }
}
