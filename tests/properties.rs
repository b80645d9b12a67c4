use plankey::query_ast::{canonicalize_text, decompose, normalize_full_query, QueryPlanManager};
use proptest::prelude::*;

fn in_list(values: &[u32]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

proptest! {
    #[test]
    fn in_lists_share_a_key(a in prop::collection::vec(0u32..100_000, 2..12), b in prop::collection::vec(0u32..100_000, 2..12)) {
        let left = normalize_full_query(&format!("SELECT * FROM t WHERE x IN ({}) AND y = 1", in_list(&a))).unwrap();
        let right = normalize_full_query(&format!("SELECT * FROM t WHERE x IN ({}) AND y = 2", in_list(&b))).unwrap();
        prop_assert_eq!(&left, &right);
        prop_assert_eq!(left, "SELECT * FROM t WHERE x IN ( ?? ) AND y = ?");
    }

    #[test]
    fn literals_follow_source_order(values in prop::collection::vec(0u32..1_000, 1..8), name in "[a-zA-Z0-9 ]{0,12}") {
        let mut sql = format!("SELECT * FROM t WHERE s = '{name}'");
        for v in &values { sql.push_str(&format!(" OR n = {v}")); }
        let d = decompose(&sql).unwrap();
        let mut expected = vec![format!("'{name}'")];
        expected.extend(values.iter().map(|v| v.to_string()));
        prop_assert_eq!(d.literals, expected);
    }

    #[test]
    fn canonical_text_is_a_fixed_point(id in 0u32..10_000, country in "[a-zA-Z]{1,10}") {
        let sql = format!("SELECT * FROM users WHERE id = {id} AND city_id IN (SELECT id FROM cities WHERE country = '{country}')");
        let once = normalize_full_query(&sql).unwrap();
        prop_assert_eq!(canonicalize_text(&once), once.clone());
        prop_assert_eq!(normalize_full_query(&once).unwrap(), once);
    }

    #[test]
    fn requests_equal_hits_plus_misses(picks in prop::collection::vec((0usize..4, 0u32..50), 1..20)) {
        let shapes = [
            "SELECT * FROM customers WHERE id = {}",
            "SELECT * FROM users WHERE city_id IN (SELECT id FROM cities WHERE zip = {})",
            "SELECT * FROM orders WHERE c IN (SELECT id FROM customers WHERE r IN (SELECT id FROM regions WHERE z = {}))",
            "SELECT a FROM t WHERE b IN ({}, 1, 2) ORDER BY a",
        ];
        let mut manager = QueryPlanManager::new();
        let mut last_score = 0;
        for (shape, value) in picks {
            let sql = shapes[shape].replace("{}", &value.to_string());
            manager.fetch_or_generate_query_plan(&sql).unwrap();
            let m = manager.metrics();
            prop_assert_eq!(m.requests, m.hits + m.misses);
            prop_assert!(manager.total_complexity_score() >= last_score);
            last_score = manager.total_complexity_score();
        }
    }
}
