//! Property-based tests for query matching and filter evaluation.
//!
//! These verify the matching rules for arbitrary query lines, FIFO
//! consumption of expectations, and that filtering never reorders rows.

use livemock_core::{
    FixtureSet, MatchMode, MockConfig, MockLivestatus, SessionError, evaluate_filter, row,
};
use livemock_proto::{Row, Value};
use proptest::prelude::*;

/// Single query lines without newlines.
fn query_line() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 :=_.]{0,20}"
}

fn query_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(query_line(), 1..6)
}

#[test]
fn prop_loose_accepts_any_superset() {
    proptest!(|(expected in query_lines(), extra in query_lines(), seed in any::<u64>())| {
        let mut actual: Vec<String> = expected.iter().chain(&extra).cloned().collect();
        actual.sort_by_key(|line| {
            let mut h = seed;
            for b in line.bytes() {
                h = h.wrapping_mul(31).wrapping_add(u64::from(b));
            }
            h
        });

        // PROPERTY: extra lines and any line order are tolerated
        prop_assert!(MatchMode::Loose.matches(&expected.join("\n"), &actual.join("\n")));
    });
}

#[test]
fn prop_loose_ignores_cache_lines() {
    proptest!(|(expected in query_lines(), cache in "[a-z]{1,8}")| {
        let pattern = format!("{}\nCache: {cache}", expected.join("\n"));

        // PROPERTY: `Cache: ` lines of the expected query are never required
        prop_assert!(MatchMode::Loose.matches(&pattern, &expected.join("\n")));
    });
}

#[test]
fn prop_strict_is_equality() {
    proptest!(|(a in query_lines(), b in query_lines())| {
        let (a, b) = (a.join("\n"), b.join("\n"));
        prop_assert_eq!(MatchMode::Strict.matches(&a, &b), a == b);
        prop_assert!(MatchMode::Strict.matches(&a, &a));
    });
}

#[test]
fn prop_ellipsis_without_placeholder_is_equality() {
    proptest!(|(a in "[A-Za-z0-9 ;\\[\\]()*+?]{0,20}", b in "[A-Za-z0-9 ;\\[\\]()*+?]{0,20}")| {
        // PROPERTY: text without `...` matches only itself, metacharacters included
        prop_assert_eq!(MatchMode::Ellipsis.matches(&a, &b), a == b);
    });
}

#[test]
fn prop_fifo_consumption() {
    proptest!(|(tables in prop::collection::vec("[a-z]{1,8}", 1..8))| {
        let live = MockLivestatus::with_fixtures(MockConfig::default(), FixtureSet::empty());
        for table in &tables {
            live.expect_query_with(format!("GET {table}"), MatchMode::Strict)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
        }

        let scope = live.enter_with(false).map_err(|e| TestCaseError::fail(e.to_string()))?;
        for table in &tables {
            // PROPERTY: only the head is ever matched
            let result = live.lookup_next_query(&format!("GET {table}"));
            prop_assert!(result.is_ok(), "{:?}", result);
        }
        prop_assert_eq!(
            live.lookup_next_query("GET hosts"),
            Err(SessionError::UnexpectedQuery { query: "GET hosts".to_string() })
        );
        prop_assert!(scope.finish().is_ok());
    });
}

#[test]
fn prop_filter_preserves_order() {
    proptest!(|(states in prop::collection::vec(0i64..4, 0..20), threshold in 0i64..4)| {
        let rows: Vec<Row> = states
            .iter()
            .enumerate()
            .map(|(i, state)| row([("id", Value::from(i as i64)), ("state", Value::Int(*state))]))
            .collect();

        let kept = evaluate_filter(&format!("Filter: state > {threshold}"), &rows)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let expected: Vec<Row> =
            rows.iter().filter(|row| row["state"] > Value::Int(threshold)).cloned().collect();

        // PROPERTY: filtering keeps exactly the passing rows, in input order
        prop_assert_eq!(kept, expected);
    });
}
