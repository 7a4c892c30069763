//! Tests for the session lifecycle of the simulator.
//!
//! These tests verify critical invariants:
//! - Queries are answered only in declared order, each at most once
//! - Scope exit reports every unconsumed expectation
//! - Declarations are resolved against the tables present at declaration time

use insta::assert_snapshot;
use livemock_core::{
    DeclarationError, FixtureSet, MatchMode, MockConfig, MockLivestatus, STATUS_QUERY, ScopeState,
    SessionError,
};
use livemock_proto::{ResponseFrame, Row, Value};
use serde_json::json;

fn rows(value: serde_json::Value) -> Vec<Row> {
    serde_json::from_value(value).expect("fixture rows should deserialize")
}

fn hosts_mock() -> MockLivestatus {
    let live = MockLivestatus::with_fixtures(MockConfig::default(), FixtureSet::empty());
    live.add_table(
        "hosts",
        rows(json!([
            {"name": "heute", "state": 0, "alias": "Heute"},
            {"name": "morgen", "state": 1, "alias": "Morgen"},
        ])),
    );
    live
}

/// INVARIANT: queries sent in declared order never raise, and each receive
/// yields the response precomputed for its declaration.
#[test]
fn declared_order_is_answered() {
    let live = hosts_mock();
    live.expect_query("GET hosts\nColumns: name\nFilter: state = 0")
        .expect("declaration should succeed")
        .expect_query_with("GET hosts\nColumns: alias state", MatchMode::Strict)
        .expect("declaration should succeed");

    let scope = live.enter_with(false).expect("enter should succeed");

    live.socket_send(b"GET hosts\nColumns: name\nFilter: state = 0\n\n")
        .expect("first query should match");
    let frame = ResponseFrame::decode(&live.socket_recv(4096).expect("recv should succeed"))
        .expect("frame should decode");
    assert_eq!(frame.rows().expect("body should parse"), vec![vec![Value::from("heute")]]);

    live.socket_send(b"GET hosts\nColumns: alias state\n\n").expect("second query should match");
    let wire = live.socket_recv(4096).expect("recv should succeed");
    assert_snapshot!(String::from_utf8_lossy(&wire), @r"
    200          29
    [['Heute', 0], ['Morgen', 1]]
    ");

    scope.finish().expect("all expectations consumed");
}

/// INVARIANT: an empty queue rejects any query and names it.
#[test]
fn unexpected_query_names_the_text() {
    let live = hosts_mock();
    let scope = live.enter_with(false).expect("enter should succeed");

    let err = live.socket_send(b"Spanish inquisition!").expect_err("nothing is expected");
    assert_snapshot!(err.to_string(), @r"
    got unexpected query:
     * 'Spanish inquisition!'
    ");

    scope.finish().expect("nothing was declared");
}

/// INVARIANT: a mismatch names both queries and leaves the head in place.
#[test]
fn mismatch_keeps_the_head() {
    let live = hosts_mock();
    live.expect_query_with("GET hosts\nColumns: name", MatchMode::Strict)
        .expect("declaration should succeed");
    let scope = live.enter_with(false).expect("enter should succeed");

    let err = live.lookup_next_query("GET hosts\nColumns:  name").expect_err("strict mismatch");
    assert_snapshot!(err.to_string(), @r"
    expected query (strict):
     * 'GET hosts\nColumns: name'
    got query:
     * 'GET hosts\nColumns:  name'
    ");

    live.lookup_next_query("GET hosts\nColumns: name").expect("head is still expected");
    scope.finish().expect("all expectations consumed");
}

/// INVARIANT: a query is consumed at most once.
#[test]
fn repeated_query_is_unexpected() {
    let live = hosts_mock();
    live.expect_query("GET hosts\nColumns: name").expect("declaration should succeed");
    let scope = live.enter_with(false).expect("enter should succeed");

    live.lookup_next_query("GET hosts\nColumns: name").expect("first send matches");
    assert!(matches!(
        live.lookup_next_query("GET hosts\nColumns: name"),
        Err(SessionError::UnexpectedQuery { .. })
    ));
    scope.finish().expect("all expectations consumed");
}

/// INVARIANT: scope exit enumerates every unconsumed query, in order.
#[test]
fn exit_lists_unmet_queries() {
    let live = hosts_mock();
    live.expect_query("GET hosts\nColumns: name").expect("declaration should succeed");

    let scope = live.enter_with(false).expect("enter should succeed");
    let err = scope.finish().expect_err("query was never sent");

    assert_eq!(err, SessionError::UnmetExpectations {
        queries: vec!["GET hosts\nColumns: name".to_string()]
    });
    assert_snapshot!(err.to_string(), @r"
    expected queries were not queried:
     * 'GET hosts\nColumns: name'
    ");
}

/// INVARIANT: the status probe is inserted first, before earlier declarations.
#[test]
fn status_probe_must_come_first() {
    let live = MockLivestatus::new();
    live.expect_query("GET hosts\nColumns: name").expect("declaration should succeed");

    let scope = live.enter().expect("enter should succeed");
    let err = live.lookup_next_query("GET hosts\nColumns: name").expect_err("probe is first");
    assert!(matches!(err, SessionError::QueryMismatch { mode: MatchMode::Loose, .. }));

    let status = live.lookup_next_query(STATUS_QUERY).expect("probe matches");
    let Value::Str(version) = &status[0][0] else {
        panic!("livestatus_version should be text, got {:?}", status[0][0]);
    };
    assert_eq!(version.split('.').count(), 3);

    live.lookup_next_query("GET hosts\nColumns: name").expect("declared query follows");
    scope.finish().expect("all expectations consumed");
}

/// INVARIANT: the configured default for the status probe applies to `enter`.
#[test]
fn status_probe_can_be_disabled_by_config() {
    let config = MockConfig { expect_status_query: false, ..MockConfig::default() };
    let live = MockLivestatus::with_config(config);

    let scope = live.enter().expect("enter should succeed");
    assert!(live.pending_queries().is_empty());
    scope.finish().expect("nothing expected");
}

/// INVARIANT: declarations fail immediately on unknown tables and columns.
#[test]
fn declaration_errors_surface_immediately() {
    let live = hosts_mock();

    assert_eq!(
        live.expect_query("GET services\nColumns: description").map(drop),
        Err(DeclarationError::UnknownTable { table: "services".to_string() })
    );
    assert_eq!(
        live.expect_query("GET hosts\nColumns: name address").map(drop),
        Err(DeclarationError::UnknownColumn {
            table: "hosts".to_string(),
            column: "address".to_string()
        })
    );
    assert!(matches!(
        live.expect_query("GET hosts\nColumns: name\nFilter: name !! heute"),
        Err(DeclarationError::Filter(_))
    ));
    assert!(live.pending_queries().is_empty());
}

/// INVARIANT: replacing a table does not change earlier declarations.
#[test]
fn declarations_snapshot_the_tables() {
    let live = hosts_mock();
    live.expect_query("GET hosts\nColumns: name").expect("declaration should succeed");
    live.add_table("hosts", rows(json!([{"name": "gestern"}])));
    live.expect_query("GET hosts\nColumns: name").expect("declaration should succeed");

    let scope = live.enter_with(false).expect("enter should succeed");
    let first = live.lookup_next_query("GET hosts\nColumns: name").expect("first matches");
    let second = live.lookup_next_query("GET hosts\nColumns: name").expect("second matches");

    assert_eq!(first.len(), 2);
    assert_eq!(second, vec![vec![Value::from("gestern")]]);
    scope.finish().expect("all expectations consumed");
}

/// INVARIANT: leaving a scope always resets it, whatever the outcome.
#[test]
fn closure_scope_resets_after_failure() {
    let live = hosts_mock();
    live.expect_query("GET hosts").expect("declaration should succeed");

    let result: Result<(), SessionError> =
        live.run(false, |live| live.lookup_next_query("GET services").map(drop));
    assert!(matches!(result, Err(SessionError::QueryMismatch { .. })));
    assert_eq!(live.state(), ScopeState::AwaitingScope);

    let result: Result<usize, SessionError> = live.run(false, |live| {
        live.expect_query("GET hosts\nColumns: name")?;
        Ok(live.lookup_next_query("GET hosts\nColumns: name")?.len())
    });
    assert_eq!(result, Ok(2));
}

/// INVARIANT: an unfinished scope with unmet expectations fails the test.
#[test]
#[should_panic(expected = "expected queries were not queried")]
fn dropped_scope_panics() {
    let live = hosts_mock();
    live.expect_query("GET hosts").expect("declaration should succeed");
    let _scope = live.enter_with(false).expect("enter should succeed");
}

#[test]
fn ellipsis_commands() {
    let live = hosts_mock();
    live.expect_query_with("COMMAND [...] SCHEDULE_HOST_DOWNTIME;heute;...", MatchMode::Ellipsis)
        .expect("declaration should succeed");

    let scope = live.enter_with(false).expect("enter should succeed");
    let response = live
        .lookup_next_query("COMMAND [1593770319] SCHEDULE_HOST_DOWNTIME;heute;1593770319;1596448719")
        .expect("ellipsis matches");
    assert!(response.is_empty());
    scope.finish().expect("all expectations consumed");
}
