//! Property-based tests for response framing.
//!
//! These verify that framing is deterministic and that the header always
//! describes the body exactly, for arbitrary response values.

use livemock_proto::{ResponseFrame, Value, literal};
use proptest::prelude::*;

/// Strategy for cell values, including nested lists.
fn arbitrary_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::Int),
        // NaN never compares equal, so it is kept out of round-trip checks
        any::<f64>().prop_filter("finite", |x| x.is_finite()).prop_map(Value::Float),
        ".{0,12}".prop_map(Value::Str),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::List)
    })
}

/// Strategy for response rows.
fn arbitrary_rows() -> impl Strategy<Value = Vec<Vec<Value>>> {
    prop::collection::vec(prop::collection::vec(arbitrary_value(), 0..5), 0..6)
}

#[test]
fn prop_framing_is_deterministic() {
    proptest!(|(rows in arbitrary_rows())| {
        let first = ResponseFrame::ok(&rows).to_bytes();
        let second = ResponseFrame::ok(&rows).to_bytes();

        // PROPERTY: re-serializing the same value yields the same frame
        prop_assert_eq!(first, second);
    });
}

#[test]
fn prop_header_matches_body_length() {
    proptest!(|(rows in arbitrary_rows())| {
        let frame = ResponseFrame::ok(&rows);
        let wire = frame.to_bytes();

        let (status, length) = ResponseFrame::parse_header(&wire).expect("header should parse");
        prop_assert_eq!(status, 200);
        prop_assert_eq!(length, wire.len() - ResponseFrame::HEADER_SIZE);
        prop_assert_eq!(wire[ResponseFrame::HEADER_SIZE - 1], b'\n');
    });
}

#[test]
fn prop_decoded_rows_reframe_identically() {
    proptest!(|(rows in arbitrary_rows())| {
        let wire = ResponseFrame::ok(&rows).to_bytes();

        let decoded = ResponseFrame::decode(&wire).expect("decode should succeed");
        let parsed = decoded.rows().expect("body should parse");
        prop_assert_eq!(&parsed, &rows);

        // PROPERTY: a consumer re-framing what it read produces the original bytes
        prop_assert_eq!(ResponseFrame::ok(&parsed).to_bytes(), wire);
    });
}

#[test]
fn prop_literal_parser_never_panics() {
    proptest!(|(text in "\\PC{0,40}")| {
        let _ = literal::parse(&text);
    });
}
