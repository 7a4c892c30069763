//! Fuzz target for the response body literal parser
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Deep list nesting is rejected with an error, never a stack overflow
//! - Anything that parses re-parses to the same value after rendering

#![no_main]

use libfuzzer_sys::fuzz_target;
use livemock_proto::literal;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(value) = literal::parse(text) {
        let rendered = value.to_string();
        let reparsed = literal::parse(&rendered).expect("rendered literal should parse");
        // NaN never equals itself; compare the rendered forms instead
        assert_eq!(reparsed.to_string(), rendered);
    }
});
