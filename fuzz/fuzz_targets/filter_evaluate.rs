//! Fuzz target for filter compilation and evaluation
//!
//! # Strategy
//!
//! - Directive soup: arbitrary `Filter:`/`And:`/`Or:` lines in any order
//! - Operators: every supported operator plus garbage operator text
//! - Values: integers, text, empty values and regex metacharacters
//!
//! # Invariants
//!
//! - NEVER panic, whatever the directives
//! - Evaluation keeps a subset of the input rows, in input order

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use livemock_core::{evaluate_filter, row};
use livemock_proto::{Row, Value};

#[derive(Debug, Arbitrary)]
enum Directive {
    Filter { column: Column, operator: u8, value: String },
    And(u8),
    Or(u8),
    Raw(String),
}

#[derive(Debug, Arbitrary)]
enum Column {
    Name,
    State,
    Parents,
    Missing,
}

const OPERATORS: [&str; 8] = ["=", ">", "<", ">=", "<=", "~", "!=", "=~"];

fn render(directive: &Directive) -> String {
    match directive {
        Directive::Filter { column, operator, value } => {
            let column = match column {
                Column::Name => "name",
                Column::State => "state",
                Column::Parents => "parents",
                Column::Missing => "alias",
            };
            let operator = OPERATORS[usize::from(*operator) % OPERATORS.len()];
            format!("Filter: {column} {operator} {value}")
        }
        Directive::And(n) => format!("And: {}", n % 6),
        Directive::Or(n) => format!("Or: {}", n % 6),
        Directive::Raw(line) => line.clone(),
    }
}

fuzz_target!(|directives: Vec<Directive>| {
    let rows: Vec<Row> = vec![
        row([
            ("name", Value::from("heute")),
            ("state", Value::Int(0)),
            ("parents", Value::from(vec!["example.com"])),
        ]),
        row([
            ("name", Value::from("example.com")),
            ("state", Value::Int(2)),
            ("parents", Value::List(vec![])),
        ]),
    ];

    let query: Vec<String> = directives.iter().map(render).collect();
    if let Ok(kept) = evaluate_filter(&query.join("\n"), &rows) {
        let mut remaining = rows.iter();
        for row in &kept {
            assert!(remaining.any(|candidate| candidate == row), "filter reordered rows");
        }
    }
});
