//! Expected queries and how incoming queries are matched against them.
//!
//! An [`Expectation`] is resolved once, when it is declared: its columns and
//! result rows are computed from the fixture store as it is at that moment.
//! Replacing a table afterwards does not change expectations that were
//! already declared.
//!
//! # Invariants
//!
//! - FIFO: the [`ExpectationQueue`] only ever hands out its head. An entry is
//!   removed exactly when a query matched it, so every expectation is
//!   consumed at most once.

use std::{collections::VecDeque, fmt, str::FromStr};

use livemock_proto::{
    IntoQuery, Query, Response, Value,
    query::normalize,
};
use regex::Regex;

use crate::{error::DeclarationError, filter::evaluate_filter, fixtures::FixtureStore};

/// Prefix of lines ignored by [`MatchMode::Loose`].
const CACHE_PREFIX: &str = "Cache: ";

/// Placeholder of [`MatchMode::Ellipsis`].
const ELLIPSIS: &str = "...";

/// How an incoming query is compared with an expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Byte-exact equality.
    Strict,
    /// `...` in the expected query matches any text within a line; the rest
    /// must match exactly, over the whole query.
    Ellipsis,
    /// Every line of the expected query, except `Cache: ` lines, must occur
    /// verbatim somewhere in the incoming query.
    ///
    /// Extra lines and a different line order are accepted. This is lenient
    /// enough that `GET hosts` also matches `GET hosts\nColumns: name`;
    /// declare with [`MatchMode::Strict`] when that matters.
    #[default]
    Loose,
}

impl MatchMode {
    /// Name as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Ellipsis => "ellipsis",
            Self::Loose => "loose",
        }
    }

    /// Whether `actual` matches `expected` under this mode.
    ///
    /// ```
    /// use livemock_core::MatchMode;
    ///
    /// assert!(MatchMode::Ellipsis.matches("Hello ... world!", "Hello cruel world!"));
    /// assert!(!MatchMode::Ellipsis.matches("...b", "abc"));
    /// assert!(MatchMode::Loose.matches(
    ///     "GET hosts\nColumns: name",
    ///     "GET hosts\nCache: reload\nColumns: name\nLocaltime: 12345",
    /// ));
    /// ```
    pub fn matches(self, expected: &str, actual: &str) -> bool {
        match self {
            Self::Strict => expected == actual,
            Self::Ellipsis => ellipsis_pattern(expected).is_ok_and(|re| re.is_match(actual)),
            Self::Loose => {
                let actual_lines: Vec<&str> = actual.lines().collect();
                expected
                    .lines()
                    .filter(|line| !line.starts_with(CACHE_PREFIX))
                    .all(|line| actual_lines.contains(&line))
            },
        }
    }
}

/// Compile an ellipsis pattern: literal text with `...` as lazy wildcards,
/// anchored at both ends.
fn ellipsis_pattern(expected: &str) -> Result<Regex, regex::Error> {
    let body: Vec<String> = expected.split(ELLIPSIS).map(regex::escape).collect();
    Regex::new(&format!(r"\A(?:{})\z", body.join(".*?")))
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = DeclarationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(Self::Strict),
            "ellipsis" => Ok(Self::Ellipsis),
            "loose" => Ok(Self::Loose),
            other => Err(DeclarationError::UnsupportedMatchMode(other.to_string())),
        }
    }
}

/// A declared query with its precomputed result.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    query: String,
    columns: Vec<String>,
    rows: Response,
    mode: MatchMode,
}

impl Expectation {
    /// Resolve a declared query against the current fixture tables.
    ///
    /// Columns come from the `Columns:` line, or, when the query has none,
    /// from the sorted union of the table's columns. Without a table or
    /// without columns the result is empty.
    ///
    /// # Errors
    ///
    /// - `DeclarationError::UnknownTable` if columns are known but the table
    ///   is not stored
    /// - `DeclarationError::UnknownColumn` if a selected row lacks a column,
    ///   including inferred columns when rows of the table differ in keys
    /// - `DeclarationError::Filter` if the filter directives are invalid
    pub fn resolve(
        query: impl IntoQuery,
        mode: MatchMode,
        store: &FixtureStore,
    ) -> Result<Self, DeclarationError> {
        let query = normalize(query);
        let parsed = Query::new(&query);
        let table = parsed.table();

        let mut columns: Vec<String> = parsed
            .columns()
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        if columns.is_empty()
            && let Some(table) = table
        {
            columns = store.columns(table);
        }

        let mut rows = Response::new();
        if let Some(table) = table
            && !columns.is_empty()
        {
            let data = store
                .table(table)
                .ok_or_else(|| DeclarationError::UnknownTable { table: table.to_string() })?;

            for entry in evaluate_filter(&query, data)? {
                let row = columns
                    .iter()
                    .map(|column| {
                        entry.get(column).cloned().ok_or_else(|| DeclarationError::UnknownColumn {
                            table: table.to_string(),
                            column: column.clone(),
                        })
                    })
                    .collect::<Result<Vec<Value>, _>>()?;
                rows.push(row);
            }
        }

        Ok(Self { query, columns, rows, mode })
    }

    /// Expected query text, trailing newlines stripped.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Columns of the result, in response order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Precomputed result rows.
    pub fn rows(&self) -> &Response {
        &self.rows
    }

    /// Match mode used for this entry.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether `actual` satisfies this expectation.
    pub fn matches(&self, actual: &str) -> bool {
        self.mode.matches(&self.query, actual)
    }

    /// Build the response for a matched query.
    ///
    /// With `column_headers` the first row holds the column names. With a
    /// `site_marker` every data row starts with that marker; the header row
    /// never does.
    pub fn into_response(self, column_headers: bool, site_marker: Option<&str>) -> Response {
        let mut response = Response::with_capacity(self.rows.len() + 1);
        if column_headers {
            response.push(self.columns.into_iter().map(Value::Str).collect());
        }
        match site_marker {
            Some(marker) => response.extend(self.rows.into_iter().map(|row| {
                let mut prefixed = Vec::with_capacity(row.len() + 1);
                prefixed.push(Value::from(marker));
                prefixed.extend(row);
                prefixed
            })),
            None => response.extend(self.rows),
        }
        response
    }
}

/// FIFO queue of expectations.
#[derive(Debug, Clone, Default)]
pub struct ExpectationQueue {
    entries: VecDeque<Expectation>,
}

impl ExpectationQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an expectation.
    pub fn push(&mut self, expectation: Expectation) {
        self.entries.push_back(expectation);
    }

    /// Insert an expectation at `position`; positions past the end append.
    pub fn insert(&mut self, position: usize, expectation: Expectation) {
        let position = position.min(self.entries.len());
        self.entries.insert(position, expectation);
    }

    /// The next expectation to be matched.
    pub fn head(&self) -> Option<&Expectation> {
        self.entries.front()
    }

    /// Remove and return the head.
    pub fn pop(&mut self) -> Option<Expectation> {
        self.entries.pop_front()
    }

    /// Number of expectations left.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether every expectation was consumed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expected queries in queue order.
    pub fn queries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Expectation::query)
    }

    /// Remove every expectation, returning their queries in queue order.
    pub fn drain(&mut self) -> Vec<String> {
        self.entries.drain(..).map(|expectation| expectation.query).collect()
    }
}
