//! Query text introspection.
//!
//! A query is plain text: `GET <table>` on the first line, then one
//! directive or header per line. Nothing here validates the query; the
//! accessors extract what is present and ignore the rest.
//!
//! ```text
//! GET services
//! Columns: host_name description
//! Filter: host_name = heute
//! ColumnHeaders: on
//! ```

use std::collections::BTreeMap;

/// Query headers: `Key: value` lines keyed by `Key`. Later lines win.
pub type Headers = BTreeMap<String, String>;

/// Header that asks for a leading row of column names.
pub const COLUMN_HEADERS: &str = "ColumnHeaders";

/// Borrowed view over query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query<'a> {
    text: &'a str,
}

impl<'a> Query<'a> {
    /// Wrap query text. No parsing happens until an accessor is called.
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// The raw query text.
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Query lines, split on `\n` or `\r\n`.
    pub fn lines(self) -> impl Iterator<Item = &'a str> {
        self.text.lines()
    }

    /// Table named by a leading `GET <table>` line.
    ///
    /// Runs of whitespace after `GET` are allowed. `None` when the first
    /// line is not a `GET` line or names no table.
    pub fn table(&self) -> Option<&'a str> {
        let first = self.lines().next()?;
        if !first.starts_with("GET ") {
            return None;
        }
        first.split_whitespace().nth(1)
    }

    /// Columns of the first `Columns:` line.
    ///
    /// `Some(vec![])` for a `Columns:` line without names; callers treat that
    /// like a missing line.
    pub fn columns(&self) -> Option<Vec<&'a str>> {
        self.lines()
            .find_map(|line| line.strip_prefix("Columns:"))
            .map(|rest| rest.split_whitespace().collect())
    }

    /// All `Key: value` lines except the `GET` line.
    ///
    /// Lines without a colon and empty lines are skipped. The key ends at the
    /// first `": "` (or the first `:` when no `": "` exists); leading spaces
    /// are trimmed from the value. Directives such as `Filter:` show up here
    /// too, with the last occurrence winning.
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        for line in self.lines() {
            if line.is_empty() || line.starts_with("GET ") {
                continue;
            }
            let Some((key, value)) = line.split_once(": ").or_else(|| line.split_once(':'))
            else {
                continue;
            };
            headers.insert(key.to_string(), value.trim_start_matches(' ').to_string());
        }
        headers
    }

    /// Whether the query asks for a header row (`ColumnHeaders: on`).
    pub fn column_headers(&self) -> bool {
        self.headers().get(COLUMN_HEADERS).is_some_and(|value| value == "on")
    }
}

/// Query text given either as one string or as a sequence of lines.
pub trait IntoQuery {
    /// Join into a single newline-separated string.
    fn into_query(self) -> String;
}

impl IntoQuery for &str {
    fn into_query(self) -> String {
        self.to_string()
    }
}

impl IntoQuery for String {
    fn into_query(self) -> String {
        self
    }
}

impl IntoQuery for &String {
    fn into_query(self) -> String {
        self.clone()
    }
}

impl IntoQuery for &[&str] {
    fn into_query(self) -> String {
        self.join("\n")
    }
}

impl<const N: usize> IntoQuery for [&str; N] {
    fn into_query(self) -> String {
        self.join("\n")
    }
}

impl IntoQuery for Vec<&str> {
    fn into_query(self) -> String {
        self.join("\n")
    }
}

impl IntoQuery for Vec<String> {
    fn into_query(self) -> String {
        self.join("\n")
    }
}

/// Join query lines and strip trailing newlines.
pub fn normalize(query: impl IntoQuery) -> String {
    let mut text = query.into_query();
    let trimmed = text.trim_end_matches('\n').len();
    text.truncate(trimmed);
    text
}
