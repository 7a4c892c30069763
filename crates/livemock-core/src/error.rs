//! Error types for the simulator core.
//!
//! Strongly-typed errors per stage: filter compilation and evaluation,
//! expectation declaration, and the session (matching, transport, scope
//! exit). Every failure is immediate and user-facing; nothing is retried.
//!
//! Query text inside messages is quoted with escapes, so a missing newline or
//! a stray space between expected and actual query is visible.

use std::io;

use livemock_proto::value::quote;
use thiserror::Error;

use crate::expectation::MatchMode;

/// Errors from compiling or applying `Filter:`/`And:`/`Or:` directives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Comparison operator is not in the operator table
    #[error("operator {operator:?} not implemented")]
    UnsupportedOperator {
        /// Operator text as written in the query
        operator: String,
    },

    /// `Filter:` line without both a column and an operator
    #[error("malformed filter line {line:?}, expected `Filter: <column> <op> [value]`")]
    MalformedFilter {
        /// Offending line
        line: String,
    },

    /// `And:`/`Or:` line without a valid count
    #[error("malformed combinator line {line:?}, expected `And: <n>` or `Or: <n>`")]
    MalformedCombinator {
        /// Offending line
        line: String,
    },

    /// Combinator asks for more filters than are on the stack
    #[error("{directive} {requested} needs {requested} filters, only {available} available")]
    CombinatorUnderflow {
        /// `And:` or `Or:`
        directive: &'static str,
        /// Count given in the directive
        requested: usize,
        /// Filters on the stack at that point
        available: usize,
    },

    /// More than one predicate left after all directives were processed
    #[error("got {count} filters, expected one; missing And: or Or: directive?")]
    MissingCombinator {
        /// Predicates left on the stack
        count: usize,
    },

    /// Row does not have the filtered column
    #[error("row has no column {column:?}")]
    MissingColumn {
        /// Column named in the filter
        column: String,
    },

    /// Filter literal cannot be converted to the row value's type
    #[error("cannot compare {target} column {column:?} with {literal:?}")]
    Coercion {
        /// Column named in the filter
        column: String,
        /// Literal from the filter line
        literal: String,
        /// Type of the row value
        target: &'static str,
    },

    /// `~` pattern is not a valid regular expression
    #[error("invalid regular expression {pattern:?}: {reason}")]
    InvalidPattern {
        /// Pattern from the filter line
        pattern: String,
        /// Regex compiler message
        reason: String,
    },

    /// `~` applied to a non-text column
    #[error("regular expression filter on {found} column {column:?}, expected str")]
    NotText {
        /// Column named in the filter
        column: String,
        /// Type of the row value
        found: &'static str,
    },
}

/// Errors raised while declaring an expected query.
///
/// Declarations are resolved against the fixture store immediately, so all
/// of these surface before any query is matched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// Match mode name is not `strict`, `ellipsis` or `loose`
    #[error("match mode {0:?} not supported")]
    UnsupportedMatchMode(String),

    /// Query asks for explicit columns of a table that is not stored
    #[error("table {table:?} not stored, add it with add_table")]
    UnknownTable {
        /// Table from the `GET` line
        table: String,
    },

    /// A row of the table lacks a requested column
    #[error("column '{table}.{column}' not known, add it to the fixtures or fix the query")]
    UnknownColumn {
        /// Table from the `GET` line
        table: String,
        /// Missing column
        column: String,
    },

    /// Filter directives could not be compiled or applied
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),
}

/// Errors raised by the session: matching, transport and scope exit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Query submitted while no expectation is queued
    #[error("got unexpected query:\n * {}", quote(.query))]
    UnexpectedQuery {
        /// Submitted query
        query: String,
    },

    /// Query does not match the head of the expectation queue
    #[error("expected query ({mode}):\n * {}\ngot query:\n * {}", quote(.expected), quote(.actual))]
    QueryMismatch {
        /// Query at the head of the queue
        expected: String,
        /// Submitted query
        actual: String,
        /// Match mode of the head entry
        mode: MatchMode,
    },

    /// Receive called before any response was buffered
    #[error("nothing sent yet, can't receive")]
    NothingToReceive,

    /// Simulator used outside an entered scope
    #[error("mock connection used outside of a scope; enter one first")]
    ScopeNotEntered,

    /// Scope entered while another one is active
    #[error("scope already entered; finish it before entering again")]
    ScopeActive,

    /// Submitted bytes are not valid UTF-8
    #[error("query is not valid UTF-8")]
    InvalidEncoding,

    /// Declared queries were never submitted
    #[error("expected queries were not queried:{}", bullets(.queries))]
    UnmetExpectations {
        /// Remaining queries, in queue order
        queries: Vec<String>,
    },

    /// Scope failed and declared queries were never submitted either
    ///
    /// Only produced when multiple-report mode is on.
    #[error("scope failed: {cause}\nexpected queries were not queried:{}", bullets(.queries))]
    UnmetAfterFailure {
        /// Message of the error that ended the scope
        cause: String,
        /// Remaining queries, in queue order
        queries: Vec<String>,
    },

    /// Declaration made while entering the scope failed
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

fn bullets(queries: &[String]) -> String {
    queries.iter().map(|query| format!("\n * {}", quote(query))).collect()
}

/// Convert `SessionError` to `io::Error` at the transport boundary.
///
/// The original error stays attached as the source, so callers can downcast
/// it back.
impl From<SessionError> for io::Error {
    fn from(err: SessionError) -> Self {
        let kind = match &err {
            SessionError::ScopeNotEntered | SessionError::ScopeActive => {
                io::ErrorKind::NotConnected
            },
            SessionError::NothingToReceive => io::ErrorKind::UnexpectedEof,
            SessionError::UnexpectedQuery { .. }
            | SessionError::QueryMismatch { .. }
            | SessionError::InvalidEncoding => io::ErrorKind::InvalidData,
            SessionError::UnmetExpectations { .. }
            | SessionError::UnmetAfterFailure { .. }
            | SessionError::Declaration(_) => io::ErrorKind::Other,
        };
        Self::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn unexpected_query_message() {
        let err = SessionError::UnexpectedQuery { query: "Spanish inquisition!".to_string() };
        assert_snapshot!(err.to_string(), @r"
        got unexpected query:
         * 'Spanish inquisition!'
        ");
    }

    #[test]
    fn mismatch_names_both_queries_and_mode() {
        let err = SessionError::QueryMismatch {
            expected: "Hello\nworld!".to_string(),
            actual: "Foo\nbar!".to_string(),
            mode: MatchMode::Loose,
        };
        assert_snapshot!(err.to_string(), @r"
        expected query (loose):
         * 'Hello\nworld!'
        got query:
         * 'Foo\nbar!'
        ");
    }

    #[test]
    fn unmet_lists_every_query() {
        let err = SessionError::UnmetExpectations {
            queries: vec!["GET hosts\nColumns: name".to_string(), "GET services".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "expected queries were not queried:\n * 'GET hosts\\nColumns: name'\n * 'GET services'"
        );
    }

    #[test]
    fn io_conversion_keeps_source() {
        let err: io::Error = SessionError::NothingToReceive.into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let inner = err.get_ref().and_then(|e| e.downcast_ref::<SessionError>());
        assert_eq!(inner, Some(&SessionError::NothingToReceive));
    }

    #[test]
    fn protocol_violations_are_invalid_data() {
        let err: io::Error = SessionError::UnexpectedQuery { query: String::new() }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err: io::Error = SessionError::ScopeNotEntered.into();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
