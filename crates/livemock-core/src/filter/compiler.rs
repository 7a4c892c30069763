//! Compilation of a single `Filter:` line.

use livemock_proto::{Row, Value};
use regex::Regex;

use super::operator::{Operator, coerce};
use crate::error::FilterError;

/// Prefix of a filter directive.
pub const FILTER_PREFIX: &str = "Filter:";

/// A compiled `Filter: <column> <op> [value]` line.
///
/// The value is everything after the operator, internal spaces included, and
/// defaults to the empty string, which allows "column is empty" checks. For
/// `~` the value is compiled into a regular expression up front, so an
/// invalid pattern fails at compile time rather than per row.
#[derive(Debug, Clone)]
pub struct Comparison {
    column: String,
    operator: Operator,
    literal: String,
    pattern: Option<Regex>,
}

impl Comparison {
    /// Compile a `Filter:` line.
    ///
    /// # Errors
    ///
    /// - `FilterError::MalformedFilter` if the column or operator is missing
    /// - `FilterError::UnsupportedOperator` if the operator is not in the
    ///   operator table
    /// - `FilterError::InvalidPattern` if a `~` pattern does not compile
    pub fn parse(line: &str) -> Result<Self, FilterError> {
        let malformed = || FilterError::MalformedFilter { line: line.to_string() };

        let rest = line.strip_prefix(FILTER_PREFIX).ok_or_else(malformed)?;
        let (column, rest) = split_token(rest).ok_or_else(malformed)?;
        let (operator, literal) = split_token(rest).ok_or_else(malformed)?;

        let operator: Operator = operator.parse()?;
        let pattern = match operator {
            Operator::Match => Some(Regex::new(&format!("^(?:{literal})")).map_err(|e| {
                FilterError::InvalidPattern { pattern: literal.to_string(), reason: e.to_string() }
            })?),
            _ => None,
        };

        Ok(Self { column: column.to_string(), operator, literal: literal.to_string(), pattern })
    }

    /// Column the filter reads.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Comparison operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Literal as written, before coercion.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Apply the filter to a row.
    ///
    /// # Errors
    ///
    /// - `FilterError::MissingColumn` if the row lacks the column
    /// - `FilterError::Coercion` if the literal cannot take the row value's
    ///   type
    /// - `FilterError::NotText` if `~` is applied to a non-text value
    pub fn evaluate(&self, row: &Row) -> Result<bool, FilterError> {
        let row_value = row
            .get(&self.column)
            .ok_or_else(|| FilterError::MissingColumn { column: self.column.clone() })?;

        if let Some(pattern) = &self.pattern {
            return match row_value {
                Value::Str(text) => Ok(pattern.is_match(text)),
                other => Err(FilterError::NotText {
                    column: self.column.clone(),
                    found: other.type_name(),
                }),
            };
        }

        let literal = coerce(&self.literal, row_value).ok_or_else(|| FilterError::Coercion {
            column: self.column.clone(),
            literal: self.literal.clone(),
            target: row_value.type_name(),
        })?;

        Ok(self.operator.compare(row_value, &literal))
    }
}

/// Split off the first whitespace-delimited token.
///
/// Returns the token and the remainder with leading whitespace removed;
/// trailing whitespace of the remainder is kept.
fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], s[end..].trim_start())),
        None => Some((s, "")),
    }
}
