//! Operator table for `Filter:` comparisons.
//!
//! The row value decides the type of a comparison: the filter literal is
//! coerced to the row value's type before comparing, never the other way
//! round.
//!
//! | row value | literal coerced to                      |
//! |-----------|-----------------------------------------|
//! | int       | integer (surrounding whitespace allowed) |
//! | float     | float (surrounding whitespace allowed)   |
//! | str       | the literal text, unchanged              |
//! | list      | list of the literal's whitespace-separated words |
//!
//! `>=` and `<=` are mirrored: `>=` holds when the row value is
//! *not greater* than the literal, `<=` when it is *not less*.

use std::{cmp::Ordering, fmt, str::FromStr};

use livemock_proto::Value;

use crate::error::FilterError;

/// Comparison operator of a `Filter:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`: equality after coercion
    Equal,
    /// `>`: row value greater than literal
    Greater,
    /// `<`: row value less than literal
    Less,
    /// `>=`: row value not greater than literal
    GreaterOrEqual,
    /// `<=`: row value not less than literal
    LessOrEqual,
    /// `~`: regular expression anchored at the start of the row value
    Match,
}

impl Operator {
    /// Every supported operator.
    pub const ALL: [Self; 6] = [
        Self::Equal,
        Self::Greater,
        Self::Less,
        Self::GreaterOrEqual,
        Self::LessOrEqual,
        Self::Match,
    ];

    /// Operator text as written in a query.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Match => "~",
        }
    }

    /// Compare an already coerced literal against a row value.
    ///
    /// Values of different types never compare; every operator except `=`
    /// is then false. [`Operator::Match`] is not an ordering and is handled
    /// by the compiled filter; it returns false here.
    pub fn compare(self, row_value: &Value, literal: &Value) -> bool {
        let ordering = row_value.partial_cmp(literal);
        match self {
            Self::Equal => row_value == literal,
            Self::Greater => ordering == Some(Ordering::Greater),
            Self::Less => ordering == Some(Ordering::Less),
            Self::GreaterOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            Self::LessOrEqual => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            Self::Match => false,
        }
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| FilterError::UnsupportedOperator { operator: s.to_string() })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Coerce a filter literal to the type of `target`.
///
/// `None` when the literal is not a valid value of that type.
pub fn coerce(literal: &str, target: &Value) -> Option<Value> {
    match target {
        Value::Int(_) => literal.trim().parse().ok().map(Value::Int),
        Value::Float(_) => literal.trim().parse().ok().map(Value::Float),
        Value::Str(_) => Some(Value::Str(literal.to_string())),
        Value::List(_) => {
            Some(Value::List(literal.split_whitespace().map(Value::from).collect()))
        },
    }
}
