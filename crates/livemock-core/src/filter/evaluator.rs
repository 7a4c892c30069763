//! Stack-based evaluation of a query's filter directives.
//!
//! Directives are processed top to bottom:
//!
//! - `Filter: ...` compiles one [`Comparison`] and pushes it
//! - `And: n` pops the last `n` predicates and pushes their conjunction
//! - `Or: n` pops the last `n` predicates and pushes their disjunction
//!
//! At the end at most one predicate may remain. Several leftover predicates
//! mean the query forgot a combinator; they are reported, never joined
//! implicitly.

use livemock_proto::{Query, Row};

use super::compiler::{Comparison, FILTER_PREFIX};
use crate::error::FilterError;

const AND_PREFIX: &str = "And:";
const OR_PREFIX: &str = "Or:";

/// Predicate tree over a row.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Single `Filter:` comparison
    Compare(Comparison),
    /// `And: n`; an empty conjunction holds
    All(Vec<Predicate>),
    /// `Or: n`; an empty disjunction does not hold
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Evaluate against a row.
    ///
    /// Combinators evaluate every child, so a child failing on a missing
    /// column is reported even when an earlier child already decided the
    /// outcome.
    pub fn evaluate(&self, row: &Row) -> Result<bool, FilterError> {
        match self {
            Self::Compare(comparison) => comparison.evaluate(row),
            Self::All(children) => {
                children.iter().try_fold(true, |acc, child| Ok(child.evaluate(row)? && acc))
            },
            Self::Any(children) => {
                children.iter().try_fold(false, |acc, child| Ok(child.evaluate(row)? || acc))
            },
        }
    }
}

/// Combined filter of one query.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    predicate: Option<Predicate>,
}

impl Filter {
    /// Compile every `Filter:`/`And:`/`Or:` line of a query.
    ///
    /// Other lines are ignored.
    pub fn parse(query: &str) -> Result<Self, FilterError> {
        let mut stack: Vec<Predicate> = Vec::new();

        for line in Query::new(query).lines() {
            if line.starts_with(FILTER_PREFIX) {
                stack.push(Predicate::Compare(Comparison::parse(line)?));
            } else if let Some(count) = line.strip_prefix(AND_PREFIX) {
                let children = pop_many(&mut stack, "And:", count, line)?;
                stack.push(Predicate::All(children));
            } else if let Some(count) = line.strip_prefix(OR_PREFIX) {
                let children = pop_many(&mut stack, "Or:", count, line)?;
                stack.push(Predicate::Any(children));
            }
        }

        match stack.len() {
            0 | 1 => Ok(Self { predicate: stack.pop() }),
            count => Err(FilterError::MissingCombinator { count }),
        }
    }

    /// Whether the query had no filter directives.
    pub fn is_empty(&self) -> bool {
        self.predicate.is_none()
    }

    /// The combined predicate, if any.
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Whether a single row passes.
    pub fn matches(&self, row: &Row) -> Result<bool, FilterError> {
        match &self.predicate {
            Some(predicate) => predicate.evaluate(row),
            None => Ok(true),
        }
    }

    /// Rows that pass, in their original order.
    pub fn apply(&self, rows: &[Row]) -> Result<Vec<Row>, FilterError> {
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if self.matches(row)? {
                kept.push(row.clone());
            }
        }
        Ok(kept)
    }
}

/// Filter `rows` with the directives of `query`.
///
/// ```
/// use livemock_core::filter::evaluate_filter;
/// use livemock_proto::{Row, Value};
///
/// let rows: Vec<Row> = [("heute", 0), ("morgen", 1)]
///     .into_iter()
///     .map(|(name, state)| {
///         Row::from([
///             ("name".to_string(), Value::from(name)),
///             ("state".to_string(), Value::from(state)),
///         ])
///     })
///     .collect();
///
/// let heute = evaluate_filter("Filter: name = heute", &rows).unwrap();
/// assert_eq!(heute, rows[..1]);
///
/// let none = evaluate_filter("Filter: name = heute\nFilter: state > 0\nAnd: 2", &rows).unwrap();
/// assert!(none.is_empty());
///
/// let both = evaluate_filter("Filter: name = heute\nFilter: state > 0\nOr: 2", &rows).unwrap();
/// assert_eq!(both, rows);
///
/// let prefix = evaluate_filter("Filter: name ~ heu", &rows).unwrap();
/// assert_eq!(prefix, rows[..1]);
/// ```
pub fn evaluate_filter(query: &str, rows: &[Row]) -> Result<Vec<Row>, FilterError> {
    Filter::parse(query)?.apply(rows)
}

fn pop_many(
    stack: &mut Vec<Predicate>,
    directive: &'static str,
    count: &str,
    line: &str,
) -> Result<Vec<Predicate>, FilterError> {
    let requested: usize = count
        .trim()
        .parse()
        .map_err(|_| FilterError::MalformedCombinator { line: line.to_string() })?;

    let available = stack.len();
    let start = available.checked_sub(requested).ok_or(FilterError::CombinatorUnderflow {
        directive,
        requested,
        available,
    })?;

    Ok(stack.split_off(start))
}
