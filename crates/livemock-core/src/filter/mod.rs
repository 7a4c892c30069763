//! Filter directives: operator table, line compiler and stack evaluator.

pub mod compiler;
pub mod evaluator;
pub mod operator;

pub use compiler::Comparison;
pub use evaluator::{Filter, Predicate, evaluate_filter};
pub use operator::{Operator, coerce};
