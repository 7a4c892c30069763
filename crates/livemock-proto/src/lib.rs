//! Wire-level types for the livemock query protocol simulator.
//!
//! The query protocol is line oriented: a query is a `GET <table>` line
//! followed by directives (`Columns:`, `Filter:`, `And:`/`Or:`) and arbitrary
//! `Key: value` headers. Responses are framed with a fixed 16-byte header
//! carrying a status code and the body length, followed by the body as a
//! nested list literal.
//!
//! This crate is pure data handling with no state: [`Query`] introspects
//! query text, [`Value`] models cell values and their literal form, and
//! [`ResponseFrame`] encodes and decodes framed responses.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod literal;
pub mod query;
pub mod response;
pub mod value;

pub use errors::{ProtocolError, Result};
pub use query::{Headers, IntoQuery, Query};
pub use response::{Response, ResponseFrame};
pub use value::{Row, Value};
