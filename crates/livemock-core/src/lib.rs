//! Query protocol simulator core.
//!
//! A [`MockLivestatus`] answers queries from in-memory fixture tables, but
//! only the queries a test declared, in the declared order. Each declaration
//! is resolved immediately: its `Filter:`/`And:`/`Or:` directives are
//! evaluated against the [`FixtureStore`] and the result rows are stored with
//! the expectation. Matching then pops the head of the queue and buffers the
//! framed response for the emulated socket.
//!
//! # Components
//!
//! - [`filter`]: operator table, `Filter:` line compiler and stack evaluator
//! - [`fixtures`]: fixture sets and the per-simulator table store
//! - [`expectation`]: match modes, resolved expectations and their queue
//! - [`session`]: the simulator handle and its scope guard
//!
//! ```
//! use livemock_core::{MatchMode, MockLivestatus, SessionError};
//!
//! let live = MockLivestatus::new();
//! live.expect_query_with("GET services\nColumns: description\nFilter: host_name = heute", MatchMode::Loose)
//!     .unwrap();
//!
//! live.run(false, |live| -> Result<(), SessionError> {
//!     live.socket_send(b"GET services\nColumns: description\nFilter: host_name = heute\n\n")?;
//!     let frame = live.socket_recv(1024)?;
//!     assert_eq!(frame.as_ref(), b"200          14\n[['CPU load']]");
//!     Ok(())
//! })
//! .unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod expectation;
pub mod filter;
pub mod fixtures;
pub mod session;

pub use config::MockConfig;
pub use error::{DeclarationError, FilterError, SessionError};
pub use expectation::{Expectation, ExpectationQueue, MatchMode};
pub use filter::{Filter, evaluate_filter};
pub use fixtures::{FixtureSet, FixtureStore, row};
pub use session::{MockLivestatus, STATUS_QUERY, Scope, ScopeState};
