//! The simulator: expectation declarations, query matching, the emulated
//! socket buffer and the scope that checks everything was consumed.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐  enter()   ┌────────┐
//! │ AwaitingScope │───────────>│ Active │── send/recv: match head, buffer frame
//! └───────────────┘            └────────┘
//!         ^                         │
//!         └─────────────────────────┘
//!          finish()/fail()/drop: queue must be empty
//! ```
//!
//! Declarations are accepted in either state. Queries are only matched while
//! a scope is active.
//!
//! # Invariants
//!
//! - Exit always resets: whatever the outcome, leaving a scope returns to
//!   `AwaitingScope` with an empty queue and no buffered response, so one
//!   simulator can run any number of scopes.
//! - First error wins: when a scope ends with an error and multiple-report
//!   mode is off, unmet expectations are not reported on top of it.

use std::{
    fmt,
    ops::Deref,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::{Bytes, BytesMut};
use livemock_proto::{IntoQuery, Query, Response, ResponseFrame, Row};
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::MockConfig,
    error::{DeclarationError, SessionError},
    expectation::{Expectation, ExpectationQueue, MatchMode},
    fixtures::{FixtureSet, FixtureStore},
};

/// Query a host sends right after connecting, to learn the core's version
/// and size.
pub const STATUS_QUERY: &str = "GET status\nCache: reload\nColumns: livestatus_version \
                                program_version program_start num_hosts num_services";

/// Frame terminator a client appends to every query.
pub const QUERY_TERMINATOR: &[u8] = b"\n\n";

/// Scope state of a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// No scope entered; queries are rejected
    AwaitingScope,
    /// Scope entered; queries are matched
    Active,
}

struct Inner {
    config: MockConfig,
    fixtures: FixtureStore,
    queue: ExpectationQueue,
    state: ScopeState,
    /// Unread bytes of the last framed response
    last_response: Option<BytesMut>,
}

/// Query protocol simulator.
///
/// Cloning yields another handle to the same simulator, which is how the
/// emulated socket and the test share it. Intended for one caller at a time.
///
/// ```
/// use livemock_core::{MatchMode, MockLivestatus};
///
/// let live = MockLivestatus::new();
/// live.expect_query_with("GET hosts\nColumns: name", MatchMode::Strict).unwrap();
///
/// let scope = live.enter_with(false).unwrap();
/// let rows = live.lookup_next_query("GET hosts\nColumns: name").unwrap();
/// assert_eq!(rows.len(), 2);
/// scope.finish().unwrap();
/// ```
#[derive(Clone)]
pub struct MockLivestatus {
    inner: Arc<Mutex<Inner>>,
}

impl MockLivestatus {
    /// Simulator with default configuration and the monitoring fixture set.
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Simulator with the monitoring fixture set.
    pub fn with_config(config: MockConfig) -> Self {
        Self::with_fixtures(config, FixtureSet::monitoring())
    }

    /// Simulator seeded with `fixtures`.
    ///
    /// When `config.expect_status_query` is set, `fixtures` needs a `status`
    /// table for [`Self::enter`] to resolve the status probe.
    pub fn with_fixtures(config: MockConfig, fixtures: FixtureSet) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                config,
                fixtures: FixtureStore::new(fixtures),
                queue: ExpectationQueue::new(),
                state: ScopeState::AwaitingScope,
                last_response: None,
            })),
        }
    }

    /// A panic while the lock was held leaves the state consistent enough to
    /// report on, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a table, replacing any table of the same name.
    ///
    /// Expectations declared earlier keep their results.
    pub fn add_table(&self, name: impl Into<String>, rows: Vec<Row>) -> &Self {
        let name = name.into();
        debug!(table = %name, rows = rows.len(), "fixture table replaced");
        self.lock().fixtures.add_table(name, rows);
        self
    }

    /// Declare the next expected query, matched loosely.
    pub fn expect_query(&self, query: impl IntoQuery) -> Result<&Self, DeclarationError> {
        self.declare(query, MatchMode::Loose, None)
    }

    /// Declare the next expected query with an explicit match mode.
    pub fn expect_query_with(
        &self,
        query: impl IntoQuery,
        mode: MatchMode,
    ) -> Result<&Self, DeclarationError> {
        self.declare(query, mode, None)
    }

    /// Declare an expected query at a queue position.
    ///
    /// Positions past the end of the queue append.
    pub fn expect_query_at(
        &self,
        query: impl IntoQuery,
        mode: MatchMode,
        position: usize,
    ) -> Result<&Self, DeclarationError> {
        self.declare(query, mode, Some(position))
    }

    fn declare(
        &self,
        query: impl IntoQuery,
        mode: MatchMode,
        position: Option<usize>,
    ) -> Result<&Self, DeclarationError> {
        let mut inner = self.lock();
        let expectation = Expectation::resolve(query, mode, &inner.fixtures)?;

        debug!(
            table = Query::new(expectation.query()).table().unwrap_or("-"),
            columns = expectation.columns().len(),
            rows = expectation.rows().len(),
            %mode,
            ?position,
            "expectation declared"
        );

        match position {
            Some(position) => inner.queue.insert(position, expectation),
            None => inner.queue.push(expectation),
        }
        Ok(self)
    }

    /// Prefix every data row of later responses with the site marker.
    pub fn set_prepend_site(&self, prepend_site: bool) {
        self.lock().config.prepend_site = prepend_site;
    }

    /// Current scope state.
    pub fn state(&self) -> ScopeState {
        self.lock().state
    }

    /// Queries still expected, in queue order.
    pub fn pending_queries(&self) -> Vec<String> {
        self.lock().queue.queries().map(str::to_string).collect()
    }

    /// Current rows of a fixture table.
    pub fn table(&self, name: &str) -> Option<Vec<Row>> {
        self.lock().fixtures.table(name).map(<[Row]>::to_vec)
    }

    /// Match a query against the head of the queue.
    ///
    /// On a match the head is consumed, the framed response replaces any
    /// unread bytes of the previous one, and the response rows are returned.
    ///
    /// # Errors
    ///
    /// - `SessionError::ScopeNotEntered` outside of a scope
    /// - `SessionError::UnexpectedQuery` if nothing is expected
    /// - `SessionError::QueryMismatch` if the head does not match
    pub fn lookup_next_query(&self, query: &str) -> Result<Response, SessionError> {
        self.lock().lookup(query)
    }

    /// Submit query bytes as a socket write.
    ///
    /// A trailing `\n\n` terminator is stripped before matching.
    pub fn socket_send(&self, data: &[u8]) -> Result<(), SessionError> {
        let data = data.strip_suffix(QUERY_TERMINATOR).unwrap_or(data);
        trace!(bytes = data.len(), "socket send");

        let query = std::str::from_utf8(data).map_err(|_| SessionError::InvalidEncoding)?;
        self.lookup_next_query(query).map(drop)
    }

    /// Read up to `max` bytes of the buffered response.
    ///
    /// Returns an empty buffer once the response is fully read.
    ///
    /// # Errors
    ///
    /// - `SessionError::NothingToReceive` if no query was answered yet
    pub fn socket_recv(&self, max: usize) -> Result<Bytes, SessionError> {
        let mut inner = self.lock();
        let buffer = inner.last_response.as_mut().ok_or(SessionError::NothingToReceive)?;

        let chunk = buffer.split_to(max.min(buffer.len())).freeze();
        trace!(bytes = chunk.len(), remaining = buffer.len(), "socket recv");
        Ok(chunk)
    }

    /// Enter a scope, expecting the status probe as configured.
    pub fn enter(&self) -> Result<Scope<'_>, SessionError> {
        let expect_status_query = self.lock().config.expect_status_query;
        self.enter_with(expect_status_query)
    }

    /// Enter a scope.
    ///
    /// With `expect_status_query` the status probe ([`STATUS_QUERY`]) is
    /// inserted in front of everything declared so far.
    ///
    /// # Errors
    ///
    /// - `SessionError::ScopeActive` if a scope is already active
    /// - `SessionError::Declaration` if the status probe cannot be resolved
    pub fn enter_with(&self, expect_status_query: bool) -> Result<Scope<'_>, SessionError> {
        let mut inner = self.lock();
        if inner.state == ScopeState::Active {
            return Err(SessionError::ScopeActive);
        }

        if expect_status_query {
            let status = Expectation::resolve(STATUS_QUERY, MatchMode::Loose, &inner.fixtures)?;
            inner.queue.insert(0, status);
        }
        inner.state = ScopeState::Active;

        info!(expect_status_query, expected = inner.queue.len(), "scope entered");
        Ok(Scope { mock: self, finished: false })
    }

    /// Run `f` inside a scope.
    ///
    /// Unmet expectations are reported when `f` succeeds. When `f` fails its
    /// error is returned, unless multiple-report mode is on and expectations
    /// were left, in which case the combined report is returned instead.
    pub fn run<T, E, F>(&self, expect_status_query: bool, f: F) -> Result<T, E>
    where
        E: From<SessionError> + fmt::Display,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        let scope = self.enter_with(expect_status_query)?;
        match f(self) {
            Ok(value) => {
                scope.finish()?;
                Ok(value)
            },
            Err(err) => {
                scope.fail(&err)?;
                Err(err)
            },
        }
    }
}

impl Default for MockLivestatus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockLivestatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("MockLivestatus")
            .field("state", &inner.state)
            .field("expected", &inner.queue.len())
            .field("config", &inner.config)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn lookup(&mut self, query: &str) -> Result<Response, SessionError> {
        if self.state != ScopeState::Active {
            return Err(SessionError::ScopeNotEntered);
        }

        match self.queue.head() {
            None => {
                warn!(query, "unexpected query");
                return Err(SessionError::UnexpectedQuery { query: query.to_string() });
            },
            Some(head) if !head.matches(query) => {
                warn!(expected = head.query(), actual = query, mode = %head.mode(), "query mismatch");
                return Err(SessionError::QueryMismatch {
                    expected: head.query().to_string(),
                    actual: query.to_string(),
                    mode: head.mode(),
                });
            },
            Some(_) => {},
        }
        let Some(expectation) = self.queue.pop() else {
            return Err(SessionError::UnexpectedQuery { query: query.to_string() });
        };

        let column_headers = Query::new(query).column_headers();
        let site_marker = self.config.prepend_site.then_some(self.config.site_marker.as_str());
        let response = expectation.into_response(column_headers, site_marker);

        let mut buffer = BytesMut::new();
        ResponseFrame::ok(&response).encode(&mut buffer);
        debug!(rows = response.len(), bytes = buffer.len(), left = self.queue.len(), "query matched");

        self.last_response = Some(buffer);
        Ok(response)
    }

    /// Leave the scope. `failure` carries the message of an error already
    /// ending the scope.
    fn exit(&mut self, failure: Option<&str>) -> Result<(), SessionError> {
        self.state = ScopeState::AwaitingScope;
        self.last_response = None;
        let queries = self.queue.drain();
        info!(unmet = queries.len(), failed = failure.is_some(), "scope exited");

        match failure {
            _ if queries.is_empty() => Ok(()),
            Some(_) if !self.config.report_multiple => Ok(()),
            Some(cause) => {
                Err(SessionError::UnmetAfterFailure { cause: cause.to_string(), queries })
            },
            None => Err(SessionError::UnmetExpectations { queries }),
        }
    }
}

/// Guard for an entered scope.
///
/// Finish it with [`Scope::finish`] (or [`Scope::fail`] when the code under
/// test failed) to get unmet expectations as an error. Dropping an
/// unfinished guard still exits the scope: it panics on unmet expectations,
/// unless the thread is already panicking, in which case they are only
/// logged in multiple-report mode.
#[must_use = "unmet expectations are reported when the scope is finished"]
pub struct Scope<'a> {
    mock: &'a MockLivestatus,
    finished: bool,
}

impl Scope<'_> {
    /// Exit the scope and check every expectation was consumed.
    ///
    /// # Errors
    ///
    /// - `SessionError::UnmetExpectations` listing every query left
    pub fn finish(mut self) -> Result<(), SessionError> {
        self.finished = true;
        self.mock.lock().exit(None)
    }

    /// Exit the scope after the code under test failed with `cause`.
    ///
    /// # Errors
    ///
    /// - `SessionError::UnmetAfterFailure` in multiple-report mode when
    ///   queries were left
    pub fn fail(mut self, cause: &impl fmt::Display) -> Result<(), SessionError> {
        self.finished = true;
        self.mock.lock().exit(Some(&cause.to_string()))
    }
}

impl Deref for Scope<'_> {
    type Target = MockLivestatus;

    fn deref(&self) -> &Self::Target {
        self.mock
    }
}

impl Drop for Scope<'_> {
    #[allow(clippy::panic, reason = "an unfinished scope must not pass silently")]
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let panicking = std::thread::panicking();
        let result = self.mock.lock().exit(panicking.then_some("panicked"));
        match result {
            Ok(()) => {},
            Err(err) if panicking => error!(%err, "unmet expectations while unwinding"),
            Err(err) => panic!("{err}"),
        }
    }
}
