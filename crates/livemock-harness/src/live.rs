//! Minimal host client built on the transport seams.
//!
//! `LiveClient` does what a host application does with a query protocol
//! endpoint: pick the first enabled site, connect, send the status probe as
//! part of the connection bootstrap, then send queries and decode framed
//! responses. It only ever talks to the seams in [`crate::transport`], so
//! the same client runs against the simulator in tests.

use std::time::Duration;

use livemock_core::STATUS_QUERY;
use livemock_proto::{IntoQuery, ProtocolError, Response, ResponseFrame, Value, query::normalize};
use tracing::{debug, info};

use crate::{
    error::ClientError,
    transport::{ConnectionFactory, QueryTransport, SiteLookup},
};

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Terminator appended to every query.
const TERMINATOR: &str = "\n\n";

/// Client options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Send the status probe right after connecting
    pub status_probe: bool,
    /// Timeout handed to the transport
    pub timeout: Option<Duration>,
    /// Ask the endpoint to prefix rows with the site name
    pub prepend_site: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { status_probe: true, timeout: Some(DEFAULT_TIMEOUT), prepend_site: false }
    }
}

/// Connection to one site.
#[derive(Debug)]
pub struct LiveClient<T: QueryTransport> {
    site: String,
    transport: T,
    /// Row returned by the status probe
    status: Option<Vec<Value>>,
}

impl<T: QueryTransport> LiveClient<T> {
    /// Connect to the first enabled site.
    ///
    /// # Errors
    ///
    /// - `ClientError::NoEnabledSite` if the lookup returns no enabled site
    /// - any error of the status probe when `options.status_probe` is set
    pub fn connect<F, S>(
        factory: &F,
        sites: &S,
        options: &ClientOptions,
    ) -> Result<Self, ClientError>
    where
        F: ConnectionFactory<Transport = T>,
        S: SiteLookup,
    {
        let (enabled, _disabled) = sites.enabled_and_disabled_sites();
        let (site, config) = enabled.into_iter().next().ok_or(ClientError::NoEnabledSite)?;

        let mut transport = factory.create_transport(&config)?;
        transport.set_timeout(options.timeout)?;
        transport.connect(&config.socket)?;
        factory.set_prepend_site(options.prepend_site);
        info!(%site, socket = %config.socket, "connected");

        let mut client = Self { site, transport, status: None };
        if options.status_probe {
            client.status = client.query(STATUS_QUERY)?.into_iter().next();
        }
        Ok(client)
    }

    /// Name of the connected site.
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Row returned by the status probe: version, program version, program
    /// start, host count and service count.
    pub fn status(&self) -> Option<&[Value]> {
        self.status.as_deref()
    }

    /// Send a query and decode the response rows.
    pub fn query(&mut self, query: impl IntoQuery) -> Result<Response, ClientError> {
        let mut text = normalize(query);
        text.push_str(TERMINATOR);
        self.transport.send(text.as_bytes())?;

        let header = self.read_exact(ResponseFrame::HEADER_SIZE)?;
        let (status, length) = ResponseFrame::parse_header(&header)?;
        let body = String::from_utf8(self.read_exact(length)?)
            .map_err(|_| ProtocolError::InvalidUtf8)?;
        debug!(status, length, "response received");

        if status != ResponseFrame::STATUS_OK {
            return Err(ClientError::Status { code: status, body });
        }
        Ok(ResponseFrame { status, body }.rows()?)
    }

    /// First column of every row.
    pub fn query_column(&mut self, query: impl IntoQuery) -> Result<Vec<Value>, ClientError> {
        Ok(self.query(query)?.into_iter().filter_map(|row| row.into_iter().next()).collect())
    }

    /// First column of the first row.
    pub fn query_value(&mut self, query: impl IntoQuery) -> Result<Value, ClientError> {
        self.query_column(query)?.into_iter().next().ok_or(ClientError::EmptyResult)
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn read_exact(&mut self, expected: usize) -> Result<Vec<u8>, ClientError> {
        let mut buf = Vec::with_capacity(expected);
        while buf.len() < expected {
            let chunk = self.transport.recv(expected - buf.len())?;
            if chunk.is_empty() {
                return Err(ClientError::ConnectionClosed { expected, received: buf.len() });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}
