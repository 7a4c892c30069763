//! Seams between a host application and the query protocol endpoint.
//!
//! The host never opens sockets or reads site configuration itself: it asks a
//! [`ConnectionFactory`] for a [`QueryTransport`] and a [`SiteLookup`] for the
//! sites to talk to. Production code passes real implementations; tests pass
//! the simulator-backed ones from [`crate::install`].

use std::{collections::BTreeMap, io, time::Duration};

use bytes::Bytes;

/// Connection settings of one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Socket address, e.g. `unix:/omd/sites/mysite/tmp/run/live`
    pub socket: String,
}

/// Sites keyed by site name.
pub type SiteMap = BTreeMap<String, SiteConfig>;

/// Duplex byte stream to a query protocol endpoint.
///
/// Mirrors a blocking stream socket: `send` writes a whole query, `recv`
/// returns at most `max` bytes and an empty buffer once the peer has nothing
/// more to send.
pub trait QueryTransport {
    /// Connect to `address`.
    fn connect(&mut self, address: &str) -> io::Result<()>;

    /// Set the timeout for blocking operations. `None` blocks forever.
    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Write a complete query, terminator included.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read up to `max` bytes.
    fn recv(&mut self, max: usize) -> io::Result<Bytes>;
}

/// Creates transports for sites.
pub trait ConnectionFactory {
    /// Transport produced by this factory.
    type Transport: QueryTransport;

    /// Create an unconnected transport for `site`.
    fn create_transport(&self, site: &SiteConfig) -> io::Result<Self::Transport>;

    /// Ask the endpoint to prefix every row with the site name.
    ///
    /// Endpoints without site tagging ignore this.
    fn set_prepend_site(&self, _prepend_site: bool) {}
}

/// Answers which sites are enabled.
pub trait SiteLookup {
    /// Enabled and disabled sites, in that order.
    fn enabled_and_disabled_sites(&self) -> (SiteMap, SiteMap);
}
