//! Simulator-backed implementations of the host seams.
//!
//! A [`MockInstallation`] hands out [`SimSocket`]s over one shared simulator
//! and reports a single enabled site, so a host built against the seams talks
//! to the simulator without any other setup.

use std::io;

use livemock_core::{MockLivestatus, config::DEFAULT_SITE_MARKER};
use tracing::debug;

use crate::{
    sim_socket::SimSocket,
    transport::{ConnectionFactory, SiteConfig, SiteLookup, SiteMap},
};

/// Socket address reported for the simulated site.
pub const MOCK_SOCKET: &str = "unix:";

/// Connection factory and site lookup over one simulator.
#[derive(Debug, Clone)]
pub struct MockInstallation {
    mock: MockLivestatus,
}

impl MockInstallation {
    /// Install `mock` behind the seams.
    pub fn new(mock: MockLivestatus) -> Self {
        Self { mock }
    }

    /// The simulator, for declaring expectations and entering scopes.
    pub fn mock(&self) -> &MockLivestatus {
        &self.mock
    }
}

impl ConnectionFactory for MockInstallation {
    type Transport = SimSocket;

    fn create_transport(&self, site: &SiteConfig) -> io::Result<SimSocket> {
        debug!(socket = %site.socket, "simulated transport created");
        Ok(SimSocket::new(self.mock.clone()))
    }

    fn set_prepend_site(&self, prepend_site: bool) {
        self.mock.set_prepend_site(prepend_site);
    }
}

impl SiteLookup for MockInstallation {
    fn enabled_and_disabled_sites(&self) -> (SiteMap, SiteMap) {
        let enabled = SiteMap::from([(DEFAULT_SITE_MARKER.to_string(), SiteConfig {
            socket: MOCK_SOCKET.to_string(),
        })]);
        (enabled, SiteMap::new())
    }
}

/// Installation over a fresh simulator with default fixtures.
pub fn mock_livestatus() -> MockInstallation {
    MockInstallation::new(MockLivestatus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::QueryTransport;

    #[test]
    fn one_enabled_site() {
        let (enabled, disabled) = mock_livestatus().enabled_and_disabled_sites();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled["NO_SITE"].socket, "unix:");
        assert!(disabled.is_empty());
    }

    #[test]
    fn transports_share_the_simulator() {
        let installation = mock_livestatus();
        installation.mock().expect_query("GET hosts\nColumns: name").unwrap();

        let site = SiteConfig { socket: MOCK_SOCKET.to_string() };
        let mut first = installation.create_transport(&site).unwrap();
        let mut second = installation.create_transport(&site).unwrap();

        let scope = installation.mock().enter_with(false).unwrap();
        second.send(b"GET hosts\nColumns: name\n\n").unwrap();
        assert_eq!(&first.recv(16).unwrap()[..], b"200          28\n");
        scope.finish().unwrap();
    }
}
