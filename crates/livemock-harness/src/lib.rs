//! Host-side harness for the livemock simulator.
//!
//! A host application reaches a query protocol endpoint through three seams:
//! a [`ConnectionFactory`] producing [`QueryTransport`]s, a [`SiteLookup`]
//! naming the enabled sites, and the endpoint's site tagging switch
//! ([`ConnectionFactory::set_prepend_site`]). [`MockInstallation`] implements
//! all of them over one [`MockLivestatus`], and [`LiveClient`] is a small
//! host that uses nothing but the seams.
//!
//! ```
//! use livemock_core::MatchMode;
//! use livemock_harness::simple_expect;
//! use livemock_proto::Value;
//!
//! let names = simple_expect("GET hosts\nColumns: name", MatchMode::Loose, true, |live| {
//!     Ok(live.query_column("GET hosts\nColumns: name")?)
//! })
//! .unwrap();
//! assert_eq!(names, [Value::from("heute"), Value::from("example.com")]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod install;
pub mod live;
pub mod sim_socket;
pub mod transport;

use livemock_core::{MatchMode, MockLivestatus};

pub use error::{ClientError, HarnessError};
pub use install::{MOCK_SOCKET, MockInstallation, mock_livestatus};
pub use live::{ClientOptions, LiveClient};
pub use sim_socket::SimSocket;
pub use transport::{ConnectionFactory, QueryTransport, SiteConfig, SiteLookup, SiteMap};

/// Run `f` with a client connected to a fresh simulator that expects
/// `query`.
///
/// An empty `query` declares nothing. With `expect_status_query` the client
/// sends the status probe on connect and the simulator expects it first.
/// Unmet expectations are reported when `f` returns successfully.
pub fn simple_expect<T, F>(
    query: &str,
    mode: MatchMode,
    expect_status_query: bool,
    f: F,
) -> Result<T, HarnessError>
where
    F: FnOnce(&mut LiveClient<SimSocket>) -> Result<T, HarnessError>,
{
    let installation = mock_livestatus();
    let mock: &MockLivestatus = installation.mock();
    if !query.is_empty() {
        mock.expect_query_with(query, mode)?;
    }

    mock.run(expect_status_query, |_| {
        let options = ClientOptions { status_probe: expect_status_query, ..ClientOptions::default() };
        let mut client = LiveClient::connect(&installation, &installation, &options)?;
        f(&mut client)
    })
}
