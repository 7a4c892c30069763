//! Simulator-backed transport.
//!
//! `SimSocket` routes socket writes into the simulator's matcher and reads
//! from its response buffer. Connecting and timeouts are recorded but have
//! no effect; nothing touches the network.

use std::{io, time::Duration};

use bytes::Bytes;
use livemock_core::MockLivestatus;
use tracing::trace;

use crate::transport::QueryTransport;

/// Transport over a shared simulator.
#[derive(Debug, Clone)]
pub struct SimSocket {
    mock: MockLivestatus,
    /// Address passed to the last `connect`
    address: Option<String>,
    /// Timeout passed to the last `set_timeout`
    timeout: Option<Duration>,
}

impl SimSocket {
    /// Create an unconnected socket on `mock`.
    pub fn new(mock: MockLivestatus) -> Self {
        Self { mock, address: None, timeout: None }
    }

    /// Address of the last `connect` call.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Timeout of the last `set_timeout` call.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl QueryTransport for SimSocket {
    fn connect(&mut self, address: &str) -> io::Result<()> {
        trace!(address, "simulated connect");
        self.address = Some(address.to_string());
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    /// Protocol violations surface as `io::Error`s whose source is the
    /// simulator's `SessionError`.
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.mock.socket_send(data).map_err(io::Error::from)
    }

    fn recv(&mut self, max: usize) -> io::Result<Bytes> {
        self.mock.socket_recv(max).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use livemock_core::{SessionError, ScopeState};

    use super::*;

    #[test]
    fn connect_and_timeout_are_recorded() {
        let mut socket = SimSocket::new(MockLivestatus::new());
        socket.connect("unix:").unwrap();
        socket.set_timeout(Some(Duration::from_secs(3))).unwrap();

        assert_eq!(socket.address(), Some("unix:"));
        assert_eq!(socket.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn send_outside_scope_is_not_connected() {
        let mock = MockLivestatus::new();
        let mut socket = SimSocket::new(mock.clone());
        assert_eq!(mock.state(), ScopeState::AwaitingScope);

        let err = socket.send(b"GET hosts\n\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert_eq!(
            err.get_ref().and_then(|e| e.downcast_ref::<SessionError>()),
            Some(&SessionError::ScopeNotEntered)
        );
    }

    #[test]
    fn recv_before_send() {
        let mut socket = SimSocket::new(MockLivestatus::new());
        assert_eq!(socket.recv(16).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }
}
