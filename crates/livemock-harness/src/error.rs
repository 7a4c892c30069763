//! Error types for the host client and the convenience wrappers.

use std::io;

use livemock_core::{DeclarationError, SessionError};
use livemock_proto::ProtocolError;
use thiserror::Error;

/// Errors from [`crate::LiveClient`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failed
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// Site lookup returned no enabled site
    #[error("no enabled site to connect to")]
    NoEnabledSite,

    /// Response frame could not be decoded
    #[error("malformed response: {0}")]
    Frame(#[from] ProtocolError),

    /// Endpoint answered with a non-200 status
    #[error("query failed with status {code}: {body}")]
    Status {
        /// Status code from the frame header
        code: u16,
        /// Response body
        body: String,
    },

    /// Transport ran dry before the announced bytes arrived
    #[error("connection closed after {received} of {expected} bytes")]
    ConnectionClosed {
        /// Bytes announced
        expected: usize,
        /// Bytes read
        received: usize,
    },

    /// Query expected to return a value returned no rows
    #[error("query returned no rows")]
    EmptyResult,
}

impl ClientError {
    /// The simulator error behind a transport failure, if any.
    pub fn session_error(&self) -> Option<&SessionError> {
        match self {
            Self::Io(err) => err.get_ref().and_then(|inner| inner.downcast_ref()),
            _ => None,
        }
    }
}

/// Errors from [`crate::simple_expect`].
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Scope could not be entered or expectations were left
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Expected query could not be declared
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// Host client failed
    #[error(transparent)]
    Client(#[from] ClientError),
}
