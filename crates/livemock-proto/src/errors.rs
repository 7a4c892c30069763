//! Error types for frame decoding and literal parsing.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than the fixed response header
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Response header is not `<status:3> <length:11>\n`
    #[error("malformed response header: {0:?}")]
    MalformedHeader(String),

    /// Body is shorter than the length announced in the header
    #[error("frame truncated: header announced {expected} body bytes, got {actual}")]
    FrameTruncated {
        /// Body length from the header
        expected: usize,
        /// Body bytes actually available
        actual: usize,
    },

    /// Body is not valid UTF-8
    #[error("response body is not valid UTF-8")]
    InvalidUtf8,

    /// Literal text could not be parsed
    #[error("invalid literal at byte {offset}: {reason}")]
    InvalidLiteral {
        /// Byte offset where parsing failed
        offset: usize,
        /// What the parser expected
        reason: &'static str,
    },

    /// Literal parsed but does not have the shape of a response
    #[error("response body must be a list of lists")]
    NotATable,
}
