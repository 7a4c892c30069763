//! Response framing.
//!
//! Layout on the wire:
//! `"{status:<3} {length:>11}\n{body}"`
//!
//! The first 16 bytes are a fixed-width header: a three-character status
//! code (left-justified), a space, the body length in bytes (right-justified
//! in eleven characters) and a newline. The body is the literal form of the
//! response rows (see [`crate::value`]).
//!
//! # Invariants
//!
//! - Length Consistency: the header length always equals the byte length of
//!   the body. [`ResponseFrame::encode`] computes it from the body, and
//!   [`ResponseFrame::decode`] rejects frames whose body is shorter.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    errors::{ProtocolError, Result},
    literal,
    value::Value,
};

/// Response rows, each holding values in requested-column order.
pub type Response = Vec<Vec<Value>>;

/// A framed response: status code plus literal body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Status code (the simulator always answers [`ResponseFrame::STATUS_OK`])
    pub status: u16,
    /// Serialized rows
    pub body: String,
}

impl ResponseFrame {
    /// Size of the fixed header in bytes.
    pub const HEADER_SIZE: usize = 16;

    /// Status code of a successful query.
    pub const STATUS_OK: u16 = 200;

    /// Frame rows with status 200.
    pub fn ok(rows: &[Vec<Value>]) -> Self {
        Self { status: Self::STATUS_OK, body: render(rows) }
    }

    /// The fixed-width header for this frame.
    pub fn header(&self) -> String {
        format!("{:<3} {:>11}\n", self.status, self.body.len())
    }

    /// Write header and body into `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(self.header().as_bytes());
        dst.put_slice(self.body.as_bytes());
    }

    /// Header and body as one buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::HEADER_SIZE + self.body.len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Parse the fixed 16-byte header into `(status, body_length)`.
    ///
    /// Only the first [`Self::HEADER_SIZE`] bytes are inspected.
    pub fn parse_header(bytes: &[u8]) -> Result<(u16, usize)> {
        let header = bytes.get(..Self::HEADER_SIZE).ok_or(ProtocolError::FrameTooShort {
            expected: Self::HEADER_SIZE,
            actual: bytes.len(),
        })?;

        let malformed = || ProtocolError::MalformedHeader(String::from_utf8_lossy(header).into());

        let text = std::str::from_utf8(header).map_err(|_| malformed())?;
        let (status, rest) = text.split_at_checked(3).ok_or_else(malformed)?;
        let length = rest
            .strip_prefix(' ')
            .and_then(|rest| rest.strip_suffix('\n'))
            .ok_or_else(malformed)?;

        let status = status.trim_end().parse().map_err(|_| malformed())?;
        let length = length.trim_start().parse().map_err(|_| malformed())?;

        Ok((status, length))
    }

    /// Decode a complete frame. Bytes past the announced body are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (status, length) = Self::parse_header(bytes)?;

        let available = bytes.len() - Self::HEADER_SIZE;
        let body = bytes
            .get(Self::HEADER_SIZE..Self::HEADER_SIZE.saturating_add(length))
            .ok_or(ProtocolError::FrameTruncated { expected: length, actual: available })?;

        let body = std::str::from_utf8(body).map_err(|_| ProtocolError::InvalidUtf8)?;

        Ok(Self { status, body: body.to_string() })
    }

    /// Parse the body back into rows.
    pub fn rows(&self) -> Result<Response> {
        match literal::parse(&self.body)? {
            Value::List(rows) => rows
                .into_iter()
                .map(|row| match row {
                    Value::List(cells) => Ok(cells),
                    _ => Err(ProtocolError::NotATable),
                })
                .collect(),
            _ => Err(ProtocolError::NotATable),
        }
    }
}

/// Serialize rows as a list-of-lists literal.
pub fn render(rows: &[Vec<Value>]) -> String {
    let mut out = String::from("[");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('[');
        for (j, cell) in row.iter().enumerate() {
            if j > 0 {
                out.push_str(", ");
            }
            out.push_str(&cell.to_string());
        }
        out.push(']');
    }
    out.push(']');
    out
}
