//! Fuzz target for ResponseFrame::decode
//!
//! This fuzzer feeds arbitrary bytes to the frame decoder to find:
//! - Panics on short or malformed fixed-width headers
//! - Length fields that overflow or over-read the buffer
//! - Bodies that decode but fail to parse as rows
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use livemock_proto::ResponseFrame;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = ResponseFrame::decode(data) {
        // A decoded frame re-encodes to its announced length
        assert_eq!(frame.header().len(), ResponseFrame::HEADER_SIZE);
        let _ = frame.rows();
    }
});
