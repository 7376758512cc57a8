//! Fuzz target: request input parsing.
//!
//! Feeds arbitrary bytes through both body formats. Errors are
//! expected and fine; panics are not.

#![no_main]

use libfuzzer_sys::fuzz_target;

use drydock_server::body::parse_input;
use drydock_server::BodyFormat;

fuzz_target!(|data: &[u8]| {
    let _ = parse_input(BodyFormat::Form, None, data);
    let _ = parse_input(BodyFormat::Json, None, data);
    if let Ok(query) = std::str::from_utf8(data) {
        let _ = parse_input(BodyFormat::Form, Some(query), b"");
    }
});
