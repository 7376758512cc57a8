//! Fuzz target: request path routing.
//!
//! Verifies that arbitrary path strings never panic the router and
//! never produce an endpoint name containing a slash.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(path) = std::str::from_utf8(data) {
        let (name, _format) = drydock_server::route(path);
        assert!(!name.contains('/'));
    }
});
