//! Fuzz target for OT1 Authorization header parsing
//!
//! Quoted values may span `;` separators, so the attribute splitter carries
//! state across segments. Arbitrary header text must never panic it.
//!
//! # Invariants
//!
//! - Parsing never panics
//! - An accepted header always covers the three mandatory signed headers

#![no_main]

use libfuzzer_sys::fuzz_target;
use opentoken_auth::{REQUIRED_SIGNED_HEADERS, parse_authorization};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(attributes) = parse_authorization(text) {
        for required in REQUIRED_SIGNED_HEADERS {
            assert!(attributes.signed_headers.iter().any(|h| h == required));
        }
    }
});
