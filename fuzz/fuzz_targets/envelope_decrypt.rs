//! Fuzz target for envelope decryption
//!
//! Arbitrary bytes must never panic the header parser, code resolution or
//! slicing of the HMAC/IV/ciphertext sections. Every invalid input returns
//! an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use opentoken_crypto::decrypt;

fuzz_target!(|data: &[u8]| {
    let _ = decrypt(data, b"fuzz key");
});
