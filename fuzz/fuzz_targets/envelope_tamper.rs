//! Fuzz target for envelope tamper detection
//!
//! # Strategy
//!
//! Encrypt arbitrary plaintext under a fuzzer-chosen supported suite, then
//! flip one bit anywhere in the record.
//!
//! # Invariants
//!
//! - The untouched record decrypts to the plaintext
//! - The tampered record NEVER decrypts successfully
//! - The failure is a version, resolution or HMAC error, never a length or
//!   padding error

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use opentoken_crypto::{CryptoError, MethodConfig, Suite, SuiteConfig, decrypt, encrypt, registry};

#[derive(Debug, Arbitrary)]
struct Tamper {
    hmac_code: u8,
    cipher_code: u8,
    plaintext: Vec<u8>,
    iv_byte: u8,
    position: usize,
    bit: u8,
}

fn suite(hmac_code: u8, cipher_code: u8) -> Option<Suite> {
    let hmac = registry::digest_by_code(hmac_code % 11)?;
    let cipher = registry::cipher_by_code(cipher_code % 65)?;
    SuiteConfig {
        hmac: MethodConfig::new(hmac.name, "md5", 1),
        cipher: MethodConfig::new(cipher.name, "md5", 1),
    }
    .resolve()
    .ok()
}

fuzz_target!(|input: Tamper| {
    let Some(suite) = suite(input.hmac_code, input.cipher_code) else {
        return;
    };
    let iv = vec![input.iv_byte; suite.cipher.iv_len()];
    let Ok(mut record) = encrypt(input.plaintext.clone(), b"key", &suite, &iv) else {
        return;
    };

    assert_eq!(decrypt(&record, b"key").ok(), Some(input.plaintext));

    let position = input.position % record.len();
    record[position] ^= 1 << (input.bit % 8);
    let result = decrypt(&record, b"key");
    assert!(
        matches!(
            result,
            Err(CryptoError::InvalidVersion { .. }
                | CryptoError::HmacInvalid
                | CryptoError::UnknownAlgorithmCode { .. }
                | CryptoError::UnsupportedAlgorithm { .. })
        ),
        "tampered record at byte {position} gave {result:?}"
    );
});
