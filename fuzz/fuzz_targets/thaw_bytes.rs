//! Fuzz target for thawing untrusted storage bytes
//!
//! Storage is attacker-writable. Thawing arbitrary bytes must return an
//! error without panicking or inflating unbounded output.

#![no_main]

use chrono::TimeDelta;
use libfuzzer_sys::fuzz_target;
use opentoken_core::{FreezeConfig, Freezer, ServiceSecret, SimEnv};
use opentoken_crypto::{MethodConfig, SuiteConfig};

fn freezer() -> Option<Freezer<SimEnv>> {
    let suite = SuiteConfig {
        hmac: MethodConfig::new("md5", "md5", 1),
        cipher: MethodConfig::new("aes-128-cbc", "md5", 1),
    }
    .resolve()
    .ok()?;
    Some(Freezer::new(
        FreezeConfig { primary: suite, secondary: suite, max_lifetime: TimeDelta::days(1) },
        ServiceSecret::from_bytes(b"outer".to_vec()),
        SimEnv::with_seed(0),
    ))
}

fuzz_target!(|data: &[u8]| {
    let Some(freezer) = freezer() else {
        return;
    };
    let _ = freezer.thaw_bytes(data, b"inner");
});
