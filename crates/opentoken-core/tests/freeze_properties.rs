//! Property-based tests for freeze/thaw
//!
//! Any value frozen under any inner key thaws back unchanged until its
//! expiration, and reads as expired afterwards.

use std::collections::BTreeMap;

use chrono::TimeDelta;
use opentoken_core::{
    Environment, FreezeConfig, FreezeError, FreezeOptions, Freezer, ServiceSecret, SimEnv,
    inner_key,
};
use opentoken_crypto::{MethodConfig, SuiteConfig};
use proptest::prelude::*;

fn freezer(env: &SimEnv, secret: Vec<u8>) -> Freezer<SimEnv> {
    let config = FreezeConfig {
        primary: SuiteConfig {
            hmac: MethodConfig::new("sha512", "sha256", 2),
            cipher: MethodConfig::new("aes-256-ofb", "sha1", 2),
        }
        .resolve()
        .unwrap(),
        secondary: SuiteConfig {
            hmac: MethodConfig::new("whirlpool", "md5", 2),
            cipher: MethodConfig::new("seed-cbc", "ripemd160", 2),
        }
        .resolve()
        .unwrap(),
        max_lifetime: TimeDelta::hours(1),
    };
    Freezer::new(config, ServiceSecret::from_bytes(secret), env.clone())
}

/// Strategy for structured values resembling stored account documents
fn arbitrary_value() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(".{0,12}", prop::collection::vec(any::<u8>(), 0..64), 0..6)
}

#[test]
fn prop_freeze_thaw_roundtrip() {
    proptest!(|(
        value in arbitrary_value(),
        ids in prop::collection::vec(".{1,16}", 1..4),
        secret in prop::collection::vec(any::<u8>(), 1..64),
        seed in any::<u64>(),
    )| {
        let env = SimEnv::with_seed(seed);
        let freezer = freezer(&env, secret);
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let key = inner_key(&id_refs).unwrap();

        let frozen = freezer.freeze(&value, &key, FreezeOptions::default()).unwrap();
        let thawed: BTreeMap<String, Vec<u8>> = freezer.thaw(&frozen, &key).unwrap();

        // PROPERTY: thaw inverts freeze before expiration
        prop_assert_eq!(thawed, value);
    });
}

#[test]
fn prop_thaw_after_expiry_is_expired() {
    proptest!(|(value in arbitrary_value(), minutes in 1i64..60, seed in any::<u64>())| {
        let env = SimEnv::with_seed(seed);
        let freezer = freezer(&env, b"outer".to_vec());
        let expires = env.wall_clock() + TimeDelta::minutes(minutes);

        let frozen = freezer.freeze(&value, b"inner", FreezeOptions::expiring_at(expires)).unwrap();
        env.advance(TimeDelta::minutes(minutes) + TimeDelta::seconds(1));

        // PROPERTY: authenticated but expired records are never returned
        let result = freezer.thaw::<BTreeMap<String, Vec<u8>>>(&frozen, b"inner");
        prop_assert_eq!(result, Err(FreezeError::Expired { expires }));
    });
}

#[test]
fn frozen_bytes_differ_per_freeze() {
    let env = SimEnv::with_seed(9);
    let freezer = freezer(&env, b"outer".to_vec());

    let a = freezer.freeze("same", b"k", FreezeOptions::default()).unwrap();
    let b = freezer.freeze("same", b"k", FreezeOptions::default()).unwrap();
    assert_ne!(a, b, "fresh IVs must make ciphertexts differ");
}
