//! OpenToken Core
//!
//! Confidentiality and addressing of records at rest.
//!
//! # Data Flow
//!
//! ```text
//! logical ids ──► RecordClass::storage_key ──► "prefix" + hex(PBKDF2(id_i)) joined by "/"
//!      │
//!      └─► inner_key (raw ids) ──► Freezer::freeze
//!                                    encode → deflate → encrypt(inner key, secondary suite)
//!                                    {data, expires} → encode → encrypt(service secret, primary suite)
//! ```
//!
//! The storage address is an irreversible hash of the identifiers while the
//! inner encryption key is the identifiers themselves. Reading the storage
//! backend alone (ciphertext plus hashed keys) reveals nothing without the
//! original identifiers.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod env;
pub mod error;
pub mod freeze;
pub mod keys;
pub mod secret;

pub use env::Environment;
#[cfg(feature = "test-utils")]
pub use env::SimEnv;
pub use error::{CodecError, FreezeError, KeyError, SecretError};
pub use freeze::{FreezeConfig, FreezeOptions, Freezer, FrozenRecord};
pub use keys::{HashConfig, HashConfigSpec, MAX_SEGMENT_LENGTH, RecordClass, inner_key};
pub use secret::ServiceSecret;
