//! OpenToken Cryptographic Primitives
//!
//! Building blocks for protecting records at rest. Pure functions with
//! deterministic outputs: callers provide the IV, so every ciphertext can be
//! reproduced in tests.
//!
//! # Envelope
//!
//! A record is encrypted under keys stretched from a caller-supplied key
//! source, then authenticated with an HMAC that covers the header as well as
//! the payload.
//!
//! ```text
//! key source
//!     │
//!     ├── PBKDF2(cipher key digest) → cipher key
//!     └── PBKDF2(HMAC key digest)   → HMAC key (32 bytes)
//!
//! header(17) ‖ HMAC(header ‖ IV ‖ ciphertext) ‖ IV ‖ ciphertext
//! ```
//!
//! The header names every algorithm by its registry code, so a record
//! carries everything needed to decrypt it except the key source.
//!
//! # Registry
//!
//! Algorithm codes are permanent. Entries are only ever appended; an
//! algorithm this build cannot execute keeps its code reserved so that
//! headers naming it still parse and fail with a precise error.
//!
//! # Security
//!
//! - HMAC is verified in constant time before any decryption is attempted
//! - Iteration counts are clamped to [`MAX_ITERATIONS`] on both sides, so a
//!   forged header cannot demand unbounded key stretching
//! - Derived keys and consumed plaintexts are zeroized

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod error;
pub mod kdf;
pub mod registry;
pub mod seed;
pub mod suite;
pub mod symmetric;

pub use envelope::{EncryptionHeader, HEADER_LEN, HEADER_VERSION, decrypt, encrypt};
pub use error::{AlgorithmField, CryptoError};
pub use kdf::{compute_hmac, constant_time_eq, derive_key};
pub use registry::{
    BlockPrimitive, CipherDescriptor, CipherSuite, DigestDescriptor, HashFunction, Mode,
};
pub use suite::{
    CipherMethod, HMAC_KEY_BYTES, HmacMethod, MAX_ITERATIONS, MethodConfig, Suite, SuiteConfig,
};
