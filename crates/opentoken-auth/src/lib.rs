//! OT1 Request Signatures
//!
//! Clients sign a canonical rendering of each request with an HMAC-SHA256
//! keyed by the secret behind one of their access codes. The secret never
//! travels with the request; the server resolves it from the access code.
//!
//! # Security
//!
//! - Signatures are compared in constant time
//! - Unknown and wrong access codes fail with the same message
//! - Headers the client did not sign are stripped after verification, so
//!   later handlers only ever see signed input
//! - Host and date checks bound replay to one host and a short window

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod canonical;
pub mod error;
pub mod gate;
pub mod header;
pub mod request;
pub mod signer;
pub mod store;
pub mod verifier;

pub use canonical::{canonical_bytes, signature_hex};
pub use error::{LookupError, SignatureError};
pub use gate::{SignatureConfig, parse_iso8601};
pub use header::{REQUIRED_SIGNED_HEADERS, SignatureAttributes, parse_authorization};
pub use request::{AUTHORIZATION, DATE_HEADER, SignedRequest};
pub use signer::{authorization_header, sign_request};
pub use store::{AccessCodeStore, AccessSecret, MemoryAccessCodes};
pub use verifier::{Authentication, SignatureVerifier};
