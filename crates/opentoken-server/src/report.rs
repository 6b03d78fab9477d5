//! Client-facing error reports
//!
//! A report carries a stable message, an opaque code and a random reference.
//! The reference is logged next to the full internal error, so an operator
//! can find the cause from what a client quotes without the client ever
//! seeing internals.

use std::fmt;

use opentoken_auth::SignatureError;
use opentoken_core::Environment;
use serde::Serialize;

use crate::records::RecordError;

/// Random bytes in a reference id.
const REFERENCE_BYTES: usize = 8;

/// Message shown for failures whose details stay server-side.
pub const INTERNAL_MESSAGE: &str = "Internal error.";

/// Error as returned to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Opaque code per error identity
    pub code: &'static str,
    /// Stable, human-readable message
    pub message: String,
    /// Per-failure correlation id
    pub reference: String,
}

impl ErrorReport {
    /// Report with a fresh reference id.
    pub fn new<E: Environment>(env: &E, code: &'static str, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), reference: env.random_hex(REFERENCE_BYTES) }
    }

    /// Report a rejected signature and log it at `warn`.
    pub fn signature<E: Environment>(env: &E, error: &SignatureError) -> Self {
        let report = Self::new(env, error.code(), error.to_string());
        match error {
            SignatureError::LookupFailed { reason } => {
                tracing::error!(code = report.code, reference = %report.reference, reason, "access code lookup failed");
                Self { message: INTERNAL_MESSAGE.to_string(), ..report }
            },
            SignatureError::Crypto(source) => {
                tracing::error!(code = report.code, reference = %report.reference, error = %source, "signature computation failed");
                Self { message: INTERNAL_MESSAGE.to_string(), ..report }
            },
            _ => {
                tracing::warn!(code = report.code, reference = %report.reference, error = %error, "signature rejected");
                report
            },
        }
    }

    /// Report a record failure.
    ///
    /// Internal failures are logged at `error` and shown generically.
    pub fn record<E: Environment>(env: &E, error: &RecordError) -> Self {
        if error.is_internal() {
            let report = Self::new(env, error.code(), INTERNAL_MESSAGE);
            tracing::error!(code = report.code, reference = %report.reference, error = %error, "record operation failed");
            report
        } else {
            let report = Self::new(env, error.code(), error.to_string());
            tracing::warn!(code = report.code, reference = %report.reference, error = %error, "record rejected");
            report
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {}, reference {})", self.message, self.code, self.reference)
    }
}
