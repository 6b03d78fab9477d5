//! OT1 request verification
//!
//! ```text
//! no Authorization ──► Unsigned (if allowed) | SignatureRequired
//! host/date gate   ──► MissingHost | HostMismatch | MissingDate | InvalidDate | DateTooOld | DateTooNew
//! parse header     ──► identifier / attribute errors
//! resolve secret   ──► InvalidAccessCode
//! compare HMAC     ──► SignatureMismatch
//! strip unsigned headers ──► Signed
//! ```

use opentoken_core::Environment;
use opentoken_crypto::constant_time_eq;

use crate::{
    canonical::{canonical_bytes, signature_hex},
    error::SignatureError,
    gate::{SignatureConfig, check_date, check_host},
    header::parse_authorization,
    request::{AUTHORIZATION, SignedRequest},
    store::AccessCodeStore,
};

/// Terminal success state of verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// No Authorization header, and the caller allowed that
    Unsigned,
    /// Signature verified
    Signed {
        /// Access code that signed the request
        access_code: String,
    },
}

impl Authentication {
    /// Whether the request carried a verified signature.
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Signed { .. })
    }
}

/// Verifies OT1 signatures against an access-code store.
pub struct SignatureVerifier<S: AccessCodeStore, E: Environment> {
    config: SignatureConfig,
    store: S,
    env: E,
}

impl<S: AccessCodeStore, E: Environment> SignatureVerifier<S, E> {
    /// Create a verifier.
    pub fn new(config: SignatureConfig, store: S, env: E) -> Self {
        Self { config, store, env }
    }

    /// Verify `request` on behalf of `account_id`.
    ///
    /// On success with a signature, every header not covered by the
    /// signature is removed from `request`.
    pub async fn authenticate(
        &self,
        request: &mut SignedRequest,
        account_id: &str,
        allow_unsigned: bool,
    ) -> Result<Authentication, SignatureError> {
        let Some(authorization) = request.header(AUTHORIZATION) else {
            return if allow_unsigned {
                Ok(Authentication::Unsigned)
            } else {
                Err(SignatureError::SignatureRequired)
            };
        };

        check_host(request, &self.config)?;
        check_date(request, &self.config, self.env.wall_clock())?;

        let attributes = parse_authorization(&authorization)?;

        let Some(secret) = self.store.resolve(account_id, &attributes.access_code).await? else {
            return Err(SignatureError::InvalidAccessCode);
        };

        let canonical = canonical_bytes(request, &attributes.signed_headers);
        let expected = signature_hex(secret.expose(), &canonical)?;
        let supplied = attributes.signature.to_ascii_lowercase();
        if !constant_time_eq(expected.as_bytes(), supplied.as_bytes()) {
            return Err(SignatureError::SignatureMismatch);
        }

        request.retain_headers(&attributes.signed_headers);
        let access_code = attributes.access_code.clone();
        request.set_signature(attributes);
        tracing::debug!(account_id, "signed request verified");
        Ok(Authentication::Signed { access_code })
    }
}
