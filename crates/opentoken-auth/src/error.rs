//! Rejection reasons for signed requests
//!
//! Every reason has its own variant, a fixed message and an opaque code.
//! Messages never distinguish an unknown access code from a wrong one.

use opentoken_crypto::CryptoError;
use thiserror::Error;

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No Authorization header and unsigned requests are not allowed
    #[error("A signed message is required.")]
    SignatureRequired,

    /// First segment is not `TYPE-METHOD-ALGORITHM-ENCODING`
    #[error("Invalid format of signature identifier.")]
    InvalidIdentifier,

    /// TYPE is not `OT1`
    #[error("Invalid signature method in Authorized header.")]
    UnsupportedType,

    /// METHOD is not `HMAC`
    #[error("Invalid METHOD in signature identifier, expected HMAC.")]
    UnsupportedMethod,

    /// ALGORITHM is not `SHA256`
    #[error("Invalid ALGORITHM in signature identifier, expected SHA256.")]
    UnsupportedAlgorithm,

    /// ENCODING is not `HEX`
    #[error("Invalid ENCODING in signature identifier, expected HEX.")]
    UnsupportedEncoding,

    /// Attribute segment has no `=`
    #[error("Malformed signature attribute.")]
    MalformedAttribute,

    /// Same attribute key appears twice
    #[error("Duplicate signature attribute: {name}.")]
    DuplicateAttribute {
        /// Attribute key
        name: String,
    },

    /// Quoted value never closes
    #[error("Unterminated quoted value for signature attribute: {name}.")]
    UnterminatedQuote {
        /// Attribute key
        name: String,
    },

    /// Required attributes are absent
    #[error("Missing signature attributes: {}.", .names.join(", "))]
    MissingAttributes {
        /// Absent keys
        names: Vec<String>,
    },

    /// Attributes outside the allowed set are present
    #[error("Unexpected signature attributes: {}.", .names.join(", "))]
    UnexpectedAttributes {
        /// Extra keys
        names: Vec<String>,
    },

    /// `signed-headers` omits a mandatory header
    #[error("Signed headers must include: {}.", .names.join(", "))]
    MissingSignedHeaders {
        /// Mandatory headers not signed
        names: Vec<String>,
    },

    /// Access code does not resolve for this account
    #[error("Invalid account ID or access code.")]
    InvalidAccessCode,

    /// Computed HMAC differs from the supplied signature
    #[error("Signature verification mismatch.")]
    SignatureMismatch,

    /// Host header absent
    #[error("Host header is required.")]
    MissingHost,

    /// Host header differs from the canonical host
    #[error("Invalid Host header.")]
    HostMismatch,

    /// Date header absent
    #[error("X-OpenToken-Date header is required.")]
    MissingDate,

    /// Date header is not an ISO-8601 timestamp
    #[error("Invalid X-OpenToken-Date header.")]
    InvalidDate,

    /// Date is older than the allowed window
    #[error("X-OpenToken-Date is too far in the past.")]
    DateTooOld,

    /// Date is newer than the allowed window
    #[error("X-OpenToken-Date is too far in the future.")]
    DateTooNew,

    /// Access-code store failed to answer
    #[error("Access code lookup failed.")]
    LookupFailed {
        /// Backend error, for logs only
        reason: String,
    },

    /// Expected signature could not be computed
    #[error("Signature computation failed.")]
    Crypto(#[from] CryptoError),
}

impl SignatureError {
    /// Short opaque code for client-facing error references.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SignatureRequired => "S200",
            Self::InvalidIdentifier => "S201",
            Self::UnsupportedType => "S202",
            Self::UnsupportedMethod => "S203",
            Self::UnsupportedAlgorithm => "S204",
            Self::UnsupportedEncoding => "S205",
            Self::MalformedAttribute => "S206",
            Self::DuplicateAttribute { .. } => "S207",
            Self::UnterminatedQuote { .. } => "S208",
            Self::MissingAttributes { .. } => "S209",
            Self::UnexpectedAttributes { .. } => "S210",
            Self::MissingSignedHeaders { .. } => "S211",
            Self::InvalidAccessCode => "S212",
            Self::SignatureMismatch => "S213",
            Self::MissingHost => "S214",
            Self::HostMismatch => "S215",
            Self::MissingDate => "S216",
            Self::InvalidDate => "S217",
            Self::DateTooOld => "S218",
            Self::DateTooNew => "S219",
            Self::LookupFailed { .. } => "S220",
            Self::Crypto(_) => "S221",
        }
    }

    /// Only a failed store lookup is worth retrying, and only by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LookupFailed { .. })
    }

    /// Server-side faults, as opposed to a bad request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::LookupFailed { .. } | Self::Crypto(_))
    }
}

/// Error returned by an access-code store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("access code store: {0}")]
pub struct LookupError(pub String);

impl From<LookupError> for SignatureError {
    fn from(e: LookupError) -> Self {
        Self::LookupFailed { reason: e.0 }
    }
}
