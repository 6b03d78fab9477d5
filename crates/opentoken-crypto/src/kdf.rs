//! Key stretching, HMAC and constant-time comparison
//!
//! The digest is chosen at runtime from the registry, so each operation
//! dispatches once over [`HashFunction`] into a monomorphized RustCrypto call.

use hmac::{Hmac, Mac};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::{error::CryptoError, registry::HashFunction};

/// Bind `$d` to the concrete digest type for `$function` and evaluate `$body`.
macro_rules! with_hash {
    ($function:expr, $d:ident => $body:expr) => {
        match $function {
            HashFunction::Md4 => {
                type $d = md4::Md4;
                $body
            },
            HashFunction::Md5 => {
                type $d = md5::Md5;
                $body
            },
            HashFunction::Ripemd160 => {
                type $d = ripemd::Ripemd160;
                $body
            },
            HashFunction::Sha1 => {
                type $d = sha1::Sha1;
                $body
            },
            HashFunction::Sha224 => {
                type $d = sha2::Sha224;
                $body
            },
            HashFunction::Sha256 => {
                type $d = sha2::Sha256;
                $body
            },
            HashFunction::Sha384 => {
                type $d = sha2::Sha384;
                $body
            },
            HashFunction::Sha512 => {
                type $d = sha2::Sha512;
                $body
            },
            HashFunction::Whirlpool => {
                type $d = whirlpool::Whirlpool;
                $body
            },
        }
    };
}

/// PBKDF2-HMAC over `function`, producing `length` bytes.
///
/// `iterations` must be at least 1. The output is zeroized on drop.
pub fn derive_key(
    function: HashFunction,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    length: usize,
) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(vec![0u8; length]);
    with_hash!(function, D => pbkdf2::pbkdf2_hmac::<D>(password, salt, iterations, &mut out));
    out
}

/// HMAC over the concatenation of `parts`.
///
/// # Errors
///
/// - `InvalidKeyLength`: the MAC rejected the key
pub fn compute_hmac(function: HashFunction, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
    with_hash!(function, D => {
        let mut mac = <Hmac<D> as Mac>::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKeyLength { algorithm: "hmac" })?;
        for part in parts {
            mac.update(part);
        }
        Ok(mac.finalize().into_bytes().to_vec())
    })
}

/// Compare two byte strings without leaking the position of the first
/// difference.
///
/// Lengths are not secret: inputs of different length compare unequal
/// immediately.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
