//! Client-side signing

use opentoken_crypto::CryptoError;

use crate::{
    canonical::{canonical_bytes, signature_hex},
    header::REQUIRED_SIGNED_HEADERS,
    request::{AUTHORIZATION, SignedRequest},
};

/// Authorization header value signing `request` over the mandatory headers
/// plus `extra_headers`, in that order.
pub fn authorization_header(
    request: &SignedRequest,
    access_code: &str,
    secret: &[u8],
    extra_headers: &[&str],
) -> Result<String, CryptoError> {
    let mut signed: Vec<String> = REQUIRED_SIGNED_HEADERS.iter().map(|h| (*h).to_string()).collect();
    for extra in extra_headers {
        let extra = extra.to_ascii_lowercase();
        if !signed.contains(&extra) {
            signed.push(extra);
        }
    }

    let signature = signature_hex(secret, &canonical_bytes(request, &signed))?;
    Ok(format!(
        "OT1-HMAC-SHA256-HEX; access-code=\"{access_code}\"; signature=\"{signature}\"; signed-headers=\"{}\"",
        signed.join(" ")
    ))
}

/// Sign `request` in place by setting its Authorization header.
pub fn sign_request(
    request: &mut SignedRequest,
    access_code: &str,
    secret: &[u8],
    extra_headers: &[&str],
) -> Result<(), CryptoError> {
    let value = authorization_header(request, access_code, secret, extra_headers)?;
    request.set_header(AUTHORIZATION, &value);
    Ok(())
}
