//! Canonical signing string
//!
//! ```text
//! METHOD
//! PATH
//! QUERY
//! name:value      (one line per signed header, in the client's order)
//!
//! BODY
//! ```

use opentoken_crypto::{CryptoError, HashFunction, compute_hmac};

use crate::request::SignedRequest;

/// Bytes the client signs for `request` over `signed_headers`.
///
/// Header values are trimmed; `host` is also lowercased. A signed header
/// missing from the request contributes an empty value.
pub fn canonical_bytes(request: &SignedRequest, signed_headers: &[String]) -> Vec<u8> {
    let mut out = Vec::with_capacity(128 + request.body.len());
    for line in [&request.method, &request.path, &request.query] {
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
    }

    for name in signed_headers {
        let raw = request.header(name).unwrap_or_default();
        let mut value = raw.trim().to_string();
        if name == "host" {
            value.make_ascii_lowercase();
        }
        out.extend_from_slice(name.as_bytes());
        out.push(b':');
        out.extend_from_slice(value.as_bytes());
        out.push(b'\n');
    }

    out.push(b'\n');
    out.extend_from_slice(&request.body);
    out
}

/// Lowercase hex `HMAC-SHA256(secret, canonical)`.
pub fn signature_hex(secret: &[u8], canonical: &[u8]) -> Result<String, CryptoError> {
    Ok(hex::encode(compute_hmac(HashFunction::Sha256, secret, &[canonical])?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed() -> Vec<String> {
        ["host", "x-opentoken-date", "content-type"].map(String::from).to_vec()
    }

    #[test]
    fn canonical_string_for_simple_get() {
        let request = SignedRequest::new("GET", "/path", "")
            .with_header("Host", "example.com")
            .with_header("X-OpenToken-Date", "2010-01-01T01:23:45Z")
            .with_header("Content-Type", "text/plain");

        let expected = [
            "GET",
            "/path",
            "",
            "host:example.com",
            "x-opentoken-date:2010-01-01T01:23:45Z",
            "content-type:text/plain",
            "",
            "",
        ]
        .join("\n");
        assert_eq!(canonical_bytes(&request, &signed()), expected.as_bytes());
    }

    #[test]
    fn host_is_lowercased_and_values_trimmed() {
        let request = SignedRequest::new("POST", "/p", "a=1")
            .with_header("Host", "  EXAMPLE.com ")
            .with_header("Content-Type", " Text/Plain ")
            .with_body("{\"x\":1}");

        let canonical = String::from_utf8(canonical_bytes(&request, &signed())).unwrap();
        assert_eq!(
            canonical,
            "POST\n/p\na=1\nhost:example.com\nx-opentoken-date:\ncontent-type:Text/Plain\n\n{\"x\":1}"
        );
    }

    #[test]
    fn header_order_follows_declaration() {
        let request = SignedRequest::new("GET", "/", "").with_header("a", "1").with_header("b", "2");
        let ab = canonical_bytes(&request, &["a".to_string(), "b".to_string()]);
        let ba = canonical_bytes(&request, &["b".to_string(), "a".to_string()]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn signature_is_lowercase_hex_sha256() {
        let sig = signature_hex(b"secret", b"data").unwrap();
        assert_eq!(sig.len(), 64);
        assert_eq!(sig, sig.to_ascii_lowercase());
    }
}
