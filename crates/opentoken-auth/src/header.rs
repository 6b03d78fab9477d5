//! Authorization header parsing
//!
//! ```text
//! OT1-HMAC-SHA256-HEX; access-code="..."; signature="..."; signed-headers="host x-opentoken-date content-type"
//! ```
//!
//! The first segment is the identifier. The rest are `key=value`
//! attributes; a double-quoted value may itself contain `;`, in which case it
//! spans several segments up to the closing quote.

use crate::error::SignatureError;

/// Only signature type this verifier dispatches.
pub const SIGNATURE_TYPE: &str = "OT1";

/// Headers every signature must cover.
pub const REQUIRED_SIGNED_HEADERS: [&str; 3] = ["host", "x-opentoken-date", "content-type"];

const ACCESS_CODE: &str = "access-code";
const SIGNATURE: &str = "signature";
const SIGNED_HEADERS: &str = "signed-headers";
const ATTRIBUTES: [&str; 3] = [ACCESS_CODE, SIGNATURE, SIGNED_HEADERS];

/// Parsed OT1 Authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureAttributes {
    /// `HMAC`
    pub method: String,
    /// `SHA256`
    pub algorithm: String,
    /// `HEX`
    pub encoding: String,
    /// Client's access code
    pub access_code: String,
    /// Client's hex signature
    pub signature: String,
    /// Lowercase header names in the client's order
    pub signed_headers: Vec<String>,
}

/// Parse and validate an Authorization header value.
///
/// # Errors
///
/// One [`SignatureError`] per rejection reason, checked in this order:
/// identifier shape, TYPE, METHOD, ALGORITHM, ENCODING, attribute syntax,
/// duplicates, missing attributes, extra attributes, mandatory signed headers.
pub fn parse_authorization(value: &str) -> Result<SignatureAttributes, SignatureError> {
    let mut segments = value.split(';');
    let identifier = segments.next().unwrap_or_default().trim().to_ascii_uppercase();

    let parts: Vec<&str> = identifier.split('-').collect();
    let [kind, method, algorithm, encoding] = parts.as_slice() else {
        return Err(SignatureError::InvalidIdentifier);
    };
    if [kind, method, algorithm, encoding].iter().any(|p| p.is_empty()) {
        return Err(SignatureError::InvalidIdentifier);
    }
    if *kind != SIGNATURE_TYPE {
        return Err(SignatureError::UnsupportedType);
    }
    if *method != "HMAC" {
        return Err(SignatureError::UnsupportedMethod);
    }
    if *algorithm != "SHA256" {
        return Err(SignatureError::UnsupportedAlgorithm);
    }
    if *encoding != "HEX" {
        return Err(SignatureError::UnsupportedEncoding);
    }

    let attributes = parse_attributes(segments)?;

    let missing: Vec<String> = ATTRIBUTES
        .iter()
        .filter(|name| !attributes.iter().any(|(key, _)| key == *name))
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SignatureError::MissingAttributes { names: missing });
    }

    let extra: Vec<String> = attributes
        .iter()
        .filter(|(key, _)| !ATTRIBUTES.contains(&key.as_str()))
        .map(|(key, _)| key.clone())
        .collect();
    if !extra.is_empty() {
        return Err(SignatureError::UnexpectedAttributes { names: extra });
    }

    let lookup = |name: &str| {
        attributes.iter().find(|(key, _)| key == name).map(|(_, v)| v.clone()).unwrap_or_default()
    };

    let signed_headers: Vec<String> =
        lookup(SIGNED_HEADERS).to_ascii_lowercase().split_whitespace().map(str::to_string).collect();
    let unsigned: Vec<String> = REQUIRED_SIGNED_HEADERS
        .iter()
        .filter(|required| !signed_headers.iter().any(|h| h == *required))
        .map(|required| (*required).to_string())
        .collect();
    if !unsigned.is_empty() {
        return Err(SignatureError::MissingSignedHeaders { names: unsigned });
    }

    Ok(SignatureAttributes {
        method: (*method).to_string(),
        algorithm: (*algorithm).to_string(),
        encoding: (*encoding).to_string(),
        access_code: lookup(ACCESS_CODE),
        signature: lookup(SIGNATURE),
        signed_headers,
    })
}

/// Split attribute segments into `(key, value)` pairs, rejoining quoted
/// values that contain `;`.
fn parse_attributes<'a>(
    mut segments: impl Iterator<Item = &'a str>,
) -> Result<Vec<(String, String)>, SignatureError> {
    let mut attributes: Vec<(String, String)> = Vec::new();

    while let Some(segment) = segments.next() {
        if segment.trim().is_empty() {
            continue;
        }
        let Some((key, raw)) = segment.split_once('=') else {
            return Err(SignatureError::MalformedAttribute);
        };
        let key = key.trim().to_ascii_lowercase();
        let raw = raw.trim_start();

        let value = if let Some(quoted) = raw.strip_prefix('"') {
            let mut collected = quoted.to_string();
            loop {
                if let Some(end) = collected.find('"') {
                    if !collected[end + 1..].trim().is_empty() {
                        return Err(SignatureError::MalformedAttribute);
                    }
                    collected.truncate(end);
                    break collected;
                }
                let Some(next) = segments.next() else {
                    return Err(SignatureError::UnterminatedQuote { name: key });
                };
                collected.push(';');
                collected.push_str(next);
            }
        } else {
            raw.trim_end().to_string()
        };

        if attributes.iter().any(|(existing, _)| *existing == key) {
            return Err(SignatureError::DuplicateAttribute { name: key });
        }
        attributes.push((key, value));
    }

    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"OT1-HMAC-SHA256-HEX; access-code="abc"; signature="00ff"; signed-headers="host x-opentoken-date content-type""#;

    #[test]
    fn parses_valid_header() {
        let attrs = parse_authorization(VALID).unwrap();
        assert_eq!(attrs.access_code, "abc");
        assert_eq!(attrs.signature, "00ff");
        assert_eq!(attrs.signed_headers, ["host", "x-opentoken-date", "content-type"]);
        assert_eq!(attrs.method, "HMAC");
    }

    #[test]
    fn identifier_is_case_normalized() {
        let header = VALID.replacen("OT1-HMAC-SHA256-HEX", "ot1-hmac-sha256-hex", 1);
        assert!(parse_authorization(&header).is_ok());
    }

    #[test]
    fn signed_headers_keep_client_order_and_are_lowercased() {
        let header = r#"OT1-HMAC-SHA256-HEX; access-code=a; signature=b; signed-headers="Content-Type  X-Extra host x-opentoken-date""#;
        let attrs = parse_authorization(header).unwrap();
        assert_eq!(attrs.signed_headers, ["content-type", "x-extra", "host", "x-opentoken-date"]);
    }

    #[test]
    fn quoted_value_may_contain_semicolons() {
        let header = r#"OT1-HMAC-SHA256-HEX; access-code="a;b;c"; signature=s; signed-headers="host x-opentoken-date content-type""#;
        assert_eq!(parse_authorization(header).unwrap().access_code, "a;b;c");
    }

    #[test]
    fn identifier_shape_errors() {
        for header in ["", "OT1-HMAC-SHA256", "OT1-HMAC-SHA256-HEX-X", "OT1--SHA256-HEX"] {
            assert_eq!(parse_authorization(header), Err(SignatureError::InvalidIdentifier), "{header}");
        }
    }

    #[test]
    fn identifier_field_errors() {
        let cases = [
            ("OT2-HMAC-SHA256-HEX", SignatureError::UnsupportedType),
            ("OT1-RSA-SHA256-HEX", SignatureError::UnsupportedMethod),
            ("OT1-HMAC-SHA1-HEX", SignatureError::UnsupportedAlgorithm),
            ("OT1-HMAC-SHA256-BASE64", SignatureError::UnsupportedEncoding),
        ];
        for (identifier, expected) in cases {
            let header = VALID.replacen("OT1-HMAC-SHA256-HEX", identifier, 1);
            assert_eq!(parse_authorization(&header), Err(expected), "{identifier}");
        }
    }

    #[test]
    fn attribute_errors() {
        let cases = [
            (
                r#"OT1-HMAC-SHA256-HEX; access-code=a; access-code=b; signature=s; signed-headers="host x-opentoken-date content-type""#,
                SignatureError::DuplicateAttribute { name: "access-code".to_string() },
            ),
            (
                r#"OT1-HMAC-SHA256-HEX; access-code="a; signature=s"#,
                SignatureError::UnterminatedQuote { name: "access-code".to_string() },
            ),
            (
                r#"OT1-HMAC-SHA256-HEX; access-code=a; signed-headers="host x-opentoken-date content-type""#,
                SignatureError::MissingAttributes { names: vec!["signature".to_string()] },
            ),
            (
                r#"OT1-HMAC-SHA256-HEX; access-code=a; signature=s; nonce=1; signed-headers="host x-opentoken-date content-type""#,
                SignatureError::UnexpectedAttributes { names: vec!["nonce".to_string()] },
            ),
            (
                r#"OT1-HMAC-SHA256-HEX; access-code=a; signature=s; signed-headers="host""#,
                SignatureError::MissingSignedHeaders {
                    names: vec!["x-opentoken-date".to_string(), "content-type".to_string()],
                },
            ),
            ("OT1-HMAC-SHA256-HEX; access-code", SignatureError::MalformedAttribute),
        ];
        for (header, expected) in cases {
            assert_eq!(parse_authorization(header), Err(expected), "{header}");
        }
    }
}
