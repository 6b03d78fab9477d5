//! Inbound request as seen by signature verification

use crate::header::SignatureAttributes;

/// Authorization header name.
pub const AUTHORIZATION: &str = "authorization";

/// Date header every signed request must carry and sign.
pub const DATE_HEADER: &str = "x-opentoken-date";

/// One request, constructed and discarded within its handler.
///
/// Header names are matched case-insensitively. Repeated headers are kept in
/// arrival order and read back joined with `,`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedRequest {
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: String,
    /// Raw body
    pub body: Vec<u8>,
    headers: Vec<(String, String)>,
    signature: Option<SignatureAttributes>,
}

impl SignedRequest {
    /// Request without headers or body.
    pub fn new(method: &str, path: &str, query: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query: query.to_string(),
            ..Self::default()
        }
    }

    /// Builder-style header insertion.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Builder-style body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a header value.
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Replace all values of a header.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.add_header(name, value);
    }

    /// Header value, with repeated headers joined by `,`.
    pub fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect();
        if values.is_empty() { None } else { Some(values.join(",")) }
    }

    /// All headers in arrival order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Signature attributes, set once the request is authenticated.
    pub fn signature(&self) -> Option<&SignatureAttributes> {
        self.signature.as_ref()
    }

    pub(crate) fn set_signature(&mut self, attributes: SignatureAttributes) {
        self.signature = Some(attributes);
    }

    /// Drop every header whose lowercase name is not in `keep`.
    pub fn retain_headers(&mut self, keep: &[String]) {
        self.headers.retain(|(name, _)| keep.iter().any(|k| name.eq_ignore_ascii_case(k)));
    }
}
