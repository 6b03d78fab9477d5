//! End-to-end OT1 verification tests
//!
//! Each rejection reason is triggered in isolation against an otherwise
//! valid, freshly signed request.

use chrono::{TimeDelta, TimeZone, Utc};
use opentoken_auth::{
    AUTHORIZATION, AccessSecret, Authentication, MemoryAccessCodes, SignatureConfig,
    SignatureError, SignatureVerifier, SignedRequest, authorization_header, sign_request,
};
use opentoken_core::SimEnv;
use proptest::prelude::*;

const ACCOUNT: &str = "acct-1";
const CODE: &str = "code-1";
const SECRET: &[u8] = b"shared signing secret";

fn env() -> SimEnv {
    SimEnv::at(0, Utc.with_ymd_and_hms(2010, 1, 1, 1, 23, 45).unwrap())
}

fn verifier() -> SignatureVerifier<MemoryAccessCodes, SimEnv> {
    let store = MemoryAccessCodes::new();
    store.insert(ACCOUNT, CODE, AccessSecret::new(SECRET.to_vec()));
    let config = SignatureConfig {
        host: "example.com".to_string(),
        date_window_past: TimeDelta::minutes(5),
        date_window_future: TimeDelta::minutes(5),
    };
    SignatureVerifier::new(config, store, env())
}

fn request() -> SignedRequest {
    SignedRequest::new("POST", "/account", "verbose=1")
        .with_header("Host", "Example.com")
        .with_header("X-OpenToken-Date", "2010-01-01T01:23:45Z")
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"email":"a@example.com"}"#)
}

fn signed_request() -> SignedRequest {
    let mut request = request();
    sign_request(&mut request, CODE, SECRET, &[]).unwrap();
    request
}

async fn verify(request: &mut SignedRequest) -> Result<Authentication, SignatureError> {
    verifier().authenticate(request, ACCOUNT, false).await
}

fn with_authorization(value: &str) -> SignedRequest {
    let mut request = request();
    request.set_header(AUTHORIZATION, value);
    request
}

#[tokio::test]
async fn valid_signature_is_accepted() {
    let mut request = signed_request();
    let auth = verify(&mut request).await.unwrap();

    assert_eq!(auth, Authentication::Signed { access_code: CODE.to_string() });
    assert!(auth.is_signed());
    assert_eq!(request.signature().unwrap().access_code, CODE);
}

#[tokio::test]
async fn unsigned_headers_are_stripped_after_verification() {
    let mut request = request().with_header("X-Forwarded-User", "admin");
    sign_request(&mut request, CODE, SECRET, &[]).unwrap();

    verify(&mut request).await.unwrap();
    assert!(request.header("x-forwarded-user").is_none());
    assert!(request.header(AUTHORIZATION).is_none());
    assert_eq!(request.header("content-type").as_deref(), Some("application/json"));
}

#[tokio::test]
async fn extra_signed_headers_are_kept() {
    let mut request = request().with_header("X-Request-Id", "42");
    sign_request(&mut request, CODE, SECRET, &["X-Request-Id"]).unwrap();

    verify(&mut request).await.unwrap();
    assert_eq!(request.header("x-request-id").as_deref(), Some("42"));
}

#[tokio::test]
async fn missing_authorization_depends_on_caller() {
    let verifier = verifier();

    let mut request = request();
    assert_eq!(
        verifier.authenticate(&mut request, ACCOUNT, true).await,
        Ok(Authentication::Unsigned)
    );
    assert_eq!(
        verifier.authenticate(&mut request, ACCOUNT, false).await,
        Err(SignatureError::SignatureRequired)
    );
}

#[tokio::test]
async fn tampered_body_is_a_mismatch() {
    let mut request = signed_request();
    request.body = br#"{"email":"b@example.com"}"#.to_vec();
    assert_eq!(verify(&mut request).await, Err(SignatureError::SignatureMismatch));
}

#[tokio::test]
async fn uppercase_hex_signature_is_accepted() {
    let request = request();
    let header = authorization_header(&request, CODE, SECRET, &[]).unwrap();
    let (prefix, rest) = header.split_once("signature=\"").unwrap();
    let (signature, suffix) = rest.split_once('"').unwrap();
    let upper = format!("{prefix}signature=\"{}\"{suffix}", signature.to_ascii_uppercase());

    let mut request = with_authorization(&upper);
    assert!(verify(&mut request).await.is_ok());
}

#[tokio::test]
async fn unknown_and_wrong_codes_are_indistinguishable() {
    let mut unknown = request();
    sign_request(&mut unknown, "no-such-code", SECRET, &[]).unwrap();
    let unknown_err = verify(&mut unknown).await.unwrap_err();

    let mut other_account = signed_request();
    let other_err = verifier().authenticate(&mut other_account, "acct-2", false).await.unwrap_err();

    assert_eq!(unknown_err, SignatureError::InvalidAccessCode);
    assert_eq!(unknown_err.to_string(), other_err.to_string());
}

#[tokio::test]
async fn host_and_date_gate_runs_before_parsing() {
    let mut request = with_authorization("garbage");
    request.set_header("Host", "evil.com");
    assert_eq!(verify(&mut request).await, Err(SignatureError::HostMismatch));

    let mut request = signed_request();
    request.set_header("X-OpenToken-Date", "2010-01-01T01:00:00Z");
    assert_eq!(verify(&mut request).await, Err(SignatureError::DateTooOld));

    let mut request = signed_request();
    request.set_header("X-OpenToken-Date", "2010-01-01T02:00:00Z");
    assert_eq!(verify(&mut request).await, Err(SignatureError::DateTooNew));
}

#[tokio::test]
async fn rejection_set_has_distinct_identities() {
    let sh = r#"signed-headers="host x-opentoken-date content-type""#;
    let cases: Vec<(SignedRequest, SignatureError)> = vec![
        (request(), SignatureError::SignatureRequired),
        (with_authorization("OT1-HMAC-SHA256"), SignatureError::InvalidIdentifier),
        (with_authorization("XX1-HMAC-SHA256-HEX"), SignatureError::UnsupportedType),
        (with_authorization("OT1-RSA-SHA256-HEX"), SignatureError::UnsupportedMethod),
        (with_authorization("OT1-HMAC-MD5-HEX"), SignatureError::UnsupportedAlgorithm),
        (with_authorization("OT1-HMAC-SHA256-B64"), SignatureError::UnsupportedEncoding),
        (
            with_authorization(&format!("OT1-HMAC-SHA256-HEX; access-code=a; {sh}")),
            SignatureError::MissingAttributes { names: vec!["signature".to_string()] },
        ),
        (
            with_authorization(&format!(
                "OT1-HMAC-SHA256-HEX; access-code=a; signature=b; realm=c; {sh}"
            )),
            SignatureError::UnexpectedAttributes { names: vec!["realm".to_string()] },
        ),
        (
            with_authorization(&format!(
                "OT1-HMAC-SHA256-HEX; access-code=a; access-code=a; signature=b; {sh}"
            )),
            SignatureError::DuplicateAttribute { name: "access-code".to_string() },
        ),
        (
            with_authorization("OT1-HMAC-SHA256-HEX; access-code=\"a; signature=b"),
            SignatureError::UnterminatedQuote { name: "access-code".to_string() },
        ),
        (
            with_authorization(
                "OT1-HMAC-SHA256-HEX; access-code=a; signature=b; signed-headers=\"host content-type\"",
            ),
            SignatureError::MissingSignedHeaders { names: vec!["x-opentoken-date".to_string()] },
        ),
        (
            with_authorization(&format!(
                "OT1-HMAC-SHA256-HEX; access-code=nope; signature=b; {sh}"
            )),
            SignatureError::InvalidAccessCode,
        ),
        (
            with_authorization(&format!(
                "OT1-HMAC-SHA256-HEX; access-code={CODE}; signature=00; {sh}"
            )),
            SignatureError::SignatureMismatch,
        ),
        (
            {
                let mut r = signed_request();
                r.set_header("Host", "other.example.com");
                r
            },
            SignatureError::HostMismatch,
        ),
        (
            {
                let mut r = SignedRequest::new("GET", "/", "")
                    .with_header("X-OpenToken-Date", "2010-01-01T01:23:45Z");
                r.set_header(AUTHORIZATION, "OT1-HMAC-SHA256-HEX");
                r
            },
            SignatureError::MissingHost,
        ),
        (
            {
                let mut r = signed_request();
                r.set_header("X-OpenToken-Date", "not a date");
                r
            },
            SignatureError::InvalidDate,
        ),
        (
            {
                let mut r = SignedRequest::new("GET", "/", "").with_header("Host", "example.com");
                r.set_header(AUTHORIZATION, "OT1-HMAC-SHA256-HEX");
                r
            },
            SignatureError::MissingDate,
        ),
        (
            {
                let mut r = signed_request();
                r.set_header("X-OpenToken-Date", "2009-12-31T00:00:00Z");
                r
            },
            SignatureError::DateTooOld,
        ),
        (
            {
                let mut r = signed_request();
                r.set_header("X-OpenToken-Date", "2010-01-02T00:00:00Z");
                r
            },
            SignatureError::DateTooNew,
        ),
    ];

    let mut codes = Vec::new();
    for (mut request, expected) in cases {
        let err = verify(&mut request).await.unwrap_err();
        assert_eq!(err, expected);
        codes.push(err.code());
    }
    let total = codes.len();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), total, "every rejection reason has its own code");
}

#[test]
fn prop_parser_never_panics() {
    proptest!(|(header in ".{0,200}")| {
        // PROPERTY: arbitrary header text is either accepted or rejected cleanly
        let _ = opentoken_auth::parse_authorization(&header);
    });
}

#[test]
fn prop_any_signed_body_verifies() {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    proptest!(|(body in prop::collection::vec(any::<u8>(), 0..256), path in "/[a-z/]{0,20}")| {
        let mut request = SignedRequest::new("PUT", &path, "")
            .with_header("Host", "example.com")
            .with_header("X-OpenToken-Date", "2010-01-01T01:23:45Z")
            .with_header("Content-Type", "application/octet-stream")
            .with_body(body);
        sign_request(&mut request, CODE, SECRET, &[]).unwrap();

        // PROPERTY: a request signed with the right secret always verifies
        let result = runtime.block_on(verify(&mut request));
        prop_assert!(result.is_ok(), "{:?}", result);
    });
}
