//! Host and date checks that precede signature parsing

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::{
    error::SignatureError,
    request::{DATE_HEADER, SignedRequest},
};

/// Canonical host and accepted clock skew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    /// Host every signed request must be addressed to
    pub host: String,
    /// How far in the past the date header may be
    pub date_window_past: TimeDelta,
    /// How far in the future the date header may be
    pub date_window_future: TimeDelta,
}

/// `Host` must equal the configured host, ignoring ASCII case.
pub fn check_host(request: &SignedRequest, config: &SignatureConfig) -> Result<(), SignatureError> {
    let host = request.header("host").ok_or(SignatureError::MissingHost)?;
    if host.trim().eq_ignore_ascii_case(&config.host) {
        Ok(())
    } else {
        Err(SignatureError::HostMismatch)
    }
}

/// ISO-8601 date-times with an offset (`Z`, `+01:00` or `+0100`).
const OFFSET_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z", "%Y%m%dT%H%M%S%.f%#z"];

/// ISO-8601 date-times without an offset, read as UTC.
const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y%m%dT%H%M%S%.f"];

/// `X-OpenToken-Date` must parse and fall within
/// `[now - past, now + future]`.
///
/// A bound outside chrono's range does not constrain the date.
pub fn check_date(
    request: &SignedRequest,
    config: &SignatureConfig,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, SignatureError> {
    let raw = request.header(DATE_HEADER).ok_or(SignatureError::MissingDate)?;
    let date = parse_iso8601(raw.trim()).ok_or(SignatureError::InvalidDate)?;

    if now.checked_sub_signed(config.date_window_past).is_some_and(|earliest| date < earliest) {
        return Err(SignatureError::DateTooOld);
    }
    if now.checked_add_signed(config.date_window_future).is_some_and(|latest| date > latest) {
        return Err(SignatureError::DateTooNew);
    }
    Ok(date)
}

/// Extended or basic ISO-8601 with `T` or a space between date and time.
pub fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        .map(|date| date.with_timezone(&Utc))
        .or_else(|| {
            LOCAL_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|naive| naive.and_utc())
        })
}
