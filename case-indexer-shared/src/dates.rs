//! Timestamp normalization.
//!
//! Case documents carry ISO-like timestamps in several shapes (`Z`-suffixed,
//! offset, naive, date-only). The index stores every date as RFC 3339 UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::errors::ModelError;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-like timestamp into UTC.
///
/// Naive timestamps are read as UTC, date-only values as midnight UTC.
pub fn parse_utc(field: &str, value: &str) -> Result<DateTime<Utc>, ModelError> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = trimmed.trim_end_matches('Z');
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ModelError::invalid_date(field, value))
}

/// Render a timestamp as RFC 3339 with a `Z` suffix.
pub fn to_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Normalize an optional ISO-like timestamp to RFC 3339 UTC.
///
/// Empty strings are treated as absent.
pub fn normalize(field: &str, value: Option<&str>) -> Result<Option<String>, ModelError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_utc(field, v).map(|dt| Some(to_rfc3339(&dt))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_z_suffixed() {
        let out = normalize("opening_date", Some("2026-01-22T08:30:00Z")).unwrap();
        assert_eq!(out.as_deref(), Some("2026-01-22T08:30:00Z"));
    }

    #[test]
    fn test_normalize_naive_as_utc() {
        let out = normalize("created_at", Some("2026-01-22T08:30:00.123456")).unwrap();
        assert_eq!(out.as_deref(), Some("2026-01-22T08:30:00.123456Z"));
    }

    #[test]
    fn test_normalize_offset_converted() {
        let out = normalize("updated_at", Some("2026-01-22T10:30:00+02:00")).unwrap();
        assert_eq!(out.as_deref(), Some("2026-01-22T08:30:00Z"));
    }

    #[test]
    fn test_normalize_date_only() {
        let out = normalize("closure_date", Some("2026-02-01")).unwrap();
        assert_eq!(out.as_deref(), Some("2026-02-01T00:00:00Z"));
    }

    #[test]
    fn test_normalize_absent_and_empty() {
        assert_eq!(normalize("closure_date", None).unwrap(), None);
        assert_eq!(normalize("closure_date", Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = normalize("opening_date", Some("last tuesday")).unwrap_err();
        assert!(matches!(err, ModelError::InvalidDate { .. }));
    }
}
