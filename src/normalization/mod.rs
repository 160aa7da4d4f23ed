//! Pure normalization utilities shared by the scanner and parsers.
//!
//! Everything in this module is deterministic and free of I/O; identical
//! input always produces identical output.

pub mod discipline;
pub mod postcode;
pub mod venue_name;

use chrono::NaiveDate;

pub use discipline::{detect_pony_classes, infer_discipline, normalise_discipline};
pub use postcode::normalise_postcode;
pub use venue_name::normalise_venue_name;

/// Parse a strict ISO `YYYY-MM-DD` date. Anything else is rejected
/// (chrono alone would accept unpadded months and days).
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Return the URL if it uses http(s), otherwise None.
pub fn sanitise_url(url: Option<&str>) -> Option<String> {
    let candidate = url?.trim();
    let lower = candidate.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(candidate.to_string())
    } else {
        if !candidate.is_empty() {
            let head: String = candidate.chars().take(100).collect();
            tracing::warn!(url = %head, "rejected non-http url");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_iso_dates_only() {
        assert!(parse_iso_date("2026-02-25").is_some());
        assert!(parse_iso_date(" 2026-02-25 ").is_some());
        assert!(parse_iso_date("25/02/2026").is_none());
        assert!(parse_iso_date("2026-2-5").is_none());
        assert!(parse_iso_date("TBC").is_none());
    }

    #[test]
    fn keeps_http_and_https_urls_only() {
        assert_eq!(
            sanitise_url(Some("https://example.com/x")),
            Some("https://example.com/x".to_string())
        );
        assert_eq!(
            sanitise_url(Some("http://example.com")),
            Some("http://example.com".to_string())
        );
        assert_eq!(sanitise_url(Some("javascript:alert(1)")), None);
        assert_eq!(sanitise_url(Some("ftp://example.com")), None);
        assert_eq!(sanitise_url(None), None);
    }
}
