//! The wire contract between parsers and the scanner.
//!
//! Purely extractive: a parser reports what the source says, nothing more.
//! No classification, no canonicalization, no date filtering; the scanner
//! owns all of that. `discipline` is the source's raw wording, not a
//! canonical value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedEvent {
    pub name: String,
    /// ISO `YYYY-MM-DD`; the scanner skips events it cannot parse.
    pub date_start: String,
    #[serde(default)]
    pub date_end: Option<String>,
    pub venue_name: String,
    #[serde(default)]
    pub venue_postcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Raw discipline hint as the source spells it.
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub has_pony_classes: bool,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExtractedEvent {
    /// Required-field check applied at the parser boundary; records failing
    /// it are discarded before they reach the scanner.
    pub fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.date_start.trim().is_empty()
            && !self.venue_name.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_check() {
        let mut event = ExtractedEvent {
            name: "Spring Show".into(),
            date_start: "2026-04-01".into(),
            venue_name: "Arena UK".into(),
            ..Default::default()
        };
        assert!(event.has_required_fields());

        event.venue_name = "  ".into();
        assert!(!event.has_required_fields());
    }

    #[test]
    fn deserializes_with_missing_optionals() {
        let event: ExtractedEvent = serde_json::from_str(
            r#"{"name": "Show", "date_start": "2026-01-01", "venue_name": "Somewhere"}"#,
        )
        .unwrap();
        assert!(event.has_required_fields());
        assert!(event.classes.is_empty());
        assert!(!event.has_pony_classes);
    }
}
