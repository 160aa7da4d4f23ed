//! Event classification: the single place `discipline` and
//! `is_competition` are decided. Parsers hand over raw hints; nothing
//! downstream of this function re-litigates the outcome.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalization::discipline::{self, infer_discipline, normalise_discipline};

/// Classification outcome for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub discipline: Option<&'static str>,
    pub is_competition: bool,
}

// Keywords that mark an event as non-competition regardless of any
// discipline hint ("Dressage Training Clinic" is training, not dressage
// competition).
static TRAINING_KEYWORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(training|clinic|lesson|masterclass|camp)s?\b").unwrap());

static HIRE_KEYWORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(venue|arena)\s+hire\b").unwrap());

/// Classify an event from its name, optional parser discipline hint, and
/// optional description.
///
/// Rules in order, first hit wins:
/// 1. strong non-competition keyword in name or description
/// 2. parser hint resolved through the discipline table
/// 3. keyword inference over name, then description
/// 4. unknown events are presumed competitions
pub fn classify(
    name: &str,
    discipline_hint: Option<&str>,
    description: Option<&str>,
) -> Classification {
    let description = description.unwrap_or("");

    if HIRE_KEYWORDS_RE.is_match(name) || HIRE_KEYWORDS_RE.is_match(description) {
        return Classification {
            discipline: Some(discipline::VENUE_HIRE),
            is_competition: false,
        };
    }
    // "Combined Training" is a competition discipline, not the keyword.
    let name_scan = name.to_lowercase().replace("combined training", "");
    let desc_scan = description.to_lowercase().replace("combined training", "");
    if TRAINING_KEYWORDS_RE.is_match(&name_scan) || TRAINING_KEYWORDS_RE.is_match(&desc_scan) {
        return Classification {
            discipline: Some(discipline::TRAINING),
            is_competition: false,
        };
    }

    if let Some(hint) = discipline_hint {
        let (canonical, is_competition) = normalise_discipline(hint);
        if let Some(canonical) = canonical {
            return Classification {
                discipline: Some(canonical),
                is_competition,
            };
        }
    }

    if let Some(inferred) = infer_discipline(name).or_else(|| infer_discipline(description)) {
        return Classification {
            discipline: Some(inferred),
            is_competition: true,
        };
    }

    Classification {
        discipline: None,
        is_competition: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::discipline::{SHOW_JUMPING, TRAINING, VENUE_HIRE};

    #[test]
    fn training_keyword_overrides_discipline_hint() {
        let got = classify(
            "Maddy Moffet Jump Polework Training Clinic",
            Some("Show Jumping"),
            None,
        );
        assert_eq!(got.discipline, Some(TRAINING));
        assert!(!got.is_competition);
    }

    #[test]
    fn hire_keywords_win_over_training_keywords() {
        let got = classify("Arena Hire - flatwork or jumps", None, None);
        assert_eq!(got.discipline, Some(VENUE_HIRE));
        assert!(!got.is_competition);
    }

    #[test]
    fn combined_training_is_not_the_training_keyword() {
        let got = classify("Combined Training", Some("combined training"), None);
        assert_eq!(got.discipline, Some(crate::normalization::discipline::COMBINED_TRAINING));
        assert!(got.is_competition);
    }

    #[test]
    fn resolved_hint_is_trusted() {
        let got = classify("Spring Show", Some("showjump"), None);
        assert_eq!(got.discipline, Some(SHOW_JUMPING));
        assert!(got.is_competition);
    }

    #[test]
    fn unresolved_hint_falls_back_to_inference() {
        let got = classify("Evening Showjumping League", Some("???"), None);
        assert_eq!(got.discipline, Some(SHOW_JUMPING));
        assert!(got.is_competition);
    }

    #[test]
    fn inference_checks_description_after_name() {
        let got = classify(
            "Spring Spectacular",
            None,
            Some("Two rings of unaffiliated showjumping"),
        );
        assert_eq!(got.discipline, Some(SHOW_JUMPING));
        assert!(got.is_competition);
    }

    #[test]
    fn unknown_events_are_presumed_competitions() {
        let got = classify("Village Fun Day", None, None);
        assert_eq!(got.discipline, None);
        assert!(got.is_competition);
    }

    #[test]
    fn classify_is_pure() {
        let a = classify("Spring Show", Some("showjump"), Some("desc"));
        let b = classify("Spring Show", Some("showjump"), Some("desc"));
        assert_eq!(a, b);
    }
}
