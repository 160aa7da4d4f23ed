//! Discipline canonicalization and keyword inference.
//!
//! Fifteen canonical categories: twelve competition disciplines, two
//! non-competition categories (Venue Hire, Training) and a catch-all
//! (Other). The raw-spelling table is data, not algorithm; extend it
//! alongside the tests.

use once_cell::sync::Lazy;
use regex::Regex;

pub const SHOW_JUMPING: &str = "Show Jumping";
pub const DRESSAGE: &str = "Dressage";
pub const EVENTING: &str = "Eventing";
pub const CROSS_COUNTRY: &str = "Cross Country";
pub const COMBINED_TRAINING: &str = "Combined Training";
pub const SHOWING: &str = "Showing";
pub const HUNTER_TRIAL: &str = "Hunter Trial";
pub const PONY_CLUB: &str = "Pony Club";
pub const NSEA: &str = "NSEA";
pub const AGRICULTURAL_SHOW: &str = "Agricultural Show";
pub const ENDURANCE: &str = "Endurance";
pub const GYMKHANA: &str = "Gymkhana";
pub const OTHER: &str = "Other";
pub const VENUE_HIRE: &str = "Venue Hire";
pub const TRAINING: &str = "Training";

/// Every canonical category the classifier may produce.
pub const CANONICAL_DISCIPLINES: [&str; 15] = [
    SHOW_JUMPING,
    DRESSAGE,
    EVENTING,
    CROSS_COUNTRY,
    COMBINED_TRAINING,
    SHOWING,
    HUNTER_TRIAL,
    PONY_CLUB,
    NSEA,
    AGRICULTURAL_SHOW,
    ENDURANCE,
    GYMKHANA,
    OTHER,
    VENUE_HIRE,
    TRAINING,
];

/// Lowercase raw spelling -> canonical category.
const RAW_TO_CANONICAL: [(&str, &str); 86] = [
    // Show Jumping
    ("showjumping", SHOW_JUMPING),
    ("show jumping", SHOW_JUMPING),
    ("showjump", SHOW_JUMPING),
    ("show jump", SHOW_JUMPING),
    ("british showjumping", SHOW_JUMPING),
    ("unaffiliated showjumping", SHOW_JUMPING),
    ("unaffiliated show jumping", SHOW_JUMPING),
    ("equitation jumping", SHOW_JUMPING),
    ("sj", SHOW_JUMPING),
    // Dressage
    ("dressage", DRESSAGE),
    ("british dressage", DRESSAGE),
    ("unaffiliated dressage", DRESSAGE),
    ("dressage to music", DRESSAGE),
    // Eventing
    ("eventing", EVENTING),
    ("one day event", EVENTING),
    ("ode", EVENTING),
    ("eventer trial", EVENTING),
    ("express eventing", EVENTING),
    ("eventers challenge", EVENTING),
    ("horse trial", EVENTING),
    ("horse trials", EVENTING),
    // Cross Country
    ("cross country", CROSS_COUNTRY),
    ("xc", CROSS_COUNTRY),
    ("show cross", CROSS_COUNTRY),
    ("showcross", CROSS_COUNTRY),
    ("arena eventing", CROSS_COUNTRY),
    // Combined Training
    ("combined training", COMBINED_TRAINING),
    ("ct", COMBINED_TRAINING),
    // Showing
    ("showing", SHOWING),
    ("shows", SHOWING),
    ("show", SHOWING),
    ("bsps", SHOWING),
    ("working hunter", SHOWING),
    // Hunter Trial
    ("hunter trial", HUNTER_TRIAL),
    ("hunter trials", HUNTER_TRIAL),
    // Pony Club
    ("pony club", PONY_CLUB),
    ("pony club rally", PONY_CLUB),
    // NSEA
    ("nsea", NSEA),
    ("schools competition", NSEA),
    // Agricultural Show
    ("agricultural show", AGRICULTURAL_SHOW),
    ("county show", AGRICULTURAL_SHOW),
    // Endurance
    ("endurance", ENDURANCE),
    ("pleasure ride", ENDURANCE),
    ("fun ride", ENDURANCE),
    // Gymkhana
    ("gymkhana", GYMKHANA),
    ("mounted games", GYMKHANA),
    // Other
    ("polo", OTHER),
    ("polocrosse", OTHER),
    ("horseball", OTHER),
    ("driving", OTHER),
    ("carriage driving", OTHER),
    ("working equitation", OTHER),
    ("le trec", OTHER),
    ("trec", OTHER),
    ("hobby horse", OTHER),
    ("demonstration", OTHER),
    ("demonstrations", OTHER),
    ("social", OTHER),
    ("vip event", OTHER),
    ("riding club", OTHER),
    ("mixed events", OTHER),
    ("other", OTHER),
    // Venue Hire
    ("venue hire", VENUE_HIRE),
    ("arena hire", VENUE_HIRE),
    ("arena/course hire", VENUE_HIRE),
    ("arena/coursehire", VENUE_HIRE),
    ("arena/school hire", VENUE_HIRE),
    ("arena booking", VENUE_HIRE),
    ("course hire", VENUE_HIRE),
    ("school hire", VENUE_HIRE),
    ("xc course hire", VENUE_HIRE),
    ("facility hire", VENUE_HIRE),
    // Training
    ("training", TRAINING),
    ("training clinic", TRAINING),
    ("training clinics", TRAINING),
    ("tuition", TRAINING),
    ("tuition/lessons", TRAINING),
    ("lessons", TRAINING),
    ("lesson", TRAINING),
    ("schooling", TRAINING),
    ("clinic", TRAINING),
    ("clinics", TRAINING),
    ("camp", TRAINING),
    ("camps", TRAINING),
    ("masterclass", TRAINING),
    ("polework", TRAINING),
];

/// Whether a canonical category counts as a competition.
pub fn category_is_competition(canonical: &str) -> bool {
    !matches!(canonical, VENUE_HIRE | TRAINING)
}

/// Map a raw discipline string to `(canonical, is_competition)`.
///
/// Unknown or empty input resolves to no canonical value and is presumed a
/// competition; the classifier decides what to do next.
pub fn normalise_discipline(raw: &str) -> (Option<&'static str>, bool) {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return (None, true);
    }
    for (spelling, canonical) in RAW_TO_CANONICAL {
        if spelling == key {
            return (Some(canonical), category_is_competition(canonical));
        }
    }
    (None, true)
}

/// Keyword patterns for inferring a competition discipline from free text.
/// First match wins; ordering mirrors how specific the vocabulary is.
/// Acronym alternatives stay case-sensitive so "BE" never matches the word
/// "be".
static DISCIPLINE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        (SHOW_JUMPING, r"(?i:show\s*jump)|\bSJ\b|\bBS\s"),
        (DRESSAGE, r"(?i:dressage)|\bBD\b"),
        (
            EVENTING,
            r"(?i:eventing|one.day.event|horse\s*trial)|\bODE\b|\bBE\d*\b",
        ),
        (
            CROSS_COUNTRY,
            r"(?i:cross\s*country|show.?cross|arena\s*eventing)|\bXC\b",
        ),
        (COMBINED_TRAINING, r"(?i:combined\s*training)|\bCT\b"),
        (HUNTER_TRIAL, r"(?i)hunter\s*trial"),
        (SHOWING, r"(?i)\bshowing\b|working\s*hunter"),
        (PONY_CLUB, r"(?i)pony\s*club"),
        (NSEA, r"(?i)\bNSEA\b"),
        (AGRICULTURAL_SHOW, r"(?i)agricultural\s*show|county\s*show"),
        (ENDURANCE, r"(?i)endurance|pleasure\s*ride"),
        (GYMKHANA, r"(?i)gymkhana|mounted\s*games"),
    ]
    .into_iter()
    .map(|(canonical, pattern)| (canonical, Regex::new(pattern).unwrap()))
    .collect()
});

/// Infer a competition discipline from event name/description text.
pub fn infer_discipline(text: &str) -> Option<&'static str> {
    DISCIPLINE_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(canonical, _)| *canonical)
}

const PONY_KEYWORDS: [&str; 11] = [
    "pony",
    "ponies",
    "junior",
    "u18",
    "under 18",
    "u16",
    "under 16",
    "u14",
    "under 14",
    "trailblazer",
    "nsea",
];

/// True if text mentions pony or junior classes.
pub fn detect_pony_classes(text: &str) -> bool {
    let lower = text.to_lowercase();
    PONY_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_raw_spellings() {
        assert_eq!(normalise_discipline("showjump"), (Some(SHOW_JUMPING), true));
        assert_eq!(normalise_discipline("SJ"), (Some(SHOW_JUMPING), true));
        assert_eq!(
            normalise_discipline("  British Dressage "),
            (Some(DRESSAGE), true)
        );
        assert_eq!(normalise_discipline("horse trials"), (Some(EVENTING), true));
        assert_eq!(normalise_discipline("polocrosse"), (Some(OTHER), true));
    }

    #[test]
    fn non_competition_categories_flag_false() {
        assert_eq!(normalise_discipline("arena hire"), (Some(VENUE_HIRE), false));
        assert_eq!(normalise_discipline("clinics"), (Some(TRAINING), false));
        assert_eq!(normalise_discipline("camp"), (Some(TRAINING), false));
    }

    #[test]
    fn unknown_input_does_not_resolve() {
        assert_eq!(normalise_discipline(""), (None, true));
        assert_eq!(normalise_discipline("underwater basket weaving"), (None, true));
    }

    #[test]
    fn canonical_values_are_fixed_points() {
        for canonical in CANONICAL_DISCIPLINES {
            let (resolved, is_comp) = normalise_discipline(canonical);
            assert_eq!(resolved, Some(canonical));
            assert_eq!(is_comp, category_is_competition(canonical));
        }
    }

    #[test]
    fn infers_from_free_text() {
        assert_eq!(infer_discipline("Evening Showjumping League"), Some(SHOW_JUMPING));
        assert_eq!(infer_discipline("Intro & Prelim Dressage"), Some(DRESSAGE));
        assert_eq!(infer_discipline("Mini ODE at the park"), Some(EVENTING));
        assert_eq!(infer_discipline("XC schooling day"), Some(CROSS_COUNTRY));
        assert_eq!(infer_discipline("Spring Gymkhana"), Some(GYMKHANA));
        assert_eq!(infer_discipline("Cake sale"), None);
        // acronyms only match in uppercase
        assert_eq!(infer_discipline("dates to be confirmed"), None);
        assert_eq!(infer_discipline("BE90 & BE100 sections"), Some(EVENTING));
    }

    #[test]
    fn detects_pony_classes() {
        assert!(detect_pony_classes("Senior & Junior showjumping"));
        assert!(detect_pony_classes("128cm Ponies welcome"));
        assert!(detect_pony_classes("NSEA qualifier"));
        assert!(!detect_pony_classes("Open showjumping 90cm"));
    }
}
