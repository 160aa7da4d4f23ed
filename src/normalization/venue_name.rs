//! Venue-name canonicalization.
//!
//! Raw venue strings arrive in every shape parsers can produce: shouty
//! capitals, postcode-laden addresses, show numbering, company suffixes and
//! the occasional URL pasted into a venue field. The pipeline here reduces
//! them to the canonical form the venue matcher indexes on. Pathological
//! input short-circuits to the `"Tbc"` sentinel; the event is kept and
//! grouped against the Tbc venue.

use once_cell::sync::Lazy;
use regex::Regex;

use super::postcode::{is_postcode, normalise_postcode};

/// Sentinel canonical name for junk venue input.
pub const TBC: &str = "Tbc";

/// Maximum plausible length for a venue name; longer strings are addresses
/// or scraped paragraphs, not names.
const MAX_NAME_LEN: usize = 100;

/// Names longer than this keep only the first comma segment.
const SINGLE_COMMA_TRUNCATE_LEN: usize = 50;

// BS-style show numbering: "(1)", "(2) - SPONSORED BY DUBARRY", ...
static SHOW_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(\d+\)(\s*-\s*.*)?$").unwrap());

// Trailing event-descriptor parentheticals: "(Festival)", "(Small Pony
// Premier)". Location qualifiers like "(Cumbria)" are preserved.
static TRAILING_EVENT_PAREN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*\([^)]*(?:Premier|Festival|Championship|Finals|Qualifier|Scope|Senior|Junior|Pony|Winter|Summer|League)[^)]*\)\s*$",
    )
    .unwrap()
});

static LIMITED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+Limited$").unwrap());

// Trailing abbreviation codes: " - Chspc", " - Vwh". Six letters max so
// location names after a dash survive.
static TRAILING_ABBREV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*-\s+[A-Za-z]{1,6}$").unwrap());

// Spaced UK postcode embedded in a name/address.
static EMBEDDED_POSTCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z]{1,2}\d[A-Z\d]?\s+\d[A-Z]{2}\b").unwrap());

// Google plus-code, e.g. "9C4W+XF" or "8FVC9G8F+6W".
static PLUS_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[23456789CFGHJMPQRVWX]{4,8}\+[23456789CFGHJMPQRVWX]{2,3}\b").unwrap()
});

static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Venue-type suffixes stripped from the end of names, longest first.
const VENUE_SUFFIXES: [&str; 12] = [
    "Equestrian Centre",
    "Equestrian",
    "Equine Centre",
    "Equine",
    "Riding Centre",
    "Riding School",
    "Riding Club",
    "Showground",
    "Event Centre",
    "Farm",
    "Stables",
    "Ltd",
];

/// Words that are meaningless when left dangling at the end of a name.
const ORPHAN_WORDS: [&str; 6] = ["of", "at", "in", "on", "&", "and"];

/// Canonicalize a raw venue name. Total and deterministic; junk input
/// returns the `"Tbc"` sentinel.
pub fn normalise_venue_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_junk(trimmed) {
        return TBC.to_string();
    }

    let cleaned = clean(trimmed);
    let truncated = truncate_on_commas(&cleaned);

    // Truncation can expose a suffix that was previously buried inside an
    // address ("Hall Farm, Nottingham" -> "Hall Farm"), so the cleanup
    // stages run once more on the kept segment to stay idempotent.
    let finished = if truncated != cleaned {
        strip_trailing_noise(&strip_suffixes(&truncated))
    } else {
        truncated
    };

    let finished = finished.trim().to_string();
    if finished.is_empty() {
        TBC.to_string()
    } else {
        finished
    }
}

fn is_junk(trimmed: &str) -> bool {
    if trimmed.is_empty() || trimmed.len() > MAX_NAME_LEN {
        return true;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("www.")
        || lower.contains("://")
    {
        return true;
    }
    if is_postcode(trimmed) {
        return true;
    }
    PLUS_CODE_RE.is_match(trimmed)
}

fn clean(name: &str) -> String {
    let without_numbering = SHOW_NUMBER_RE.replace(name, "");
    let without_paren = TRAILING_EVENT_PAREN_RE.replace(&without_numbering, "");

    let mut cleaned = title_case(without_paren.trim());
    cleaned = remove_embedded_postcodes(&cleaned);
    cleaned = LIMITED_RE.replace(&cleaned, "").to_string();
    cleaned = TRAILING_ABBREV_RE.replace(&cleaned, "").to_string();
    cleaned = strip_suffixes(&cleaned);
    strip_trailing_noise(&cleaned)
}

/// Title-case, preserving all-uppercase acronyms of up to three letters.
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let is_short_acronym =
                word.len() <= 3 && word.chars().all(|c| c.is_ascii_uppercase());
            if is_short_acronym {
                word.to_string()
            } else {
                title_case_word(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase every alphabetic character that starts an alphabetic run,
/// lowercase the rest ("O'NEILL" -> "O'Neill", "WESTON-SUPER-MARE" ->
/// "Weston-Super-Mare").
fn title_case_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_run_start = true;
    for c in word.chars() {
        if c.is_alphabetic() {
            if at_run_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_run_start = false;
        } else {
            out.push(c);
            at_run_start = true;
        }
    }
    out
}

fn remove_embedded_postcodes(name: &str) -> String {
    let mut out = name.to_string();
    loop {
        let Some(m) = EMBEDDED_POSTCODE_RE.find(&out) else {
            break;
        };
        if normalise_postcode(m.as_str()).is_none() {
            break;
        }
        out.replace_range(m.range(), " ");
    }
    out
}

/// Iteratively strip venue-type suffixes ("X Equestrian Centre" -> "X").
/// Never strips a name down to nothing.
fn strip_suffixes(name: &str) -> String {
    let mut current = name.trim().to_string();
    loop {
        let lower = current.to_ascii_lowercase();
        let mut stripped = false;
        for suffix in VENUE_SUFFIXES {
            let needle = format!(" {}", suffix.to_ascii_lowercase());
            if lower.ends_with(&needle) {
                let keep = current.len() - needle.len();
                if current[..keep].trim().is_empty() {
                    continue;
                }
                current.truncate(keep);
                current = current.trim_end().to_string();
                stripped = true;
                break;
            }
        }
        if !stripped {
            return current;
        }
    }
}

/// Collapse whitespace and peel trailing punctuation and orphan
/// prepositions until the tail is clean.
fn strip_trailing_noise(name: &str) -> String {
    let mut current = MULTI_SPACE_RE.replace_all(name.trim(), " ").to_string();
    loop {
        let before = current.len();
        current = current
            .trim_end_matches(|c: char| {
                c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '&' | ',' | '.' | ';')
            })
            .to_string();
        if let Some(last) = current.rsplit(' ').next() {
            if ORPHAN_WORDS.contains(&last.to_ascii_lowercase().as_str()) && last.len() < current.len()
            {
                current.truncate(current.len() - last.len());
                current = current.trim_end().to_string();
            }
        }
        if current.len() == before {
            return current;
        }
    }
}

/// Address truncation: two or more commas always keep the first segment;
/// one comma keeps the first segment only when the whole string is long
/// enough to be an address rather than a qualified name.
fn truncate_on_commas(name: &str) -> String {
    let comma_count = name.matches(',').count();
    let take_first =
        comma_count >= 2 || (comma_count == 1 && name.len() > SINGLE_COMMA_TRUNCATE_LEN);
    if take_first {
        name.split(',').next().unwrap_or(name).trim().to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn junk_input_yields_tbc() {
        assert_eq!(normalise_venue_name(""), TBC);
        assert_eq!(normalise_venue_name("   "), TBC);
        assert_eq!(normalise_venue_name("http://example.com/event/123"), TBC);
        assert_eq!(normalise_venue_name("www.arenauk.com"), TBC);
        assert_eq!(normalise_venue_name("CV12 9JA"), TBC);
        assert_eq!(normalise_venue_name("cv129ja"), TBC);
        assert_eq!(normalise_venue_name("9C4W+XF Bristol"), TBC);
        let long = "a".repeat(101);
        assert_eq!(normalise_venue_name(&long), TBC);
    }

    #[test]
    fn strips_show_numbering_and_event_parens() {
        assert_eq!(
            normalise_venue_name("Arena UK (2) - SPONSORED BY DUBARRY"),
            "Arena UK"
        );
        assert_eq!(normalise_venue_name("Eland Lodge (1)"), "Eland Lodge");
        assert_eq!(
            normalise_venue_name("Hickstead (Winter Championship)"),
            "Hickstead"
        );
        // location qualifiers survive
        assert_eq!(
            normalise_venue_name("Greenlands (Cumbria)"),
            "Greenlands (Cumbria)"
        );
    }

    #[test]
    fn title_cases_preserving_short_acronyms() {
        assert_eq!(normalise_venue_name("ELAND LODGE"), "Eland Lodge");
        assert_eq!(normalise_venue_name("arena UK"), "Arena UK");
        assert_eq!(normalise_venue_name("BCA college"), "BCA College");
    }

    #[test]
    fn removes_embedded_postcode_and_company_tails() {
        assert_eq!(normalise_venue_name("Abbey Sports CV12 9JA"), "Abbey Sports");
        assert_eq!(normalise_venue_name("Onley Grounds Limited"), "Onley Grounds");
        assert_eq!(normalise_venue_name("South View - Chspc"), "South View");
    }

    #[test]
    fn strips_suffix_vocabulary_iteratively() {
        assert_eq!(normalise_venue_name("Kelsall Hill Equestrian Centre"), "Kelsall Hill");
        assert_eq!(normalise_venue_name("Mill House Riding School Ltd"), "Mill House");
        assert_eq!(normalise_venue_name("Abbey Farm"), "Abbey");
        // not in the vocabulary, preserved
        assert_eq!(
            normalise_venue_name("Allens Hill Competition Centre"),
            "Allens Hill Competition Centre"
        );
        // never strips down to nothing
        assert_eq!(normalise_venue_name("Stables"), "Stables");
    }

    #[test]
    fn truncates_addresses_on_commas() {
        assert_eq!(
            normalise_venue_name("Onley Grounds, Willoughby, Rugby"),
            "Onley Grounds"
        );
        assert_eq!(
            normalise_venue_name("Stockton Dressage Group, Stockton on the Forest Village Hall"),
            "Stockton Dressage Group"
        );
        // a short qualified name keeps its county
        assert_eq!(
            normalise_venue_name("Higher Bridge, Cheshire"),
            "Higher Bridge, Cheshire"
        );
    }

    #[test]
    fn strips_orphan_prepositions_and_punctuation() {
        assert_eq!(normalise_venue_name("Manor Grounds at"), "Manor Grounds");
        assert_eq!(normalise_venue_name("Priory Park &"), "Priory Park");
        assert_eq!(normalise_venue_name("Rectory Yard -"), "Rectory Yard");
    }

    #[test]
    fn idempotent_over_varied_input() {
        let samples = [
            "ELAND LODGE EQUESTRIAN CENTRE",
            "Arena UK (2) - SPONSORED BY DUBARRY",
            "Onley Grounds, Willoughby, Rugby",
            "Hall Farm, Nottingham, Notts",
            "Higher Bridge, Cheshire",
            "http://example.com",
            "South View - Chspc",
            "Abbey Farm CV12 9JA",
            "Tbc",
            "",
        ];
        for s in samples {
            let once = normalise_venue_name(s);
            assert_eq!(normalise_venue_name(&once), once, "not idempotent for {s:?}");
        }
    }
}
