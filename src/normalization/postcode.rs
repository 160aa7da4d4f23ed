//! UK postcode canonicalization.
//!
//! Canonical form is `OUTWARD INWARD`, uppercase, single space. The inward
//! code is always `digit letter letter`; the outward code must match one of
//! the recognized UK shapes once digit runs are collapsed.

/// Outward shapes after collapsing each run of digits to a single `D`.
/// `L` = letter. Covers A9, A99, AA9, AA99, A9A and AA9A style codes.
const OUTWARD_SHAPES: [&str; 6] = ["L", "LL", "LD", "LLD", "LDL", "LLDL"];

/// Canonicalize a raw postcode string, or return None for anything that is
/// not UK-shaped.
pub fn normalise_postcode(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation());
    if trimmed.is_empty() {
        return None;
    }

    let compact: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.len() < 5 || compact.len() > 7 {
        return None;
    }
    if !compact.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let (outward, inward) = compact.split_at(compact.len() - 3);

    let mut inward_chars = inward.chars();
    let inward_ok = inward_chars.next().is_some_and(|c| c.is_ascii_digit())
        && inward_chars.all(|c| c.is_ascii_alphabetic());
    if !inward_ok {
        return None;
    }

    if !OUTWARD_SHAPES.contains(&outward_shape(outward).as_str()) {
        return None;
    }

    Some(format!("{outward} {inward}"))
}

/// Collapse an outward code into its letter/digit-run shape:
/// "CV12" -> "LLD", "SW1A" -> "LLDL", "B33" -> "LD".
fn outward_shape(outward: &str) -> String {
    let mut shape = String::with_capacity(outward.len());
    let mut in_digit_run = false;
    for c in outward.chars() {
        if c.is_ascii_digit() {
            if !in_digit_run {
                shape.push('D');
                in_digit_run = true;
            }
        } else {
            shape.push('L');
            in_digit_run = false;
        }
    }
    shape
}

/// True when the whole string is a UK postcode (canonical or not).
pub fn is_postcode(text: &str) -> bool {
    normalise_postcode(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_common_forms() {
        assert_eq!(normalise_postcode("cv129ja"), Some("CV12 9JA".to_string()));
        assert_eq!(normalise_postcode("CV12 9JA"), Some("CV12 9JA".to_string()));
        assert_eq!(normalise_postcode("  m1 1aa  "), Some("M1 1AA".to_string()));
        assert_eq!(normalise_postcode("SW1A1AA"), Some("SW1A 1AA".to_string()));
        assert_eq!(normalise_postcode("B33 8TH."), Some("B33 8TH".to_string()));
        assert_eq!(normalise_postcode("ng32 2ef,"), Some("NG32 2EF".to_string()));
    }

    #[test]
    fn rejects_non_uk_shapes() {
        assert_eq!(normalise_postcode(""), None);
        assert_eq!(normalise_postcode("hello"), None);
        assert_eq!(normalise_postcode("12345"), None);
        assert_eq!(normalise_postcode("1A2 3BC"), None);
        // inward must be digit letter letter
        assert_eq!(normalise_postcode("CV12 JA9"), None);
        // too long / too short once compacted
        assert_eq!(normalise_postcode("ABCDE1 2FG"), None);
        assert_eq!(normalise_postcode("A1A"), None);
        // embedded garbage characters
        assert_eq!(normalise_postcode("CV1?-9JA"), None);
    }

    #[test]
    fn canonical_postcodes_are_fixed_points() {
        for pc in ["CV12 9JA", "M1 1AA", "SW1A 1AA", "B33 8TH", "LD3 8AH"] {
            assert_eq!(normalise_postcode(pc).as_deref(), Some(pc));
        }
    }

    #[test]
    fn shape_collapse() {
        assert_eq!(outward_shape("CV12"), "LLD");
        assert_eq!(outward_shape("SW1A"), "LLDL");
        assert_eq!(outward_shape("B33"), "LD");
        assert_eq!(outward_shape("W1A"), "LDL");
    }
}
