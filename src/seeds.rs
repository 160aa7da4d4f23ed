//! Load-time seed data: the compiled-in source definitions and the venue
//! seed pack (canonical venues, aliases, ambiguous names).
//!
//! The venue data lives in `data/venue_seeds.json` and is embedded into the
//! binary; it is read-only at runtime. Canonical names are stored in their
//! normalized form.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// A compiled-in upstream source. `key` doubles as the parser-registry
/// dispatch key; keys with no registered parser fall back to the generic
/// extractor.
#[derive(Debug, Clone, Copy)]
pub struct SourceDef {
    pub key: &'static str,
    pub display_name: &'static str,
    pub url: &'static str,
    pub enabled: bool,
}

pub const SOURCE_DEFINITIONS: [SourceDef; 22] = [
    SourceDef {
        key: "equipe_online",
        display_name: "Equipe Online",
        url: "https://online.equipe.com/api/v1/meetings",
        enabled: true,
    },
    SourceDef {
        key: "horse_events",
        display_name: "Horse Events",
        url: "https://www.horse-events.co.uk/events/",
        enabled: true,
    },
    SourceDef {
        key: "arena_uk",
        display_name: "Arena UK",
        url: "https://www.arenauk.com/events/all-upcoming",
        enabled: true,
    },
    SourceDef {
        key: "hickstead",
        display_name: "Hickstead",
        url: "https://www.hickstead.co.uk/whats-on/",
        enabled: true,
    },
    SourceDef {
        key: "british_showjumping",
        display_name: "British Showjumping",
        url: "https://www.britishshowjumping.co.uk/shows",
        enabled: true,
    },
    SourceDef {
        key: "british_dressage",
        display_name: "British Dressage",
        url: "https://www.britishdressage.co.uk/competitions/",
        enabled: true,
    },
    SourceDef {
        key: "british_eventing",
        display_name: "British Eventing",
        url: "https://www.britisheventing.com/calendar",
        enabled: true,
    },
    SourceDef {
        key: "nsea",
        display_name: "NSEA",
        url: "https://www.nsea.org.uk/events",
        enabled: true,
    },
    SourceDef {
        key: "pony_club",
        display_name: "The Pony Club",
        url: "https://pcuk.org/events/",
        enabled: true,
    },
    SourceDef {
        key: "kelsall_hill",
        display_name: "Kelsall Hill",
        url: "https://www.kelsallhill.co.uk/whats-on",
        enabled: true,
    },
    SourceDef {
        key: "epworth",
        display_name: "Epworth Equestrian",
        url: "https://www.epworthequestrian.co.uk/events",
        enabled: true,
    },
    SourceDef {
        key: "horse_monkey",
        display_name: "Horse Monkey",
        url: "https://www.horsemonkey.com/events",
        enabled: true,
    },
    SourceDef {
        key: "my_riding_life",
        display_name: "My Riding Life",
        url: "https://www.myridinglife.com/eventdates.aspx",
        enabled: true,
    },
    SourceDef {
        key: "equilive",
        display_name: "EquiLive",
        url: "https://www.equi-live.com/",
        enabled: true,
    },
    SourceDef {
        key: "equo_events",
        display_name: "EquoEvents",
        url: "https://www.equoevents.co.uk/Events/SearchEvents",
        enabled: true,
    },
    SourceDef {
        key: "ashwood",
        display_name: "Ashwood Equestrian",
        url: "https://www.ashwoodequestrian.com/events",
        enabled: true,
    },
    SourceDef {
        key: "addington",
        display_name: "Addington Equestrian",
        url: "https://addingtonequestrian.com/whats-on/",
        enabled: true,
    },
    SourceDef {
        key: "bolesworth",
        display_name: "Bolesworth",
        url: "https://www.bolesworth.com/events/",
        enabled: true,
    },
    SourceDef {
        key: "hartpury",
        display_name: "Hartpury Equine",
        url: "https://www.hartpury.ac.uk/equine/events/",
        enabled: true,
    },
    SourceDef {
        key: "its_plain_sailing",
        display_name: "It's Plain Sailing",
        url: "https://www.itsplainsailing.com/clubs",
        enabled: true,
    },
    SourceDef {
        key: "entry_master",
        display_name: "Entry Master",
        url: "https://www.entrymaster.co.uk/upcoming-events",
        enabled: true,
    },
    SourceDef {
        key: "horse_boarding_uk",
        display_name: "Horse Boarding UK",
        url: "https://www.horseboardinguk.org/events",
        enabled: false,
    },
];

/// One seeded venue record.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueSeed {
    pub canonical_name: String,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    venues: Vec<VenueSeed>,
    ambiguous_names: Vec<String>,
}

static SEED_FILE: Lazy<SeedFile> = Lazy::new(|| {
    serde_json::from_str(include_str!("data/venue_seeds.json"))
        .expect("embedded venue_seeds.json is valid")
});

/// The ordered venue seed list.
pub fn venue_seeds() -> &'static [VenueSeed] {
    &SEED_FILE.venues
}

/// Generic names that must not alias-match without a postcode to
/// disambiguate them.
pub fn is_ambiguous_name(name: &str) -> bool {
    SEED_FILE
        .ambiguous_names
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::normalise_venue_name;
    use crate::normalization::postcode::normalise_postcode;
    use std::collections::HashSet;

    #[test]
    fn seed_file_parses_and_keys_are_unique() {
        let mut keys = HashSet::new();
        for def in SOURCE_DEFINITIONS {
            assert!(keys.insert(def.key), "duplicate source key {}", def.key);
            assert!(def.url.starts_with("http"), "bad url for {}", def.key);
        }
        assert!(!venue_seeds().is_empty());
    }

    #[test]
    fn seed_names_are_canonical() {
        for seed in venue_seeds() {
            assert_eq!(
                normalise_venue_name(&seed.canonical_name),
                seed.canonical_name,
                "seed venue {:?} is not canonical",
                seed.canonical_name
            );
        }
    }

    #[test]
    fn seed_postcodes_are_canonical() {
        for seed in venue_seeds() {
            if let Some(pc) = &seed.postcode {
                assert_eq!(normalise_postcode(pc).as_deref(), Some(pc.as_str()));
            }
        }
    }

    #[test]
    fn alias_names_are_globally_unique() {
        let mut seen = HashSet::new();
        for seed in venue_seeds() {
            for alias in &seed.aliases {
                assert!(seen.insert(alias.to_lowercase()), "duplicate alias {alias}");
            }
        }
    }

    #[test]
    fn ambiguous_name_lookup_is_case_insensitive() {
        assert!(is_ambiguous_name("home farm"));
        assert!(is_ambiguous_name("Home Farm"));
        assert!(!is_ambiguous_name("Arena UK"));
    }
}
