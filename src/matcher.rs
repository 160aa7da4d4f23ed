//! Venue identity resolution.
//!
//! An in-memory index is rebuilt at scan start and mutated by every
//! successful resolution, so concurrent scans agree on venue identity
//! without a round-trip per lookup. All writes go through the matcher; the
//! mutex plus the ON CONFLICT insert in the store guarantee that two scans
//! creating the same canonical name end up with one row.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::seeds;
use crate::store::{self, Db};

/// How a venue was resolved. `Created` means a fresh row was inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Alias,
    Prefix,
    Postcode,
    Created,
}

#[derive(Debug, Clone, Copy)]
pub struct VenueMatch {
    pub venue_id: i64,
    pub kind: MatchKind,
}

/// Pure lookup outcome over the in-memory index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Alias(i64),
    Prefix(i64),
    Postcode(i64),
    Miss,
}

/// In-memory venue index. Alias keys are lowercased; canonical names are
/// kept verbatim for the prefix scan; postcodes are canonical form.
#[derive(Debug, Default)]
pub struct VenueIndex {
    by_alias: HashMap<String, i64>,
    by_postcode: HashMap<String, Vec<i64>>,
    canonical_names: HashMap<i64, String>,
}

impl VenueIndex {
    pub fn insert_venue(&mut self, id: i64, canonical_name: &str, postcode: Option<&str>) {
        self.by_alias.insert(canonical_name.to_lowercase(), id);
        self.canonical_names.insert(id, canonical_name.to_string());
        if let Some(pc) = postcode {
            let ids = self.by_postcode.entry(pc.to_string()).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }

    pub fn insert_alias(&mut self, alias: &str, venue_id: i64) {
        self.by_alias.insert(alias.to_lowercase(), venue_id);
    }

    pub fn len(&self) -> usize {
        self.canonical_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_names.is_empty()
    }

    /// Resolution decision for `(normalized_name, canonical_postcode)`.
    ///
    /// 1. exact alias (skipped for ambiguous names arriving without a
    ///    postcode)
    /// 2. unique canonical-name prefix ("Bury Farm" -> "Bury Farm
    ///    Equestrian Village"); two or more candidates is no match
    /// 3. unique postcode owner, which also teaches the name as an alias
    fn lookup(&self, name: &str, postcode: Option<&str>) -> Lookup {
        let alias_allowed = !(postcode.is_none() && seeds::is_ambiguous_name(name));
        if alias_allowed {
            if let Some(&id) = self.by_alias.get(&name.to_lowercase()) {
                return Lookup::Alias(id);
            }
        }

        let prefix = format!("{name} ");
        let mut candidates = self
            .canonical_names
            .iter()
            .filter(|(_, canonical)| canonical.starts_with(&prefix));
        match (candidates.next(), candidates.next()) {
            (Some((&id, _)), None) => return Lookup::Prefix(id),
            // two or more prefix candidates: fall through to the postcode
            // step rather than guessing
            _ => {}
        }

        if let Some(pc) = postcode {
            if let Some(ids) = self.by_postcode.get(pc) {
                if let [only] = ids.as_slice() {
                    return Lookup::Postcode(*only);
                }
            }
        }

        Lookup::Miss
    }
}

/// Matcher shared across scans. The mutex serializes the resolve-then-insert
/// critical section so concurrent creates cannot fork identity.
pub struct VenueMatcher {
    db: Db,
    index: Mutex<VenueIndex>,
}

impl VenueMatcher {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            index: Mutex::new(VenueIndex::default()),
        }
    }

    /// Rebuild the index from the venues and alias tables. Called at scan
    /// start.
    pub async fn rebuild(&self) -> Result<()> {
        let mut fresh = VenueIndex::default();
        for venue in store::venues::all_venues(&self.db).await? {
            fresh.insert_venue(venue.id, &venue.canonical_name, venue.postcode.as_deref());
        }
        let aliases = store::venues::all_aliases(&self.db).await?;
        for alias in &aliases {
            fresh.insert_alias(&alias.alias_name, alias.venue_id);
        }
        info!(
            venues = fresh.len(),
            aliases = aliases.len(),
            "venue index rebuilt"
        );
        *self.index.lock().await = fresh;
        Ok(())
    }

    /// Resolve a normalized venue name (and optional canonical postcode) to
    /// a venue id, creating the venue on a full miss.
    pub async fn resolve(&self, name: &str, postcode: Option<&str>) -> Result<VenueMatch> {
        let mut index = self.index.lock().await;
        match index.lookup(name, postcode) {
            Lookup::Alias(venue_id) => Ok(VenueMatch {
                venue_id,
                kind: MatchKind::Alias,
            }),
            Lookup::Prefix(venue_id) => Ok(VenueMatch {
                venue_id,
                kind: MatchKind::Prefix,
            }),
            Lookup::Postcode(venue_id) => {
                // The name is new but the postcode pins the venue; remember
                // the spelling for next time.
                store::venues::insert_alias(&self.db, name, venue_id).await?;
                index.insert_alias(name, venue_id);
                debug!(name, venue_id, "venue resolved by postcode, alias learned");
                Ok(VenueMatch {
                    venue_id,
                    kind: MatchKind::Postcode,
                })
            }
            Lookup::Miss => {
                let venue_id = store::venues::ensure_venue(&self.db, name, postcode).await?;
                index.insert_venue(venue_id, name, postcode);
                debug!(name, venue_id, "venue created");
                Ok(VenueMatch {
                    venue_id,
                    kind: MatchKind::Created,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with_seeds() -> VenueIndex {
        let mut index = VenueIndex::default();
        index.insert_venue(1, "Allens Hill Competition Centre", Some("WR10 2DH"));
        index.insert_alias("Allens Hill", 1);
        index.insert_venue(2, "Bury Farm Equestrian Village", Some("LU7 9BT"));
        index.insert_venue(3, "Arena UK", Some("NG32 2EF"));
        index.insert_venue(4, "Home Farm", Some("YO62 4JV"));
        index
    }

    #[test]
    fn exact_alias_match_is_case_insensitive() {
        let index = index_with_seeds();
        assert_eq!(index.lookup("allens hill", None), Lookup::Alias(1));
        assert_eq!(
            index.lookup("Allens Hill Competition Centre", None),
            Lookup::Alias(1)
        );
    }

    #[test]
    fn unique_prefix_matches() {
        let index = index_with_seeds();
        assert_eq!(index.lookup("Bury Farm", None), Lookup::Prefix(2));
    }

    #[test]
    fn ambiguous_prefix_is_a_miss() {
        let mut index = index_with_seeds();
        index.insert_venue(10, "Manor Grange Hall", None);
        index.insert_venue(11, "Manor Grange Paddocks", None);
        assert_eq!(index.lookup("Manor Grange", None), Lookup::Miss);
    }

    #[test]
    fn postcode_resolves_unknown_name() {
        let index = index_with_seeds();
        assert_eq!(
            index.lookup("Completely New Name", Some("NG32 2EF")),
            Lookup::Postcode(3)
        );
    }

    #[test]
    fn shared_postcode_is_a_miss() {
        let mut index = index_with_seeds();
        index.insert_venue(5, "Arena UK Overflow", Some("NG32 2EF"));
        // two venues share the postcode: prefix still wins for "Arena UK"
        // derivatives, but a foreign name cannot resolve through it
        assert_eq!(index.lookup("Somewhere Else", Some("NG32 2EF")), Lookup::Miss);
    }

    #[test]
    fn ambiguous_name_without_postcode_skips_alias() {
        let index = index_with_seeds();
        assert_eq!(index.lookup("Home Farm", None), Lookup::Miss);
        // with a postcode the alias step applies again
        assert_eq!(index.lookup("Home Farm", Some("YO62 4JV")), Lookup::Alias(4));
    }

    #[test]
    fn learned_alias_resolves_on_next_lookup() {
        let mut index = index_with_seeds();
        assert_eq!(
            index.lookup("Fresh Spelling", Some("NG32 2EF")),
            Lookup::Postcode(3)
        );
        index.insert_alias("Fresh Spelling", 3);
        assert_eq!(index.lookup("Fresh Spelling", None), Lookup::Alias(3));
    }
}
