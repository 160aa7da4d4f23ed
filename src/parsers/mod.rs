//! Parser strategies keyed by source key.
//!
//! Concrete parsers register in the table below; `get` falls back to the
//! generic LLM extractor for any unknown key so new sources can be onboarded
//! as data before they earn a dedicated parser.

pub mod equipe_online;
pub mod fetch;
pub mod generic;
pub mod horse_events;
pub mod html;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::extract::ExtractedEvent;
use crate::util::http::HttpClient;

/// Shared context handed to every parser invocation.
#[derive(Clone)]
pub struct ParserContext {
    pub http: HttpClient,
    pub extractor_url: String,
    pub extractor_model: String,
}

/// One source-fetching strategy. Implementations are purely extractive:
/// they must not filter by date, classify, touch the database, or
/// canonicalize anything.
#[async_trait]
pub trait Parser: Send + Sync {
    async fn fetch_and_parse(
        &self,
        source_url: &str,
        ctx: &ParserContext,
    ) -> Result<Vec<ExtractedEvent>>;
}

type ParserFactory = fn() -> Box<dyn Parser>;

static REGISTRY: Lazy<HashMap<&'static str, ParserFactory>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, ParserFactory> = HashMap::new();
    table.insert("equipe_online", || Box::new(equipe_online::EquipeOnlineParser));
    table.insert("horse_events", || Box::new(horse_events::HorseEventsParser));
    table
});

/// Look up the parser for a source key; unknown keys get the generic
/// extractor.
pub fn get(key: &str) -> Box<dyn Parser> {
    match REGISTRY.get(key) {
        Some(factory) => factory(),
        None => Box::new(generic::GenericParser),
    }
}

/// All keys with a dedicated parser.
pub fn registered_keys() -> Vec<&'static str> {
    let mut keys: Vec<_> = REGISTRY.keys().copied().collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_keys_resolve() {
        assert_eq!(registered_keys(), vec!["equipe_online", "horse_events"]);
        for key in registered_keys() {
            let _parser = get(key);
        }
    }

    #[test]
    fn unknown_key_gets_generic_fallback() {
        // must not panic, and must hand back a usable strategy
        let _parser = get("some_future_source");
    }
}
