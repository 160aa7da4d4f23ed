//! Parser for horse-events.co.uk: the listing page embeds one JSON-LD
//! Event block per event, including venue, postcode and sometimes
//! coordinates.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::extract::ExtractedEvent;
use crate::parsers::{fetch, html, Parser, ParserContext};

pub struct HorseEventsParser;

#[async_trait]
impl Parser for HorseEventsParser {
    async fn fetch_and_parse(
        &self,
        source_url: &str,
        ctx: &ParserContext,
    ) -> Result<Vec<ExtractedEvent>> {
        let page = fetch::fetch_page(&ctx.http, source_url).await?;
        let events = collect_events(&page);
        info!(count = events.len(), "json-ld events parsed");
        Ok(events)
    }
}

/// Pull every JSON-LD Event from the page. Handles plain objects, arrays
/// and Yoast-style `@graph` wrappers.
fn collect_events(page: &str) -> Vec<ExtractedEvent> {
    let mut events = Vec::new();
    for block in html::json_ld_blocks(page) {
        let Ok(data) = serde_json::from_str::<Value>(&block) else {
            continue;
        };
        for node in event_nodes(&data) {
            if let Some(event) = event_from_json_ld(node) {
                events.push(event);
            }
        }
    }
    events
}

fn event_nodes(data: &Value) -> Vec<&Value> {
    match data {
        Value::Object(_) => {
            if is_event(data) {
                vec![data]
            } else if let Some(graph) = data.get("@graph").and_then(Value::as_array) {
                graph.iter().filter(|n| is_event(n)).collect()
            } else {
                Vec::new()
            }
        }
        Value::Array(items) => items.iter().filter(|n| is_event(n)).collect(),
        _ => Vec::new(),
    }
}

fn is_event(node: &Value) -> bool {
    node.get("@type").and_then(Value::as_str) == Some("Event")
}

fn event_from_json_ld(node: &Value) -> Option<ExtractedEvent> {
    let name = text(node.get("name")?)?;
    let date_start = date_part(&text(node.get("startDate")?)?);

    let location = node.get("location");
    let venue_name = location.and_then(|l| l.get("name")).and_then(text)?;
    let address = location.and_then(|l| l.get("address"));
    let geo = location.and_then(|l| l.get("geo"));

    let event = ExtractedEvent {
        name,
        date_start,
        date_end: node.get("endDate").and_then(text).map(|d| date_part(&d)),
        venue_name,
        venue_postcode: address.and_then(|a| a.get("postalCode")).and_then(text),
        latitude: geo.and_then(|g| g.get("latitude")).and_then(Value::as_f64),
        longitude: geo.and_then(|g| g.get("longitude")).and_then(Value::as_f64),
        discipline: None,
        has_pony_classes: false,
        classes: Vec::new(),
        url: node.get("url").and_then(text),
        description: node.get("description").and_then(text),
    };
    event.has_required_fields().then_some(event)
}

fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// "2026-05-03T09:00:00+01:00" -> "2026-05-03".
fn date_part(raw: &str) -> String {
    raw.split('T').next().unwrap_or(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_graph_wrapped_event() {
        let page = r#"<html><head><script type="application/ld+json">
        {"@graph": [
            {"@type": "WebSite", "name": "ignored"},
            {"@type": "Event",
             "name": "One Day Event at Kelsall",
             "startDate": "2026-05-03T09:00:00+01:00",
             "endDate": "2026-05-04",
             "location": {
                "@type": "Place",
                "name": "Kelsall Hill Equestrian Centre",
                "address": {"postalCode": "CW6 0SR"},
                "geo": {"latitude": 53.2131, "longitude": -2.7121}
             },
             "url": "https://www.horse-events.co.uk/event/ode-kelsall/",
             "description": "BE80 and BE90 sections"}
        ]}
        </script></head></html>"#;

        let events = collect_events(page);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.date_start, "2026-05-03");
        assert_eq!(event.date_end.as_deref(), Some("2026-05-04"));
        assert_eq!(event.venue_name, "Kelsall Hill Equestrian Centre");
        assert_eq!(event.venue_postcode.as_deref(), Some("CW6 0SR"));
        assert_eq!(event.latitude, Some(53.2131));
        // raw venue text is carried as-is; canonicalization is the
        // scanner's job
        assert!(event.discipline.is_none());
    }

    #[test]
    fn parses_array_of_events_and_skips_incomplete() {
        let page = r#"<script type="application/ld+json">[
            {"@type": "Event", "name": "Show A", "startDate": "2026-06-01",
             "location": {"name": "Arena UK"}},
            {"@type": "Event", "name": "No location", "startDate": "2026-06-02"}
        ]</script>"#;
        let events = collect_events(page);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Show A");
    }

    #[test]
    fn ignores_malformed_json() {
        let page = r#"<script type="application/ld+json">{not json}</script>"#;
        assert!(collect_events(page).is_empty());
    }
}
