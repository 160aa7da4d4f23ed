//! Parser for the Equipe Online meetings API: a single JSON endpoint
//! listing upcoming meetings with venue and discipline metadata.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::extract::ExtractedEvent;
use crate::parsers::{Parser, ParserContext};

pub struct EquipeOnlineParser;

#[async_trait]
impl Parser for EquipeOnlineParser {
    async fn fetch_and_parse(
        &self,
        source_url: &str,
        ctx: &ParserContext,
    ) -> Result<Vec<ExtractedEvent>> {
        let body = ctx
            .http
            .get_json(source_url)
            .await
            .with_context(|| format!("fetching {source_url}"))?;
        let events = parse_meetings(&body);
        info!(count = events.len(), "equipe meetings parsed");
        Ok(events)
    }
}

/// Walk the meetings payload. Records without a name, start date or venue
/// are dropped at this boundary.
fn parse_meetings(body: &Value) -> Vec<ExtractedEvent> {
    let Some(meetings) = body.as_array() else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for meeting in meetings {
        let name = string_field(meeting, "display_name").or_else(|| string_field(meeting, "name"));
        let date_start =
            string_field(meeting, "starts_on").or_else(|| string_field(meeting, "start_date"));
        let venue_name =
            string_field(meeting, "venue_name").or_else(|| string_field(meeting, "place"));

        let (Some(name), Some(date_start), Some(venue_name)) = (name, date_start, venue_name)
        else {
            continue;
        };

        let classes = meeting
            .get("classes")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|c| string_field(c, "name").or_else(|| c.as_str().map(String::from)))
                    .collect()
            })
            .unwrap_or_default();

        let event = ExtractedEvent {
            name,
            date_start,
            date_end: string_field(meeting, "ends_on"),
            venue_name,
            venue_postcode: string_field(meeting, "venue_postcode"),
            latitude: meeting.get("latitude").and_then(Value::as_f64),
            longitude: meeting.get("longitude").and_then(Value::as_f64),
            discipline: string_field(meeting, "discipline"),
            has_pony_classes: meeting
                .get("pony")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            classes,
            url: string_field(meeting, "url"),
            description: None,
        };
        if event.has_required_fields() {
            events.push(event);
        }
    }
    events
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_meeting_list() {
        let body = json!([
            {
                "display_name": "Spring Tour Week 1",
                "starts_on": "2026-03-14",
                "ends_on": "2026-03-16",
                "venue_name": "Arena UK",
                "venue_postcode": "NG32 2EF",
                "discipline": "show_jumping",
                "pony": true,
                "classes": [{"name": "90cm Open"}, {"name": "1.10m Open"}],
                "url": "https://online.equipe.com/meetings/123"
            },
            {
                "name": "No venue meeting",
                "starts_on": "2026-04-01"
            }
        ]);
        let events = parse_meetings(&body);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.name, "Spring Tour Week 1");
        assert_eq!(event.date_start, "2026-03-14");
        assert_eq!(event.venue_name, "Arena UK");
        assert_eq!(event.discipline.as_deref(), Some("show_jumping"));
        assert!(event.has_pony_classes);
        assert_eq!(event.classes, vec!["90cm Open", "1.10m Open"]);
    }

    #[test]
    fn non_array_payload_is_empty() {
        assert!(parse_meetings(&json!({"error": "nope"})).is_empty());
    }

    #[test]
    fn past_meetings_are_not_filtered() {
        let body = json!([{
            "display_name": "Historic Show",
            "starts_on": "2019-01-05",
            "venue_name": "Somewhere"
        }]);
        // parsers are purely extractive; the scanner owns any date logic
        assert_eq!(parse_meetings(&body).len(), 1);
    }
}
