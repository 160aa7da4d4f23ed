//! Generic fallback parser: fetches the page, distills the text, and asks
//! an LLM extraction backend for structured events. Used for every source
//! key without a dedicated parser.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::extract::ExtractedEvent;
use crate::parsers::{fetch, html, Parser, ParserContext};

/// Cap on distilled page text sent to the extraction backend.
const MAX_TEXT_LENGTH: usize = 6000;

const EXTRACTION_PROMPT: &str = "Extract all equestrian competitions from this webpage text.
The current year is {year}. Use this when dates don't include a year.
For each competition return a JSON object with these fields:
- name: competition/show name (string, required)
- date_start: start date as YYYY-MM-DD (string, required)
- date_end: end date as YYYY-MM-DD or null
- venue_name: venue name (string, required)
- venue_postcode: UK postcode if visible, or null
- discipline: discipline text as written, or null
- has_pony_classes: true if pony or junior classes exist
- classes: array of class names/descriptions
- url: link to competition details or null

Return ONLY a JSON array. No explanation.

Webpage text:
{text}";

pub struct GenericParser;

#[async_trait]
impl Parser for GenericParser {
    async fn fetch_and_parse(
        &self,
        source_url: &str,
        ctx: &ParserContext,
    ) -> Result<Vec<ExtractedEvent>> {
        let page = fetch::fetch_page(&ctx.http, source_url).await?;
        let distilled = html::distill_text(&page);
        let truncated: String = distilled.chars().take(MAX_TEXT_LENGTH).collect();

        let prompt = EXTRACTION_PROMPT
            .replace("{year}", &Utc::now().year().to_string())
            .replace("{text}", &truncated);

        let url = format!("{}/api/generate", ctx.extractor_url.trim_end_matches('/'));
        let payload = json!({
            "model": ctx.extractor_model,
            "prompt": prompt,
            "stream": false,
            "options": {"temperature": 0.1, "num_ctx": 4096, "num_predict": 2048},
        });

        info!(
            url = source_url,
            chars = truncated.len(),
            model = %ctx.extractor_model,
            "sending distilled text to extraction backend"
        );
        let body = ctx
            .http
            .post_json(&url, &payload)
            .await
            .context("extraction backend request failed")?;

        let raw_text = body
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(parse_response(raw_text))
    }
}

/// Parse the LLM response into validated events, discarding records that
/// miss required fields.
fn parse_response(text: &str) -> Vec<ExtractedEvent> {
    let Some(json_str) = repair_json_array(text) else {
        let head: String = text.chars().take(500).collect();
        warn!(head = %head, "no valid JSON array in extraction response");
        return Vec::new();
    };

    let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(&json_str) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    for item in items {
        match serde_json::from_value::<ExtractedEvent>(item.clone()) {
            Ok(event) if event.has_required_fields() => events.push(event),
            Ok(_) => warn!(record = %item, "extracted record missing required fields"),
            Err(err) => warn!(error = %err, "skipping malformed extracted record"),
        }
    }
    info!(count = events.len(), "events extracted from LLM response");
    events
}

/// Extract a valid JSON array from model output, repairing truncation by
/// closing the array after the last complete object.
fn repair_json_array(text: &str) -> Option<String> {
    let start = text.find('[')?;

    if let Some(end) = text.rfind(']') {
        if end > start {
            let candidate = &text[start..=end];
            if serde_json::from_str::<serde_json::Value>(candidate).is_ok() {
                return Some(candidate.to_string());
            }
        }
    }

    // Truncated output: close after the last complete object, walking
    // backwards until the result parses.
    let fragment = &text[start..];
    let mut cut = fragment.rfind('}')?;
    loop {
        let candidate = format!("{}]", &fragment[..=cut]);
        if serde_json::from_str::<serde_json::Value>(&candidate).is_ok() {
            info!(cut, "repaired truncated JSON array");
            return Some(candidate);
        }
        cut = fragment[..cut].rfind('}')?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_array() {
        let text = r#"Here you go: [{"name": "Show", "date_start": "2026-05-01", "venue_name": "Arena UK"}] done"#;
        let events = parse_response(text);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Show");
    }

    #[test]
    fn repairs_truncated_array() {
        let text = r#"[{"name": "A", "date_start": "2026-05-01", "venue_name": "X"}, {"name": "B", "date_start": "2026-06-01", "venue_name": "Y"}, {"name": "C", "date_st"#;
        let events = parse_response(text);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].name, "B");
    }

    #[test]
    fn discards_records_missing_required_fields() {
        let text = r#"[{"name": "A", "date_start": "2026-05-01", "venue_name": "X"},
                       {"name": "No venue", "date_start": "2026-05-02"},
                       {"date_start": "2026-05-03", "venue_name": "Z"}]"#;
        let events = parse_response(text);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn no_array_yields_empty() {
        assert!(parse_response("I could not find any events.").is_empty());
        assert!(repair_json_array("{}").is_none());
    }
}
