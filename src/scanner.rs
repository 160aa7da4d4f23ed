//! Scan orchestrator: drives one source scan end to end.
//!
//! State machine per scan: pending → running → (completed | failed).
//! `failed` is reserved for orchestrator-level faults (parser crash,
//! database unavailable, timeout); a parser that yields zero events is a
//! completed scan with a warning.
//!
//! The per-event loop is strictly sequential within a scan, and every
//! upsert commits on its own, so a mid-scan failure loses at most one
//! event.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{error, info, instrument, warn};

use crate::classifier;
use crate::extract::ExtractedEvent;
use crate::geocoder::Geocoder;
use crate::matcher::VenueMatcher;
use crate::model::Source;
use crate::normalization::{
    detect_pony_classes, normalise_postcode, normalise_venue_name, parse_iso_date, sanitise_url,
};
use crate::parsers::{self, ParserContext};
use crate::store::{self, competitions::CompetitionUpsert, scans::ScanCounts, Db};
use crate::{audit, seeds};

/// Who asked for the scan. Scheduled runs get the post-scan discipline
/// audit; manual runs skip it to keep turnarounds fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTrigger {
    Scheduled,
    Manual,
}

/// A completed scan found fewer than this fraction of the previous scan's
/// events: probably a parser issue, worth a warning.
const SHRINK_WARN_RATIO: f64 = 0.5;

pub struct Scanner {
    db: Db,
    matcher: Arc<VenueMatcher>,
    geocoder: Arc<Geocoder>,
    parser_ctx: ParserContext,
    scan_timeout: Duration,
}

impl Scanner {
    pub fn new(
        db: Db,
        matcher: Arc<VenueMatcher>,
        geocoder: Arc<Geocoder>,
        parser_ctx: ParserContext,
        scan_timeout: Duration,
    ) -> Self {
        Self {
            db,
            matcher,
            geocoder,
            parser_ctx,
            scan_timeout,
        }
    }

    /// Run one scan for `source_id` against an already-created scan row.
    #[instrument(skip(self))]
    pub async fn run_scan(&self, source_id: i64, scan_id: i64, trigger: ScanTrigger) -> Result<()> {
        store::scans::mark_running(&self.db, scan_id).await?;
        let mut counts = ScanCounts::default();

        let Some(source) = store::sources::get_enabled_source(&self.db, source_id).await? else {
            let message = format!("source {source_id} not found or not enabled");
            warn!(scan_id, "{message}");
            store::scans::fail_scan(&self.db, scan_id, &message, &counts).await?;
            return Ok(());
        };

        info!(
            source = %source.key,
            url = %source.url,
            ?trigger,
            "scanning source"
        );
        self.matcher.rebuild().await?;

        let outcome = tokio::time::timeout(
            self.scan_timeout,
            self.scan_source(&source, &mut counts),
        )
        .await;

        match outcome {
            Err(_elapsed) => {
                // events already upserted stay; only the scan is failed
                warn!(source = %source.key, timeout_secs = self.scan_timeout.as_secs(), "scan timed out");
                store::scans::fail_scan(&self.db, scan_id, "timeout", &counts).await?;
            }
            Ok(Err(err)) => {
                error!(source = %source.key, error = %format!("{err:#}"), "scan failed");
                store::scans::fail_scan(&self.db, scan_id, &format!("{err:#}"), &counts).await?;
            }
            Ok(Ok(())) => {
                store::scans::complete_scan(&self.db, scan_id, &counts).await?;
                store::sources::mark_scanned(&self.db, source_id).await?;
                info!(
                    source = %source.key,
                    found = counts.events_found,
                    upserted = counts.events_upserted,
                    skipped = counts.skipped,
                    "scan completed"
                );
                if let Err(err) = self.check_shrink_threshold(&source, scan_id, &counts).await {
                    warn!(error = %err, "scan threshold check failed");
                }
                if let Err(err) = audit::backfill_venue_distances(&self.db, &self.geocoder).await {
                    warn!(error = %err, "venue distance backfill failed");
                }
                if trigger == ScanTrigger::Scheduled {
                    if let Err(err) = audit::audit_disciplines(&self.db).await {
                        warn!(error = %err, "discipline audit failed");
                    }
                }
            }
        }
        Ok(())
    }

    /// Fetch, extract and upsert every event for one source. Errors here
    /// fail the whole scan.
    async fn scan_source(&self, source: &Source, counts: &mut ScanCounts) -> Result<()> {
        let parser = parsers::get(&source.key);
        let extracted = parser
            .fetch_and_parse(&source.url, &self.parser_ctx)
            .await
            .with_context(|| format!("parser for '{}' failed", source.key))?;

        counts.events_found = extracted.len() as i32;
        if extracted.is_empty() {
            warn!(source = %source.key, "parser returned zero events");
            return Ok(());
        }

        for event in &extracted {
            let prepared = match prepare_event(event) {
                Ok(prepared) => prepared,
                Err(reason) => {
                    counts.skipped += 1;
                    warn!(
                        source = %source.key,
                        event = %event.name,
                        %reason,
                        "skipping event"
                    );
                    continue;
                }
            };
            self.ingest_event(source, event, prepared, counts).await?;
        }
        Ok(())
    }

    /// Venue resolution, geocoding and the dedup-key upsert for one
    /// normalized event. Database errors bubble up and fail the scan.
    async fn ingest_event(
        &self,
        source: &Source,
        raw: &ExtractedEvent,
        prepared: PreparedEvent,
        counts: &mut ScanCounts,
    ) -> Result<()> {
        let venue = self
            .matcher
            .resolve(&prepared.venue_name, prepared.venue_postcode.as_deref())
            .await?;

        if let Some(pc) = prepared.venue_postcode.as_deref() {
            store::venues::set_postcode_if_missing(&self.db, venue.venue_id, pc).await?;
        }

        let parser_coords = match (raw.latitude, raw.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        };
        self.geocoder
            .resolve_venue(&self.db, venue.venue_id, parser_coords)
            .await?;

        let row = CompetitionUpsert {
            source_id: source.id,
            name: prepared.name,
            date_start: prepared.date_start,
            date_end: prepared.date_end,
            venue_id: venue.venue_id,
            is_competition: prepared.is_competition,
            discipline: prepared.discipline.map(String::from),
            has_pony_classes: prepared.has_pony_classes,
            url: prepared.url,
            classes: raw.classes.clone(),
            description: raw.description.clone(),
            raw_extract: serde_json::to_value(raw).ok(),
        };
        store::competitions::upsert_competition(&self.db, &row)
            .await
            .context("competition upsert failed")?;

        counts.events_upserted += 1;
        if prepared.is_competition {
            counts.competition_count += 1;
        } else {
            counts.training_count += 1;
        }
        Ok(())
    }

    /// Warn when a completed scan found significantly fewer events than
    /// the previous completed scan of the same source.
    async fn check_shrink_threshold(
        &self,
        source: &Source,
        scan_id: i64,
        counts: &ScanCounts,
    ) -> Result<()> {
        let Some(prev) =
            store::scans::previous_completed_scan(&self.db, source.id, scan_id).await?
        else {
            return Ok(());
        };
        if prev.events_found == 0 {
            return Ok(());
        }
        if (counts.events_found as f64) < (prev.events_found as f64) * SHRINK_WARN_RATIO {
            warn!(
                source = %source.key,
                current = counts.events_found,
                previous = prev.events_found,
                "event count dropped sharply since last scan; possible parser issue"
            );
        }
        Ok(())
    }
}

/// Everything decidable without touching the database: date parsing,
/// normalization and classification.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedEvent {
    pub name: String,
    pub date_start: NaiveDate,
    pub date_end: Option<NaiveDate>,
    pub venue_name: String,
    pub venue_postcode: Option<String>,
    pub discipline: Option<&'static str>,
    pub is_competition: bool,
    pub has_pony_classes: bool,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidDateStart,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidDateStart => write!(f, "invalid date_start"),
        }
    }
}

/// Normalize and classify one extracted event. Pure; the only rejection is
/// an unparseable start date. An invalid `date_end` is dropped, not fatal.
pub fn prepare_event(event: &ExtractedEvent) -> Result<PreparedEvent, SkipReason> {
    let date_start = parse_iso_date(&event.date_start).ok_or(SkipReason::InvalidDateStart)?;
    let date_end = event.date_end.as_deref().and_then(parse_iso_date);

    let venue_name = normalise_venue_name(&event.venue_name);
    let venue_postcode = event
        .venue_postcode
        .as_deref()
        .and_then(|pc| normalise_postcode(pc));

    let classification = classifier::classify(
        &event.name,
        event.discipline.as_deref(),
        event.description.as_deref(),
    );

    let pony_text = format!(
        "{} {} {}",
        event.name,
        event.classes.join(" "),
        event.description.as_deref().unwrap_or("")
    );
    let has_pony_classes = event.has_pony_classes || detect_pony_classes(&pony_text);

    Ok(PreparedEvent {
        name: event.name.trim().to_string(),
        date_start,
        date_end,
        venue_name,
        venue_postcode,
        discipline: classification.discipline,
        is_competition: classification.is_competition,
        has_pony_classes,
        url: sanitise_url(event.url.as_deref()),
    })
}

/// One-time idempotent startup seeding: sources, venues, aliases.
pub async fn seed_all(db: &Db) -> Result<()> {
    store::sources::seed_sources(db).await?;
    store::venues::seed_venues(db).await?;
    store::venues::seed_aliases(db).await?;
    for key in parsers::registered_keys() {
        if !seeds::SOURCE_DEFINITIONS.iter().any(|d| d.key == key) {
            warn!(key, "registered parser has no source definition");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::discipline::{SHOW_JUMPING, TRAINING};

    fn base_event() -> ExtractedEvent {
        ExtractedEvent {
            name: "Spring Show".into(),
            date_start: "2026-04-03".into(),
            venue_name: "Arena UK".into(),
            ..Default::default()
        }
    }

    #[test]
    fn training_keyword_overrides_hint_end_to_end() {
        let event = ExtractedEvent {
            name: "Maddy Moffet Jump Polework Training Clinic".into(),
            date_start: "2026-02-25".into(),
            venue_name: "Abbey Farm".into(),
            discipline: Some("Show Jumping".into()),
            ..Default::default()
        };
        let prepared = prepare_event(&event).unwrap();
        assert_eq!(prepared.discipline, Some(TRAINING));
        assert!(!prepared.is_competition);
    }

    #[test]
    fn discipline_hint_is_trusted() {
        let event = ExtractedEvent {
            discipline: Some("showjump".into()),
            ..base_event()
        };
        let prepared = prepare_event(&event).unwrap();
        assert_eq!(prepared.discipline, Some(SHOW_JUMPING));
        assert!(prepared.is_competition);
    }

    #[test]
    fn postcode_is_canonicalized() {
        let event = ExtractedEvent {
            venue_postcode: Some("cv129ja".into()),
            ..base_event()
        };
        let prepared = prepare_event(&event).unwrap();
        assert_eq!(prepared.venue_postcode.as_deref(), Some("CV12 9JA"));
    }

    #[test]
    fn junk_venue_becomes_tbc_and_event_is_kept() {
        let event = ExtractedEvent {
            venue_name: "http://example.com/event/123".into(),
            ..base_event()
        };
        let prepared = prepare_event(&event).unwrap();
        assert_eq!(prepared.venue_name, "Tbc");
    }

    #[test]
    fn unparseable_start_date_is_skipped() {
        let event = ExtractedEvent {
            date_start: "sometime in spring".into(),
            ..base_event()
        };
        assert_eq!(prepare_event(&event), Err(SkipReason::InvalidDateStart));
    }

    #[test]
    fn invalid_date_end_is_dropped_not_fatal() {
        let event = ExtractedEvent {
            date_end: Some("TBC".into()),
            ..base_event()
        };
        let prepared = prepare_event(&event).unwrap();
        assert!(prepared.date_end.is_none());
    }

    #[test]
    fn past_events_are_ingested() {
        let event = ExtractedEvent {
            date_start: "2023-06-10".into(),
            ..base_event()
        };
        let prepared = prepare_event(&event).unwrap();
        assert_eq!(
            prepared.date_start,
            NaiveDate::from_ymd_opt(2023, 6, 10).unwrap()
        );
    }

    #[test]
    fn non_http_url_is_dropped_event_kept() {
        let event = ExtractedEvent {
            url: Some("javascript:void(0)".into()),
            ..base_event()
        };
        let prepared = prepare_event(&event).unwrap();
        assert!(prepared.url.is_none());
        assert_eq!(prepared.name, "Spring Show");
    }

    #[test]
    fn pony_classes_detected_from_class_list() {
        let event = ExtractedEvent {
            classes: vec!["70cm Open".into(), "128cm Ponies".into()],
            ..base_event()
        };
        assert!(prepare_event(&event).unwrap().has_pony_classes);
    }
}
