//! Daily tick and on-demand scan triggers.
//!
//! One scan per source may be running at a time; a second request for the
//! same source is suppressed with a log line and retried on the next tick.
//! The worker pool is bounded by `SCAN_CONCURRENCY` (default 1, i.e.
//! sources scan sequentially).

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveTime, TimeZone};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::scanner::{Scanner, ScanTrigger};
use crate::store::{self, Db};

/// Outcome of asking for a scan of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started { source_id: i64, scan_id: i64 },
    AlreadyRunning { source_id: i64 },
}

pub struct Scheduler {
    db: Db,
    scanner: Arc<Scanner>,
    schedule: (u32, u32),
    concurrency: usize,
    in_flight: Mutex<HashSet<i64>>,
}

struct ScanRequest {
    source_id: i64,
    scan_id: i64,
}

impl Scheduler {
    pub fn new(db: Db, scanner: Arc<Scanner>, schedule: (u32, u32), concurrency: usize) -> Self {
        Self {
            db,
            scanner,
            schedule,
            concurrency: concurrency.max(1),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn try_begin(&self, source_id: i64) -> bool {
        self.in_flight
            .lock()
            .expect("in_flight lock poisoned")
            .insert(source_id)
    }

    fn finish(&self, source_id: i64) {
        self.in_flight
            .lock()
            .expect("in_flight lock poisoned")
            .remove(&source_id);
    }

    /// Create scan rows for every source not already in flight. The guard
    /// for a reserved source is released by `drive`.
    async fn reserve(
        &self,
        source_ids: &[i64],
    ) -> Result<(Vec<ScanRequest>, Vec<TriggerOutcome>)> {
        let mut requests = Vec::new();
        let mut outcomes = Vec::new();
        for &source_id in source_ids {
            if !self.try_begin(source_id) {
                warn!(source_id, "scan already in flight; request suppressed");
                outcomes.push(TriggerOutcome::AlreadyRunning { source_id });
                continue;
            }
            match store::scans::create_scan(&self.db, source_id).await {
                Ok(scan_id) => {
                    outcomes.push(TriggerOutcome::Started { source_id, scan_id });
                    requests.push(ScanRequest { source_id, scan_id });
                }
                Err(err) => {
                    self.finish(source_id);
                    return Err(err);
                }
            }
        }
        Ok((requests, outcomes))
    }

    /// Run reserved scans with the configured concurrency bound, releasing
    /// each source's guard as its scan finishes.
    async fn drive(self: Arc<Self>, requests: Vec<ScanRequest>, trigger: ScanTrigger) {
        let mut tasks: JoinSet<()> = JoinSet::new();
        for request in requests {
            while tasks.len() >= self.concurrency {
                let _ = tasks.join_next().await;
            }
            let sched = Arc::clone(&self);
            tasks.spawn(async move {
                if let Err(err) = sched
                    .scanner
                    .run_scan(request.source_id, request.scan_id, trigger)
                    .await
                {
                    error!(
                        source_id = request.source_id,
                        error = %format!("{err:#}"),
                        "scan task failed"
                    );
                }
                sched.finish(request.source_id);
            });
        }
        while tasks.join_next().await.is_some() {}
    }

    /// On-demand trigger: a specific source, or all enabled sources when
    /// `source_id` is None. Returns immediately; scans run in the
    /// background.
    pub async fn trigger(
        self: &Arc<Self>,
        source_id: Option<i64>,
        trigger: ScanTrigger,
    ) -> Result<Vec<TriggerOutcome>> {
        let source_ids = match source_id {
            Some(id) => vec![id],
            None => store::sources::enabled_sources(&self.db)
                .await?
                .into_iter()
                .map(|s| s.id)
                .collect(),
        };
        let (requests, outcomes) = self.reserve(&source_ids).await?;
        if !requests.is_empty() {
            let sched = Arc::clone(self);
            tokio::spawn(sched.drive(requests, trigger));
        }
        Ok(outcomes)
    }

    /// One scheduled sweep over all enabled sources; awaits completion.
    pub async fn run_scheduled(self: &Arc<Self>) -> Result<()> {
        let source_ids: Vec<i64> = store::sources::enabled_sources(&self.db)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        info!(sources = source_ids.len(), "scheduled scan sweep starting");
        let (requests, _) = self.reserve(&source_ids).await?;
        Arc::clone(self).drive(requests, ScanTrigger::Scheduled).await;
        info!("scheduled scan sweep finished");
        Ok(())
    }

    /// Run the daily tick loop until shutdown is signalled. On shutdown,
    /// in-flight scans get a short grace period before the loop exits.
    pub async fn run_daily_loop(self: Arc<Self>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let (hour, minute) = self.schedule;
        info!(hour, minute, "daily scan schedule active");
        loop {
            let wait = until_next_tick(hour, minute);
            info!(seconds = wait.as_secs(), "next scheduled sweep");
            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(err) = self.run_scheduled().await {
                        error!(error = %format!("{err:#}"), "scheduled sweep failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("shutdown requested; waiting for running scans");
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    return;
                }
            }
        }
    }
}

/// Duration until the next local `HH:MM`, always in the future.
fn until_next_tick(hour: u32, minute: u32) -> Duration {
    let now = Local::now();
    let tick = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    let mut candidate = now.date_naive().and_time(tick);
    if Local
        .from_local_datetime(&candidate)
        .earliest()
        .is_none_or(|dt| dt <= now)
    {
        candidate += chrono::Duration::days(1);
    }
    match Local.from_local_datetime(&candidate).earliest() {
        Some(next) => (next - now).to_std().unwrap_or(Duration::from_secs(60)),
        // unrepresentable local time (DST gap): try again in an hour
        None => Duration::from_secs(3600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_tick_is_always_in_the_future_and_within_a_day() {
        for (h, m) in [(0, 0), (6, 0), (12, 30), (23, 59)] {
            let wait = until_next_tick(h, m);
            assert!(wait > Duration::ZERO);
            assert!(wait <= Duration::from_secs(24 * 3600 + 3600));
        }
    }
}
