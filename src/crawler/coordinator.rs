//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Enumerating traversal keys and recording the run
//! - Listing each key and fanning its entries out to workers
//! - Extracting, persisting and pacing each entry
//! - Handling cancellation
//! - Reporting final statistics

use crate::catalog::{EntryStub, KeySpace, TraversalKey};
use crate::config::Config;
use crate::crawler::detail::DetailExtractor;
use crate::crawler::listing::ListingExtractor;
use crate::crawler::pacing::{pause, RequestGate};
use crate::output::{
    build_run_report, write_markdown_report, CrawlObserver, EntryOutcome, RunStats, RunSummary,
    TracingObserver,
};
use crate::session::SessionFactory;
use crate::state::{CrawlPhase, PhaseTracker};
use crate::storage::{open_storage, PersistenceSink, RunLog, RunRecord, RunStatus, StorageError};
use crate::ReelError;
use futures::{FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Main crawler coordinator structure
pub struct Coordinator {
    key_space: KeySpace,
    key_filter: Option<Vec<String>>,
    listing: ListingExtractor,
    detail: DetailExtractor,
    sink: PersistenceSink,
    sessions: SessionFactory,
    run_log: Option<Arc<Mutex<dyn RunLog>>>,
    config_hash: String,
    observer: Arc<dyn CrawlObserver>,
    stats: Arc<RunStats>,
    cancel: CancellationToken,
    entry_pace: Duration,
    key_pace: Duration,
    workers: usize,
    report_path: Option<PathBuf>,
}

impl Coordinator {
    /// Creates a coordinator over explicit sessions and sink
    ///
    /// No run log is attached; use [`with_run_log`](Self::with_run_log) to record runs.
    pub fn new(
        config: &Config,
        sessions: SessionFactory,
        sink: PersistenceSink,
    ) -> Result<Self, ReelError> {
        let gate = Arc::new(RequestGate::new(config.crawler.min_request_interval()));

        Ok(Self {
            key_space: config.keys.clone(),
            key_filter: None,
            listing: ListingExtractor::new(config, sessions.clone(), gate.clone())?,
            detail: DetailExtractor::new(config, sessions.clone(), gate)?,
            sink,
            sessions,
            run_log: None,
            config_hash: String::new(),
            observer: Arc::new(TracingObserver),
            stats: Arc::new(RunStats::new()),
            cancel: CancellationToken::new(),
            entry_pace: config.crawler.entry_pace(),
            key_pace: config.crawler.key_pace(),
            workers: config.crawler.workers.max(1),
            report_path: None,
        })
    }

    /// Creates a coordinator wired to the stores and backend named in the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `config_hash` - Hash of the configuration file, stored on the run row
    pub fn from_config(config: &Config, config_hash: &str) -> Result<Self, ReelError> {
        let (store, blobs) = open_storage(&config.output)?;
        let sessions = SessionFactory::from_config(config)?;
        let sink = PersistenceSink::new(store.clone(), blobs);

        let coordinator = Self::new(config, sessions, sink)?.with_run_log(store, config_hash);
        Ok(match &config.output.report_path {
            Some(path) => coordinator.with_report_path(path),
            None => coordinator,
        })
    }

    pub fn with_run_log(mut self, run_log: Arc<Mutex<dyn RunLog>>, config_hash: &str) -> Self {
        self.run_log = Some(run_log);
        self.config_hash = config_hash.to_string();
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Restricts the run to the given keys; enumeration order is kept
    pub fn with_key_filter(mut self, keys: Vec<String>) -> Self {
        self.key_filter = Some(keys);
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Shares an externally owned cancellation token with this run
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run after the entries in flight
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> Arc<RunStats> {
        self.stats.clone()
    }

    /// Runs the crawl
    ///
    /// This is the core crawling logic that:
    /// 1. Enumerates the traversal keys
    /// 2. Records the run and checks a session can be opened at all
    /// 3. Lists each key and processes its entries
    /// 4. Finishes the run with its final counters
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run completed or was interrupted; counters are final
    /// * `Err(ReelError::Traversal)` - Keys could not be enumerated
    /// * `Err(ReelError::SessionUnavailable)` - No session could be opened before the first key
    pub async fn run(&self) -> Result<RunSummary, ReelError> {
        let keys = self.resolve_keys()?;
        let run_id = self.start_run()?;
        self.observer.run_started(run_id, &keys);

        let mut phases = PhaseTracker::new();

        if let Err(e) = self.preflight().await {
            tracing::error!("Pre-flight session check failed: {}", e);
            phases.advance(CrawlPhase::Done)?;
            self.finish(run_id, RunStatus::Failed, &keys);
            return Err(e);
        }

        let start_time = std::time::Instant::now();
        let traversed = self.traverse(&keys, &mut phases).await;
        phases.advance(CrawlPhase::Done)?;

        let status = match &traversed {
            Err(_) => RunStatus::Failed,
            Ok(()) if self.cancel.is_cancelled() => RunStatus::Interrupted,
            Ok(()) => RunStatus::Completed,
        };
        tracing::info!(
            "Traversal ended after {:.1}s ({})",
            start_time.elapsed().as_secs_f64(),
            status.to_db_string()
        );

        let summary = self.finish(run_id, status, &keys);
        traversed.map(|()| summary)
    }

    fn resolve_keys(&self) -> Result<Vec<TraversalKey>, ReelError> {
        self.key_space.select(self.key_filter.as_deref())
    }

    fn start_run(&self) -> Result<Option<i64>, ReelError> {
        let Some(run_log) = &self.run_log else {
            return Ok(None);
        };
        let mut log = run_log.lock().map_err(|_| StorageError::LockPoisoned)?;

        let recovered = log.recover_stale_runs()?;
        if recovered > 0 {
            tracing::warn!("Marked {} unfinished run(s) as interrupted", recovered);
        }

        let run_id = log.create_run(&self.config_hash)?;
        tracing::info!("Starting crawl run {} (config {})", run_id, self.config_hash);
        Ok(Some(run_id))
    }

    async fn preflight(&self) -> Result<(), ReelError> {
        let session = self.sessions.acquire().await?;
        self.sessions.release(session).await;
        tracing::debug!("{} backend reachable", self.sessions.backend_name());
        Ok(())
    }

    async fn traverse(
        &self,
        keys: &[TraversalKey],
        phases: &mut PhaseTracker,
    ) -> Result<(), ReelError> {
        for (index, key) in keys.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancelled before key {}", key);
                break;
            }

            phases.advance(CrawlPhase::Listing)?;
            let listing = self.listing.fetch_entries(key).await;
            if listing.failure.is_some() {
                self.stats.listing_failure();
            }
            self.stats.parse_skips(listing.skipped as u64);
            self.observer
                .key_listed(key, listing.stubs.len(), listing.skipped);

            if !listing.stubs.is_empty() {
                phases.advance(CrawlPhase::Detail)?;
                self.process_entries(key, &listing.stubs).await;
            }

            self.stats.key_processed();
            let summary = self.stats.snapshot();
            tracing::info!(
                "Progress: {}/{} keys, {} entries, {} records",
                index + 1,
                keys.len(),
                summary.entries_seen,
                summary.records_persisted
            );

            phases.advance(CrawlPhase::KeyPace)?;
            let is_last = index + 1 == keys.len();
            if !is_last && !pause(self.key_pace, &self.cancel).await {
                tracing::info!("Cancelled during key pace after {}", key);
                break;
            }
        }

        Ok(())
    }

    async fn process_entries(&self, key: &TraversalKey, stubs: &[EntryStub]) {
        futures::stream::iter(stubs)
            .map(|stub| self.run_entry(key, stub))
            .buffer_unordered(self.workers)
            .collect::<Vec<()>>()
            .await;
    }

    /// Runs one entry to completion; failures and panics stay inside the entry
    async fn run_entry(&self, key: &TraversalKey, stub: &EntryStub) {
        if self.cancel.is_cancelled() {
            return;
        }

        let outcome = match AssertUnwindSafe(self.process_entry(stub))
            .catch_unwind()
            .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::error!("Entry {} failed: {}", stub.entry_id, e);
                self.stats.entry_failure();
                EntryOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::error!("Entry {} panicked", stub.entry_id);
                self.stats.entry_failure();
                EntryOutcome::Failed("entry processing panicked".to_string())
            }
        };

        self.observer.entry_finished(key, stub, &outcome);
        pause(self.entry_pace, &self.cancel).await;
    }

    async fn process_entry(&self, stub: &EntryStub) -> Result<EntryOutcome, ReelError> {
        let mut phases = PhaseTracker::starting_at(CrawlPhase::Detail);
        self.stats.entries_seen(1);

        let page = self.detail.fetch_records(&stub.source_url).await;
        self.stats.parse_skips(page.skipped as u64);
        if page.failure.is_some() {
            self.stats.detail_failure();
        }

        if page.records.is_empty() {
            self.stats.entry_with_zero_records();
            phases.advance(CrawlPhase::Pace)?;
            return Ok(match page.failure {
                Some(reason) => EntryOutcome::Failed(reason),
                None => EntryOutcome::NoRecords,
            });
        }

        phases.advance(CrawlPhase::Persist)?;
        let result = self.sink.persist(stub, &page.records);

        self.stats.records_persisted(result.records_written);
        self.stats.record_errors(result.record_errors);
        if result.blob_written {
            self.stats.blob_written();
        } else {
            self.stats.blob_error();
        }
        if result.records_written > 0 {
            self.stats.entry_persisted();
        }

        phases.advance(CrawlPhase::Pace)?;
        Ok(EntryOutcome::Persisted(result))
    }

    /// Records the final status, notifies the observer and writes the report
    fn finish(&self, run_id: Option<i64>, status: RunStatus, keys: &[TraversalKey]) -> RunSummary {
        let summary = self.stats.snapshot();

        let run = run_id.and_then(|id| match self.record_finish(id, status, &summary) {
            Ok(run) => Some(run),
            Err(e) => {
                tracing::error!("Failed to record end of run {}: {}", id, e);
                None
            }
        });

        self.observer.run_finished(status, &summary);

        if let Some(path) = &self.report_path {
            let keys: Vec<String> = keys.iter().map(|k| k.as_str().to_string()).collect();
            let report = build_run_report(run.as_ref(), summary, &keys);
            match write_markdown_report(&report, path) {
                Ok(()) => tracing::info!("Report written to {}", path.display()),
                Err(e) => tracing::warn!("Failed to write report {}: {}", path.display(), e),
            }
        }

        summary
    }

    fn record_finish(
        &self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> Result<RunRecord, ReelError> {
        let Some(run_log) = &self.run_log else {
            return Err(StorageError::RunNotFound(run_id).into());
        };
        let stats_json = serde_json::to_string(summary)?;
        let mut log = run_log.lock().map_err(|_| StorageError::LockPoisoned)?;
        log.finish_run(run_id, status, &stats_json)?;
        Ok(log.get_run(run_id)?)
    }
}
