// src/crawl/coordinator.rs
// =============================================================================
// The run coordinator: owns one crawl from start to finish.
//
// How a run goes:
// 1. Create the output document and start the result sink
// 2. Start N workers sharing the frontier, the HTTP client and the sink
// 3. Seed the frontier with the base URL (if the gatekeeper allows it)
// 4. Wait until the frontier drains, or the run deadline passes
// 5. Cancel: workers stop taking tasks and abandon in-flight fetches
// 6. Join the workers, let the sink finish, write the LLM index
//
// The output document is always written, even if no page made it.
//
// Rust concepts:
// - tokio::spawn + JoinHandle: each worker and the sink run as their own task
// - CancellationToken: one "stop now" signal every worker can listen to
// - tokio::time::timeout: put a deadline on any future
// - Drop as a signal: when the last results Sender is dropped, the sink's
//   recv() returns None and the sink finishes
// =============================================================================

use super::fetch::build_client;
use super::frontier::Frontier;
use super::stats::RunStats;
use super::worker::{run_worker, WorkerContext};
use crate::classify::{PageClassifier, RuleClassifier};
use crate::config::CrawlSettings;
use crate::extract::Extractor;
use crate::guard::UrlGuard;
use crate::output::{create_document, run_sink, write_index};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

// Everything worth reporting about a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pages_processed: usize,
    pub errors: usize,
    pub admitted: usize,
    pub queued: usize,
    pub dropped: usize,
    pub records_written: usize,
    pub index_entries: usize,
    pub elapsed_secs: f64,
    pub pages_per_second: f64,
    pub deadline_hit: bool,
    pub output_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,
}

pub struct Crawler {
    settings: CrawlSettings,
    guard: UrlGuard,
    classifier: Arc<dyn PageClassifier>,
}

impl Crawler {
    pub fn new(settings: CrawlSettings) -> Self {
        Self {
            settings,
            guard: UrlGuard::strict(),
            classifier: Arc::new(RuleClassifier),
        }
    }

    #[cfg(test)]
    pub fn with_guard(mut self, guard: UrlGuard) -> Self {
        self.guard = guard;
        self
    }

    #[cfg(test)]
    pub fn with_classifier(mut self, classifier: Arc<dyn PageClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    // Runs the whole crawl and reports what happened
    //
    // Only local I/O problems (output file, HTTP client setup) make this
    // return an error. Page-level failures end up in the report.
    pub async fn run(self) -> Result<RunReport> {
        let started = Instant::now();
        let settings = &self.settings;

        info!(
            url = %settings.base_url,
            workers = settings.workers,
            max_depth = settings.max_depth,
            "Starting documentation fetch"
        );

        // Fail before any network activity if the output can't be created
        let document = create_document(&settings.output_path).await?;
        let (results_tx, results_rx) = mpsc::channel(settings.result_capacity.max(1));
        let sink = tokio::spawn(run_sink(document, results_rx, settings.flush_every));

        let client = build_client(settings, self.guard).context("failed to build HTTP client")?;
        let (frontier, queue) = Frontier::new(settings.max_depth, settings.queue_capacity);
        let frontier = Arc::new(frontier);
        let stats = Arc::new(RunStats::default());
        let cancel = CancellationToken::new();

        // One context, cloned per worker; the clones share everything heavy
        let ctx = WorkerContext {
            frontier: Arc::clone(&frontier),
            queue: Arc::new(queue),
            client,
            guard: self.guard,
            extractor: Arc::new(Extractor::new(settings.extraction)),
            // bool::then: Some(classifier) only when an index will be written
            classifier: settings
                .index_path
                .is_some()
                .then(|| Arc::clone(&self.classifier)),
            results: results_tx,
            stats: Arc::clone(&stats),
            cancel: cancel.clone(),
            request_delay: settings.request_delay,
        };

        let workers: Vec<_> = (0..settings.workers)
            .map(|id| tokio::spawn(run_worker(id, ctx.clone())))
            .collect();
        // The sink finishes once the last sender is gone, so ours goes now
        drop(ctx);

        // Workers are already waiting, so the seed gets picked up right away
        match self.guard.check(&settings.base_url) {
            Ok(()) => {
                frontier.try_admit(&settings.base_url, 0);
            }
            Err(e) => {
                stats.record_error();
                warn!(url = %settings.base_url, error = %e, "Refusing base URL");
            }
        }

        // timeout() gives Err(Elapsed) if the deadline fires first
        let deadline_hit = tokio::time::timeout(settings.run_timeout, frontier.wait_drained())
            .await
            .is_err();
        if deadline_hit {
            warn!(
                timeout_secs = settings.run_timeout.as_secs(),
                "Run deadline elapsed, stopping workers"
            );
        }
        // Drained or not, the run is over: idle workers leave queue.next(),
        // busy ones abandon their fetch
        cancel.cancel();

        // A JoinError here means a worker panicked
        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                stats.record_error();
                error!(error = %e, "Worker task failed");
            }
        }

        // Two `?`: the first for the task itself (JoinError), the second for
        // the sink's own I/O result
        let summary = sink.await.context("result sink task failed")??;

        let index_path = match &settings.index_path {
            Some(path) => {
                write_index(path, &summary.entries).await?;
                info!(
                    path = %path.display(),
                    entries = summary.entries.len(),
                    "LLM.txt generated"
                );
                Some(path.clone())
            }
            None => None,
        };

        let elapsed = started.elapsed().as_secs_f64();
        let frontier_stats = frontier.stats();
        let pages = stats.pages_processed();
        let report = RunReport {
            pages_processed: pages,
            errors: stats.errors(),
            admitted: frontier_stats.admitted,
            queued: frontier_stats.queued,
            dropped: frontier_stats.dropped,
            records_written: summary.records_written,
            index_entries: summary.entries.len(),
            elapsed_secs: elapsed,
            pages_per_second: if elapsed > 0.0 { pages as f64 / elapsed } else { 0.0 },
            deadline_hit,
            output_path: settings.output_path.clone(),
            index_path,
        };

        info!(
            pages = report.pages_processed,
            errors = report.errors,
            admitted = report.admitted,
            dropped = report.dropped,
            elapsed_secs = report.elapsed_secs,
            pages_per_second = report.pages_per_second,
            "Fetch completed"
        );

        Ok(report)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does run() take `self` instead of `&self`?
//    - A Crawler runs exactly once; taking ownership makes that explicit
//
// 2. Why drop(ctx) right after spawning the workers?
//    - ctx holds a results Sender. While any Sender is alive the sink keeps
//      waiting, so the coordinator's own copy must go
//
// 3. Why join_all instead of awaiting the handles one by one?
//    - Same result here, but it reads as "wait for all of them"
// -----------------------------------------------------------------------------
