// src/crawl/worker.rs
// =============================================================================
// A single crawl worker.
//
// How it works:
// Each worker loops: take a task from the queue, then
// 1. Gate: re-check the URL, this time resolving its hostname
// 2. Wait the polite delay (unless the run is cancelled meanwhile)
// 3. Fetch the page
// 4. Extract the main content and the links
// 5. Classify the page (only when the LLM index is on)
// 6. Hand the record to the result sink
// 7. Offer the links to the frontier at depth + 1
// 8. Tell the frontier this task is finished
// and goes back for the next one.
//
// Failures:
// Any step can fail for one page. That page is logged and counted and the
// loop moves on ("soft failure"). Only cancellation, or the queue closing,
// ends the loop.
//
// Rust concepts:
// - Clone + Arc: every worker gets its own WorkerContext, but the heavy
//   parts inside (frontier, extractor, stats) are shared through Arc
// - Send futures: tokio::spawn needs the worker's future to be Send, which
//   is why HTML parsing lives in a plain (non-async) function
// - Trait objects: the classifier is an Arc<dyn PageClassifier>
// =============================================================================

use super::fetch::fetch_page;
use super::frontier::{Frontier, PageTask, TaskQueue};
use super::links::discover_links;
use super::stats::RunStats;
use crate::classify::{clean_title, collapse_whitespace, PageClassifier};
use crate::error::{FetchError, PageError};
use crate::extract::{Extractor, Strategy};
use crate::guard::UrlGuard;
use crate::output::{IndexEntry, PageRecord, SinkItem};
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

// Everything a worker shares with the rest of the run
#[derive(Clone)]
pub struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub queue: Arc<TaskQueue>,
    pub client: Client,
    pub guard: UrlGuard,
    pub extractor: Arc<Extractor>,
    // Only set when the LLM index is enabled
    pub classifier: Option<Arc<dyn PageClassifier>>,
    pub results: mpsc::Sender<SinkItem>,
    pub stats: Arc<RunStats>,
    pub cancel: CancellationToken,
    pub request_delay: Duration,
}

// A parsed page, reduced to owned data
#[derive(Debug)]
struct ParsedPage {
    record: PageRecord,
    strategy: Strategy,
    links: Vec<Url>,
}

// Runs until the queue is closed or the run is cancelled
pub async fn run_worker(id: usize, ctx: WorkerContext) {
    debug!(worker = id, "Worker started");

    // next() returns None once the run is cancelled
    while let Some(task) = ctx.queue.next(&ctx.cancel).await {
        process_task(id, &ctx, &task).await;
        // Always last: process_task() has already admitted this page's
        // links, so the frontier can never see "nothing outstanding" while
        // this page still has children on the way
        ctx.frontier.finish_task();
    }

    debug!(worker = id, "Worker stopped");
}

async fn process_task(id: usize, ctx: &WorkerContext, task: &PageTask) {
    let started = Instant::now();
    let url = &task.url;

    if let Err(e) = ctx.guard.check_resolved(url).await {
        ctx.stats.record_error();
        warn!(worker = id, url = %url, error = %e, "Refusing URL");
        return;
    }

    // Polite crawling: small delay before each request
    if !ctx.request_delay.is_zero() {
        tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            _ = tokio::time::sleep(ctx.request_delay) => {}
        }
    }

    let fetched = match fetch_page(&ctx.client, url, &ctx.cancel).await {
        Ok(fetched) => fetched,
        // Not a page failure: the whole run is stopping
        Err(FetchError::Cancelled) => {
            debug!(worker = id, url = %url, "Fetch abandoned, run cancelled");
            return;
        }
        Err(e) => {
            ctx.stats.record_error();
            warn!(worker = id, url = %url, error = %e, "Error fetching page");
            return;
        }
    };

    // Relative links are relative to where the body came from, which after
    // a redirect (/docs -> /docs/) is not the URL we asked for. A redirect
    // to another host leaves the site, so its links are not followed.
    let links_base = if same_origin(&fetched.final_url, url) {
        Some(&fetched.final_url)
    } else {
        debug!(
            worker = id,
            url = %url,
            final_url = %fetched.final_url,
            "Redirected off-site, not following links"
        );
        None
    };
    let links_base = links_base.filter(|_| task.depth < ctx.frontier.max_depth());

    let page = match parse_page(&fetched.body, url, &ctx.extractor, links_base) {
        Ok(page) => page,
        Err(e) => {
            ctx.stats.record_error();
            warn!(worker = id, url = %url, error = %e, "No content extracted");
            return;
        }
    };

    // as_deref(): Option<Arc<dyn PageClassifier>> -> Option<&dyn PageClassifier>
    let entry = ctx
        .classifier
        .as_deref()
        .map(|classifier| index_entry(classifier, &page.record));

    let item = SinkItem {
        record: page.record,
        entry,
    };
    // send() waits when the sink's channel is full: backpressure, not loss
    if ctx.results.send(item).await.is_err() {
        ctx.stats.record_error();
        warn!(worker = id, url = %url, "Result sink closed, page lost");
        return;
    }
    ctx.stats.record_page();

    // Links were already filtered to the same host; this catches the rest
    // (e.g. a same-host link on a literal private IP)
    let mut admitted = 0;
    for link in page.links {
        if let Err(e) = ctx.guard.check(&link) {
            ctx.stats.record_error();
            warn!(worker = id, url = %link, error = %e, "Rejected link");
            continue;
        }
        if ctx.frontier.try_admit(&link, task.depth + 1) {
            admitted += 1;
        }
    }

    info!(
        worker = id,
        url = %url,
        depth = task.depth,
        strategy = ?page.strategy,
        new_links = admitted,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Fetched"
    );
}

// Parses a body into a page record plus the links worth following
//
// This must stay a plain fn: scraper's Html stores its text in non-atomic
// reference-counted tendrils, so it is not Send, and a Send future (which tokio::spawn requires) must never
// hold one across an .await. Everything returned here is owned, Send data.
//
// links_base is the URL relative links are resolved against, or None to
// skip link discovery entirely.
fn parse_page(
    body: &str,
    url: &Url,
    extractor: &Extractor,
    links_base: Option<&Url>,
) -> Result<ParsedPage, PageError> {
    if body.trim().is_empty() {
        return Err(PageError::EmptyDocument);
    }

    let document = Html::parse_document(body);
    let extraction = extractor.extract(&document).ok_or(PageError::NoContent)?;

    let links = links_base
        .map(|base| discover_links(&document, base))
        .unwrap_or_default();

    Ok(ParsedPage {
        record: PageRecord {
            title: page_title(&document).unwrap_or_else(|| url.to_string()),
            content: extraction.text,
            source_url: url.to_string(),
        },
        strategy: extraction.strategy,
        links,
    })
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").expect("static selector");
    let raw = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    // The title becomes a one-line `## ` heading, so no newlines survive
    let title = collapse_whitespace(&raw);
    (!title.is_empty()).then_some(title)
}

// Builds the LLM index entry for a page
fn index_entry(classifier: &dyn PageClassifier, record: &PageRecord) -> IndexEntry {
    let title = clean_title(&record.title);
    IndexEntry {
        page_type: classifier.classify(&record.source_url, &title),
        description: classifier.describe(&record.content),
        url: record.source_url.clone(),
        title,
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does process_task() return () instead of Result?
//    - Every failure is handled right where it happens (log + count)
//    - There is nothing useful the caller could do with an error
//
// 2. What is `let Some(x) = ... else { ... };`?
//    - "let-else": bind x if the pattern matches, otherwise run the else
//      block, which must leave the function (return, continue, ...)
//
// 3. Why `&ctx.extractor` when extractor is an Arc<Extractor>?
//    - &Arc<Extractor> auto-derefs to &Extractor when a function asks for one
//
// 4. What does `%url` mean inside info!()?
//    - Record the field using its Display impl (`?url` would use Debug)
// -----------------------------------------------------------------------------
