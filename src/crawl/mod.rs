// src/crawl/mod.rs
// =============================================================================
// This module runs the concurrent documentation crawl.
//
// Features:
// - N workers pulling from one bounded queue
// - Every URL fetched at most once per run
// - Same-host restriction and a depth limit
// - Polite crawling with a delay before each request
// - A run deadline that stops everything cleanly
//
// Submodules:
// - coordinator: starts the workers, waits, shuts down, reports
// - frontier: visited set + bounded task queue + drain detection
// - worker: the per-page pipeline
// - fetch: the HTTP client and page download
// - links: link discovery inside a fetched page
// - stats: run counters
// =============================================================================

mod coordinator;
mod fetch;
mod frontier;
mod links;
mod stats;
mod worker;

pub use coordinator::{Crawler, RunReport};
