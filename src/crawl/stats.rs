// src/crawl/stats.rs
// =============================================================================
// Run counters shared by every worker.
//
// Only ever incremented while the crawl runs; read once all workers are done.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct RunStats {
    pages_processed: AtomicUsize,
    errors: AtomicUsize,
}

impl RunStats {
    pub fn record_page(&self) {
        self.pages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_processed(&self) -> usize {
        self.pages_processed.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }
}
