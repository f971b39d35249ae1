// src/output/sink.rs
// =============================================================================
// The result sink: the single task that owns the output document.
//
// Workers send finished pages over a bounded channel. The sink writes them in
// the order they arrive (not the order they were discovered), flushing every
// few records so a long crawl doesn't pile up in memory, and keeps the index
// entries that came with them for the LLM index.
//
// Because only this task ever writes, the document needs no lock, and the
// index ends up in exactly the same order as the document.
//
// Rust concepts:
// - Generics with trait bounds: run_sink() writes to any AsyncWrite, a File
//   in production and a Vec<u8> in tests
// - BufWriter: collects small writes into one big write
// =============================================================================

use super::index::IndexEntry;
use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::debug;

pub const DOCUMENT_HEADER: &str =
    "# Documentation\n\nThis file contains documentation fetched by DocFetch.\n\n---\n\n";

const WRITE_BUFFER: usize = 32 * 1024;

// One extracted page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub title: String,
    pub content: String,
    pub source_url: String,
}

impl PageRecord {
    // The section this page becomes in the output document
    pub fn to_section(&self) -> String {
        format!("## {}\n\n{}\n\n---\n\n", self.title, self.content)
    }
}

// What a worker hands the sink: the page, plus its index entry if indexing
pub struct SinkItem {
    pub record: PageRecord,
    pub entry: Option<IndexEntry>,
}

// What the sink hands back once the channel closes
#[derive(Debug, Default)]
pub struct SinkSummary {
    pub records_written: usize,
    pub entries: Vec<IndexEntry>,
}

// Creates (or truncates) the output document
pub async fn create_document(path: &std::path::Path) -> Result<File> {
    File::create(path)
        .await
        .with_context(|| format!("failed to create output file {}", path.display()))
}

// Drains the channel into the output document until every sender is gone
pub async fn run_sink<W>(
    out: W,
    mut results: mpsc::Receiver<SinkItem>,
    flush_every: usize,
) -> Result<SinkSummary>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER, out);
    writer
        .write_all(DOCUMENT_HEADER.as_bytes())
        .await
        .context("failed to write document header")?;

    let mut summary = SinkSummary::default();
    // recv() returns None once every Sender has been dropped
    while let Some(item) = results.recv().await {
        writer
            .write_all(item.record.to_section().as_bytes())
            .await
            .with_context(|| format!("failed to write section for {}", item.record.source_url))?;
        summary.records_written += 1;

        if let Some(entry) = item.entry {
            summary.entries.push(entry);
        }

        if flush_every > 0 && summary.records_written % flush_every == 0 {
            writer.flush().await.context("failed to flush output")?;
            debug!(records = summary.records_written, "Flushed output document");
        }
    }

    // BufWriter does not flush on drop in async code, so this one matters
    writer.flush().await.context("failed to flush output")?;
    Ok(summary)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why `W: AsyncWrite + Unpin`?
//    - AsyncWrite: anything we can write bytes to asynchronously
//    - Unpin: lets the writer be used through a plain &mut without pinning
//
// 2. Why `.with_context(|| ...)` instead of `.context(...)`?
//    - The closure only runs if there is an error, so the format!() string
//      is not built for every successful write
// -----------------------------------------------------------------------------
