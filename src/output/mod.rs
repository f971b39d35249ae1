// src/output/mod.rs
// =============================================================================
// Everything that ends up on disk.
//
// Submodules:
// - sink: the output document writer task
// - index: the LLM index file
// =============================================================================

mod index;
mod sink;

pub use index::{write_index, IndexEntry};
pub use sink::{create_document, run_sink, PageRecord, SinkItem};

#[cfg(test)]
pub use index::{render_index, INDEX_HEADER};
#[cfg(test)]
pub use sink::DOCUMENT_HEADER;
