// src/output/index.rs
// =============================================================================
// The LLM index: a plain-text table of contents an LLM can skim.
//
// Format, one block per crawled page in completion order:
//
//   [GUIDE] Getting Started
//   https://example.com/learn/start
//   Install the CLI. Then run your first fetch.
//   <blank line>
// =============================================================================

use crate::classify::PageType;
use anyhow::{Context, Result};
use std::path::Path;

pub const INDEX_HEADER: &str = "# llm.txt - AI-friendly documentation index\n\
# This file helps LLMs quickly find relevant documentation sections\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub page_type: PageType,
    pub title: String,
    pub url: String,
    pub description: String,
}

pub fn render_index(entries: &[IndexEntry]) -> String {
    let mut out = String::from(INDEX_HEADER);
    for entry in entries {
        out.push_str(&format!(
            "[{}] {}\n{}\n{}\n\n",
            entry.page_type, entry.title, entry.url, entry.description
        ));
    }
    out
}

pub async fn write_index(path: &Path, entries: &[IndexEntry]) -> Result<()> {
    tokio::fs::write(path, render_index(entries))
        .await
        .with_context(|| format!("failed to write index {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_index() {
        let entries = vec![IndexEntry {
            page_type: PageType::Guide,
            title: "Getting Started".to_string(),
            url: "https://example.com/learn/start".to_string(),
            description: "Install the CLI.".to_string(),
        }];
        assert_eq!(
            render_index(&entries),
            format!(
                "{INDEX_HEADER}[GUIDE] Getting Started\nhttps://example.com/learn/start\nInstall the CLI.\n\n"
            )
        );
    }
}
