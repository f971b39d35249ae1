// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// DocFetch has a single job, so there are no subcommands: one flat struct
// holds every flag. Numbers that the config layer clamps (depth, workers)
// are parsed as signed integers so "--depth 0" or "--depth -1" reach the
// clamping logic instead of being rejected by clap.
// =============================================================================

use crate::config::{
    CrawlConfig, ExtractionPolicy, DEFAULT_MAX_DEPTH, DEFAULT_USER_AGENT, DEFAULT_WORKERS,
};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "docfetch",
    version,
    about = "Fetch a documentation site into a single Markdown file",
    long_about = "docfetch crawls a documentation website, extracts the main content of every page \
                  and writes it all into one Markdown document. It can also write an llm.txt index \
                  that helps LLMs find the right section quickly."
)]
pub struct Cli {
    /// Documentation URL to start from (e.g., https://go.dev/doc/)
    #[arg(long)]
    pub url: String,

    /// Output file (.md or .txt, inside the current directory)
    #[arg(long, default_value = "docs.md")]
    pub output: String,

    /// Maximum crawl depth (0 or less means the default, at most 10)
    ///
    /// Depth 0 = just the starting page
    /// Depth 1 = starting page + the pages it links to
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH as i64, allow_negative_numbers = true)]
    pub depth: i64,

    /// Number of concurrent workers (0 or less means the default, at most 20)
    #[arg(
        long,
        visible_alias = "workers",
        default_value_t = DEFAULT_WORKERS as i64,
        allow_negative_numbers = true
    )]
    pub concurrent: i64,

    /// User-Agent header sent with every request
    #[arg(long, env = "DOCFETCH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Also write an llm.txt index next to the output file
    #[arg(long)]
    pub llm_txt: bool,

    /// Fetch only the starting page, without following links
    #[arg(long)]
    pub single_page: bool,

    /// Stop the whole run after this many seconds
    #[arg(long, default_value_t = 600)]
    pub timeout_secs: u64,

    /// Delay before each request, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// Minimum characters for extracted text to count as content
    #[arg(long, default_value_t = 200)]
    pub min_content: usize,

    /// Minimum characters for a block to be considered by the density strategy
    #[arg(long, default_value_t = 500)]
    pub min_dense_content: usize,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    // The raw, not yet validated crawl options
    pub fn to_config(&self) -> CrawlConfig {
        CrawlConfig {
            base_url: self.url.clone(),
            output_path: self.output.clone(),
            max_depth: self.depth,
            workers: self.concurrent,
            user_agent: self.user_agent.clone(),
            generate_index: self.llm_txt,
            single_page: self.single_page,
            run_timeout: Duration::from_secs(self.timeout_secs),
            request_delay: Duration::from_millis(self.delay_ms),
            extraction: ExtractionPolicy {
                min_content_chars: self.min_content,
                dense_min_chars: self.min_dense_content,
                ..ExtractionPolicy::default()
            },
        }
    }
}


// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why i64 for depth and workers?
//    - clap would reject "-1" for a usize before our code ever sees it
//    - The config layer decides what zero or negative values mean
//
// 2. What does env = "DOCFETCH_USER_AGENT" do?
//    - If the flag is missing, clap reads the environment variable
//    - If both are missing, the default value is used
//
// 3. Why a separate to_config()?
//    - The CLI struct is about parsing, CrawlConfig is about crawling
//    - Tests can build a CrawlConfig without going through clap
// -----------------------------------------------------------------------------
