// src/main.rs
// =============================================================================
// This is the entry point of the docfetch CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Install the log formatter (stderr, so stdout stays clean for --json)
// 3. Validate the configuration before touching the network
// 4. Run the crawl and print the report
// 5. Exit with proper code (0 = pages written, 1 = no pages, 2 = error)
//
// Logs go to stderr and the summary to stdout, so
// `docfetch --json > report.json` captures only the report.
//
// Rust concepts used:
// - async/await: the crawl runs on the tokio runtime
// - Result<T, E> and `?`: any fatal error bubbles up to main() as anyhow::Error
// - {:#} on an anyhow error prints the whole context chain on one line
// =============================================================================

mod classify;      // src/classify.rs - page types and descriptions for the index
mod cli;           // src/cli.rs - command-line parsing
mod config;        // src/config.rs - raw options and validated settings
mod crawl;         // src/crawl/ - the concurrent crawl engine
mod error;         // src/error.rs - typed errors
mod extract;       // src/extract/ - main-content extraction
mod guard;         // src/guard/ - URL and output path safety checks
mod output;        // src/output/ - output document and LLM index

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use crawl::{Crawler, RunReport};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = at least one page written
//   Ok(1) = run finished but no page made it
//   Err   = configuration rejected or local I/O failed (exit code 2)
async fn run(cli: Cli) -> Result<i32> {
    let config = cli.to_config();
    debug!(config = ?config, "Parsed options");

    let settings = config.validate()?;

    if !cli.json {
        println!("🔍 Fetching documentation from: {}", settings.base_url);
        println!("📊 Max depth: {}, workers: {}", settings.max_depth, settings.workers);
    }

    let report = Crawler::new(settings).run().await?;
    print_report(&report, cli.json)?;

    if report.pages_processed > 0 {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "docfetch=debug" } else { "docfetch=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!("📊 Summary:");
    println!("   📄 Pages: {}", report.pages_processed);
    println!("   ❌ Errors: {}", report.errors);
    println!("   🔗 Admitted: {}", report.admitted);
    if report.dropped > 0 {
        println!("   ⚠️  Dropped (queue full): {}", report.dropped);
    }
    println!(
        "   ⏱️  Time: {:.2}s ({:.2} pages/s)",
        report.elapsed_secs, report.pages_per_second
    );
    if report.deadline_hit {
        println!("   ⏰ Stopped at the run deadline");
    }
    println!("✅ Documentation saved to: {}", report.output_path.display());
    if let Some(index) = &report.index_path {
        println!(
            "✅ LLM index saved to: {} ({} entries)",
            index.display(),
            report.index_entries
        );
    }
    Ok(())
}
