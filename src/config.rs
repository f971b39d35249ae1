// src/config.rs
// =============================================================================
// Crawl configuration: raw options in, validated settings out.
//
// CrawlConfig is what the user asked for (straight from the CLI).
// CrawlSettings is what the engine runs with. The only way from one to the
// other is CrawlConfig::validate(), which either clamps or rejects:
// - depth/workers <= 0        -> clamped to the defaults
// - depth > 10, workers > 20  -> rejected
// - unsafe output path or URL -> rejected
//
// None of this touches the network.
// =============================================================================

use crate::error::ConfigError;
use crate::guard::{index_path_for, validate_output_path, UrlGuard};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const MAX_DEPTH_CEILING: usize = 10;
pub const DEFAULT_WORKERS: usize = 3;
pub const MAX_WORKERS: usize = 20;
pub const DEFAULT_USER_AGENT: &str = "DocFetch/1.0";
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

// Queue slots per worker, and result channel slots per worker
const QUEUE_SLOTS_PER_WORKER: usize = 100;
const RESULT_SLOTS_PER_WORKER: usize = 10;

// Records written between explicit flushes of the output document
const FLUSH_EVERY: usize = 10;

// Thresholds that decide when extracted text "looks like content"
//
// These are the main knobs for extraction quality, so they travel with the
// settings instead of living inline in the extractor.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionPolicy {
    /// A strategy succeeds once its text has more characters than this.
    pub min_content_chars: usize,
    /// The density strategy only considers blocks longer than this.
    pub dense_min_chars: usize,
    /// A dense block's text must exceed its children's text times this.
    pub density_ratio: f64,
    /// The fallback ignores layout shells with this many element children.
    pub fallback_max_children: usize,
}

impl ExtractionPolicy {
    // True once text is long enough to be taken as the page's content
    pub fn is_viable(&self, text: &str) -> bool {
        text.chars().count() > self.min_content_chars
    }
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            min_content_chars: 200,
            dense_min_chars: 500,
            density_ratio: 1.5,
            fallback_max_children: 50,
        }
    }
}

// Raw options as the user gave them
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    pub output_path: String,
    pub max_depth: i64,
    pub workers: i64,
    pub user_agent: String,
    pub generate_index: bool,
    pub single_page: bool,
    pub run_timeout: Duration,
    pub request_delay: Duration,
    pub extraction: ExtractionPolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            output_path: "docs.md".to_string(),
            max_depth: DEFAULT_MAX_DEPTH as i64,
            workers: DEFAULT_WORKERS as i64,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            generate_index: false,
            single_page: false,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            request_delay: DEFAULT_REQUEST_DELAY,
            extraction: ExtractionPolicy::default(),
        }
    }
}

// Validated settings the engine runs with
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub base_url: Url,
    pub output_path: PathBuf,
    pub index_path: Option<PathBuf>,
    pub max_depth: usize,
    pub workers: usize,
    pub user_agent: String,
    pub run_timeout: Duration,
    pub request_delay: Duration,
    pub queue_capacity: usize,
    pub result_capacity: usize,
    pub flush_every: usize,
    pub extraction: ExtractionPolicy,
}

impl CrawlSettings {
    // Settings with the derived capacities filled in for a worker count
    pub fn new(base_url: Url, output_path: PathBuf, max_depth: usize, workers: usize) -> Self {
        Self {
            base_url,
            output_path,
            index_path: None,
            max_depth,
            workers,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            run_timeout: DEFAULT_RUN_TIMEOUT,
            request_delay: DEFAULT_REQUEST_DELAY,
            queue_capacity: workers * QUEUE_SLOTS_PER_WORKER,
            result_capacity: workers * RESULT_SLOTS_PER_WORKER,
            flush_every: FLUSH_EVERY,
            extraction: ExtractionPolicy::default(),
        }
    }
}

impl CrawlConfig {
    // Turns raw options into settings, or explains why it can't
    pub fn validate(&self) -> Result<CrawlSettings, ConfigError> {
        let output_path = validate_output_path(&self.output_path)?;
        let base_url = UrlGuard::strict().validate(&self.base_url)?;

        if self.max_depth > MAX_DEPTH_CEILING as i64 {
            return Err(ConfigError::DepthTooHigh {
                got: self.max_depth,
                max: MAX_DEPTH_CEILING,
            });
        }
        if self.workers > MAX_WORKERS as i64 {
            return Err(ConfigError::TooManyWorkers {
                got: self.workers,
                max: MAX_WORKERS,
            });
        }

        let workers = clamp_or_default(self.workers, DEFAULT_WORKERS);
        let max_depth = if self.single_page {
            0
        } else {
            clamp_or_default(self.max_depth, DEFAULT_MAX_DEPTH)
        };

        let index_path = self.generate_index.then(|| {
            let index = index_path_for(&self.output_path);
            output_path.with_file_name(file_name(&index))
        });

        let mut settings = CrawlSettings::new(base_url, output_path, max_depth, workers);
        settings.index_path = index_path;
        settings.user_agent = self.user_agent.clone();
        settings.run_timeout = self.run_timeout;
        settings.request_delay = self.request_delay;
        settings.extraction = self.extraction;
        Ok(settings)
    }
}

fn clamp_or_default(value: i64, default: usize) -> usize {
    if value <= 0 {
        default
    } else {
        value as usize
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> CrawlConfig {
        CrawlConfig {
            base_url: url.to_string(),
            ..CrawlConfig::default()
        }
    }

    #[test]
    fn test_defaults_validate() {
        let settings = config("https://example.com/docs").validate().unwrap();
        assert_eq!(settings.max_depth, 2);
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.queue_capacity, 300);
        assert_eq!(settings.result_capacity, 30);
        assert!(settings.index_path.is_none());
    }

    #[test]
    fn test_non_positive_values_clamp_to_defaults() {
        let mut cfg = config("https://example.com");
        cfg.max_depth = 0;
        cfg.workers = -4;
        let settings = cfg.validate().unwrap();
        assert_eq!(settings.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(settings.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_ceilings_reject() {
        let mut cfg = config("https://example.com");
        cfg.max_depth = 11;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DepthTooHigh { got: 11, .. })
        ));

        let mut cfg = config("https://example.com");
        cfg.workers = 21;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::TooManyWorkers { got: 21, .. })
        ));
    }

    #[test]
    fn test_unsafe_inputs_reject() {
        assert!(matches!(
            config("http://192.168.1.5/").validate(),
            Err(ConfigError::UnsafeUrl(_))
        ));
        assert!(matches!(
            config("ftp://example.com/").validate(),
            Err(ConfigError::UnsafeUrl(_))
        ));

        let mut cfg = config("https://example.com");
        cfg.output_path = "../escape.md".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UnsafeOutputPath(_))
        ));
    }

    #[test]
    fn test_single_page_forces_depth_zero() {
        let mut cfg = config("https://example.com");
        cfg.single_page = true;
        cfg.max_depth = 5;
        assert_eq!(cfg.validate().unwrap().max_depth, 0);
    }

    #[test]
    fn test_index_path_sits_next_to_output() {
        let mut cfg = config("https://example.com");
        cfg.output_path = "out/api.md".to_string();
        cfg.generate_index = true;
        let settings = cfg.validate().unwrap();
        let index = settings.index_path.unwrap();
        assert!(index.ends_with("out/api.llm.txt"));
        assert_eq!(index.parent(), settings.output_path.parent());
    }
}
