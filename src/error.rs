// src/error.rs
// =============================================================================
// Typed errors for the parts of the crawl that can fail.
//
// Two families live here:
// - Fatal errors (ConfigError): the run never starts
// - Soft errors (GuardError, FetchError): one URL or page fails, the run
//   keeps going and the error counter goes up
//
// main.rs wraps everything in anyhow at the very edge, in run().
// =============================================================================

use thiserror::Error;

// Reasons a URL is refused by the gatekeeper
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("invalid URL format: {0}")]
    Malformed(String),

    #[error("only HTTP/HTTPS URLs allowed, got '{0}'")]
    Scheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("local hostname '{0}' not allowed")]
    BlockedHost(String),

    #[error("private/internal address {0} not allowed")]
    PrivateAddress(std::net::IpAddr),

    #[error("could not resolve host '{host}': {reason}")]
    Resolve { host: String, reason: String },
}

// Reasons an output path is refused
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("absolute paths are not allowed")]
    Absolute,

    #[error("relative path traversal (..) is not allowed")]
    Traversal,

    #[error("home directory expansion (~) is not allowed")]
    HomeExpansion,

    #[error("output path must be within the current working directory")]
    OutsideWorkingDir,

    #[error("only .md, .txt, and .llm.txt file extensions are allowed")]
    Extension,

    #[error("could not determine the current working directory: {0}")]
    CurrentDir(String),
}

// Configuration problems, all reported before any network activity
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("output path validation failed: {0}")]
    UnsafeOutputPath(#[from] PathError),

    #[error("base URL validation failed: {0}")]
    UnsafeUrl(#[from] GuardError),

    #[error("max depth cannot exceed {max} (got {got})")]
    DepthTooHigh { got: i64, max: usize },

    #[error("concurrent workers cannot exceed {max} (got {got})")]
    TooManyWorkers { got: i64, max: usize },
}

// Per-page fetch failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("redirect refused: {0}")]
    UnsafeRedirect(String),

    #[error("connection refused by gatekeeper: {0}")]
    UnsafeAddress(String),

    #[error("non-200 status {0}")]
    Status(u16),

    #[error("not an HTML document (content-type '{0}')")]
    NotHtml(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("cancelled by run deadline")]
    Cancelled,
}

// A page that fetched fine but had nothing worth keeping
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("empty document")]
    EmptyDocument,

    #[error("no content found")]
    NoContent,
}

impl FetchError {
    // Sorts a reqwest error into one of our categories
    //
    // A gatekeeper refusal can come from two places inside reqwest: the
    // redirect policy (UnsafeRedirect) or the DNS resolver at connect time
    // (UnsafeAddress). Either way it is buried somewhere in the source()
    // chain, so we walk the chain looking for our own GuardError.
    pub fn categorize(error: reqwest::Error) -> Self {
        if let Some(refusal) = guard_refusal(&error) {
            return if error.is_redirect() {
                FetchError::UnsafeRedirect(refusal.to_string())
            } else {
                FetchError::UnsafeAddress(refusal.to_string())
            };
        }

        let error_string = error.to_string();
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_redirect() {
            FetchError::TooManyRedirects
        } else if error.is_connect() {
            FetchError::Connect(error_string)
        } else {
            FetchError::Request(error_string)
        }
    }
}

// Finds a GuardError anywhere in an error's source chain
fn guard_refusal<'a>(error: &'a (dyn std::error::Error + 'static)) -> Option<&'a GuardError> {
    let mut current = error.source();
    while let Some(source) = current {
        if let Some(refusal) = source.downcast_ref::<GuardError>() {
            return Some(refusal);
        }
        current = source.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_wraps_guard_message() {
        let err = ConfigError::from(GuardError::BlockedHost("localhost".to_string()));
        assert_eq!(
            err.to_string(),
            "base URL validation failed: local hostname 'localhost' not allowed"
        );
    }

    #[derive(Debug, Error)]
    #[error("connect failed")]
    struct Outer(#[source] Box<dyn std::error::Error + Send + Sync>);

    #[test]
    fn test_guard_refusal_found_deep_in_chain() {
        let inner: Box<dyn std::error::Error + Send + Sync> =
            Box::new(GuardError::BlockedHost("localhost".to_string()));
        let outer = Outer(Box::new(Outer(inner)));
        assert_eq!(
            guard_refusal(&outer),
            Some(&GuardError::BlockedHost("localhost".to_string()))
        );
        assert_eq!(guard_refusal(&Outer("plain".into())), None);
    }

    #[test]
    fn test_depth_message_names_ceiling() {
        let err = ConfigError::DepthTooHigh { got: 11, max: 10 };
        assert!(err.to_string().contains("cannot exceed 10"));
    }
}
