// src/classify.rs
// =============================================================================
// Page classification and short descriptions for the LLM index.
//
// The crawl engine only knows the PageClassifier trait. RuleClassifier is the
// default: plain substring rules on the URL and title, first match wins.
// =============================================================================

use std::fmt;

/// What kind of documentation page something is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Api,
    Guide,
    Reference,
    Example,
    Section,
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PageType::Api => "API",
            PageType::Guide => "GUIDE",
            PageType::Reference => "REFERENCE",
            PageType::Example => "EXAMPLE",
            PageType::Section => "SECTION",
        };
        f.write_str(tag)
    }
}

/// Called once per successfully extracted page.
pub trait PageClassifier: Send + Sync {
    fn classify(&self, url: &str, title: &str) -> PageType;
    fn describe(&self, content: &str) -> String;
}

// (page type, URL fragments, title fragments), checked in order
const RULES: &[(PageType, &[&str], &[&str])] = &[
    (
        PageType::Api,
        &["/api/", "/pkg/", "/reference/pkg/"],
        &["api", "package"],
    ),
    (
        PageType::Guide,
        &["/guide/", "/tutorial/", "/learn/", "/docs/guides/"],
        &["guide", "tutorial", "getting started"],
    ),
    (
        PageType::Reference,
        &["/ref/", "/reference/", "/spec/"],
        &["reference", "specification"],
    ),
    (
        PageType::Example,
        &["/example/", "/examples/"],
        &["example"],
    ),
];

const DESCRIPTION_LIMIT: usize = 200;
const FALLBACK_DESCRIPTION: &str = "Documentation page content.";

// Title suffixes that only add noise to an index entry
const TITLE_NOISE: &[&str] = &[
    " - Documentation",
    " | Documentation",
    " - Go",
    " | Go",
    " - React",
    " | React",
    " Documentation",
    " Docs",
    " API Reference",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleClassifier;

impl PageClassifier for RuleClassifier {
    fn classify(&self, url: &str, title: &str) -> PageType {
        let url = url.to_lowercase();
        let title = title.to_lowercase();

        RULES
            .iter()
            .find(|(_, url_parts, title_parts)| {
                url_parts.iter().any(|part| url.contains(part))
                    || title_parts.iter().any(|part| title.contains(part))
            })
            .map(|(page_type, _, _)| *page_type)
            .unwrap_or(PageType::Section)
    }

    fn describe(&self, content: &str) -> String {
        let collapsed = collapse_whitespace(content);
        if collapsed.is_empty() {
            return FALLBACK_DESCRIPTION.to_string();
        }

        let sentences: Vec<&str> = collapsed
            .split(". ")
            .map(|s| s.trim_end_matches('.'))
            .collect();

        if sentences.len() >= 2 {
            let two = format!("{}. {}.", sentences[0], sentences[1]);
            if two.chars().count() <= DESCRIPTION_LIMIT {
                return two;
            }
        }

        let one = format!("{}.", sentences[0]);
        if one.chars().count() > DESCRIPTION_LIMIT {
            let truncated: String = one.chars().take(DESCRIPTION_LIMIT - 3).collect();
            return format!("{}...", truncated);
        }
        one
    }
}

// Strips site-name suffixes so index titles read cleanly
//
// Whitespace runs (including newlines) collapse to one space first: a title
// must stay on the single `[TYPE] title` line of its index record.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = collapse_whitespace(title);
    for noise in TITLE_NOISE {
        cleaned = cleaned.replace(noise, "");
    }
    cleaned.trim().to_string()
}

// "a \n  b" -> "a b"
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_url() {
        let c = RuleClassifier;
        assert_eq!(c.classify("https://x.dev/api/client", "Client"), PageType::Api);
        assert_eq!(c.classify("https://x.dev/learn/intro", "Intro"), PageType::Guide);
        assert_eq!(c.classify("https://x.dev/spec/wire", "Wire"), PageType::Reference);
        assert_eq!(c.classify("https://x.dev/examples/chat", "Chat"), PageType::Example);
        assert_eq!(c.classify("https://x.dev/about", "About"), PageType::Section);
    }

    #[test]
    fn test_classify_by_title_and_priority() {
        let c = RuleClassifier;
        assert_eq!(c.classify("https://x.dev/a", "Getting Started"), PageType::Guide);
        // API wins over the example rule because it is checked first
        assert_eq!(c.classify("https://x.dev/examples/", "API overview"), PageType::Api);
    }

    #[test]
    fn test_describe_takes_two_short_sentences() {
        let c = RuleClassifier;
        let desc = c.describe("Tokio is a runtime.  It runs   futures. It also has timers.");
        assert_eq!(desc, "Tokio is a runtime. It runs futures.");
    }

    #[test]
    fn test_describe_falls_back_to_one_sentence() {
        let c = RuleClassifier;
        let long = "b".repeat(190);
        let desc = c.describe(&format!("Short one. {}. Tail.", long));
        assert_eq!(desc, "Short one.");
    }

    #[test]
    fn test_describe_truncates_single_long_sentence() {
        let c = RuleClassifier;
        let desc = c.describe(&"word ".repeat(100));
        assert_eq!(desc.chars().count(), 200);
        assert!(desc.ends_with("..."));
    }

    #[test]
    fn test_describe_empty_content() {
        assert_eq!(RuleClassifier.describe("  \n "), FALLBACK_DESCRIPTION);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  Streams - Documentation "), "Streams");
        assert_eq!(clean_title("Router | React"), "Router");
        assert_eq!(clean_title("Serde Docs"), "Serde");
    }

    #[test]
    fn test_clean_title_joins_wrapped_lines() {
        assert_eq!(clean_title("\n  Routing\n  Guide\n"), "Routing Guide");
        assert_eq!(clean_title("Tasks\n - Documentation"), "Tasks");
    }

    #[test]
    fn test_page_type_tags() {
        assert_eq!(PageType::Api.to_string(), "API");
        assert_eq!(PageType::Section.to_string(), "SECTION");
    }
}
