// src/extract/strategies.rs
// =============================================================================
// The individual content-selection strategies.
//
// Each one looks at the whole parsed page and proposes a Candidate. Only the
// driver in mod.rs decides which candidate wins; a strategy never calls
// another strategy.
//
// Rust concepts:
// - &'static str constants: selector lists live in the binary, no allocation
// - filter_map(ElementRef::wrap): keep only the element children of a node
// =============================================================================

use super::text::{flatten, text_len};
use super::Candidate;
use crate::config::ExtractionPolicy;
use scraper::{ElementRef, Html, Selector};

// Elements that mark the page's main region
const SEMANTIC: &[&str] = &["main", "article", "[role='main']", "[role='article']"];

// Class/id conventions used by documentation generators, most specific first
const CONTENT_CONTAINERS: &[&str] = &[
    ".content",
    ".docs-content",
    "#main-content",
    ".documentation",
    ".post-content",
    ".markdown-body",
    ".content-wrapper",
    ".doc-content",
    ".document",
    ".entry-content",
    ".page-content",
    ".article-content",
    "[class*='content']",
    "[class*='docs']",
    "[class*='document']",
    "[id*='content']",
    "[id*='main']",
];

// Page chrome that is cut from the body before the fallback looks at it
const LAYOUT_CHROME: &str = "nav, header, footer, aside, script, style, form, iframe, \
    .sidebar, .toc, .navigation, .menu, .ads, .advertisement, \
    [class*='nav'], [class*='menu'], [class*='sidebar'], [class*='footer'], [class*='header']";

// Everything above plus interactive bits, stripped inside a chosen container
const NON_CONTENT: &str = "nav, header, footer, aside, script, style, form, iframe, \
    .sidebar, .toc, .navigation, .menu, .ads, .advertisement, button, \
    [class*='nav'], [class*='menu'], [class*='sidebar'], [class*='footer'], [class*='header'], \
    [class*='button'], [onclick], [role='navigation'], [role='banner'], [role='contentinfo']";

fn compile(css: &str) -> Selector {
    // Only ever called with the constants above
    Selector::parse(css).expect("built-in selector is valid CSS")
}

// Every selector the extractor needs, parsed once
pub struct Selectors {
    semantic: Vec<Selector>,
    containers: Vec<Selector>,
    sections: Selector,
    body: Selector,
    layout_chrome: Selector,
    non_content: Selector,
}

impl Selectors {
    pub fn new() -> Self {
        Self {
            semantic: SEMANTIC.iter().map(|css| compile(css)).collect(),
            containers: CONTENT_CONTAINERS.iter().map(|css| compile(css)).collect(),
            sections: compile("section, div"),
            body: compile("body"),
            layout_chrome: compile(LAYOUT_CHROME),
            non_content: compile(NON_CONTENT),
        }
    }
}

// Second pass: strip non-content sub-elements and flatten what's left
fn container_text(element: ElementRef<'_>, selectors: &Selectors) -> String {
    flatten(element, Some(&selectors.non_content))
}

// Tries each selector in order and returns the first viable container text
fn first_viable(
    doc: &Html,
    list: &[Selector],
    selectors: &Selectors,
    policy: &ExtractionPolicy,
) -> Candidate {
    for selector in list {
        for element in doc.select(selector) {
            let text = container_text(element, selectors);
            if policy.is_viable(&text) {
                return Candidate::viable(text);
            }
        }
    }
    Candidate::empty()
}

// Strategy 1: <main>, <article> and their ARIA equivalents
pub fn semantic(doc: &Html, selectors: &Selectors, policy: &ExtractionPolicy) -> Candidate {
    first_viable(doc, &selectors.semantic, selectors, policy)
}

// Strategy 2: well-known content container classes and ids
pub fn content_container(
    doc: &Html,
    selectors: &Selectors,
    policy: &ExtractionPolicy,
) -> Candidate {
    first_viable(doc, &selectors.containers, selectors, policy)
}

// Strategy 3: the largest block that holds most of its own text
//
// A layout shell's text is almost all inside its children. A real content
// block has a lot of direct text (paragraph runs, inline markup), so its own
// length clearly exceeds what its element children account for.
pub fn density(doc: &Html, selectors: &Selectors, policy: &ExtractionPolicy) -> Candidate {
    let mut best: Option<(ElementRef<'_>, usize)> = None;

    for element in doc.select(&selectors.sections) {
        let own = text_len(element, None);
        if own <= policy.dense_min_chars || best.map_or(false, |(_, len)| own <= len) {
            continue;
        }

        let children: usize = element
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| text_len(child, None))
            .sum();

        if own as f64 > children as f64 * policy.density_ratio {
            best = Some((element, own));
        }
    }

    match best {
        Some((element, _)) => {
            let text = container_text(element, selectors);
            if policy.is_viable(&text) {
                Candidate::viable(text)
            } else {
                Candidate::rejected(text)
            }
        }
        None => Candidate::empty(),
    }
}

// Strategy 4: cut the page chrome, take the biggest remaining element
//
// If even that is too short, the cleaned body is returned as long as it has
// any text at all.
pub fn fallback(doc: &Html, selectors: &Selectors, policy: &ExtractionPolicy) -> Candidate {
    let Some(body) = doc.select(&selectors.body).next() else {
        return Candidate::empty();
    };
    let chrome = &selectors.layout_chrome;

    let mut largest: Option<(ElementRef<'_>, usize)> = None;
    let mut stack: Vec<ElementRef<'_>> = body.children().filter_map(ElementRef::wrap).rev().collect();

    while let Some(element) = stack.pop() {
        if chrome.matches(&element) {
            continue;
        }

        let children: Vec<ElementRef<'_>> = element.children().filter_map(ElementRef::wrap).collect();
        if children.len() < policy.fallback_max_children {
            let size = text_len(element, Some(chrome));
            if largest.map_or(true, |(_, best)| size > best) {
                largest = Some((element, size));
            }
        }
        stack.extend(children.into_iter().rev());
    }

    if let Some((element, _)) = largest {
        let text = container_text(element, selectors);
        if policy.is_viable(&text) {
            return Candidate::viable(text);
        }
    }

    let cleaned = flatten(body, Some(chrome));
    if cleaned.is_empty() {
        Candidate::empty()
    } else {
        Candidate::viable(cleaned)
    }
}
