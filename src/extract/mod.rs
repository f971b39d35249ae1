// src/extract/mod.rs
// =============================================================================
// Main-content extraction.
//
// Documentation sites mark up their content in wildly different ways, so no
// single selector list works. Extraction runs a cascade of strategies in
// priority order and stops at the first one whose text is long enough:
//
//   1. Semantic     <main>, <article>, role="main"/"article"
//   2. Container    .content, .markdown-body, [id*='main'], ...
//   3. Density      biggest block that holds most of its own text
//   4. Fallback     strip page chrome, take the biggest element or the body
//
// Whatever container wins, its nav/forms/buttons/scripts are stripped before
// it is flattened to text (see text.rs).
//
// Submodules:
// - strategies: the four strategies
// - text: subtree flattening
//
// Rust concepts:
// - Generic closures: run_cascade() takes any FnMut(Strategy) -> Candidate,
//   so tests can drive it with fake strategies
// - Iterator::find_map: "try each one, stop at the first Some"
// - Borrowing: extraction only reads the parsed page (&Html), never owns it
// =============================================================================

mod strategies;
mod text;

use crate::config::ExtractionPolicy;
use scraper::Html;
use strategies::Selectors;

/// One step of the extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Semantic,
    ContentContainer,
    Density,
    Fallback,
}

/// The order strategies are tried in.
pub const CASCADE: [Strategy; 4] = [
    Strategy::Semantic,
    Strategy::ContentContainer,
    Strategy::Density,
    Strategy::Fallback,
];

/// What a single strategy proposes: some text, and whether it's good enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub viable: bool,
}

impl Candidate {
    pub fn viable(text: String) -> Self {
        Self { text, viable: true }
    }

    pub fn rejected(text: String) -> Self {
        Self { text, viable: false }
    }

    pub fn empty() -> Self {
        Self::rejected(String::new())
    }
}

/// The winning text and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub strategy: Strategy,
}

/// Runs `attempt` for each strategy in `order` until one is viable.
///
/// Later strategies are never invoked once an earlier one succeeds.
pub fn run_cascade<F>(order: &[Strategy], mut attempt: F) -> Option<Extraction>
where
    F: FnMut(Strategy) -> Candidate,
{
    // find_map is lazy: it stops calling the closure at the first Some
    order.iter().find_map(|&strategy| {
        let candidate = attempt(strategy);
        candidate.viable.then(|| Extraction {
            text: candidate.text,
            strategy,
        })
    })
}

// Holds compiled selectors and thresholds; shared by all workers
//
// Selectors are parsed once here instead of once per page.
pub struct Extractor {
    policy: ExtractionPolicy,
    selectors: Selectors,
}

impl Extractor {
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self {
            policy,
            selectors: Selectors::new(),
        }
    }

    // Best-effort main content of a page, or None if nothing usable
    pub fn extract(&self, doc: &Html) -> Option<Extraction> {
        run_cascade(&CASCADE, |strategy| self.attempt(strategy, doc))
    }

    fn attempt(&self, strategy: Strategy, doc: &Html) -> Candidate {
        let (selectors, policy) = (&self.selectors, &self.policy);
        match strategy {
            Strategy::Semantic => strategies::semantic(doc, selectors, policy),
            Strategy::ContentContainer => strategies::content_container(doc, selectors, policy),
            Strategy::Density => strategies::density(doc, selectors, policy),
            Strategy::Fallback => strategies::fallback(doc, selectors, policy),
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does `|&strategy|` mean in the find_map closure?
//    - iter() yields &Strategy; the `&` in the pattern copies the value out
//    - That works because Strategy is Copy
//
// 2. Why FnMut and not Fn?
//    - FnMut lets the closure change captured state (tests count calls)
//    - Any Fn closure is also accepted where FnMut is asked for
//
// 3. What does bool::then do?
//    - `cond.then(|| x)` is Some(x) if cond is true, otherwise None
// -----------------------------------------------------------------------------
