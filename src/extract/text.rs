// src/extract/text.rs
// =============================================================================
// Turning an element subtree into plain text.
//
// Every text node below the root is trimmed and, if anything is left, becomes
// one line of output, in document order. Elements matching the `strip`
// selector are skipped together with everything inside them (the root itself
// is never skipped).
//
// The walk uses an explicit stack rather than recursion so deeply nested
// markup can't blow the stack.
//
// Rust concepts:
// - Lifetimes: walk_text<'a> hands out &'a str slices that borrow straight
//   from the parsed document, so no text is copied while walking
// - Vec as a stack: push/pop from the end
// =============================================================================

use scraper::{ElementRef, Node, Selector};

// Calls `visit` with each trimmed, non-empty text node under `root`
pub fn walk_text<'a, F>(root: ElementRef<'a>, strip: Option<&Selector>, mut visit: F)
where
    F: FnMut(&'a str),
{
    // Children are pushed in reverse so the first child is popped first,
    // which keeps the output in document order
    let mut stack: Vec<_> = root.children().rev().collect();

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    visit(trimmed);
                }
            }
            Node::Element(_) => {
                if let (Some(strip), Some(element)) = (strip, ElementRef::wrap(node)) {
                    if strip.matches(&element) {
                        continue;
                    }
                }
                stack.extend(node.children().rev());
            }
            _ => {}
        }
    }
}

// Flattens a subtree to newline-separated text
pub fn flatten(root: ElementRef<'_>, strip: Option<&Selector>) -> String {
    let mut lines = Vec::new();
    walk_text(root, strip, |text| lines.push(text));
    lines.join("\n")
}

// Character count of the text flatten() would produce, ignoring separators
pub fn text_len(root: ElementRef<'_>, strip: Option<&Selector>) -> usize {
    let mut total = 0;
    walk_text(root, strip, |text| total += text.chars().count());
    total
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is ElementRef::wrap(node)?
//    - The tree holds every kind of node (text, comments, elements)
//    - wrap() returns Some only for elements, which selectors can match
//
// 2. Why does `continue` skip the whole subtree?
//    - The element's children are only pushed on the stack when it is kept,
//      so a stripped element takes all of its descendants with it
// -----------------------------------------------------------------------------
