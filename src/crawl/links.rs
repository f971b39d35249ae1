// src/crawl/links.rs
// =============================================================================
// Link discovery: which links on a page are worth crawling next.
//
// A link is kept only if:
// 1. It isn't an in-page anchor or a mailto:/tel:/javascript:/data: link
// 2. It resolves (relative links are joined against the page URL)
// 3. It is http/https on the same host and port as the page
// 4. Its path doesn't end in a download extension (.pdf, .zip, ...)
//
// Fragments are removed and duplicates on the same page are collapsed, in
// the order the links appear.
//
// Rust concepts:
// - Url::join: resolves "../guide", "/api" or "page#x" against a base URL
// - let-else: skip an element early when it has no usable href
// =============================================================================

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

// Paths ending in these are downloads, not documentation pages
const NON_DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".tar", ".gz", ".exe", ".dmg", ".pkg", ".deb", ".rpm",
];

// Finds the same-host links on a parsed page
pub fn discover_links(document: &Html, page_url: &Url) -> Vec<Url> {
    // Constant selector, known to be valid
    let selector = Selector::parse("a[href]").expect("static selector");

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve_link(page_url, href) else {
            continue;
        };

        if is_same_site(page_url, &link)
            && !is_non_document(&link)
            && seen.insert(link.as_str().to_owned())
        {
            links.push(link);
        }
    }

    links
}

// Resolves a link (possibly relative) to an absolute URL without fragment
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url)
}

fn is_same_site(page: &Url, link: &Url) -> bool {
    matches!(link.scheme(), "http" | "https")
        && link.host_str() == page.host_str()
        && link.port_or_known_default() == page.port_or_known_default()
}

fn is_non_document(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    NON_DOCUMENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
