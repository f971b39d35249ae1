// src/crawl/fetch.rs
// =============================================================================
// HTTP side of the crawl: one shared client, one function to fetch a page.
//
// How it works:
// 1. build_client() creates one reqwest::Client for the whole run
// 2. Every worker gets a clone of it (cheap: the client is an Arc inside),
//    so all workers share one connection pool, sized to the worker count
// 3. fetch_page() downloads a page and hands back its body together with the
//    URL it finally came from (after redirects)
//
// Safety:
// - Redirects are followed up to a limit, and every hop goes back through
//   the URL gatekeeper, so a public page can't bounce us into a private
//   address
// - The client's DNS resolver is the gatekeeper's resolver, so the address
//   we connect to is the address that was checked
//
// Rust concepts:
// - Closures: the redirect policy is a closure that captures the guard
// - tokio::select!: race the download against the run's cancellation
// - Result<T, E>: every failure becomes a typed FetchError
// =============================================================================

use crate::config::CrawlSettings;
use crate::error::FetchError;
use crate::guard::{GuardedResolver, UrlGuard};
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_REDIRECTS: usize = 5;

// A downloaded page
#[derive(Debug)]
pub struct FetchedPage {
    // Where the body actually came from. Differs from the requested URL
    // after a redirect (e.g. /docs -> /docs/), and relative links on the
    // page are relative to *this* URL
    pub final_url: Url,
    pub body: String,
}

// Builds the pooled HTTP client every worker shares
pub fn build_client(settings: &CrawlSettings, guard: UrlGuard) -> reqwest::Result<Client> {
    // reqwest calls this closure once per redirect response.
    // attempt.previous() lists every URL visited so far, *including* the
    // original request, so after N redirects it holds N entries. We allow
    // the 5th redirect and refuse the 6th (reqwest's Policy::limited does
    // the same comparison).
    let policy = redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        match guard.check(attempt.url()) {
            Ok(()) => attempt.follow(),
            // The GuardError travels inside reqwest's error, and
            // FetchError::categorize() digs it back out
            Err(reason) => attempt.error(reason),
        }
    });

    Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
        .pool_idle_timeout(IDLE_TIMEOUT)
        .pool_max_idle_per_host(settings.workers)
        .redirect(policy)
        .dns_resolver(Arc::new(GuardedResolver::new(guard)))
        .build()
}

// Fetches a page
//
// Anything but a plain 200 is an error, and so is a response that says it
// isn't HTML or text. The request is abandoned as soon as the run is
// cancelled.
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    cancel: &CancellationToken,
) -> Result<FetchedPage, FetchError> {
    let request = async {
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::categorize)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        // No Content-Type header at all is given the benefit of the doubt
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            if !is_document_type(content_type) {
                return Err(FetchError::NotHtml(content_type.to_string()));
            }
        }

        // Grab the final URL before .text() consumes the response
        let final_url = response.url().clone();
        let body = response.text().await.map_err(FetchError::categorize)?;
        Ok(FetchedPage { final_url, body })
    };

    // `biased` polls the branches top to bottom instead of randomly, so an
    // already-cancelled run never even starts the request
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = request => result,
    }
}

// HTML, XHTML, or at least some kind of text
fn is_document_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("html") || lower.contains("xml") || lower.starts_with("text/")
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What happens to the `request` future when cancellation wins?
//    - tokio::select! drops the losing branch
//    - Dropping a reqwest future closes its connection; nothing keeps running
//
// 2. Why does build_client() return reqwest::Result instead of anyhow::Result?
//    - The caller (the coordinator) adds its own context with .context()
//    - Keeping the concrete error type here costs nothing
//
// 3. Why `move` on the redirect closure?
//    - reqwest keeps the closure for the lifetime of the client
//    - `move` copies the guard into it, so it borrows nothing
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(guard: UrlGuard) -> Client {
        let base = Url::parse("https://example.com").unwrap();
        let settings = CrawlSettings::new(base, "docs.md".into(), 1, 2);
        build_client(&settings, guard).unwrap()
    }

    async fn fetch(server: &MockServer, route: &str) -> Result<FetchedPage, FetchError> {
        let url = Url::parse(&format!("{}{route}", server.uri())).unwrap();
        fetch_page(&client(UrlGuard::allowing_loopback()), &url, &CancellationToken::new()).await
    }

    // Mounts /r0 -> /r1 -> ... -> /r{hops}, where the last one serves HTML
    async fn redirect_chain(server: &MockServer, hops: usize) {
        for i in 0..hops {
            Mock::given(method("GET"))
                .and(path(format!("/r{i}")))
                .respond_with(
                    ResponseTemplate::new(302).insert_header("location", format!("/r{}", i + 1)),
                )
                .mount(server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path(format!("/r{hops}")))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>end</p>", "text/html"))
            .mount(server)
            .await;
    }

    #[test]
    fn test_document_types() {
        assert!(is_document_type("text/html; charset=utf-8"));
        assert!(is_document_type("application/xhtml+xml"));
        assert!(is_document_type("text/plain"));
        assert!(!is_document_type("application/pdf"));
        assert!(!is_document_type("image/png"));
    }

    #[tokio::test]
    async fn test_fetch_ok_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "DocFetch/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hi</p>", "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let page = fetch(&server, "/page").await.unwrap();
        assert_eq!(page.body, "<p>hi</p>");
        assert_eq!(page.final_url.path(), "/page");
    }

    #[tokio::test]
    async fn test_non_200_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetch(&server, "/missing").await;
        assert!(matches!(result, Err(FetchError::Status(404))));
    }

    #[tokio::test]
    async fn test_binary_content_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 1, 2], "application/pdf"))
            .mount(&server)
            .await;

        let result = fetch(&server, "/file").await;
        assert!(matches!(result, Err(FetchError::NotHtml(_))));
    }

    #[tokio::test]
    async fn test_final_url_follows_trailing_slash_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/docs/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>docs</p>", "text/html"))
            .mount(&server)
            .await;

        let page = fetch(&server, "/docs").await.unwrap();
        assert_eq!(page.final_url.path(), "/docs/");
    }

    #[tokio::test]
    async fn test_five_redirects_are_followed() {
        let server = MockServer::start().await;
        redirect_chain(&server, 5).await;

        let page = fetch(&server, "/r0").await.unwrap();
        assert_eq!(page.body, "<p>end</p>");
        assert_eq!(page.final_url.path(), "/r5");
    }

    #[tokio::test]
    async fn test_sixth_redirect_is_refused() {
        let server = MockServer::start().await;
        redirect_chain(&server, 6).await;

        let result = fetch(&server, "/r0").await;
        assert!(matches!(result, Err(FetchError::TooManyRedirects)));
    }

    #[tokio::test]
    async fn test_redirect_to_private_address_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hop"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "http://10.0.0.1/secret"),
            )
            .mount(&server)
            .await;

        let result = fetch(&server, "/hop").await;
        assert!(matches!(result, Err(FetchError::UnsafeRedirect(_))));
    }

    #[tokio::test]
    async fn test_resolver_refuses_names_that_resolve_internally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>x</p>", "text/html"))
            .expect(0)
            .mount(&server)
            .await;

        // Same server, but reached through a hostname: the strict resolver
        // sees localhost resolve to loopback and never opens a socket
        let port = server.address().port();
        let url = Url::parse(&format!("http://localhost:{port}/")).unwrap();
        let result = fetch_page(&client(UrlGuard::strict()), &url, &CancellationToken::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_fetch_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let url = Url::parse("https://example.com/").unwrap();
        let result = fetch_page(&client(UrlGuard::strict()), &url, &cancel).await;
        assert!(matches!(result, Err(FetchError::Cancelled)));
    }
}
