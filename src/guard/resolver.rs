// src/guard/resolver.rs
// =============================================================================
// A DNS resolver for the HTTP client that refuses internal addresses.
//
// Why this exists:
// The worker checks a hostname's addresses before fetching, but reqwest then
// resolves the name again when it opens the connection. A hostile DNS server
// can answer "203.0.113.7" to the first lookup and "10.0.0.1" to the second
// (DNS rebinding). Plugging the gatekeeper into the client's own resolver
// means the addresses that get checked are the addresses that get used.
//
// It also covers redirect targets: every hop to a new hostname goes through
// this resolver before a socket is opened.
//
// Literal IP hosts never reach a resolver; UrlGuard::check() handles those.
//
// Rust concepts:
// - Trait implementation: reqwest::dns::Resolve is reqwest's plug-in point
// - Boxed futures: the trait returns a pinned, boxed future (no async fn in
//   traits on this reqwest version)
// =============================================================================

use super::UrlGuard;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub struct GuardedResolver {
    guard: UrlGuard,
}

impl GuardedResolver {
    pub fn new(guard: UrlGuard) -> Self {
        Self { guard }
    }
}

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        // UrlGuard is Copy, so the future owns its own copy
        let guard = self.guard;
        Box::pin(async move {
            // Port 0: the connector fills in the real port afterwards
            let addrs = guard.resolve_host(name.as_str(), 0).await?;
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<_, BoxError>(addrs)
        })
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does `?` do inside Box::pin(async move { ... })?
//    - The async block returns Result<Addrs, Box<dyn Error + Send + Sync>>
//    - `?` converts our GuardError into that boxed error automatically
//      (any Error + Send + Sync + 'static can be boxed this way)
//
// 2. Why `async move`?
//    - The future may run after resolve() returns
//    - `move` makes the future own `guard` and `name` instead of borrowing
// -----------------------------------------------------------------------------
