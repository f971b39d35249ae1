// src/guard/mod.rs
// =============================================================================
// Safety gates that run before anything is fetched or written.
//
// Submodules:
// - url_guard: the URL gatekeeper (scheme, private ranges, local hostnames)
// - resolver: the HTTP client's DNS resolver, running the same address checks
// - path: output path checks and index path derivation
// =============================================================================

mod path;
mod resolver;
mod url_guard;

pub use self::path::{index_path_for, validate_output_path};
pub use self::resolver::GuardedResolver;
pub use self::url_guard::UrlGuard;
