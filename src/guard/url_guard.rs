// src/guard/url_guard.rs
// =============================================================================
// The URL gatekeeper: decides whether a URL may be queued or fetched.
//
// Rules (all must pass):
// 1. The URL parses and uses http or https
// 2. The host is not a literal private/loopback/link-local/multicast IP
// 3. The host is not one of a few well-known local names
//
// check() is synchronous and does no network I/O, so configuration
// validation can use it before anything touches the network.
// check_resolved() additionally resolves the hostname and applies rule 2 to
// every address it resolves to. Workers run it right before a fetch, and the
// HTTP client runs the same address check on every connect (see resolver.rs).
//
// A rejection is never fatal to a crawl: the URL is dropped and counted.
// =============================================================================

use crate::error::GuardError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use url::{Host, Url};

// Hostnames that are refused no matter what they resolve to
const BLOCKED_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1"];

// The gatekeeper itself
//
// It is Copy so the redirect policy closure and every worker can own one.
#[derive(Debug, Clone, Copy)]
pub struct UrlGuard {
    allow_loopback: bool,
}

impl UrlGuard {
    // The only policy production code can build
    pub fn strict() -> Self {
        Self {
            allow_loopback: false,
        }
    }

    // Lets wiremock servers on 127.0.0.1 through in tests
    #[cfg(test)]
    pub fn allowing_loopback() -> Self {
        Self {
            allow_loopback: true,
        }
    }

    // Parses and checks a URL string
    pub fn validate(&self, url_str: &str) -> Result<Url, GuardError> {
        let parsed = Url::parse(url_str).map_err(|e| GuardError::Malformed(e.to_string()))?;
        self.check(&parsed)?;
        Ok(parsed)
    }

    // Checks an already-parsed URL without any network access
    pub fn check(&self, url: &Url) -> Result<(), GuardError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(GuardError::Scheme(other.to_string())),
        }

        match url.host() {
            None => Err(GuardError::MissingHost),
            Some(Host::Domain(domain)) => {
                let lower = domain.to_ascii_lowercase();
                if !self.allow_loopback && BLOCKED_HOSTS.contains(&lower.as_str()) {
                    return Err(GuardError::BlockedHost(lower));
                }
                Ok(())
            }
            Some(Host::Ipv4(ip)) => self.check_ip(IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => self.check_ip(IpAddr::V6(ip)),
        }
    }

    // Checks the URL, then every address its hostname resolves to
    //
    // This is the early, cheap rejection a worker runs before its polite
    // delay. The addresses the HTTP client actually connects to are checked
    // again by GuardedResolver, because a rebinding DNS server can answer
    // the two lookups differently.
    pub async fn check_resolved(&self, url: &Url) -> Result<(), GuardError> {
        self.check(url)?;

        // Literal IPs were fully handled by check()
        let Some(Host::Domain(domain)) = url.host() else {
            return Ok(());
        };

        let port = url.port_or_known_default().unwrap_or(80);
        self.resolve_host(domain, port).await?;
        Ok(())
    }

    // Resolves a hostname, refusing it if *any* address is internal
    //
    // One bad address is enough: the connector may pick any of them.
    pub async fn resolve_host(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, GuardError> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| GuardError::Resolve {
                host: host.to_string(),
                reason: e.to_string(),
            })?
            .collect();

        for addr in &addrs {
            self.check_ip(addr.ip())?;
        }
        Ok(addrs)
    }

    fn check_ip(&self, ip: IpAddr) -> Result<(), GuardError> {
        if ip.is_loopback() && self.allow_loopback {
            return Ok(());
        }
        if is_internal(ip) {
            return Err(GuardError::PrivateAddress(ip));
        }
        Ok(())
    }
}

impl Default for UrlGuard {
    fn default() -> Self {
        Self::strict()
    }
}

// True for any address a public crawler has no business talking to
fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_v4(v4),
        IpAddr::V6(v6) => {
            // ::ffff:10.0.0.1 and friends are checked as the IPv4 they wrap
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_internal_v4(mapped);
            }
            is_internal_v6(v6)
        }
    }
}

fn is_internal_v4(ip: Ipv4Addr) -> bool {
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_unspecified()
        || ip.is_broadcast()
}

fn is_internal_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_multicast()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link-local
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_public_https() {
        let guard = UrlGuard::strict();
        assert!(guard.validate("https://docs.rs/serde").is_ok());
        assert!(guard.validate("http://8.8.8.8/page").is_ok());
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        let guard = UrlGuard::strict();
        assert_eq!(
            guard.validate("ftp://example.com/file").unwrap_err(),
            GuardError::Scheme("ftp".to_string())
        );
        assert!(guard.validate("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        let guard = UrlGuard::strict();
        assert!(matches!(
            guard.validate("not a url"),
            Err(GuardError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_private_ranges() {
        let guard = UrlGuard::strict();
        for url in [
            "http://192.168.1.5/",
            "http://10.0.0.1/admin",
            "http://172.16.4.2/",
            "http://169.254.169.254/latest/meta-data",
            "http://224.0.0.1/",
            "http://[fd00::1]/",
            "http://[fe80::1]/",
            "http://[::ffff:10.0.0.1]/",
        ] {
            assert!(
                matches!(guard.validate(url), Err(GuardError::PrivateAddress(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_denylisted_hosts() {
        let guard = UrlGuard::strict();
        assert!(matches!(
            guard.validate("http://localhost:8080/"),
            Err(GuardError::BlockedHost(_))
        ));
        assert!(matches!(
            guard.validate("http://LOCALHOST/"),
            Err(GuardError::BlockedHost(_))
        ));
        assert!(guard.validate("http://127.0.0.1/x").is_err());
        assert!(guard.validate("http://0.0.0.0/").is_err());
        assert!(guard.validate("http://[::1]/").is_err());
    }

    #[test]
    fn test_rejection_is_stable() {
        let guard = UrlGuard::strict();
        for _ in 0..3 {
            assert!(guard.validate("http://127.0.0.1/x").is_err());
            assert!(guard.validate("https://example.com/docs").is_ok());
        }
    }

    #[test]
    fn test_loopback_allowance_keeps_private_ranges_blocked() {
        let guard = UrlGuard::allowing_loopback();
        assert!(guard.validate("http://127.0.0.1:9999/").is_ok());
        assert!(guard.validate("http://192.168.0.1/").is_err());
    }

    #[tokio::test]
    async fn test_resolve_host_refuses_loopback_names() {
        // localhost comes from /etc/hosts, so no network is needed
        let strict = UrlGuard::strict().resolve_host("localhost", 80).await;
        assert!(matches!(strict, Err(GuardError::PrivateAddress(_))));

        let addrs = UrlGuard::allowing_loopback()
            .resolve_host("localhost", 80)
            .await
            .unwrap();
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|a| a.ip().is_loopback()));
    }

    #[tokio::test]
    async fn test_check_resolved_literal_ip_skips_dns() {
        let guard = UrlGuard::strict();
        let url = Url::parse("http://192.168.1.5/").unwrap();
        assert!(matches!(
            guard.check_resolved(&url).await,
            Err(GuardError::PrivateAddress(_))
        ));
    }
}
