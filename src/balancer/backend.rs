//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream target
//! - Track in-flight requests (for Least Connections and `release`)
//! - Track the health flag written by the health prober

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Serialize;
use url::Url;

/// Why a backend URL cannot be registered.
#[derive(Debug, thiserror::Error)]
pub enum BackendUrlError {
    #[error("{0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme `{0}`; only http backends can be proxied")]
    UnsupportedScheme(String),
}

/// Parse and vet a URL for backend registration.
///
/// The proxy speaks plain HTTP to its backends, so only absolute
/// `http` URLs are accepted; anything else is rejected at registration
/// instead of failing on the first forwarded request. The parser
/// guarantees an `http` URL carries a host, so the authority rewrite
/// in the forwarder always has one to work with.
pub fn parse_backend_url(raw: &str) -> Result<Url, BackendUrlError> {
    let url = Url::parse(raw)?;
    if url.scheme() != "http" {
        return Err(BackendUrlError::UnsupportedScheme(url.scheme().to_string()));
    }
    Ok(url)
}

/// A single registered backend.
///
/// The URL is the registry key and is immutable for the lifetime of the
/// entry; the counters and the health flag are the only mutable state.
#[derive(Debug)]
pub struct Backend {
    /// Base URL requests are forwarded to. Unique within the registry.
    pub url: Url,
    /// Relative traffic share under weighted scheduling. Always >= 1.
    pub weight: u32,
    /// Requests currently routed here and not yet released.
    active_connections: AtomicUsize,
    /// Liveness flag, written only by the health prober. A backend is
    /// assumed healthy until its first probe.
    healthy: AtomicBool,
}

impl Backend {
    pub fn new(url: Url, weight: u32) -> Self {
        Self {
            url,
            weight: weight.max(1),
            active_connections: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
        }
    }

    /// Registry key: the backend URL as a string.
    pub fn address(&self) -> &str {
        self.url.as_str()
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    pub fn inc_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement the in-flight counter, flooring at zero.
    ///
    /// A release with no matching selection (e.g. a duplicate release
    /// from the HTTP layer) must never drive the counter negative.
    pub fn dec_connections(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
    }

    /// Point-in-time copy for `list` responses.
    pub fn snapshot(&self) -> BackendSnapshot {
        BackendSnapshot {
            address: self.url.to_string(),
            weight: self.weight,
            active_connections: self.active_connections(),
            healthy: self.is_healthy(),
        }
    }
}

/// Immutable view of one backend, as returned by `BackendPool::list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendSnapshot {
    pub address: String,
    pub weight: u32,
    pub active_connections: usize,
    pub healthy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(url: &str) -> Backend {
        Backend::new(url.parse().unwrap(), 1)
    }

    #[test]
    fn connection_counter_floors_at_zero() {
        let b = backend("http://127.0.0.1:9000/");
        b.dec_connections();
        assert_eq!(b.active_connections(), 0);

        b.inc_connections();
        b.inc_connections();
        b.dec_connections();
        assert_eq!(b.active_connections(), 1);
    }

    #[test]
    fn new_backend_is_healthy_with_floor_weight() {
        let b = Backend::new("http://127.0.0.1:9000/".parse().unwrap(), 0);
        assert!(b.is_healthy());
        assert_eq!(b.weight, 1);
    }

    #[test]
    fn registration_urls_must_be_proxyable() {
        assert!(parse_backend_url("http://127.0.0.1:9000/").is_ok());

        assert!(matches!(
            parse_backend_url("not a url"),
            Err(BackendUrlError::Parse(_))
        ));
        assert!(matches!(
            parse_backend_url("mailto:alice@example.com"),
            Err(BackendUrlError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            parse_backend_url("https://127.0.0.1:9000/"),
            Err(BackendUrlError::UnsupportedScheme(_))
        ));
        // Host-less URLs can never parse with an http scheme, so the
        // scheme restriction covers them too.
        assert!(matches!(
            parse_backend_url("unix:/var/run/app.sock"),
            Err(BackendUrlError::UnsupportedScheme(_))
        ));
    }
}
