//! Best-effort client address resolution.
//!
//! The gateway typically sits behind load balancers, so the first
//! `X-Forwarded-For` entry (the original client in conventional proxy
//! chaining) takes precedence over the transport peer address. The header
//! is attacker-controllable: this value is a metrics/billing signal, not
//! an authentication input, and callers must treat it as best-effort.

use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap};

/// Resolve the client address for a request.
///
/// Precedence: first `X-Forwarded-For` entry, then the transport peer.
/// `None` is the invalid/unknown sentinel; address-dependent checks
/// degrade to their safe default on it.
pub fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(addr) = forwarded_addr(headers) {
        return Some(addr);
    }
    peer.map(|p| p.ip())
}

/// Transport-level peer address, as recorded by `ConnectInfo` at accept time.
pub fn peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0)
}

/// Parse the first entry of `X-Forwarded-For`, e.g. "client, proxy1, proxy2".
fn forwarded_addr(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = xff.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }
    parse_host(first)
}

/// Parse an address, tolerating an optional `host:port` / `[v6]:port` suffix.
fn parse_host(s: &str) -> Option<IpAddr> {
    if let Ok(addr) = s.parse::<IpAddr>() {
        return Some(addr);
    }
    s.parse::<SocketAddr>().ok().map(|sock| sock.ip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(xff: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(v) = xff {
            h.insert("x-forwarded-for", HeaderValue::from_str(v).unwrap());
        }
        h
    }

    fn peer(s: &str) -> Option<SocketAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_forwarded_takes_precedence() {
        let h = headers(Some("203.0.113.5, 10.0.0.1"));
        let addr = client_addr(&h, peer("10.0.0.1:443"));
        assert_eq!(addr, Some("203.0.113.5".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_with_port_suffix() {
        let h = headers(Some("203.0.113.5:31337"));
        assert_eq!(client_addr(&h, None), Some("203.0.113.5".parse().unwrap()));

        let h = headers(Some("[2001:db8::1]:443"));
        assert_eq!(client_addr(&h, None), Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_falls_back_to_peer() {
        let h = headers(None);
        assert_eq!(client_addr(&h, peer("192.0.2.10:55000")), Some("192.0.2.10".parse().unwrap()));
    }

    #[test]
    fn test_garbage_forwarded_falls_back_to_peer() {
        let h = headers(Some("not-an-address"));
        assert_eq!(client_addr(&h, peer("192.0.2.10:55000")), Some("192.0.2.10".parse().unwrap()));
    }

    #[test]
    fn test_nothing_resolvable_is_none() {
        let h = headers(Some(" , 10.0.0.1"));
        assert_eq!(client_addr(&h, None), None);
    }
}
