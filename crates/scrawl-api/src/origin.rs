//! Coarse origin identity for self-notification suppression.

use std::net::{IpAddr, SocketAddr};

use axum::http::{header, HeaderMap};

use scrawl_core::OriginId;

/// Derive the caller's origin from the request.
///
/// Prefers the first hop of `x-forwarded-for` (set by a fronting proxy) over
/// the socket peer address, then appends the `User-Agent` string. Deliberately
/// coarse: every tab of one browser maps to the same origin.
pub fn origin_from(headers: &HeaderMap, peer: SocketAddr) -> OriginId {
    let ip: IpAddr = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(|| peer.ip());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    OriginId::from_parts(Some(ip), user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "10.1.2.3:4567".parse().unwrap()
    }

    #[test]
    fn test_origin_uses_peer_address_without_proxy_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("tester"));
        let origin = origin_from(&headers, peer());
        assert_eq!(origin.as_str(), "10.1.2.3tester");
    }

    #[test]
    fn test_origin_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert(header::USER_AGENT, HeaderValue::from_static("tester"));
        let origin = origin_from(&headers, peer());
        assert_eq!(origin.as_str(), "203.0.113.7tester");
    }

    #[test]
    fn test_origin_tolerates_garbage_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        let origin = origin_from(&headers, peer());
        assert_eq!(origin.as_str(), "10.1.2.3");
    }
}
