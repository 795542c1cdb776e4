//! Request logging and caller identification.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Resolve the rate-limit key for a request: the first `X-Forwarded-For`
/// entry, else the peer IP, else `"unknown"`.
pub fn caller_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

/// Logging middleware for requests.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    debug!(%method, %uri, "Request started");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        let peer: SocketAddr = "192.168.1.2:5555".parse().unwrap();
        assert_eq!(caller_identity(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_peer_fallback_ignores_port() {
        let peer: SocketAddr = "192.168.1.2:5555".parse().unwrap();
        assert_eq!(caller_identity(&HeaderMap::new(), Some(peer)), "192.168.1.2");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(caller_identity(&headers, Some(peer)), "192.168.1.2");
    }

    #[test]
    fn test_unknown_caller() {
        assert_eq!(caller_identity(&HeaderMap::new(), None), "unknown");
    }
}
