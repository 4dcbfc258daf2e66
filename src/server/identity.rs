use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::server::state::AppState;

/// Rate-limit identity of the caller: the peer address, or the first
/// `X-Forwarded-For` hop when the deployment trusts that header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    pub fn from_parts(
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
        trust_forwarded: bool,
    ) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .filter(|_| trust_forwarded)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (forwarded, peer) {
            (Some(hop), _) => ClientIdentity(hop.to_string()),
            (None, Some(addr)) => ClientIdentity(addr.ip().to_string()),
            (None, None) => ClientIdentity("unknown".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<Arc<AppState>> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::from_parts(&parts.headers, peer, state.config.trust_forwarded_for))
    }
}

/// Admin key from the `X-ADMIN-KEY` header.
pub fn admin_key_header(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-admin-key").and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers
    }

    #[test]
    fn test_forwarded_header_used_when_trusted() {
        let peer: SocketAddr = "10.0.0.2:5555".parse().unwrap();
        assert_eq!(ClientIdentity::from_parts(&forwarded(), Some(peer), true).as_str(), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_header_ignored_by_default() {
        let peer: SocketAddr = "10.0.0.2:5555".parse().unwrap();
        assert_eq!(ClientIdentity::from_parts(&forwarded(), Some(peer), false).as_str(), "10.0.0.2");
    }

    #[test]
    fn test_peer_then_unknown() {
        let peer: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        assert_eq!(ClientIdentity::from_parts(&HeaderMap::new(), Some(peer), false).as_str(), "192.0.2.1");
        assert_eq!(ClientIdentity::from_parts(&HeaderMap::new(), None, false).as_str(), "unknown");
        assert_eq!(ClientIdentity::from_parts(&forwarded(), None, false).as_str(), "unknown");
    }
}
