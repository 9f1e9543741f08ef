use std::net::IpAddr;

use axum::http::HeaderMap;
use ipnet::IpNet;

/// What the submitting client tells us about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub user_agent: String,
    pub referrer: String,
}

impl ClientContext {
    pub fn new(user_agent: &str, referrer: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            referrer: referrer.to_string(),
        }
    }

    /// Extract client metadata from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_agent = header_str(headers, "user-agent");
        let referrer = header_str(headers, "referer");
        Self {
            user_agent,
            referrer,
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Resolve the client address, honoring `X-Forwarded-For` only behind a trusted proxy.
pub fn client_ip(headers: &HeaderMap, peer_addr: Option<IpAddr>, trusted_proxies: &[IpNet]) -> IpAddr {
    let peer = peer_addr.unwrap_or(IpAddr::from([127, 0, 0, 1]));

    if !trusted_proxies.is_empty() && trusted_proxies.iter().any(|net| net.contains(&peer)) {
        if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            // Take the first (leftmost) IP that isn't a trusted proxy
            for ip_str in xff.split(',').map(|s| s.trim()) {
                if let Ok(ip) = ip_str.parse::<IpAddr>() {
                    if !trusted_proxies.iter().any(|net| net.contains(&ip)) {
                        return ip;
                    }
                }
            }
        }
    }

    peer
}
