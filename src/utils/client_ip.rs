// Client address resolution behind a known number of reverse proxies

use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr};

/// Resolve the client IP the way a trusted-hop-count proxy setup does.
///
/// The address chain is every `X-Forwarded-For` entry followed by the socket
/// peer. With `trusted_proxies` hops in front of us, the client is the entry
/// that many positions from the right end of the chain.
pub fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trusted_proxies: usize,
) -> IpAddr {
    let mut chain: Vec<IpAddr> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|entry| entry.trim().parse::<IpAddr>().ok())
        .collect();

    let peer = peer.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    chain.push(peer);

    if trusted_proxies == 0 {
        return peer;
    }

    let index = chain.len().saturating_sub(1 + trusted_proxies);
    chain[index]
}
