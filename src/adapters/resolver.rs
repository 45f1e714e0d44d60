use std::net::SocketAddr;

use tokio::net::lookup_host;

use crate::domain::ntp::ServerAddress;
use crate::error::NtpTimeError;

/// Resolve a server address to a socket address, preferring IPv4.
pub async fn resolve(server: &ServerAddress) -> Result<SocketAddr, NtpTimeError> {
    let addrs: Vec<SocketAddr> = lookup_host((server.host(), server.port()))
        .await
        .map_err(|e| NtpTimeError::Dial(format!("cannot resolve '{}': {}", server, e)))?
        .collect();

    prefer_ipv4(addrs)
        .into_iter()
        .next()
        .ok_or_else(|| NtpTimeError::Dial(format!("no IP address found for '{}'", server)))
}

/// Order IPv4 addresses before IPv6 ones, keeping resolver order otherwise.
fn prefer_ipv4(addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    let (v4, v6): (Vec<SocketAddr>, Vec<SocketAddr>) =
        addrs.into_iter().partition(|a| a.is_ipv4());
    v4.into_iter().chain(v6).collect()
}
