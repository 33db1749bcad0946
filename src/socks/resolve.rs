//! Destination resolution for SOCKS4
//!
//! SOCKS4 can only carry an IPv4 destination, so the client resolves the
//! host itself; SOCKS4A sends a placeholder address followed by the hostname
//! and leaves resolution to the proxy.

use super::consts::SOCKS4A_PLACEHOLDER_IP;
use crate::config::Socks4Variant;
use crate::error::SocksError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::net::{IpAddr, Ipv4Addr};

/// Name resolution used by the SOCKS4 handshake
#[async_trait]
pub trait Resolver: Debug + Send + Sync {
    /// Look up every address of `host`
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Destination fields of a SOCKS4 request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Socks4Destination<'a> {
    /// DSTIP field
    pub ip: [u8; 4],
    /// Hostname appended after the user-id (SOCKS4A only)
    pub hostname: Option<&'a str>,
}

impl<'a> Socks4Destination<'a> {
    /// Destination that defers resolution of `host` to the proxy
    pub fn remote(host: &'a str) -> Self {
        Socks4Destination {
            ip: SOCKS4A_PLACEHOLDER_IP,
            hostname: Some(host),
        }
    }

    /// Destination with a locally resolved address
    pub fn local(ip: Ipv4Addr) -> Self {
        Socks4Destination {
            ip: ip.octets(),
            hostname: None,
        }
    }
}

/// First IPv4 address among `addrs`
pub fn first_ipv4(addrs: &[IpAddr]) -> Option<Ipv4Addr> {
    addrs.iter().find_map(|addr| match addr {
        IpAddr::V4(v4) => Some(*v4),
        IpAddr::V6(_) => None,
    })
}

/// Work out the destination fields for `host` under `variant`
///
/// IPv4 literals never hit the resolver.
pub async fn resolve_destination<'a>(
    variant: Socks4Variant,
    host: &'a str,
    resolver: &dyn Resolver,
) -> Result<Socks4Destination<'a>, SocksError> {
    match variant {
        Socks4Variant::RemoteDns => Ok(Socks4Destination::remote(host)),
        Socks4Variant::LocalDns => {
            if let Ok(ip) = host.parse::<Ipv4Addr>() {
                return Ok(Socks4Destination::local(ip));
            }
            let addrs = resolver
                .lookup(host)
                .await
                .map_err(|e| SocksError::Resolution {
                    host: host.to_string(),
                    reason: e.to_string(),
                })?;
            let ip = first_ipv4(&addrs).ok_or_else(|| SocksError::Resolution {
                host: host.to_string(),
                reason: "no IPv4 address found for host".to_string(),
            })?;
            tracing::debug!("Resolved {} to {} for SOCKS4", host, ip);
            Ok(Socks4Destination::local(ip))
        }
    }
}
