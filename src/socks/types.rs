//! SOCKS type definitions
//!
//! Defines the destination a CONNECT request asks the proxy to reach.

use crate::error::SocksError;
use std::fmt;

/// Destination of a CONNECT request, split out of a "host:port" string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    /// Host name or address literal, without IPv6 brackets
    pub host: &'a str,
    /// Destination port
    pub port: u16,
}

impl<'a> Target<'a> {
    /// Split `addr` into host and port
    ///
    /// Accepts `host:port` and `[ipv6]:port`. The port must be a decimal
    /// number in 0..=65535.
    pub fn parse(addr: &'a str) -> Result<Self, SocksError> {
        let (host, port) = split_host_port(addr)?;
        Ok(Target { host, port })
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Split a "host:port" string, recovering the exact host substring
pub fn split_host_port(addr: &str) -> Result<(&str, u16), SocksError> {
    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let end = rest
            .find(']')
            .ok_or_else(|| SocksError::address(addr, "missing ']' in address"))?;
        let port = rest[end + 1..]
            .strip_prefix(':')
            .ok_or_else(|| SocksError::address(addr, "missing port in address"))?;
        (&rest[..end], port)
    } else {
        let idx = addr
            .rfind(':')
            .ok_or_else(|| SocksError::address(addr, "missing port in address"))?;
        let host = &addr[..idx];
        if host.contains(':') {
            return Err(SocksError::address(addr, "too many colons in address"));
        }
        (host, &addr[idx + 1..])
    };

    if host.contains('[') || host.contains(']') {
        return Err(SocksError::address(addr, "unexpected bracket in address"));
    }
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SocksError::address(addr, "invalid port"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| SocksError::address(addr, "port out of range"))?;

    Ok((host, port))
}
