//! Client module for Socksdial
//!
//! This module contains the [`Dialer`], the entry point for opening
//! connections through a SOCKS proxy.

mod dialer;

pub use dialer::Dialer;

use crate::error::SocksError;
use crate::transport::TunneledConnection;
use tokio::net::TcpStream;

/// Dial `addr` through the proxy described by `proxy_uri`
pub async fn dial(proxy_uri: &str, addr: &str) -> Result<TunneledConnection<TcpStream>, SocksError> {
    Dialer::from_uri(proxy_uri)?.dial(addr).await
}
