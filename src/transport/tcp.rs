//! TCP transport implementation
//!
//! Opens plain TCP connections to the proxy server.

use super::SocketOpts;
use crate::config::TcpConfig;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP transport for plain connections
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
}

impl TcpTransport {
    /// Create a new TCP transport with default options
    pub fn with_defaults() -> Self {
        TcpTransport::default()
    }

    /// Create a TCP transport from configuration
    pub fn from_config(config: &TcpConfig) -> Self {
        TcpTransport {
            socket_opts: SocketOpts::from_tcp_config(config),
        }
    }

    /// Set socket options
    pub fn with_socket_opts(mut self, opts: SocketOpts) -> Self {
        self.socket_opts = opts;
        self
    }

    /// Socket options applied to new connections
    pub fn socket_opts(&self) -> &SocketOpts {
        &self.socket_opts
    }

    /// Connect to `addr`, bounded by `timeout` if one is given
    ///
    /// Errors from the connect attempt are returned unchanged; an expired
    /// timeout is reported as [`io::ErrorKind::TimedOut`]. No retry is made.
    pub async fn connect(&self, addr: &str, timeout: Option<Duration>) -> io::Result<TcpStream> {
        let stream = match timeout.filter(|t| !t.is_zero()) {
            Some(timeout) => tokio::time::timeout(timeout, TcpStream::connect(addr))
                .await
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("connection to {} timed out", addr),
                    )
                })??,
            None => TcpStream::connect(addr).await?,
        };

        if let Err(e) = self.socket_opts.apply(&stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }

        tracing::debug!("TCP connection established to {}", addr);

        Ok(stream)
    }
}
