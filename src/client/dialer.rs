//! Proxy dialer
//!
//! Owns the proxy endpoint together with the collaborators a dial needs: the
//! buffer pool, the resolver used by SOCKS4 and the TCP transport.

use crate::config::{Config, Credentials, ProxyEndpoint, ProxyVersion};
use crate::error::SocksError;
use crate::pool::BufferPool;
use crate::protocol::Session;
use crate::socks::{v4, v5, Resolver, SystemResolver, Target};
use crate::transport::{TcpTransport, TunneledConnection};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// Dials TCP connections through a SOCKS proxy
#[derive(Debug, Clone)]
pub struct Dialer {
    endpoint: ProxyEndpoint,
    pool: Arc<BufferPool>,
    resolver: Arc<dyn Resolver>,
    transport: TcpTransport,
}

impl Dialer {
    /// Create a dialer for `endpoint` with its own buffer pool
    pub fn new(endpoint: ProxyEndpoint) -> Self {
        Dialer {
            endpoint,
            pool: Arc::new(BufferPool::default()),
            resolver: Arc::new(SystemResolver),
            transport: TcpTransport::with_defaults(),
        }
    }

    /// Create a dialer from a proxy URI such as `socks5://127.0.0.1:1080`
    pub fn from_uri(uri: &str) -> Result<Self, SocksError> {
        Ok(Dialer::new(uri.parse()?))
    }

    /// Create a dialer from a loaded configuration file
    pub fn from_config(config: &Config) -> Result<Self, SocksError> {
        let endpoint = config.proxy.to_endpoint()?;
        Ok(Dialer::new(endpoint).with_transport(TcpTransport::from_config(&config.tcp)))
    }

    /// Share a buffer pool with other dialers
    pub fn with_pool(mut self, pool: Arc<BufferPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Replace the resolver used for SOCKS4 destinations
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the transport used to reach the proxy
    pub fn with_transport(mut self, transport: TcpTransport) -> Self {
        self.transport = transport;
        self
    }

    /// The proxy this dialer goes through
    pub fn endpoint(&self) -> &ProxyEndpoint {
        &self.endpoint
    }

    /// Connect to the proxy and ask it for a tunnel to `addr`
    ///
    /// `addr` is validated before the proxy is contacted.
    pub async fn dial(&self, addr: &str) -> Result<TunneledConnection<TcpStream>, SocksError> {
        self.validate(addr)?;

        let timeout = self.endpoint.timeout();
        debug!(
            "Dialing {} via {} proxy {}",
            addr,
            self.endpoint.version(),
            self.endpoint.addr()
        );
        let stream = self.transport.connect(self.endpoint.addr(), timeout).await?;
        let mut conn = TunneledConnection::adopt(stream, timeout);
        self.handshake(&mut conn, addr).await?;
        Ok(conn)
    }

    /// Run the handshake over a stream the caller already connected to the proxy
    pub async fn dial_with<S>(&self, stream: S, addr: &str) -> Result<TunneledConnection<S>, SocksError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut conn = TunneledConnection::adopt(stream, self.endpoint.timeout());
        self.handshake(&mut conn, addr).await?;
        Ok(conn)
    }

    /// Run the handshake over an existing tunnel, e.g. to chain proxies
    ///
    /// Deadlines already set on `conn` are kept when no timeout is configured.
    pub async fn dial_over<S>(
        &self,
        mut conn: TunneledConnection<S>,
        addr: &str,
    ) -> Result<TunneledConnection<S>, SocksError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        conn.apply_timeout(self.endpoint.timeout());
        self.handshake(&mut conn, addr).await?;
        Ok(conn)
    }

    /// Negotiate a tunnel to `addr` over `conn`
    ///
    /// On failure `conn` is left open and still owned by the caller, who
    /// decides whether to close it.
    pub async fn handshake<S>(&self, conn: &mut TunneledConnection<S>, addr: &str) -> Result<(), SocksError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let target = self.validate(addr)?;
        let session = Session::new(&self.pool, self.endpoint.timeout());

        match self.endpoint.version() {
            ProxyVersion::Socks4(variant) => {
                v4::handshake(&session, conn, variant, &target, self.resolver.as_ref()).await
            }
            ProxyVersion::Socks5 => {
                v5::handshake(&session, conn, self.credentials(), &target).await
            }
        }
    }

    fn credentials(&self) -> Option<&Credentials> {
        self.endpoint.credentials()
    }

    fn validate<'a>(&self, addr: &'a str) -> Result<Target<'a>, SocksError> {
        let target = Target::parse(addr)?;
        if self.endpoint.version() == ProxyVersion::Socks5 {
            v5::validate_host(target.host)?;
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Socks4Variant;
    use async_trait::async_trait;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_test::io::Builder;

    #[derive(Debug)]
    struct NoLookups;

    #[async_trait]
    impl Resolver for NoLookups {
        async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
            panic!("unexpected lookup of {}", host)
        }
    }

    #[derive(Debug)]
    struct Loopback;

    #[async_trait]
    impl Resolver for Loopback {
        async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            Ok(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)])
        }
    }

    #[test]
    fn test_from_uri() {
        let dialer = Dialer::from_uri("socks4a://10.0.0.1:9050?timeout=2s").unwrap();
        assert_eq!(
            dialer.endpoint().version(),
            ProxyVersion::Socks4(Socks4Variant::RemoteDns)
        );
        assert_eq!(dialer.endpoint().addr(), "10.0.0.1:9050");
        assert_eq!(dialer.endpoint().timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_from_uri_rejects_empty_password() {
        let err = Dialer::from_uri("socks5://test_user:@127.0.0.1:1080").unwrap_err();
        assert!(matches!(err, SocksError::Config(_)));
    }

    #[tokio::test]
    async fn test_dial_with_socks5() {
        let dialer = Dialer::from_uri("socks5://127.0.0.1:1080").unwrap();
        let mut connect = vec![5, 1, 0, 3, 11];
        connect.extend_from_slice(b"example.org");
        connect.extend_from_slice(&[0, 80]);
        let mock = Builder::new()
            .write(&[5, 1, 0])
            .read(&[5, 0])
            .write(&connect)
            .read(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0])
            .build();

        let conn = dialer.dial_with(mock, "example.org:80").await.unwrap();
        assert!(conn.is_established());
    }

    #[tokio::test]
    async fn test_dial_with_socks4_uses_resolver() {
        let dialer = Dialer::from_uri("socks4://127.0.0.1:1080")
            .unwrap()
            .with_resolver(Arc::new(Loopback));
        let mock = Builder::new()
            .write(&[4, 1, 0, 80, 127, 0, 0, 1, 0])
            .read(&[0, 90, 0, 0, 0, 0, 0, 0])
            .build();

        let conn = dialer.dial_with(mock, "localhost:80").await.unwrap();
        assert!(conn.is_established());
    }

    #[tokio::test]
    async fn test_handshake_keeps_connection_on_failure() {
        let dialer = Dialer::from_uri("socks4a://127.0.0.1:1080")
            .unwrap()
            .with_resolver(Arc::new(NoLookups));
        let mut request = vec![4, 1, 0, 80, 0, 0, 0, 1, 0];
        request.extend_from_slice(b"example.org\0");
        let mock = Builder::new()
            .write(&request)
            .read(&[0, 91, 0, 0, 0, 0, 0, 0])
            .build();
        let mut conn = TunneledConnection::new(mock);

        let err = dialer.handshake(&mut conn, "example.org:80").await.unwrap_err();
        assert!(matches!(err, SocksError::RejectedOrFailed));
        assert!(!conn.is_established());
    }

    #[tokio::test]
    async fn test_dial_over_keeps_existing_deadline() {
        let dialer = Dialer::from_uri("socks5://127.0.0.1:1080").unwrap();
        let (client, _server) = tokio::io::duplex(64);
        let mut conn = TunneledConnection::new(client);
        conn.set_deadline(Instant::now() + Duration::from_millis(50));

        let err = dialer.dial_over(conn, "example.org:80").await.unwrap_err();
        match err {
            SocksError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dial_rejects_bad_target_before_connecting() {
        // Nothing listens on the discard port; a connect attempt would fail with Io.
        let dialer = Dialer::from_uri("socks5://127.0.0.1:9").unwrap();

        let err = dialer.dial("example.org").await.unwrap_err();
        assert!(matches!(err, SocksError::AddressFormat { .. }));

        let long = format!("{}:443", "h".repeat(300));
        let err = dialer.dial(&long).await.unwrap_err();
        assert!(matches!(err, SocksError::AddressFormat { .. }));
    }

    #[tokio::test]
    async fn test_shared_pool_receives_buffers() {
        let pool = Arc::new(BufferPool::default());
        let dialer = Dialer::from_uri("socks5://127.0.0.1:1080")
            .unwrap()
            .with_pool(pool.clone());
        let mock = Builder::new().write(&[5, 1, 0]).read(&[5, 0xFF]).build();

        let err = dialer.dial_with(mock, "example.org:80").await.unwrap_err();
        assert!(matches!(err, SocksError::MethodNegotiation { .. }));
        assert_eq!(pool.idle(), 2);
    }
}
