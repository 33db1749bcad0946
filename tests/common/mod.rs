//! Test utilities and mocks for Socksdial
//!
//! Loopback SOCKS4 and SOCKS5 servers that record each requested target and
//! relay the tunnel to a local echo server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start a server that writes back everything it reads
pub async fn start_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut rx, mut tx) = stream.split();
                let _ = tokio::io::copy(&mut rx, &mut tx).await;
            });
        }
    });
    addr
}

/// Start a server that accepts connections and never answers
pub async fn start_silent_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

/// A running loopback proxy
#[derive(Clone)]
pub struct TestProxy {
    /// Address the proxy listens on
    pub addr: SocketAddr,
    targets: Arc<Mutex<Vec<String>>>,
    received: Arc<AtomicUsize>,
}

impl TestProxy {
    fn new(addr: SocketAddr) -> Self {
        TestProxy {
            addr,
            targets: Arc::new(Mutex::new(Vec::new())),
            received: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Targets requested so far, as "host:port"
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }

    /// Handshake bytes read from clients so far
    pub fn received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }

    fn record(&self, target: String) {
        self.targets.lock().unwrap().push(target);
    }

    async fn read_exact<R: AsyncRead + Unpin>(&self, r: &mut R, buf: &mut [u8]) -> std::io::Result<()> {
        r.read_exact(buf).await?;
        self.received.fetch_add(buf.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn read_u8<R: AsyncRead + Unpin>(&self, r: &mut R) -> std::io::Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(r, &mut b).await?;
        Ok(b[0])
    }

    async fn read_cstr<R: AsyncRead + Unpin>(&self, r: &mut R) -> std::io::Result<String> {
        let mut out = Vec::new();
        loop {
            match self.read_u8(r).await? {
                0 => break,
                b => out.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Start a SOCKS5 server relaying every CONNECT to `upstream`
///
/// With `credentials` set only username/password authentication is accepted.
pub async fn start_socks5_server(upstream: SocketAddr, credentials: Option<(&str, &str)>) -> TestProxy {
    let (listener, addr) = create_test_listener().await;
    let proxy = TestProxy::new(addr);
    let credentials = credentials.map(|(u, p)| (u.to_string(), p.to_string()));

    let server = proxy.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let server = server.clone();
            let credentials = credentials.clone();
            tokio::spawn(async move {
                let _ = server.serve_socks5(stream, upstream, credentials).await;
            });
        }
    });
    proxy
}

/// Start a SOCKS4/4A server relaying every CONNECT to `upstream`
pub async fn start_socks4_server(upstream: SocketAddr) -> TestProxy {
    let (listener, addr) = create_test_listener().await;
    let proxy = TestProxy::new(addr);

    let server = proxy.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let server = server.clone();
            tokio::spawn(async move {
                let _ = server.serve_socks4(stream, upstream).await;
            });
        }
    });
    proxy
}

impl TestProxy {
    async fn serve_socks5(
        &self,
        mut stream: TcpStream,
        upstream: SocketAddr,
        credentials: Option<(String, String)>,
    ) -> std::io::Result<()> {
        let mut header = [0u8; 2];
        self.read_exact(&mut stream, &mut header).await?;
        let mut methods = vec![0u8; header[1] as usize];
        self.read_exact(&mut stream, &mut methods).await?;

        let wanted = if credentials.is_some() { 2 } else { 0 };
        if !methods.contains(&wanted) {
            stream.write_all(&[5, 0xFF]).await?;
            return Ok(());
        }
        stream.write_all(&[5, wanted]).await?;

        if let Some((user, pass)) = credentials {
            let _version = self.read_u8(&mut stream).await?;
            let mut username = vec![0u8; self.read_u8(&mut stream).await? as usize];
            self.read_exact(&mut stream, &mut username).await?;
            let mut password = vec![0u8; self.read_u8(&mut stream).await? as usize];
            self.read_exact(&mut stream, &mut password).await?;
            if username != user.as_bytes() || password != pass.as_bytes() {
                stream.write_all(&[1, 1]).await?;
                return Ok(());
            }
            stream.write_all(&[1, 0]).await?;
        }

        let mut request = [0u8; 4];
        self.read_exact(&mut stream, &mut request).await?;
        let mut host = vec![0u8; self.read_u8(&mut stream).await? as usize];
        self.read_exact(&mut stream, &mut host).await?;
        let mut port = [0u8; 2];
        self.read_exact(&mut stream, &mut port).await?;
        self.record(format!(
            "{}:{}",
            String::from_utf8_lossy(&host),
            u16::from_be_bytes(port)
        ));

        let mut upstream = TcpStream::connect(upstream).await?;
        let mut reply = vec![5, 0, 0, 1, 127, 0, 0, 1];
        reply.extend_from_slice(&port);
        stream.write_all(&reply).await?;

        tokio::io::copy_bidirectional(&mut stream, &mut upstream).await?;
        Ok(())
    }

    async fn serve_socks4(&self, mut stream: TcpStream, upstream: SocketAddr) -> std::io::Result<()> {
        let mut request = [0u8; 8];
        self.read_exact(&mut stream, &mut request).await?;
        let _user_id = self.read_cstr(&mut stream).await?;
        let port = u16::from_be_bytes([request[2], request[3]]);
        let ip = [request[4], request[5], request[6], request[7]];

        let host = if ip[..3] == [0, 0, 0] && ip[3] != 0 {
            self.read_cstr(&mut stream).await?
        } else {
            std::net::Ipv4Addr::from(ip).to_string()
        };
        self.record(format!("{}:{}", host, port));

        let mut upstream = TcpStream::connect(upstream).await?;
        stream.write_all(&[0, 90, 0, 0, 0, 0, 0, 0]).await?;

        tokio::io::copy_bidirectional(&mut stream, &mut upstream).await?;
        Ok(())
    }
}
