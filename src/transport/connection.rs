//! Connection handle carrying handshake deadlines
//!
//! tokio streams have no notion of an I/O deadline, so the handle keeps the
//! absolute read and write deadlines next to the stream. They bound the
//! request/reply exchanges of a handshake; once the tunnel is established
//! they are cleared and reads and writes pass straight through.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Instant;

/// Lifecycle of a connection from the client's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake not yet completed
    Negotiating,
    /// The proxy granted the CONNECT request
    Established,
}

/// A stream to a SOCKS proxy, before or after the tunnel is set up
#[derive(Debug)]
pub struct TunneledConnection<S> {
    stream: S,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
    state: ConnectionState,
}

impl<S> TunneledConnection<S> {
    /// Wrap a stream with no deadline set
    pub fn new(stream: S) -> Self {
        TunneledConnection {
            stream,
            read_deadline: None,
            write_deadline: None,
            state: ConnectionState::Negotiating,
        }
    }

    /// Adopt a caller-supplied stream, applying `timeout` as a deadline
    pub fn adopt(stream: S, timeout: Option<Duration>) -> Self {
        let mut conn = TunneledConnection::new(stream);
        conn.apply_timeout(timeout);
        conn
    }

    /// Set both deadlines to `now + timeout`
    ///
    /// A missing or zero timeout leaves the current deadlines untouched.
    pub fn apply_timeout(&mut self, timeout: Option<Duration>) {
        if let Some(timeout) = timeout.filter(|t| !t.is_zero()) {
            self.set_deadline(Instant::now() + timeout);
        }
    }

    /// Set the read and write deadline
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.read_deadline = Some(deadline);
        self.write_deadline = Some(deadline);
    }

    /// Set or clear the read deadline
    pub fn set_read_deadline(&mut self, deadline: Option<Instant>) {
        self.read_deadline = deadline;
    }

    /// Set or clear the write deadline
    pub fn set_write_deadline(&mut self, deadline: Option<Instant>) {
        self.write_deadline = deadline;
    }

    /// Remove both deadlines
    pub fn clear_deadline(&mut self) {
        self.read_deadline = None;
        self.write_deadline = None;
    }

    /// Current read deadline
    pub fn read_deadline(&self) -> Option<Instant> {
        self.read_deadline
    }

    /// Current write deadline
    pub fn write_deadline(&self) -> Option<Instant> {
        self.write_deadline
    }

    /// Handshake state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the proxy granted the tunnel
    pub fn is_established(&self) -> bool {
        self.state == ConnectionState::Established
    }

    pub(crate) fn establish(&mut self) {
        self.clear_deadline();
        self.state = ConnectionState::Established;
    }

    /// Get a reference to the underlying stream
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Unwrap the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TunneledConnection<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut Pin::into_inner(self).stream).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TunneledConnection<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut Pin::into_inner(self).stream).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut Pin::into_inner(self).stream).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut Pin::into_inner(self).stream).poll_shutdown(cx)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut Pin::into_inner(self).stream).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.stream.is_write_vectored()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_new_has_no_deadline() {
        let (a, _b) = duplex(16);
        let conn = TunneledConnection::new(a);
        assert!(conn.read_deadline().is_none());
        assert!(conn.write_deadline().is_none());
        assert_eq!(conn.state(), ConnectionState::Negotiating);
    }

    #[tokio::test]
    async fn test_adopt_with_timeout_sets_deadline() {
        let (a, _b) = duplex(16);
        let before = Instant::now();
        let conn = TunneledConnection::adopt(a, Some(Duration::from_secs(3)));
        let deadline = conn.read_deadline().unwrap();
        assert!(deadline >= before + Duration::from_secs(3));
        assert_eq!(conn.write_deadline(), Some(deadline));
    }

    #[tokio::test]
    async fn test_zero_timeout_leaves_deadline_untouched() {
        let (a, _b) = duplex(16);
        let mut conn = TunneledConnection::new(a);
        let deadline = Instant::now() + Duration::from_secs(60);
        conn.set_deadline(deadline);

        conn.apply_timeout(Some(Duration::ZERO));
        assert_eq!(conn.read_deadline(), Some(deadline));
        conn.apply_timeout(None);
        assert_eq!(conn.write_deadline(), Some(deadline));
    }

    #[tokio::test]
    async fn test_establish_clears_deadlines() {
        let (a, _b) = duplex(16);
        let mut conn = TunneledConnection::adopt(a, Some(Duration::from_secs(1)));
        conn.establish();
        assert!(conn.is_established());
        assert!(conn.read_deadline().is_none());
        assert!(conn.write_deadline().is_none());
    }

    #[tokio::test]
    async fn test_io_passes_through() {
        let (a, mut b) = duplex(64);
        let mut conn = TunneledConnection::new(a);

        conn.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        b.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        b.write_all(b"pong").await.unwrap();
        conn.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");

        let inner = conn.into_inner();
        drop(inner);
    }
}
