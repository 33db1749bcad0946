//! Request/reply exchange
//!
//! One exchange writes a complete request frame and performs a single read of
//! the reply. Reply length is not validated here: a short or oversized read is
//! handed back as is and the handshake decides whether the frame is
//! acceptable.

use super::FrameBuilder;
use crate::pool::{BufferPool, PooledBuf};
use crate::transport::TunneledConnection;
use std::future::Future;
use std::io;
use std::ops::Deref;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::trace;

/// Per-handshake I/O context: the buffer pool and the operation timeout
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    pool: &'a BufferPool,
    timeout: Option<Duration>,
}

/// Bytes returned by the proxy for one request
///
/// Backed by a pooled scratch buffer that is released on drop.
#[derive(Debug)]
pub struct Reply<'a> {
    buf: PooledBuf<'a>,
}

impl Deref for Reply<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf[..]
    }
}

impl<'a> Session<'a> {
    /// Create a session; a zero timeout means no timeout
    pub fn new(pool: &'a BufferPool, timeout: Option<Duration>) -> Self {
        Session {
            pool,
            timeout: timeout.filter(|t| !t.is_zero()),
        }
    }

    /// Timeout applied to each direction of an exchange
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Start a new request frame backed by this session's pool
    pub fn frame(&self) -> FrameBuilder<'a> {
        FrameBuilder::new(self.pool)
    }

    /// Write `request` in full, then read one reply
    ///
    /// When a timeout is configured the write deadline and then the read
    /// deadline are moved to `now + timeout` before the respective operation.
    /// Otherwise any deadline already set on the connection still applies.
    /// Replies longer than [`REPLY_BUFFER_SIZE`](crate::pool::REPLY_BUFFER_SIZE)
    /// are truncated.
    pub async fn send_receive<S>(
        &self,
        conn: &mut TunneledConnection<S>,
        request: &[u8],
    ) -> io::Result<Reply<'a>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if let Some(timeout) = self.timeout {
            conn.set_write_deadline(Some(Instant::now() + timeout));
        }
        let deadline = conn.write_deadline();
        let stream = conn.get_mut();
        with_deadline(deadline, async {
            stream.write_all(request).await?;
            stream.flush().await
        })
        .await?;
        trace!("Sent {} byte request", request.len());

        if let Some(timeout) = self.timeout {
            conn.set_read_deadline(Some(Instant::now() + timeout));
        }
        let deadline = conn.read_deadline();
        let mut buf = self.pool.acquire_scratch();
        let n = with_deadline(deadline, conn.get_mut().read(&mut buf[..])).await?;
        buf.truncate(n);
        trace!("Received {} byte reply", n);

        Ok(Reply { buf })
    }
}

async fn with_deadline<T, F>(deadline: Option<Instant>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "i/o deadline exceeded"))?,
        None => fut.await,
    }
}
