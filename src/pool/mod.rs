//! Buffer pool for handshake frames
//!
//! Every handshake borrows its request frame and its reply scratch space from
//! a [`BufferPool`]. Buffers are handed out behind a [`PooledBuf`] guard and go
//! back to the free list when the guard is dropped, so a handshake returns its
//! storage on every exit path.

mod guard;

pub use guard::PooledBuf;

use bytes::BytesMut;
use std::sync::Mutex;

/// Size of the scratch buffer a single reply is read into
///
/// Replies longer than this are truncated.
pub const REPLY_BUFFER_SIZE: usize = 1024;

/// Initial capacity of a freshly allocated buffer
///
/// Large enough for the biggest SOCKS5 frame (username/password
/// sub-negotiation, 513 bytes) and the reply scratch space.
pub const DEFAULT_BUFFER_CAPACITY: usize = REPLY_BUFFER_SIZE;

/// Buffers that grew beyond this are not kept
pub const MAX_RETAINED_CAPACITY: usize = 4 * REPLY_BUFFER_SIZE;

/// Default number of idle buffers kept by a pool
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Free list of reusable byte buffers
///
/// The pool is safe to share between concurrent handshakes (wrap it in an
/// `Arc`); it imposes no ordering between them.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<BytesMut>>,
    max_idle: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        BufferPool::new(DEFAULT_MAX_IDLE)
    }
}

impl BufferPool {
    /// Create a pool that keeps at most `max_idle` idle buffers
    pub fn new(max_idle: usize) -> Self {
        BufferPool {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Take an empty buffer from the pool, allocating if none is idle
    pub fn acquire(&self) -> PooledBuf<'_> {
        let buf = self
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop())
            .unwrap_or_else(|| BytesMut::with_capacity(DEFAULT_BUFFER_CAPACITY));
        PooledBuf::new(buf, self)
    }

    /// Take a zero-filled scratch buffer of [`REPLY_BUFFER_SIZE`] bytes
    pub fn acquire_scratch(&self) -> PooledBuf<'_> {
        let mut buf = self.acquire();
        buf.resize(REPLY_BUFFER_SIZE, 0);
        buf
    }

    /// Number of buffers currently idle
    pub fn idle(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn release(&self, mut buf: BytesMut) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.max_idle {
                idle.push(buf);
            }
        }
    }
}
