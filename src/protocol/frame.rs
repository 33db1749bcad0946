//! Outbound frame construction
//!
//! Handshake requests are small, length-then-value framed byte sequences.
//! A [`FrameBuilder`] accumulates one of them in a pooled buffer and is reset
//! between the steps of a handshake instead of being reallocated.

use crate::pool::{BufferPool, PooledBuf};
use bytes::BufMut;

/// Append-only builder for one handshake request at a time
///
/// The underlying storage goes back to the pool when the builder is dropped.
#[derive(Debug)]
pub struct FrameBuilder<'a> {
    buf: PooledBuf<'a>,
}

impl<'a> FrameBuilder<'a> {
    /// Create a builder backed by a buffer from `pool`
    pub fn new(pool: &'a BufferPool) -> Self {
        FrameBuilder {
            buf: pool.acquire(),
        }
    }

    /// Append a single byte
    pub fn put_u8(&mut self, byte: u8) -> &mut Self {
        self.buf.put_u8(byte);
        self
    }

    /// Append a 16-bit value in network byte order
    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16(value);
        self
    }

    /// Append raw bytes
    pub fn put_slice(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Append the bytes of a string
    ///
    /// No length prefix or terminator is written; the caller frames the
    /// string the way its protocol requires.
    pub fn put_str(&mut self, s: &str) -> &mut Self {
        self.put_slice(s.as_bytes())
    }

    /// Discard the current contents, keeping the allocation
    pub fn reset(&mut self) -> &mut Self {
        self.buf.clear();
        self
    }

    /// The frame built so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..]
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written since creation or the last reset
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
