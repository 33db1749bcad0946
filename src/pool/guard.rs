//! RAII guard for pooled buffers
//!
//! Provides automatic return of buffers to the pool when dropped.

use super::BufferPool;
use bytes::BytesMut;
use std::ops::{Deref, DerefMut};

/// RAII guard that returns the buffer to its pool on drop
pub struct PooledBuf<'a> {
    /// The buffer (Option to allow moving it out in `drop`)
    buf: Option<BytesMut>,
    /// Pool the buffer goes back to
    pool: &'a BufferPool,
}

impl<'a> PooledBuf<'a> {
    pub(super) fn new(buf: BytesMut, pool: &'a BufferPool) -> Self {
        PooledBuf {
            buf: Some(buf),
            pool,
        }
    }
}

impl Deref for PooledBuf<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &Self::Target {
        // Only `drop` empties the option.
        self.buf.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledBuf<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.buf.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl std::fmt::Debug for PooledBuf<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuf")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl Drop for PooledBuf<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}
