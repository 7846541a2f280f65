//! Reusable scratch buffers for the encryption pipeline.
//!
//! Buffers hold plaintext-derived values, so every release scrubs the
//! contents before the storage goes back to the free list. Release happens in
//! [`PooledBuffer`]'s `Drop`, which also runs on error returns and unwinding.

#![allow(clippy::disallowed_types, reason = "Synchronous free list; no async runtime")]

use std::{
    ops::{Deref, DerefMut},
    sync::{Mutex, PoisonError},
};

use zeroize::Zeroize;

/// Default number of idle buffers kept for reuse.
pub const DEFAULT_MAX_RETAINED: usize = 64;

/// Free list of `f64` vectors.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<f64>>>,
    max_retained: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::with_max_retained(DEFAULT_MAX_RETAINED)
    }
}

impl BufferPool {
    /// Create a pool retaining up to [`DEFAULT_MAX_RETAINED`] idle buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool retaining up to `max_retained` idle buffers.
    pub fn with_max_retained(max_retained: usize) -> Self {
        Self { free: Mutex::new(Vec::new()), max_retained }
    }

    /// Take a zero-filled buffer of exactly `dimension` elements.
    ///
    /// Reuses pooled storage when its capacity suffices; otherwise the
    /// undersized storage is scrubbed and replaced.
    pub fn acquire(&self, dimension: usize) -> PooledBuffer<'_> {
        let mut buf =
            self.free.lock().unwrap_or_else(PoisonError::into_inner).pop().unwrap_or_default();

        if buf.capacity() < dimension {
            buf.zeroize();
            buf = Vec::with_capacity(dimension);
        }
        buf.clear();
        buf.resize(dimension, 0.0);

        PooledBuffer { buf, pool: self }
    }

    /// Number of idle buffers currently pooled.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, mut buf: Vec<f64>) {
        // Wipes the full capacity and truncates to zero length
        buf.zeroize();

        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_retained {
            free.push(buf);
        }
    }
}

/// A buffer borrowed from a [`BufferPool`].
///
/// Zeroized and returned to the pool on drop.
pub struct PooledBuffer<'a> {
    buf: Vec<f64>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [f64] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.release(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_zero_filled_with_exact_length() {
        let pool = BufferPool::new();
        let buf = pool.acquire(16);
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn release_scrubs_before_reuse() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire(8);
            buf.fill(42.0);
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire(8);
        assert!(buf.iter().all(|&x| x == 0.0));
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn undersized_buffer_is_replaced() {
        let pool = BufferPool::new();
        drop(pool.acquire(4));

        let buf = pool.acquire(1024);
        assert_eq!(buf.len(), 1024);
        assert!(buf.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn larger_buffer_is_truncated_to_dimension() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire(32);
            buf.fill(-1.0);
        }

        let buf = pool.acquire(3);
        assert_eq!(&*buf, &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn retention_is_bounded() {
        let pool = BufferPool::with_max_retained(2);
        let held: Vec<_> = (0..5).map(|_| pool.acquire(4)).collect();
        drop(held);

        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn released_on_unwind() {
        let pool = BufferPool::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut buf = pool.acquire(4);
            buf[0] = 1.0;
            panic!("boom");
        }));

        assert!(result.is_err());
        assert_eq!(pool.idle(), 1);
        assert!(pool.acquire(4).iter().all(|&x| x == 0.0));
    }
}
