//! Cursor Buffer Pool
//!
//! Released cursors hand their decode scratch back to the owning reader so
//! the next cursor starts without allocating. The handoff is a bounded,
//! non-blocking producer/consumer exchange: offering to a full pool drops
//! the buffer, taking from an empty pool reports a miss.

use crossbeam::channel::{bounded, Receiver, Sender};

/// How many recycled buffers each pool retains per reader
pub(crate) const POOL_CAPACITY: usize = 5;

/// Bounded, non-blocking pool of reusable byte buffers
pub(crate) struct BufferPool {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl BufferPool {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Take a recycled buffer, or `None` on a miss
    pub(crate) fn take(&self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Offer a buffer back; dropped silently when the pool is full
    pub(crate) fn offer(&self, mut buf: Vec<u8>) {
        buf.clear();
        let _ = self.tx.try_send(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_on_empty_misses() {
        let pool = BufferPool::new(2);
        assert!(pool.take().is_none());
    }

    #[test]
    fn test_round_trip_keeps_capacity() {
        let pool = BufferPool::new(2);
        pool.offer(Vec::with_capacity(1024));
        let buf = pool.take().unwrap();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 1024);
    }

    #[test]
    fn test_offer_beyond_capacity_drops() {
        let pool = BufferPool::new(1);
        pool.offer(Vec::new());
        pool.offer(Vec::new());
        assert!(pool.take().is_some());
        assert!(pool.take().is_none());
    }
}
