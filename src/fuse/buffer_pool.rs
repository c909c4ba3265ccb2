//! Page-aligned buffer pool for request frames.
//!
//! Small frames never reach the pool: they are copied into the request's
//! inline scratch (see [`SMALL_INPUT_SIZE`](super::request::SMALL_INPUT_SIZE)).
//! Everything else is served from power-of-two page size classes, one free
//! list per class. Retrieval is non-blocking: a miss allocates, a return
//! classifies the buffer by its capacity and enqueues it. The pool has no
//! upper bound; it amortizes allocation across steady-state traffic.

use aligned_utils::bytes::AlignedBytes;
use clippy_utilities::Cast;
use parking_lot::Mutex;

/// Buffer alignment and size-class unit
pub const PAGE_SIZE: usize = 4096;

/// Size-classed free lists of page-aligned buffers. Safe to share across
/// threads; all methods take `&self`.
#[derive(Default)]
pub struct BufferPool {
    /// Free lists indexed by size class
    classes: Mutex<Vec<Vec<AlignedBytes>>>,
}

impl BufferPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classes: Mutex::new(Vec::new()),
        }
    }

    /// The size class for a requested byte count: buffers are a
    /// power-of-two number of pages.
    fn size_class(size: usize) -> usize {
        let pages = size.div_ceil(PAGE_SIZE).max(1);
        pages.next_power_of_two().trailing_zeros().cast()
    }

    /// The capacity of buffers in a size class.
    fn class_bytes(class: usize) -> usize {
        PAGE_SIZE << class
    }

    /// Acquire a zero-initialized-or-recycled buffer of at least `size`
    /// bytes. Recycled buffers keep their previous contents.
    #[must_use]
    pub fn alloc_buffer(&self, size: usize) -> AlignedBytes {
        let class = Self::size_class(size);
        {
            let mut classes = self.classes.lock();
            if let Some(buf) = classes.get_mut(class).and_then(Vec::pop) {
                return buf;
            }
        }
        AlignedBytes::new_zeroed(Self::class_bytes(class), PAGE_SIZE)
    }

    /// Return a buffer to the pool. Buffers whose capacity is not a
    /// power-of-two number of pages did not come from this pool and are
    /// dropped.
    pub fn free_buffer(&self, buf: AlignedBytes) {
        let len = buf.len();
        if len == 0 || len % PAGE_SIZE != 0 {
            return;
        }
        let pages = len / PAGE_SIZE;
        if !pages.is_power_of_two() {
            return;
        }
        let class: usize = pages.trailing_zeros().cast();
        let mut classes = self.classes.lock();
        if classes.len() <= class {
            classes.resize_with(class + 1, Vec::new);
        }
        if let Some(list) = classes.get_mut(class) {
            list.push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BufferPool, PAGE_SIZE};

    #[test]
    fn sizes_round_up_to_power_of_two_pages() {
        assert_eq!(BufferPool::size_class(1), 0);
        assert_eq!(BufferPool::size_class(PAGE_SIZE), 0);
        assert_eq!(BufferPool::size_class(PAGE_SIZE + 1), 1);
        assert_eq!(BufferPool::size_class(3 * PAGE_SIZE), 2);
        assert_eq!(BufferPool::class_bytes(2), 4 * PAGE_SIZE);
    }

    #[test]
    fn alloc_serves_class_capacity() {
        let pool = BufferPool::new();
        let buf = pool.alloc_buffer(100);
        assert_eq!(buf.len(), PAGE_SIZE);
        let buf = pool.alloc_buffer(128 * 1024 + 512);
        assert_eq!(buf.len(), 256 * 1024);
    }

    #[test]
    fn freed_buffers_are_reused() {
        let pool = BufferPool::new();
        let mut buf = pool.alloc_buffer(PAGE_SIZE);
        buf[0] = 0xAB;
        pool.free_buffer(buf);

        let recycled = pool.alloc_buffer(PAGE_SIZE);
        assert_eq!(recycled.len(), PAGE_SIZE);
        // recycled buffers keep their previous contents
        assert_eq!(recycled[0], 0xAB);
    }

    #[test]
    fn free_is_keyed_by_capacity() {
        let pool = BufferPool::new();
        let big = pool.alloc_buffer(8 * PAGE_SIZE);
        pool.free_buffer(big);
        // a small request must not get the big buffer's class
        let small = pool.alloc_buffer(16);
        assert_eq!(small.len(), PAGE_SIZE);
        // the big one is still there for a matching request
        let big_again = pool.alloc_buffer(8 * PAGE_SIZE);
        assert_eq!(big_again.len(), 8 * PAGE_SIZE);
    }
}
