//! Per-container free-list of reusable iteration cursors.
//!
//! Every iterator a container hands out wraps a `Cursor` borrowed from
//! the container's pool. Exhausting the iterator returns the cursor
//! automatically; abandoning it mid-walk does not: the cursor is simply
//! never reused, a leak bounded by the pool's retention cap rather than
//! an error. Issuance is never capped: an empty free-list allocates a
//! fresh cursor. Only retention is capped, so heavy leak pressure cannot
//! make the pool itself grow without bound.
//!
//! Counters satisfy `len() + borrowed() == allocated()` at all times;
//! a cursor discarded over the cap leaves `allocated` as well.

use core::cell::{Cell, RefCell};

/// Iteration state reused across traversals: the next backing slot to
/// examine. The pseudo-slot one past the last backing slot covers the
/// sentinel-free containers' out-of-band zero key.
#[derive(Debug)]
pub struct Cursor {
    pub(crate) slot: usize,
}

impl Cursor {
    fn fresh() -> Self {
        Cursor { slot: 0 }
    }

    fn reset(&mut self) {
        self.slot = 0;
    }
}

/// Bounded free-list of cursors, owned one-per-container.
#[derive(Debug)]
pub struct IteratorPool {
    free: RefCell<Vec<Cursor>>,
    capacity: usize,
    borrowed: Cell<usize>,
    allocated: Cell<usize>,
}

impl IteratorPool {
    /// Retention cap used by containers: a small multiple of available
    /// parallelism, so even one leaked iterator per concurrent task stays
    /// within the retained set.
    pub(crate) fn default_capacity() -> usize {
        std::thread::available_parallelism().map_or(4, |n| n.get() * 4)
    }

    pub(crate) fn new() -> Self {
        Self::with_capacity(Self::default_capacity())
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            free: RefCell::new(Vec::new()),
            capacity,
            borrowed: Cell::new(0),
            allocated: Cell::new(0),
        }
    }

    /// Take a cursor, reusing a pooled one when available.
    pub(crate) fn borrow_cursor(&self) -> Cursor {
        self.borrowed.set(self.borrowed.get() + 1);
        match self.free.borrow_mut().pop() {
            Some(mut cursor) => {
                cursor.reset();
                cursor
            }
            None => {
                self.allocated.set(self.allocated.get() + 1);
                Cursor::fresh()
            }
        }
    }

    /// Return a cursor. Beyond the retention cap the cursor is discarded.
    pub(crate) fn release_cursor(&self, cursor: Cursor) {
        debug_assert!(self.borrowed.get() > 0, "release without borrow");
        self.borrowed.set(self.borrowed.get() - 1);
        let mut free = self.free.borrow_mut();
        if free.len() < self.capacity {
            free.push(cursor);
        } else {
            self.allocated.set(self.allocated.get() - 1);
        }
    }

    /// Number of cursors currently retained and ready for reuse.
    pub fn len(&self) -> usize {
        self.free.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retention cap (`len() <= capacity()` always).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cursors currently out with iterators, including abandoned ones.
    pub fn borrowed(&self) -> usize {
        self.borrowed.get()
    }

    /// Live cursors attributable to this pool: retained plus borrowed.
    pub fn allocated(&self) -> usize {
        self.allocated.get()
    }
}
