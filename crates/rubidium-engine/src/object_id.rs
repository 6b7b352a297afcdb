//! Object identity.
//!
//! Heap objects get even ids from a single atomic counter, assigned
//! lazily on first request and never reused. Odd ids encode tagged
//! immediates (small integers) out-of-band and are never issued by the
//! allocator. The low even ids are reserved for the singleton constants.

use std::sync::atomic::{AtomicI64, Ordering};

/// Id of the false singleton.
pub const FALSE_OBJECT_ID: i64 = 0;
/// Id of the true singleton.
pub const TRUE_OBJECT_ID: i64 = 2;
/// Id of the nil singleton.
pub const NIL_OBJECT_ID: i64 = 4;
/// First id handed out for ordinary heap objects.
pub const FIRST_OBJECT_ID: i64 = 6;

/// Tagged id for a small integer: odd, bijective with the value.
pub fn fixnum_to_id(value: i64) -> i64 {
    value.wrapping_mul(2).wrapping_add(1)
}

/// Monotonic allocator for heap object ids.
pub struct ObjectIdAllocator {
    next: AtomicI64,
}

impl Default for ObjectIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectIdAllocator {
    /// Allocator starting at [`FIRST_OBJECT_ID`].
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(FIRST_OBJECT_ID),
        }
    }

    #[cfg(test)]
    fn starting_at(next: i64) -> Self {
        Self {
            next: AtomicI64::new(next),
        }
    }

    /// Issue the next id: even, unique for the process lifetime, safe
    /// for concurrent callers.
    ///
    /// Exhaustion is fatal. Continuing past wraparound would reuse ids,
    /// so the counter is clamped to its minimum and the process panics.
    pub fn next_id(&self) -> i64 {
        let id = self.next.fetch_add(2, Ordering::SeqCst);

        if id < 0 {
            self.next.store(i64::MIN, Ordering::SeqCst);
            panic!("object ids exhausted");
        }

        id
    }
}
