use super::{AtomicTagged, Tagged};
use core::sync::atomic::{AtomicU32, Ordering};

const EMPTY: u32 = u32::MAX;

/// Fixed-capacity lock-free stack of slot indices.
///
/// The head is an [`AtomicTagged`], so a pop that raced with a pop/push pair
/// returning the same index retries instead of linking a stale successor.
pub struct FreeList {
    head: AtomicTagged,
    next: Box<[AtomicU32]>,
}

impl FreeList {
    /// A list holding every index in `0..capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity < EMPTY as usize);

        let next = (0..capacity)
            .map(|i| {
                let link = if i + 1 < capacity { i as u32 + 1 } else { EMPTY };
                AtomicU32::new(link)
            })
            .collect();
        let head = if capacity == 0 { EMPTY } else { 0 };

        Self {
            head: AtomicTagged::new(head),
            next,
        }
    }

    /// A list of `capacity` slots, all currently taken.
    pub fn empty(capacity: usize) -> Self {
        debug_assert!(capacity < EMPTY as usize);

        Self {
            head: AtomicTagged::new(EMPTY),
            next: (0..capacity).map(|_| AtomicU32::new(EMPTY)).collect(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.next.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.get() == EMPTY
    }

    pub fn pop(&self) -> Option<usize> {
        loop {
            let head: Tagged = self.head.load();
            if head.value == EMPTY {
                return None;
            }
            let successor = self.next[head.value as usize].load(Ordering::Acquire);
            if self.head.compare_and_swap(head, successor) {
                return Some(head.value as usize);
            }
        }
    }

    /// Returns `index` to the list. Pushing an index twice corrupts the list.
    pub fn push(&self, index: usize) {
        debug_assert!(index < self.capacity(), "slot {index} out of range");

        loop {
            let head = self.head.load();
            self.next[index].store(head.value, Ordering::Release);
            if self.head.compare_and_swap(head, index as u32) {
                return;
            }
        }
    }
}
