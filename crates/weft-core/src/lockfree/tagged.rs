use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// A value and the modification tag it was observed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tagged {
    pub value: u32,
    pub tag: u32,
}

impl Tagged {
    #[inline]
    fn pack(self) -> u64 {
        (u64::from(self.tag) << 32) | u64::from(self.value)
    }

    #[inline]
    fn unpack(bits: u64) -> Self {
        Self {
            value: bits as u32,
            tag: (bits >> 32) as u32,
        }
    }
}

/// Lock-free cell that pairs a 32-bit value with a 32-bit modification tag.
///
/// Both halves live in one 64-bit atomic. Every successful mutation bumps the
/// tag, so [`compare_and_swap`](Self::compare_and_swap) against a stale
/// [`Tagged`] snapshot fails even when the value has come back to the same
/// bit pattern (the ABA case for recycled slot indices).
#[repr(align(64))]
pub struct AtomicTagged {
    bits: AtomicU64,
}

impl AtomicTagged {
    pub fn new(value: u32) -> Self {
        Self::with_tag(value, 0)
    }

    pub fn with_tag(value: u32, tag: u32) -> Self {
        Self {
            bits: AtomicU64::new(Tagged { value, tag }.pack()),
        }
    }

    #[inline]
    pub fn load(&self) -> Tagged {
        Tagged::unpack(self.bits.load(Ordering::Acquire))
    }

    #[inline]
    pub fn load_unchecked(&self) -> Tagged {
        Tagged::unpack(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.load().value
    }

    #[inline]
    pub fn get_unchecked(&self) -> u32 {
        self.load_unchecked().value
    }

    #[inline]
    pub fn tag(&self) -> u32 {
        self.load().tag
    }

    /// Stores `value` and bumps the tag.
    pub fn set(&self, value: u32) {
        self.update(|_| Some(value));
    }

    /// Overwrites value and tag together without bumping.
    pub fn set_all(&self, value: u32, tag: u32) {
        self.bits.store(Tagged { value, tag }.pack(), Ordering::Release);
    }

    /// Stores `value`, bumps the tag and returns the previous value.
    pub fn swap(&self, value: u32) -> u32 {
        self.update(|_| Some(value)).value
    }

    /// Stores `value` only if both the value and the tag still match `expected`.
    #[inline]
    pub fn compare_and_swap(&self, expected: Tagged, value: u32) -> bool {
        let next = Tagged {
            value,
            tag: expected.tag.wrapping_add(1),
        };
        self.bits
            .compare_exchange(
                expected.pack(),
                next.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Wrapping add. Returns the previous value.
    pub fn fetch_add(&self, delta: u32) -> u32 {
        self.update(|v| Some(v.wrapping_add(delta))).value
    }

    /// Returns the previous value.
    pub fn increment(&self) -> u32 {
        self.fetch_add(1)
    }

    /// Returns the previous value.
    pub fn decrement(&self) -> u32 {
        self.update(|v| Some(v.wrapping_sub(1))).value
    }

    /// Exchanges values with `other`. Not atomic as a pair.
    pub fn swap_with(&self, other: &AtomicTagged) {
        let mine = self.get();
        let theirs = other.swap(mine);
        self.set(theirs);
    }

    /// Returns the value held afterwards.
    pub fn set_if_larger(&self, candidate: u32) -> u32 {
        let previous = self.update(|v| (candidate > v).then_some(candidate)).value;
        previous.max(candidate)
    }

    /// Returns the value held afterwards.
    pub fn set_if_smaller(&self, candidate: u32) -> u32 {
        let previous = self.update(|v| (candidate < v).then_some(candidate)).value;
        previous.min(candidate)
    }

    /// CAS loop applying `f`; `None` leaves the cell untouched. Returns the
    /// snapshot the winning update replaced.
    fn update(&self, f: impl Fn(u32) -> Option<u32>) -> Tagged {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let old = Tagged::unpack(current);
            let Some(value) = f(old.value) else {
                return old;
            };
            let next = Tagged {
                value,
                tag: old.tag.wrapping_add(1),
            };
            match self.bits.compare_exchange_weak(
                current,
                next.pack(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return old,
                Err(actual) => current = actual,
            }
        }
    }
}

impl fmt::Debug for AtomicTagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.load();
        f.debug_struct("AtomicTagged")
            .field("value", &snapshot.value)
            .field("tag", &snapshot.tag)
            .finish()
    }
}

impl Default for AtomicTagged {
    fn default() -> Self {
        Self::new(0)
    }
}
