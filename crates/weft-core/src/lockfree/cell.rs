use atomic_float::{AtomicF32, AtomicF64};
use core::fmt;
use core::sync::atomic::{
    AtomicI32, AtomicI64, AtomicIsize, AtomicU32, AtomicU64, AtomicUsize, Ordering,
};

mod sealed {
    pub trait Sealed {}
}

/// Scalar types that have a lock-free atomic representation.
pub trait Atom: Copy + PartialOrd + fmt::Debug + Send + Sync + sealed::Sealed + 'static {
    type Repr: Send + Sync;

    const ZERO: Self;
    const ONE: Self;

    fn new_repr(value: Self) -> Self::Repr;
    fn load(repr: &Self::Repr, order: Ordering) -> Self;
    fn store(repr: &Self::Repr, value: Self, order: Ordering);
    fn swap(repr: &Self::Repr, value: Self, order: Ordering) -> Self;
    fn fetch_add(repr: &Self::Repr, value: Self, order: Ordering) -> Self;
    fn fetch_sub(repr: &Self::Repr, value: Self, order: Ordering) -> Self;
    fn compare_exchange(
        repr: &Self::Repr,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;
    fn compare_exchange_weak(
        repr: &Self::Repr,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;
}

macro_rules! impl_atom {
    ($($ty:ty => $atomic:ty, $zero:expr, $one:expr;)*) => {$(
        impl sealed::Sealed for $ty {}

        impl Atom for $ty {
            type Repr = $atomic;

            const ZERO: Self = $zero;
            const ONE: Self = $one;

            #[inline]
            fn new_repr(value: Self) -> Self::Repr {
                <$atomic>::new(value)
            }

            #[inline]
            fn load(repr: &Self::Repr, order: Ordering) -> Self {
                repr.load(order)
            }

            #[inline]
            fn store(repr: &Self::Repr, value: Self, order: Ordering) {
                repr.store(value, order)
            }

            #[inline]
            fn swap(repr: &Self::Repr, value: Self, order: Ordering) -> Self {
                repr.swap(value, order)
            }

            #[inline]
            fn fetch_add(repr: &Self::Repr, value: Self, order: Ordering) -> Self {
                repr.fetch_add(value, order)
            }

            #[inline]
            fn fetch_sub(repr: &Self::Repr, value: Self, order: Ordering) -> Self {
                repr.fetch_sub(value, order)
            }

            #[inline]
            fn compare_exchange(
                repr: &Self::Repr,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                repr.compare_exchange(current, new, success, failure)
            }

            #[inline]
            fn compare_exchange_weak(
                repr: &Self::Repr,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                repr.compare_exchange_weak(current, new, success, failure)
            }
        }
    )*};
}

impl_atom! {
    i32 => AtomicI32, 0, 1;
    i64 => AtomicI64, 0, 1;
    isize => AtomicIsize, 0, 1;
    u32 => AtomicU32, 0, 1;
    u64 => AtomicU64, 0, 1;
    usize => AtomicUsize, 0, 1;
    f32 => AtomicF32, 0.0, 1.0;
    f64 => AtomicF64, 0.0, 1.0;
}

/// Cache-line aligned lock-free cell.
///
/// `get`/`set` use acquire/release ordering. [`get_unchecked`](Self::get_unchecked)
/// is a relaxed load for hot loops that re-read a parameter every sample.
/// Compound updates ([`set_if_larger`](Self::set_if_larger) and friends) are
/// compare-and-swap retry loops and never block.
#[repr(align(64))]
pub struct AtomicValue<T: Atom> {
    value: T::Repr,
}

impl<T: Atom> AtomicValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: T::new_repr(value),
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        T::load(&self.value, Ordering::Acquire)
    }

    #[inline]
    pub fn get_unchecked(&self) -> T {
        T::load(&self.value, Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, value: T) {
        T::store(&self.value, value, Ordering::Release);
    }

    #[inline]
    pub fn swap(&self, value: T) -> T {
        T::swap(&self.value, value, Ordering::AcqRel)
    }

    /// Stores `new` if the cell still holds `expected`. Callers loop on `false`.
    #[inline]
    pub fn compare_and_swap(&self, expected: T, new: T) -> bool {
        T::compare_exchange(
            &self.value,
            expected,
            new,
            Ordering::AcqRel,
            Ordering::Acquire,
        )
        .is_ok()
    }

    /// Returns the previous value.
    #[inline]
    pub fn fetch_add(&self, delta: T) -> T {
        T::fetch_add(&self.value, delta, Ordering::AcqRel)
    }

    /// Returns the previous value.
    #[inline]
    pub fn fetch_sub(&self, delta: T) -> T {
        T::fetch_sub(&self.value, delta, Ordering::AcqRel)
    }

    /// Returns the previous value.
    #[inline]
    pub fn increment(&self) -> T {
        self.fetch_add(T::ONE)
    }

    /// Returns the previous value.
    #[inline]
    pub fn decrement(&self) -> T {
        self.fetch_sub(T::ONE)
    }

    /// Exchanges the contents of two cells.
    ///
    /// Each half is atomic, the pair is not: a concurrent writer to either cell
    /// can interleave between the two steps.
    pub fn swap_with(&self, other: &AtomicValue<T>) {
        let mine = self.get();
        let theirs = other.swap(mine);
        self.set(theirs);
    }

    /// Lock-free max update. Returns the value held afterwards.
    pub fn set_if_larger(&self, candidate: T) -> T {
        let mut current = self.get_unchecked();
        while candidate > current {
            match T::compare_exchange_weak(
                &self.value,
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(previous) => current = previous,
            }
        }
        current
    }

    /// Lock-free min update. Returns the value held afterwards.
    pub fn set_if_smaller(&self, candidate: T) -> T {
        let mut current = self.get_unchecked();
        while candidate < current {
            match T::compare_exchange_weak(
                &self.value,
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(previous) => current = previous,
            }
        }
        current
    }
}

impl<T: Atom> fmt::Debug for AtomicValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicValue").field(&self.get()).finish()
    }
}

impl<T: Atom> Clone for AtomicValue<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Atom> Default for AtomicValue<T> {
    fn default() -> Self {
        Self::new(T::ZERO)
    }
}

impl<T: Atom> From<T> for AtomicValue<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// Cache-line aligned atomic f32.
pub type AtomicFloat = AtomicValue<f32>;

/// Cache-line aligned atomic f64.
pub type AtomicDouble = AtomicValue<f64>;
