//! Shared sample buffers.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Audio sample type used throughout the graph.
pub type Sample = f32;

/// Shared handle to a block of samples.
///
/// A node's output buffer is read by every downstream node. The buffers of a
/// fan-out owner are also held by its proxies, which is why this is a shared
/// handle rather than a plain `Vec`.
#[derive(Clone, Default)]
pub struct Buffer(Rc<RefCell<Vec<Sample>>>);

impl Buffer {
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![0.0; len])
    }

    pub fn from_vec(samples: Vec<Sample>) -> Self {
        Self(Rc::new(RefCell::new(samples)))
    }

    #[inline]
    pub fn read(&self) -> Ref<'_, [Sample]> {
        Ref::map(self.0.borrow(), Vec::as_slice)
    }

    #[inline]
    pub fn write(&self) -> RefMut<'_, [Sample]> {
        RefMut::map(self.0.borrow_mut(), Vec::as_mut_slice)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resizes, padding with the current last sample so `last()` is stable.
    pub fn resize(&self, len: usize) {
        let mut samples = self.0.borrow_mut();
        if samples.len() != len {
            let pad = samples.last().copied().unwrap_or(0.0);
            samples.resize(len, pad);
        }
    }

    /// Most recent sample, or 0 for an empty buffer.
    #[inline]
    pub fn last(&self) -> Sample {
        self.0.borrow().last().copied().unwrap_or(0.0)
    }

    pub fn set_last(&self, value: Sample) {
        let mut samples = self.0.borrow_mut();
        match samples.last_mut() {
            Some(last) => *last = value,
            None => samples.push(value),
        }
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer").field("len", &self.len()).finish()
    }
}

/// Sample of `src` that lines up with `index` in a block of `dest_len`.
///
/// Equal lengths read straight through, a single sample broadcasts, anything
/// else is index-scaled.
#[inline]
pub fn scaled_sample(src: &[Sample], index: usize, dest_len: usize) -> Sample {
    match src.len() {
        0 => 0.0,
        1 => src[0],
        len if len == dest_len => src[index],
        len => src[(index * len / dest_len.max(1)).min(len - 1)],
    }
}
