//! Lock-free primitives shared between the control thread and the render thread.
//!
//! These are the only synchronisation primitives in the crate. Nothing here
//! blocks: compound updates are bounded compare-and-swap retry loops.

mod cell;
mod free_list;
mod tagged;

pub use cell::{Atom, AtomicDouble, AtomicFloat, AtomicValue};
pub use free_list::FreeList;
pub use tagged::{AtomicTagged, Tagged};
