#![forbid(unsafe_code)]

//! Fixed-layout slotted objects.
//!
//! An [`Atom`] is an instance with a fixed number of indexed slots and a
//! per-slot notification gate. [`Member`] descriptors give slots names and
//! hooks; an [`AtomClass`] collects them into a layout shared by every
//! instance.
//!
//! # Invariants
//!
//! 1. A slot is only ever addressed by an index below the atom's slot count.
//! 2. A member write that changes the stored value notifies only when the
//!    member is listenable and both the instance and slot bits are set.
//! 3. Hooks run without any borrow of the atom held, so they may re-enter.
//! 4. Every value an atom holds is released when the atom is cleared or
//!    dropped.

pub mod atom;
pub mod bits;
pub mod class;
pub mod error;
pub mod member;
pub mod notify;
pub mod value;

pub use atom::{Atom, AtomConfig};
pub use bits::{MAX_INLINE_SLOTS, NotifyScope, Packing, WORD_BITS, block_count};
pub use class::{AtomClass, ClassBuilder};
pub use error::{AtomError, HookError, Result};
pub use member::{Member, MemberFlags, UNDEFINED_NAME};
pub use notify::{Change, ChangePool, Notify, PoolNotifier};
pub use value::{Kind, Value};
