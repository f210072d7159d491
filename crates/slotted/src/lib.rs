#![forbid(unsafe_code)]

//! Slotted public facade crate.
//!
//! Re-exports the slot store from `slotted-core` and the observer pool
//! from `slotted-pool`.

pub use slotted_core::{
    Atom, AtomClass, AtomConfig, AtomError, Change, ChangePool, ClassBuilder, HookError, Kind,
    Member, MemberFlags, Notify, NotifyScope, Packing, PoolNotifier, Result, Value,
};
pub use slotted_pool::{DispatchMode, Handle, Observer, ObserverError, ObserverPool, PoolConfig, Topic};

pub mod prelude {
    pub use slotted_core as core;
    pub use slotted_pool as pool;

    pub use slotted_core::{Atom, ClassBuilder, Member, NotifyScope, Value};
    pub use slotted_pool::Handle;
}
