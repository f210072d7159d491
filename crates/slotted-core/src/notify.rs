//! Change notification.
//!
//! A [`Change`] is produced by a member write that passes the gate and
//! actually changes the stored value. It is handed to the atom's [`Notify`]
//! hook, which may be a plain closure or a [`PoolNotifier`] fanning out to
//! per-member observers.

use std::fmt;
use std::rc::Rc;

use slotted_pool::{Handle, ObserverPool};

use crate::atom::Atom;
use crate::error::HookError;
use crate::value::Value;

/// One observed slot transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Name of the member that was written.
    pub name: Rc<str>,
    /// Previous content. An empty slot is reported as [`Value::None`].
    pub old: Value,
    pub new: Value,
}

/// Hook invoked after a committed write changes an observed slot.
///
/// The hook receives the atom it was installed on and may re-enter it.
pub trait Notify {
    fn notify(&self, owner: &Atom, change: &Change) -> Result<(), HookError>;
}

impl<F> Notify for F
where
    F: Fn(&Atom, &Change) -> Result<(), HookError>,
{
    fn notify(&self, owner: &Atom, change: &Change) -> Result<(), HookError> {
        self(owner, change)
    }
}

/// Observer pool keyed by member name.
pub type ChangePool = ObserverPool<Handle<Change>>;

/// [`Notify`] hook that dispatches each change to the observers registered
/// under the member's name.
#[derive(Clone, Default)]
pub struct PoolNotifier {
    pool: Rc<ChangePool>,
}

impl PoolNotifier {
    #[must_use]
    pub fn new(pool: Rc<ChangePool>) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &Rc<ChangePool> {
        &self.pool
    }

    /// Register `observer` for changes to `member`.
    pub fn observe(&self, member: &str, observer: Handle<Change>) -> bool {
        self.pool.add(member, observer)
    }

    pub fn unobserve(&self, member: &str, observer: &Handle<Change>) -> bool {
        self.pool.remove(member, observer)
    }
}

impl Notify for PoolNotifier {
    fn notify(&self, _owner: &Atom, change: &Change) -> Result<(), HookError> {
        self.pool.notify(&change.name, change)?;
        Ok(())
    }
}

impl fmt::Debug for PoolNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolNotifier")
            .field("topics", &self.pool.topic_count())
            .finish()
    }
}
