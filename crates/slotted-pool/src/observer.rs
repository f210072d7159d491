//! Observer handles.
//!
//! The pool stores observer *handles*, not observers: a handle must be
//! cheap to clone (dispatch clones the current handle out of the list so
//! no borrow is held while it runs) and comparable (registration is
//! deduplicated by equality).
//!
//! Liveness replaces truthiness. A handle reporting `is_alive() == false`
//! is removed from its topic the next time that topic is notified with
//! [`DispatchMode::Pruning`](crate::DispatchMode::Pruning), so expiring an
//! observer only requires letting it die.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::ObserverError;

/// A handle that can be registered in an [`ObserverPool`](crate::ObserverPool).
pub trait Observer: Clone + PartialEq {
    /// Argument passed on notification.
    type Arg: ?Sized;

    /// Whether the observer should still receive notifications.
    fn is_alive(&self) -> bool {
        true
    }

    /// Deliver `arg` to the observer.
    fn call(&self, arg: &Self::Arg) -> Result<(), ObserverError>;
}

type CallbackFn<A> = dyn Fn(&A) -> Result<(), ObserverError>;

/// Closure observer, held either strongly or weakly.
///
/// Equality is allocation identity and ignores the variant: a weak handle
/// equals the strong handle it was downgraded from, so either can be used
/// to `remove` the other.
pub enum Handle<A: ?Sized + 'static> {
    Strong(Rc<CallbackFn<A>>),
    Weak(Weak<CallbackFn<A>>),
}

impl<A: ?Sized + 'static> Handle<A> {
    /// Wrap a closure in a strong handle.
    pub fn new(f: impl Fn(&A) -> Result<(), ObserverError> + 'static) -> Self {
        let rc: Rc<CallbackFn<A>> = Rc::new(f);
        Self::Strong(rc)
    }

    /// Wrap an infallible closure in a strong handle.
    pub fn infallible(f: impl Fn(&A) + 'static) -> Self {
        Self::new(move |arg| {
            f(arg);
            Ok(())
        })
    }

    /// A weak handle to the same callback.
    ///
    /// The weak handle stays alive only while a strong handle (or the
    /// original `Rc`) exists elsewhere.
    #[must_use]
    pub fn downgrade(&self) -> Self {
        match self {
            Self::Strong(rc) => Self::Weak(Rc::downgrade(rc)),
            Self::Weak(weak) => Self::Weak(weak.clone()),
        }
    }

    #[must_use]
    pub fn is_weak(&self) -> bool {
        matches!(self, Self::Weak(_))
    }

    fn addr(&self) -> *const CallbackFn<A> {
        match self {
            Self::Strong(rc) => Rc::as_ptr(rc),
            Self::Weak(weak) => weak.as_ptr(),
        }
    }
}

impl<A: ?Sized + 'static> Clone for Handle<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Strong(rc) => Self::Strong(Rc::clone(rc)),
            Self::Weak(weak) => Self::Weak(weak.clone()),
        }
    }
}

impl<A: ?Sized + 'static> PartialEq for Handle<A> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.addr(), other.addr())
    }
}

impl<A: ?Sized + 'static> Eq for Handle<A> {}

impl<A: ?Sized + 'static> fmt::Debug for Handle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_weak() { "Weak" } else { "Strong" };
        f.debug_struct("Handle")
            .field("kind", &kind)
            .field("addr", &self.addr().cast::<()>())
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl<A: ?Sized + 'static> Observer for Handle<A> {
    type Arg = A;

    fn is_alive(&self) -> bool {
        match self {
            Self::Strong(_) => true,
            Self::Weak(weak) => weak.strong_count() > 0,
        }
    }

    /// A dead weak handle swallows the call.
    fn call(&self, arg: &A) -> Result<(), ObserverError> {
        match self {
            Self::Strong(rc) => rc(arg),
            Self::Weak(weak) => match weak.upgrade() {
                Some(rc) => rc(arg),
                None => Ok(()),
            },
        }
    }
}
