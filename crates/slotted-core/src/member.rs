#![forbid(unsafe_code)]

//! Member descriptors.
//!
//! A [`Member`] binds a name to one slot index and carries the optional
//! default and validate hooks plus the flags that switch them on. The same
//! descriptor serves every atom of its class; all per-instance state lives
//! in the atom.
//!
//! # Access protocol
//!
//! | Operation | Steps |
//! |-----------|-------|
//! | `get`     | bounds check, read slot, on empty run default and cache it |
//! | `set`     | bounds check, validate, write, then notify if gated and changed |
//! | `reset`   | bounds check, empty the slot, then notify if gated and it held a value |
//!
//! A flag set without a matching hook behaves as if the flag were clear.
//!
//! # Failure Modes
//!
//! - A failing default leaves the slot empty.
//! - A failing validate leaves the slot untouched.
//! - A failing notify happens after the write: the new value stays
//!   committed and [`AtomError::NotificationFailed`] is returned.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::atom::Atom;
use crate::error::{AtomError, HookError, Result};
use crate::notify::Change;
use crate::value::{Kind, Value};

/// Name of a member that has not been bound into a class.
pub const UNDEFINED_NAME: &str = "<undefined>";

bitflags! {
    /// Per-member capability flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u8 {
        /// Run the default hook on a read of an empty slot.
        const HAS_DEFAULT = 1 << 0;
        /// Run the validate hook before every write.
        const HAS_VALIDATE = 1 << 1;
        /// Writes may produce change notifications.
        const LISTENABLE = 1 << 2;
    }
}

type DefaultFn = dyn Fn(&Atom, &str) -> std::result::Result<Value, HookError>;
type ValidateFn = dyn Fn(&Atom, &str, Value) -> std::result::Result<Value, HookError>;

/// Descriptor for one named slot.
#[derive(Clone)]
pub struct Member {
    name: Rc<str>,
    index: usize,
    flags: MemberFlags,
    default: Option<Rc<DefaultFn>>,
    validate: Option<Rc<ValidateFn>>,
}

impl Default for Member {
    fn default() -> Self {
        Self::new()
    }
}

impl Member {
    /// An unbound member: name [`UNDEFINED_NAME`], index 0, no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: Rc::from(UNDEFINED_NAME),
            index: 0,
            flags: MemberFlags::empty(),
            default: None,
            validate: None,
        }
    }

    // ── Builders ─────────────────────────────────────────────────────

    /// Use `value` as the default. Every atom caches a shared clone.
    #[must_use]
    pub fn with_default(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.with_factory(move |_, _| Ok(value.clone()))
    }

    /// Compute the default lazily on first read of an empty slot.
    #[must_use]
    pub fn with_factory(
        mut self,
        factory: impl Fn(&Atom, &str) -> std::result::Result<Value, HookError> + 'static,
    ) -> Self {
        let hook: Rc<DefaultFn> = Rc::new(factory);
        self.default = Some(hook);
        self.flags.insert(MemberFlags::HAS_DEFAULT);
        self
    }

    /// Run `validator` on every write. It may coerce the value or reject it.
    #[must_use]
    pub fn with_validator(
        mut self,
        validator: impl Fn(&Atom, &str, Value) -> std::result::Result<Value, HookError> + 'static,
    ) -> Self {
        let hook: Rc<ValidateFn> = Rc::new(validator);
        self.validate = Some(hook);
        self.flags.insert(MemberFlags::HAS_VALIDATE);
        self
    }

    /// Constrain the member to values of `kind`.
    ///
    /// Installs a kind check unless a validator is already present, and
    /// [`Kind::zero`] as default unless a default is already present.
    #[must_use]
    pub fn with_kind(self, kind: Kind) -> Self {
        let this = if self.validate.is_some() {
            self
        } else {
            self.with_validator(move |_, _, value| {
                if value.kind() == kind {
                    Ok(value)
                } else {
                    Err(HookError::TypeMismatch {
                        expected: kind,
                        found: value.kind(),
                    })
                }
            })
        };
        if this.default.is_some() {
            this
        } else {
            this.with_default(kind.zero())
        }
    }

    #[must_use]
    pub fn listenable(mut self, listenable: bool) -> Self {
        self.set_listenable(listenable);
        self
    }

    // ── Typed constructors ───────────────────────────────────────────

    #[must_use]
    pub fn bool(default: Option<bool>) -> Self {
        Self::typed(Kind::Bool, default.map(Value::from))
    }

    #[must_use]
    pub fn int(default: Option<i64>) -> Self {
        Self::typed(Kind::Int, default.map(Value::from))
    }

    #[must_use]
    pub fn float(default: Option<f64>) -> Self {
        Self::typed(Kind::Float, default.map(Value::from))
    }

    #[must_use]
    pub fn str(default: Option<&str>) -> Self {
        Self::typed(Kind::Str, default.map(Value::from))
    }

    fn typed(kind: Kind, default: Option<Value>) -> Self {
        let member = match default {
            Some(value) => Self::new().with_default(value),
            None => Self::new(),
        };
        member.with_kind(kind)
    }

    // ── Accessors ────────────────────────────────────────────────────

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<Rc<str>>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    #[must_use]
    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.flags.contains(MemberFlags::HAS_DEFAULT)
    }

    pub fn set_has_default(&mut self, enabled: bool) {
        self.flags.set(MemberFlags::HAS_DEFAULT, enabled);
    }

    #[must_use]
    pub fn has_validate(&self) -> bool {
        self.flags.contains(MemberFlags::HAS_VALIDATE)
    }

    pub fn set_has_validate(&mut self, enabled: bool) {
        self.flags.set(MemberFlags::HAS_VALIDATE, enabled);
    }

    #[must_use]
    pub fn is_listenable(&self) -> bool {
        self.flags.contains(MemberFlags::LISTENABLE)
    }

    pub fn set_listenable(&mut self, enabled: bool) {
        self.flags.set(MemberFlags::LISTENABLE, enabled);
    }

    // ── Access protocol ──────────────────────────────────────────────

    /// Read the member's slot on `owner`.
    ///
    /// An empty slot is filled from the default hook (or with
    /// [`Value::None`] when there is none) and the result is cached, so
    /// later reads return the same shared value.
    ///
    /// # Errors
    ///
    /// [`AtomError::AttributeIndexOutOfRange`] if the index does not fit
    /// `owner`, [`AtomError::DefaultFailed`] if the default hook fails.
    pub fn get(&self, owner: &Atom) -> Result<Value> {
        self.check_index(owner)?;
        if let Some(value) = owner.slot(self.index) {
            return Ok(value);
        }

        let value = match self.default_hook() {
            Some(hook) => {
                tracing::trace!(message = "member.default", name = %self.name, index = self.index);
                hook(owner, self.name()).map_err(|source| AtomError::DefaultFailed {
                    name: Rc::clone(&self.name),
                    source,
                })?
            }
            None => Value::None,
        };
        owner.replace_slot(self.index, Some(value.clone()));
        Ok(value)
    }

    /// Write `value` to the member's slot on `owner`.
    ///
    /// # Errors
    ///
    /// - [`AtomError::AttributeIndexOutOfRange`]: nothing happened.
    /// - [`AtomError::TypeMismatch`] / [`AtomError::ValidationRejected`]:
    ///   the slot was not modified.
    /// - [`AtomError::NotificationFailed`]: the write is committed.
    pub fn set(&self, owner: &Atom, value: impl Into<Value>) -> Result<()> {
        self.check_index(owner)?;
        let mut value = value.into();

        if let Some(hook) = self.validate_hook() {
            value = hook(owner, self.name(), value).map_err(|source| {
                tracing::debug!(message = "member.validate_rejected", name = %self.name, index = self.index);
                self.rejection(source)
            })?;
        }

        let old = owner.replace_slot(self.index, Some(value.clone()));
        self.emit(owner, old, value)
    }

    /// Empty the member's slot on `owner`. The next `get` runs the
    /// default again.
    ///
    /// # Errors
    ///
    /// [`AtomError::AttributeIndexOutOfRange`] or, after the slot has been
    /// emptied, [`AtomError::NotificationFailed`].
    pub fn reset(&self, owner: &Atom) -> Result<()> {
        self.check_index(owner)?;
        let old = owner.replace_slot(self.index, None);
        self.emit(owner, old, Value::None)
    }

    fn emit(&self, owner: &Atom, old: Option<Value>, new: Value) -> Result<()> {
        if !self.is_listenable() || !owner.gate_open(self.index) {
            return Ok(());
        }
        let old = old.unwrap_or_default();
        if old == new {
            return Ok(());
        }
        let change = Change {
            name: Rc::clone(&self.name),
            old,
            new,
        };
        owner.notify(&change).map_err(|source| {
            tracing::debug!(message = "member.notify_failed", name = %self.name, index = self.index);
            AtomError::NotificationFailed {
                name: Rc::clone(&self.name),
                source,
            }
        })
    }

    fn rejection(&self, source: HookError) -> AtomError {
        let name = Rc::clone(&self.name);
        match source {
            HookError::TypeMismatch { expected, found } => AtomError::TypeMismatch {
                name,
                expected,
                found,
            },
            source => AtomError::ValidationRejected { name, source },
        }
    }

    fn check_index(&self, owner: &Atom) -> Result<()> {
        let slot_count = owner.slot_count();
        if self.index < slot_count {
            return Ok(());
        }
        Err(AtomError::AttributeIndexOutOfRange {
            name: Rc::clone(&self.name),
            index: self.index,
            slot_count,
        })
    }

    fn default_hook(&self) -> Option<&Rc<DefaultFn>> {
        self.default.as_ref().filter(|_| self.has_default())
    }

    fn validate_hook(&self) -> Option<&Rc<ValidateFn>> {
        self.validate.as_ref().filter(|_| self.has_validate())
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("flags", &self.flags)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
