#![forbid(unsafe_code)]

//! The slot store.
//!
//! An [`Atom`] owns a fixed-length array of slots plus its notification
//! gate. The slot count is fixed at construction; a slot is addressed only
//! by index, names belong to the [`Member`](crate::Member) descriptors and
//! the optional [`AtomClass`] layout.
//!
//! # Design
//!
//! Every method takes `&self`. Slots live in a `RefCell` and gate words in
//! `Cell`s, so default, validate and notify hooks can re-enter the same
//! atom. A slot borrow is never held across a hook call.
//!
//! # Invariants
//!
//! 1. `slot_count` never changes after construction.
//! 2. A fresh atom has every slot empty and every notify bit clear.
//! 3. A slot is either empty (never written, or reset) or holds a value.
//! 4. `write` is unconditional; deduplication happens at the member layer.
//!
//! # Failure Modes
//!
//! - **Too many slots for inline packing**: [`AtomError::Configuration`].
//! - **Allocation failure**: [`AtomError::OutOfMemory`]; construction is
//!   abandoned and nothing leaks.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem::size_of;
use std::rc::Rc;

use crate::bits::{MAX_INLINE_SLOTS, NotifyBits, NotifyScope, Packing, block_count};
use crate::class::AtomClass;
use crate::error::{AtomError, HookError, Result};
use crate::member::Member;
use crate::notify::{Change, Notify};
use crate::value::Value;

/// Construction options for an [`Atom`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtomConfig {
    /// Gate packing (default: [`Packing::Auto`]).
    pub packing: Packing,
}

impl AtomConfig {
    #[must_use]
    pub fn with_packing(mut self, packing: Packing) -> Self {
        self.packing = packing;
        self
    }
}

/// Fixed-shape instance: indexed slots plus a notification gate.
pub struct Atom {
    slots: RefCell<Box<[Option<Value>]>>,
    bits: NotifyBits,
    notifier: RefCell<Option<Rc<dyn Notify>>>,
    class: Option<Rc<AtomClass>>,
}

impl Atom {
    // ── Constructors ─────────────────────────────────────────────────

    /// Create an atom with `slot_count` empty slots and automatic packing.
    ///
    /// # Errors
    ///
    /// [`AtomError::OutOfMemory`] if the slot storage cannot be allocated.
    pub fn new(slot_count: usize) -> Result<Self> {
        Self::with_config(slot_count, AtomConfig::default())
    }

    /// Create an atom with explicit configuration.
    ///
    /// # Errors
    ///
    /// [`AtomError::Configuration`] if `Packing::Inline` is requested for
    /// more than [`MAX_INLINE_SLOTS`] slots, [`AtomError::OutOfMemory`] if
    /// allocation fails.
    pub fn with_config(slot_count: usize, config: AtomConfig) -> Result<Self> {
        Self::build(slot_count, config, None)
    }

    pub(crate) fn for_class(class: Rc<AtomClass>, config: AtomConfig) -> Result<Self> {
        Self::build(class.member_count(), config, Some(class))
    }

    fn build(slot_count: usize, config: AtomConfig, class: Option<Rc<AtomClass>>) -> Result<Self> {
        let packing = match config.packing {
            Packing::Auto if slot_count <= MAX_INLINE_SLOTS => Packing::Inline,
            Packing::Auto => Packing::Blocks,
            Packing::Inline if slot_count > MAX_INLINE_SLOTS => {
                return Err(AtomError::Configuration {
                    slot_count,
                    packing: Packing::Inline,
                    max: MAX_INLINE_SLOTS,
                });
            }
            explicit => explicit,
        };

        let mut slots: Vec<Option<Value>> = Vec::new();
        slots
            .try_reserve_exact(slot_count)
            .map_err(|_| AtomError::OutOfMemory {
                bytes: slot_count.saturating_mul(size_of::<Option<Value>>()),
            })?;
        slots.resize_with(slot_count, || None);

        let bits = match packing {
            Packing::Blocks => {
                let count = block_count(slot_count);
                let mut words = Vec::new();
                words
                    .try_reserve_exact(count)
                    .map_err(|_| AtomError::OutOfMemory {
                        bytes: count.saturating_mul(size_of::<Cell<usize>>()),
                    })?;
                words.resize_with(count, || Cell::new(0));
                NotifyBits::blocks(words)
            }
            _ => NotifyBits::inline(),
        };

        let atom = Self {
            slots: RefCell::new(slots.into_boxed_slice()),
            bits,
            notifier: RefCell::new(None),
            class,
        };
        tracing::trace!(
            message = "atom.create",
            slot_count,
            packing = %atom.packing(),
            bytes = atom.size_bytes()
        );
        Ok(atom)
    }

    // ── Shape ────────────────────────────────────────────────────────

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Resolved gate packing (never [`Packing::Auto`]).
    #[must_use]
    pub fn packing(&self) -> Packing {
        self.bits.packing()
    }

    /// Bytes occupied by the atom header, its slot array, and any gate
    /// words stored outside the header.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        size_of::<Self>()
            + self.slot_count() * size_of::<Option<Value>>()
            + self.bits.extra_words() * size_of::<Cell<usize>>()
    }

    #[must_use]
    pub fn class(&self) -> Option<&Rc<AtomClass>> {
        self.class.as_ref()
    }

    // ── Raw slot access ──────────────────────────────────────────────

    /// Read slot `index`. `None` means the slot is empty.
    ///
    /// # Errors
    ///
    /// [`AtomError::AttributeIndexOutOfRange`] if `index >= slot_count`.
    pub fn read(&self, index: usize) -> Result<Option<Value>> {
        self.check_index(index)?;
        Ok(self.slot(index))
    }

    /// Unconditionally store `value` (or empty the slot with `None`),
    /// returning the displaced content. No hook runs.
    ///
    /// # Errors
    ///
    /// [`AtomError::AttributeIndexOutOfRange`] if `index >= slot_count`.
    pub fn write(&self, index: usize, value: Option<Value>) -> Result<Option<Value>> {
        self.check_index(index)?;
        Ok(self.replace_slot(index, value))
    }

    /// Every non-empty slot with its index.
    #[must_use]
    pub fn slots(&self) -> Vec<(usize, Value)> {
        self.slots
            .borrow()
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.clone().map(|v| (i, v)))
            .collect()
    }

    /// Empty every slot, releasing the values it held. Returns how many
    /// slots were non-empty. Notify bits are left untouched.
    pub fn clear(&self) -> usize {
        let released: Vec<Value> = self
            .slots
            .borrow_mut()
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        let count = released.len();
        drop(released);
        tracing::trace!(message = "atom.clear", released = count);
        count
    }

    pub(crate) fn slot(&self, index: usize) -> Option<Value> {
        self.slots.borrow()[index].clone()
    }

    pub(crate) fn replace_slot(&self, index: usize, value: Option<Value>) -> Option<Value> {
        std::mem::replace(&mut self.slots.borrow_mut()[index], value)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let slot_count = self.slot_count();
        if index < slot_count {
            return Ok(());
        }
        Err(AtomError::AttributeIndexOutOfRange {
            name: Rc::from(format!("#{index}")),
            index,
            slot_count,
        })
    }

    // ── Notification gate ────────────────────────────────────────────

    /// Whether the notify bit for `scope` is set.
    ///
    /// # Errors
    ///
    /// [`AtomError::AttributeIndexOutOfRange`] for a slot scope past the end.
    pub fn notifications_enabled(&self, scope: NotifyScope) -> Result<bool> {
        self.check_scope(scope)?;
        Ok(self.bits.get(scope))
    }

    /// Set or clear the notify bit for `scope`.
    ///
    /// # Errors
    ///
    /// [`AtomError::AttributeIndexOutOfRange`] for a slot scope past the end.
    pub fn set_notifications_enabled(&self, scope: NotifyScope, enabled: bool) -> Result<()> {
        self.check_scope(scope)?;
        self.bits.set(scope, enabled);
        Ok(())
    }

    /// Shorthand for `set_notifications_enabled(scope, true)`.
    pub fn enable_notifications(&self, scope: NotifyScope) -> Result<()> {
        self.set_notifications_enabled(scope, true)
    }

    /// Shorthand for `set_notifications_enabled(scope, false)`.
    pub fn disable_notifications(&self, scope: NotifyScope) -> Result<()> {
        self.set_notifications_enabled(scope, false)
    }

    /// Set or clear the instance bit and every slot bit at once.
    pub fn set_all_notifications(&self, enabled: bool) {
        self.bits.set_all(self.slot_count(), enabled);
    }

    /// Both the instance bit and the bit of slot `index` are set.
    pub(crate) fn gate_open(&self, index: usize) -> bool {
        self.bits.get(NotifyScope::Instance) && self.bits.get(NotifyScope::Slot(index))
    }

    fn check_scope(&self, scope: NotifyScope) -> Result<()> {
        match scope {
            NotifyScope::Instance => Ok(()),
            NotifyScope::Slot(index) => self.check_index(index),
        }
    }

    // ── Notify hook ──────────────────────────────────────────────────

    /// Install the notify hook, returning the previous one.
    pub fn set_notifier(&self, notifier: Rc<dyn Notify>) -> Option<Rc<dyn Notify>> {
        self.notifier.borrow_mut().replace(notifier)
    }

    /// Remove the notify hook.
    pub fn take_notifier(&self) -> Option<Rc<dyn Notify>> {
        self.notifier.borrow_mut().take()
    }

    #[must_use]
    pub fn has_notifier(&self) -> bool {
        self.notifier.borrow().is_some()
    }

    /// Run the notify hook for `change`. Does nothing when no hook is
    /// installed.
    ///
    /// The hook is cloned out first, so it may replace itself.
    pub fn notify(&self, change: &Change) -> std::result::Result<(), HookError> {
        let notifier = self.notifier.borrow().clone();
        match notifier {
            Some(notifier) => notifier.notify(self, change),
            None => Ok(()),
        }
    }

    // ── Name-based access (class-backed atoms) ───────────────────────

    /// Member descriptor bound to `name` in this atom's class.
    ///
    /// # Errors
    ///
    /// [`AtomError::UnknownMember`] if the atom has no class or the class
    /// declares no such member.
    pub fn lookup_member(&self, name: &str) -> Result<&Rc<Member>> {
        match &self.class {
            Some(class) => class.member(name),
            None => Err(AtomError::UnknownMember {
                name: name.to_owned(),
            }),
        }
    }

    /// Notify scope of the slot bound to `name`.
    pub fn member_scope(&self, name: &str) -> Result<NotifyScope> {
        Ok(NotifyScope::Slot(self.lookup_member(name)?.index()))
    }

    /// `lookup_member(name)?.get(self)`.
    pub fn get_attr(&self, name: &str) -> Result<Value> {
        self.lookup_member(name)?.get(self)
    }

    /// `lookup_member(name)?.set(self, value)`.
    pub fn set_attr(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.lookup_member(name)?.set(self, value)
    }

    /// `lookup_member(name)?.reset(self)`.
    pub fn del_attr(&self, name: &str) -> Result<()> {
        self.lookup_member(name)?.reset(self)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("class", &self.class.as_ref().map(|c| c.name()))
            .field("slots", &self.slots.borrow())
            .field("bits", &self.bits)
            .field("has_notifier", &self.has_notifier())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
