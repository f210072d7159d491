//! The notification gate: one bit per slot plus one instance-wide bit.
//!
//! Two packings are supported:
//!
//! - **Inline**: a single word. Slot `i` is bit `i`; the instance flag takes
//!   the highest bit, so at most [`MAX_INLINE_SLOTS`] slots are addressable.
//! - **Blocks**: `ceil((slot_count + 1) / WORD_BITS)` words. The instance
//!   flag is bit 0 and slot `i` is bit `i + 1`; bit `b` lives in word
//!   `b / WORD_BITS` at offset `b % WORD_BITS`.
//!
//! ```text
//! Inline (64-bit):   [I | s62 s61 ... s1 s0]
//! Blocks:            word0 = [s62 ... s1 s0 I]   word1 = [... s64 s63]
//! ```
//!
//! Words are `Cell`s so the gate can be toggled through a shared reference
//! while a hook is re-entering the owning atom.

use std::cell::Cell;
use std::fmt;

/// Bits per gate word.
pub const WORD_BITS: usize = usize::BITS as usize;

/// Largest slot count the inline packing can address.
pub const MAX_INLINE_SLOTS: usize = WORD_BITS - 1;

/// Bit of the instance flag in the inline word.
const INLINE_INSTANCE_BIT: usize = WORD_BITS - 1;

/// Number of gate words the block packing needs for `slot_count` slots.
///
/// Equal to `ceil((slot_count + 1) / WORD_BITS)`; the extra bit is the
/// instance flag. Defined for every `usize`.
#[must_use]
pub const fn block_count(slot_count: usize) -> usize {
    slot_count / WORD_BITS + 1
}

/// Which notify bit to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyScope {
    /// The instance-wide flag. When clear, no slot notifies.
    Instance,
    /// The flag of one slot.
    Slot(usize),
}

/// Requested gate packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Packing {
    /// Inline when the slot count fits, blocks otherwise.
    #[default]
    Auto,
    /// Single inline word. Fails for more than [`MAX_INLINE_SLOTS`] slots.
    Inline,
    /// Separately sized block of words.
    Blocks,
}

impl Packing {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Inline => "inline",
            Self::Blocks => "blocks",
        }
    }
}

impl fmt::Display for Packing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage for the notify bits of one atom.
///
/// Callers bounds-check slot indices against the owning atom before
/// addressing a bit.
pub(crate) enum NotifyBits {
    Inline(Cell<usize>),
    Blocks(Box<[Cell<usize>]>),
}

impl NotifyBits {
    pub(crate) fn inline() -> Self {
        Self::Inline(Cell::new(0))
    }

    pub(crate) fn blocks(words: Vec<Cell<usize>>) -> Self {
        Self::Blocks(words.into_boxed_slice())
    }

    pub(crate) fn packing(&self) -> Packing {
        match self {
            Self::Inline(_) => Packing::Inline,
            Self::Blocks(_) => Packing::Blocks,
        }
    }

    /// Words held outside the atom header (zero for inline packing).
    pub(crate) fn extra_words(&self) -> usize {
        match self {
            Self::Inline(_) => 0,
            Self::Blocks(words) => words.len(),
        }
    }

    pub(crate) fn get(&self, scope: NotifyScope) -> bool {
        let (word, mask) = self.locate(scope);
        word.get() & mask != 0
    }

    pub(crate) fn set(&self, scope: NotifyScope, enabled: bool) {
        let (word, mask) = self.locate(scope);
        let bits = word.get();
        word.set(if enabled { bits | mask } else { bits & !mask });
    }

    /// Set every bit covering `slot_count` slots plus the instance flag.
    pub(crate) fn set_all(&self, slot_count: usize, enabled: bool) {
        self.set(NotifyScope::Instance, enabled);
        for index in 0..slot_count {
            self.set(NotifyScope::Slot(index), enabled);
        }
    }

    fn locate(&self, scope: NotifyScope) -> (&Cell<usize>, usize) {
        match self {
            Self::Inline(word) => {
                let bit = match scope {
                    NotifyScope::Instance => INLINE_INSTANCE_BIT,
                    NotifyScope::Slot(index) => index,
                };
                debug_assert!(bit < WORD_BITS, "inline bit {bit} out of range");
                (word, 1usize << bit)
            }
            Self::Blocks(words) => {
                let bit = match scope {
                    NotifyScope::Instance => 0,
                    NotifyScope::Slot(index) => index + 1,
                };
                (&words[bit / WORD_BITS], 1usize << (bit % WORD_BITS))
            }
        }
    }
}

impl fmt::Debug for NotifyBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(word) => f
                .debug_tuple("Inline")
                .field(&format_args!("{:#b}", word.get()))
                .finish(),
            Self::Blocks(words) => {
                let mut list = f.debug_list();
                for word in words.iter() {
                    list.entry(&format_args!("{:#b}", word.get()));
                }
                list.finish()
            }
        }
    }
}
