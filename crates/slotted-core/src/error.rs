use std::rc::Rc;

use slotted_pool::PoolError;
use thiserror::Error;

use crate::bits::Packing;
use crate::value::Kind;

pub type Result<T> = std::result::Result<T, AtomError>;

/// Failure signalled by a default, validate, or notify hook.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HookError {
    #[error("rejected: {message}")]
    Rejected { message: String },

    #[error("expected {expected}, got {found}")]
    TypeMismatch { expected: Kind, found: Kind },

    #[error("{message}")]
    Failed { message: String },

    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl HookError {
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Errors surfaced by atom construction and member access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AtomError {
    /// The slot count cannot be represented by the requested packing.
    #[error("{slot_count} slots exceed the {packing} packing limit of {max}")]
    Configuration {
        slot_count: usize,
        packing: Packing,
        max: usize,
    },

    #[error("out of memory allocating {bytes} bytes of slot storage")]
    OutOfMemory { bytes: usize },

    /// The member's index does not address a slot of this atom: the
    /// descriptor is stale or belongs to another class.
    #[error("no attribute `{name}`: index {index} out of range for {slot_count} slots")]
    AttributeIndexOutOfRange {
        name: Rc<str>,
        index: usize,
        slot_count: usize,
    },

    #[error("`{name}` expects {expected}, got {found}")]
    TypeMismatch {
        name: Rc<str>,
        expected: Kind,
        found: Kind,
    },

    /// The validate hook refused the value. The slot was not modified.
    #[error("validation of `{name}` rejected the value: {source}")]
    ValidationRejected {
        name: Rc<str>,
        #[source]
        source: HookError,
    },

    /// The notify hook failed. The slot write that triggered it has
    /// already been committed and is not rolled back.
    #[error("notification for `{name}` failed after the write was committed: {source}")]
    NotificationFailed {
        name: Rc<str>,
        #[source]
        source: HookError,
    },

    /// The default hook failed. The slot is left empty.
    #[error("default for `{name}` failed: {source}")]
    DefaultFailed {
        name: Rc<str>,
        #[source]
        source: HookError,
    },

    #[error("unknown member `{name}`")]
    UnknownMember { name: String },
}

impl AtomError {
    /// Attribute name the error refers to, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::AttributeIndexOutOfRange { name, .. }
            | Self::TypeMismatch { name, .. }
            | Self::ValidationRejected { name, .. }
            | Self::NotificationFailed { name, .. }
            | Self::DefaultFailed { name, .. } => Some(&**name),
            Self::UnknownMember { name } => Some(name.as_str()),
            Self::Configuration { .. } | Self::OutOfMemory { .. } => None,
        }
    }

    /// Whether the slot write was committed despite the error.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::NotificationFailed { .. })
    }
}
