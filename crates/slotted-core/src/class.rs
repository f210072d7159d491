//! Class layouts: the static name → slot-index table shared by every atom
//! of a class.
//!
//! A layout is built once with [`ClassBuilder`]. Members are numbered in
//! declaration order. A derived class starts from its base's layout, so
//! inherited members keep their indices and redeclaring a name reuses the
//! slot it already had.

use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::atom::{Atom, AtomConfig};
use crate::error::{AtomError, Result};
use crate::member::Member;

/// Immutable class layout.
pub struct AtomClass {
    name: String,
    members: Vec<Rc<Member>>,
    by_name: AHashMap<Rc<str>, usize>,
    base: Option<Rc<AtomClass>>,
}

impl AtomClass {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of slots every instance of this class carries.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Member bound to `name`.
    ///
    /// # Errors
    ///
    /// [`AtomError::UnknownMember`] if no member has that name.
    pub fn member(&self, name: &str) -> Result<&Rc<Member>> {
        self.by_name
            .get(name)
            .map(|&index| &self.members[index])
            .ok_or_else(|| AtomError::UnknownMember {
                name: name.to_owned(),
            })
    }

    /// Members in slot order.
    #[must_use]
    pub fn members(&self) -> &[Rc<Member>] {
        &self.members
    }

    #[must_use]
    pub fn base(&self) -> Option<&Rc<AtomClass>> {
        self.base.as_ref()
    }

    /// Whether `self` is `other` or derives from it.
    #[must_use]
    pub fn is_subclass_of(&self, other: &AtomClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, other) {
                return true;
            }
            current = class.base.as_deref();
        }
        false
    }

    /// New atom with one empty slot per member.
    pub fn instantiate(self: &Rc<Self>) -> Result<Atom> {
        self.instantiate_with(AtomConfig::default())
    }

    pub fn instantiate_with(self: &Rc<Self>, config: AtomConfig) -> Result<Atom> {
        Atom::for_class(Rc::clone(self), config)
    }
}

impl fmt::Debug for AtomClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomClass")
            .field("name", &self.name)
            .field(
                "members",
                &self.members.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .finish()
    }
}

/// Builder for [`AtomClass`].
///
/// # Example
///
/// ```
/// use slotted_core::{ClassBuilder, Member};
///
/// let point = ClassBuilder::new("Point")
///     .member("x", Member::int(Some(0)))
///     .member("y", Member::int(Some(0)))
///     .build();
/// let p = point.instantiate().unwrap();
/// p.set_attr("y", 4i64).unwrap();
/// assert_eq!(p.get_attr("y").unwrap().as_int(), Some(4));
/// ```
pub struct ClassBuilder {
    name: String,
    members: Vec<Rc<Member>>,
    by_name: AHashMap<Rc<str>, usize>,
    base: Option<Rc<AtomClass>>,
}

impl ClassBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            by_name: AHashMap::new(),
            base: None,
        }
    }

    /// Start from `base`'s layout.
    #[must_use]
    pub fn derive(name: impl Into<String>, base: &Rc<AtomClass>) -> Self {
        Self {
            name: name.into(),
            members: base.members.clone(),
            by_name: base.by_name.clone(),
            base: Some(Rc::clone(base)),
        }
    }

    /// Declare `member` under `name`, binding its name and slot index.
    ///
    /// A name that is already declared (here or in the base) is replaced
    /// in place and keeps its index.
    #[must_use]
    pub fn member(mut self, name: &str, mut member: Member) -> Self {
        let index = match self.by_name.get(name) {
            Some(&index) => index,
            None => {
                let index = self.members.len();
                self.by_name.insert(Rc::from(name), index);
                index
            }
        };
        member.set_name(name);
        member.set_index(index);
        let member = Rc::new(member);
        if index == self.members.len() {
            self.members.push(member);
        } else {
            self.members[index] = member;
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Rc<AtomClass> {
        Rc::new(AtomClass {
            name: self.name,
            members: self.members,
            by_name: self.by_name,
            base: self.base,
        })
    }
}
