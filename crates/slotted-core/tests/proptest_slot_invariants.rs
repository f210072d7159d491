#![forbid(unsafe_code)]

//! Property-based invariant tests for atoms and members.
//!
//! 0. A fresh atom is empty and silent, and its size follows the packing.
//! 1. Gate bits behave like an independent boolean per scope, for both
//!    packings, and never leak into neighbouring bits.
//! 2. Raw writes followed by reads match a `Vec<Option<Value>>` model.
//! 3. A listenable member reports exactly the writes that change the
//!    stored value, and only while the gate is open.
//! 4. Rejected writes never modify the slot.
//! 5. `clear` releases every held value.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use slotted_core::{
    Atom, AtomConfig, Change, ClassBuilder, HookError, MAX_INLINE_SLOTS, Member, NotifyScope,
    Packing, Value, block_count,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn packing() -> impl Strategy<Value = Packing> {
    prop_oneof![Just(Packing::Inline), Just(Packing::Blocks)]
}

fn small_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::None),
        any::<bool>().prop_map(Value::Bool),
        (-4i64..4).prop_map(Value::Int),
        "[ab]{0,2}".prop_map(Value::from),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 0. Construction and sizing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fresh_atom_empty_and_sized(slot_count in 0usize..300, packing in prop_oneof![Just(Packing::Auto), Just(Packing::Blocks)]) {
        let atom = Atom::with_config(slot_count, AtomConfig::default().with_packing(packing))
            .expect("atom");
        prop_assert!(atom.slots().is_empty());
        prop_assert!(!atom.notifications_enabled(NotifyScope::Instance).expect("instance"));
        for index in 0..slot_count {
            prop_assert_eq!(atom.read(index).expect("read"), None);
            prop_assert!(!atom.notifications_enabled(NotifyScope::Slot(index)).expect("bit"));
        }

        let resolved = match packing {
            Packing::Auto if slot_count <= MAX_INLINE_SLOTS => Packing::Inline,
            Packing::Auto => Packing::Blocks,
            other => other,
        };
        prop_assert_eq!(atom.packing(), resolved);
        let extra = match resolved {
            Packing::Blocks => block_count(slot_count) * std::mem::size_of::<usize>(),
            _ => 0,
        };
        prop_assert_eq!(
            atom.size_bytes(),
            std::mem::size_of::<Atom>() + slot_count * std::mem::size_of::<Option<Value>>() + extra
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Gate bits
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn gate_matches_bool_model(
        packing in packing(),
        slot_count in 0usize..63,
        toggles in proptest::collection::vec((any::<Option<u8>>(), any::<bool>()), 0..64),
    ) {
        let atom = Atom::with_config(slot_count, AtomConfig::default().with_packing(packing))
            .expect("atom");
        let mut instance = false;
        let mut slots = vec![false; slot_count];

        for (target, enabled) in toggles {
            match target {
                None => {
                    atom.set_notifications_enabled(NotifyScope::Instance, enabled).expect("instance");
                    instance = enabled;
                }
                Some(raw) => {
                    let index = usize::from(raw);
                    let result = atom.set_notifications_enabled(NotifyScope::Slot(index), enabled);
                    if index < slot_count {
                        prop_assert!(result.is_ok());
                        slots[index] = enabled;
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
            }
        }

        prop_assert_eq!(atom.notifications_enabled(NotifyScope::Instance).expect("instance"), instance);
        for (index, &expected) in slots.iter().enumerate() {
            prop_assert_eq!(
                atom.notifications_enabled(NotifyScope::Slot(index)).expect("slot"),
                expected,
                "slot {}", index
            );
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Raw slot model
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn raw_writes_match_model(
        slot_count in 1usize..16,
        writes in proptest::collection::vec((0usize..20, proptest::option::of(small_value())), 0..48),
    ) {
        let atom = Atom::new(slot_count).expect("atom");
        let mut model: Vec<Option<Value>> = vec![None; slot_count];

        for (index, value) in writes {
            let result = atom.write(index, value.clone());
            if index < slot_count {
                let old = std::mem::replace(&mut model[index], value);
                prop_assert_eq!(result.expect("in range"), old);
            } else {
                prop_assert!(result.is_err());
            }
        }

        for (index, expected) in model.iter().enumerate() {
            prop_assert_eq!(&atom.read(index).expect("read"), expected);
        }
        let occupied: Vec<(usize, Value)> = model
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.clone().map(|v| (i, v)))
            .collect();
        prop_assert_eq!(atom.slots(), occupied);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Change reporting
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn changes_reported_only_when_value_changes(
        steps in proptest::collection::vec((small_value(), any::<bool>()), 0..48),
    ) {
        let class = ClassBuilder::new("Probe")
            .member("v", Member::new().listenable(true))
            .build();
        let atom = class.instantiate().expect("atom");
        let seen: Rc<RefCell<Vec<Change>>> = Rc::default();
        let sink = Rc::clone(&seen);
        atom.set_notifier(Rc::new(move |_: &Atom, change: &Change| -> Result<(), HookError> {
            sink.borrow_mut().push(change.clone());
            Ok(())
        }));
        atom.enable_notifications(NotifyScope::Slot(0)).expect("slot");

        let mut current = Value::None;
        let mut expected = Vec::new();
        for (value, open) in steps {
            atom.set_notifications_enabled(NotifyScope::Instance, open).expect("instance");
            atom.set_attr("v", value.clone()).expect("set");
            if open && value != current {
                expected.push((current.clone(), value.clone()));
            }
            current = value;
        }

        let got: Vec<(Value, Value)> = seen
            .borrow()
            .iter()
            .map(|c| (c.old.clone(), c.new.clone()))
            .collect();
        prop_assert_eq!(got, expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Rejected writes
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn rejected_writes_leave_slot_untouched(values in proptest::collection::vec(-10i64..10, 1..32)) {
        let class = ClassBuilder::new("NonNegative")
            .member(
                "n",
                Member::int(Some(0)).with_validator(|_, _, v| match v {
                    Value::Int(i) if i < 0 => Err(HookError::rejected("negative")),
                    other => Ok(other),
                }),
            )
            .build();
        let atom = class.instantiate().expect("atom");

        let mut last = 0i64;
        for v in values {
            let result = atom.set_attr("n", v);
            if v < 0 {
                prop_assert!(result.is_err());
            } else {
                prop_assert!(result.is_ok());
                last = v;
            }
            prop_assert_eq!(atom.get_attr("n").expect("get"), Value::Int(last));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Release
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clear_releases_every_value(occupied in proptest::collection::vec(any::<bool>(), 0..40)) {
        let shared: Rc<str> = Rc::from("payload");
        let atom = Atom::new(occupied.len()).expect("atom");
        for (i, &fill) in occupied.iter().enumerate() {
            if fill {
                atom.write(i, Some(Value::Str(Rc::clone(&shared)))).expect("write");
            }
        }
        let filled = occupied.iter().filter(|f| **f).count();
        prop_assert_eq!(Rc::strong_count(&shared), filled + 1);
        prop_assert_eq!(atom.clear(), filled);
        prop_assert_eq!(Rc::strong_count(&shared), 1);
    }
}
