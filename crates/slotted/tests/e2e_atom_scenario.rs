#![forbid(unsafe_code)]

//! End-to-end scenarios through the facade: a class with typed and
//! validated members, pool-backed observers, and weak observer expiry.

use std::cell::RefCell;
use std::rc::Rc;

use slotted::prelude::*;
use slotted::{AtomError, HookError, PoolNotifier};

type Log = Rc<RefCell<Vec<String>>>;

fn counter_class() -> Rc<slotted::AtomClass> {
    ClassBuilder::new("Counter")
        .member(
            "count",
            Member::int(Some(0))
                .with_validator(|_, _, v| match v {
                    Value::Int(i) if i < 0 => Err(HookError::rejected("count must be non-negative")),
                    Value::Int(_) => Ok(v),
                    other => Err(HookError::TypeMismatch {
                        expected: slotted::Kind::Int,
                        found: other.kind(),
                    }),
                })
                .listenable(true),
        )
        .member("label", Member::str(Some("unnamed")))
        .member("ratio", Member::float(None).listenable(true))
        .build()
}

fn recorder(log: &Log, tag: &'static str) -> Handle<slotted::Change> {
    let log = Rc::clone(log);
    Handle::infallible(move |change: &slotted::Change| {
        log.borrow_mut()
            .push(format!("{tag}:{}:{}->{}", change.name, change.old, change.new));
    })
}

#[test]
fn validated_member_round_trip() {
    let class = counter_class();
    let atom = class.instantiate().expect("atom");
    assert_eq!(class.member("count").expect("count").index(), 0);

    assert_eq!(atom.get_attr("label").expect("label"), Value::from("unnamed"));
    assert_eq!(atom.get_attr("count").expect("count"), Value::Int(0));

    atom.set_attr("count", 5i64).expect("accepted");
    let err = atom.set_attr("count", -1i64).expect_err("rejected");
    assert!(matches!(err, AtomError::ValidationRejected { .. }));
    assert!(!err.is_committed());
    assert_eq!(atom.get_attr("count").expect("count"), Value::Int(5));

    let err = atom.set_attr("count", "five").expect_err("wrong kind");
    assert!(matches!(err, AtomError::TypeMismatch { .. }));
    assert_eq!(atom.get_attr("count").expect("count"), Value::Int(5));
}

#[test]
fn pool_observers_see_gated_changes() {
    let class = counter_class();
    let atom = class.instantiate().expect("atom");
    let notifier = PoolNotifier::default();
    atom.set_notifier(Rc::new(notifier.clone()));

    let log = Log::default();
    notifier.observe("count", recorder(&log, "a"));
    notifier.observe("count", recorder(&log, "b"));
    notifier.observe("ratio", recorder(&log, "r"));

    // Gate closed: nothing is delivered.
    atom.set_attr("count", 1i64).expect("set");
    assert!(log.borrow().is_empty());

    atom.enable_notifications(NotifyScope::Instance).expect("instance");
    atom.enable_notifications(atom.member_scope("count").expect("scope"))
        .expect("count bit");
    atom.set_attr("count", 2i64).expect("set");
    atom.set_attr("count", 2i64).expect("unchanged");
    atom.set_attr("ratio", 0.5).expect("ratio bit still clear");
    atom.del_attr("count").expect("reset");

    assert_eq!(
        *log.borrow(),
        vec![
            "a:count:1->2".to_owned(),
            "b:count:1->2".to_owned(),
            "a:count:2->None".to_owned(),
            "b:count:2->None".to_owned(),
        ]
    );
    assert_eq!(atom.get_attr("count").expect("default again"), Value::Int(0));
}

#[test]
fn weak_observer_expires_on_next_notification() {
    let atom = counter_class().instantiate().expect("atom");
    let notifier = PoolNotifier::default();
    atom.set_notifier(Rc::new(notifier.clone()));
    atom.set_all_notifications(true);

    let log = Log::default();
    let strong = recorder(&log, "weak");
    notifier.observe("ratio", strong.downgrade());
    notifier.observe("ratio", recorder(&log, "kept"));

    atom.set_attr("ratio", 1.0).expect("set");
    drop(strong);
    atom.set_attr("ratio", 2.0).expect("set");

    assert_eq!(
        *log.borrow(),
        vec![
            "weak:ratio:None->1".to_owned(),
            "kept:ratio:None->1".to_owned(),
            "kept:ratio:1->2".to_owned(),
        ]
    );
    assert_eq!(notifier.pool().observer_count("ratio"), 1);
}

#[test]
fn failing_observer_surfaces_after_commit() {
    let atom = counter_class().instantiate().expect("atom");
    let notifier = PoolNotifier::default();
    atom.set_notifier(Rc::new(notifier.clone()));
    atom.set_all_notifications(true);
    notifier.observe(
        "count",
        Handle::new(|_: &slotted::Change| Err(slotted::ObserverError::failed("offline"))),
    );

    let err = atom.set_attr("count", 3i64).expect_err("observer fails");
    assert!(err.is_committed());
    assert_eq!(err.name(), Some("count"));
    assert_eq!(atom.get_attr("count").expect("count"), Value::Int(3));
}

#[test]
fn observer_reentering_atom_during_dispatch() {
    let atom = Rc::new(counter_class().instantiate().expect("atom"));
    let notifier = PoolNotifier::default();
    atom.set_notifier(Rc::new(notifier.clone()));
    atom.set_all_notifications(true);

    // Mirror every count change into the label; label is not listenable.
    let target = Rc::downgrade(&atom);
    notifier.observe(
        "count",
        Handle::new(move |change: &slotted::Change| {
            if let Some(atom) = target.upgrade() {
                atom.set_attr("label", format!("count={}", change.new))
                    .map_err(|e| slotted::ObserverError::failed(e.to_string()))?;
            }
            Ok(())
        }),
    );

    atom.set_attr("count", 7i64).expect("set");
    assert_eq!(atom.get_attr("label").expect("label"), Value::from("count=7"));
}

#[test]
fn pool_observer_rereads_committed_value() {
    let atom = Rc::new(counter_class().instantiate().expect("atom"));
    let notifier = PoolNotifier::default();
    atom.set_notifier(Rc::new(notifier.clone()));
    atom.set_all_notifications(true);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let target = Rc::downgrade(&atom);
    notifier.observe(
        "count",
        Handle::new(move |_: &slotted::Change| {
            if let Some(atom) = target.upgrade() {
                let current = atom
                    .get_attr("count")
                    .map_err(|e| slotted::ObserverError::failed(e.to_string()))?;
                sink.borrow_mut().push(current);
            }
            Ok(())
        }),
    );

    atom.set_attr("count", 5i64).expect("set");
    atom.set_attr("count", 8i64).expect("set");
    assert_eq!(*seen.borrow(), vec![Value::Int(5), Value::Int(8)]);
}

#[test]
fn drop_and_clear_release_values() {
    let shared: Rc<str> = Rc::from("shared label");
    let atom = counter_class().instantiate().expect("atom");
    atom.set_attr("label", Value::Str(Rc::clone(&shared)))
        .expect("set");
    assert_eq!(Rc::strong_count(&shared), 2);
    assert_eq!(atom.clear(), 1);
    assert_eq!(Rc::strong_count(&shared), 1);

    atom.set_attr("label", Value::Str(Rc::clone(&shared)))
        .expect("set");
    drop(atom);
    assert_eq!(Rc::strong_count(&shared), 1);
}
