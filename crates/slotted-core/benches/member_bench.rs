//! Benchmarks for the member access protocol.
//!
//! Run with: cargo bench -p slotted-core -- member

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::rc::Rc;

use slotted_core::{
    Atom, AtomConfig, Change, ClassBuilder, HookError, Member, NotifyScope, Packing, Value,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn counter_class(members: usize) -> Rc<slotted_core::AtomClass> {
    (0..members)
        .fold(ClassBuilder::new("Counters"), |builder, i| {
            builder.member(&format!("c{i}"), Member::int(Some(0)).listenable(true))
        })
        .build()
}

// ---------------------------------------------------------------------------
// 1. Cached reads
// ---------------------------------------------------------------------------

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("member/get");

    for count in [8u64, 63, 256] {
        group.throughput(Throughput::Elements(count));
        let class = counter_class(count as usize);
        let atom = class.instantiate().expect("atom");
        for member in class.members() {
            member.get(&atom).expect("warm default");
        }

        group.bench_with_input(BenchmarkId::new("by_descriptor", count), &(), |b, _| {
            b.iter(|| {
                let mut sum = 0i64;
                for member in class.members() {
                    if let Ok(Value::Int(i)) = member.get(&atom) {
                        sum = sum.wrapping_add(i);
                    }
                }
                black_box(sum)
            })
        });

        let names: Vec<String> = (0..count).map(|i| format!("c{i}")).collect();
        group.bench_with_input(BenchmarkId::new("by_name", count), &(), |b, _| {
            b.iter(|| {
                let mut sum = 0i64;
                for name in &names {
                    if let Ok(Value::Int(i)) = atom.get_attr(name) {
                        sum = sum.wrapping_add(i);
                    }
                }
                black_box(sum)
            })
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Writes with the gate closed and open
// ---------------------------------------------------------------------------

fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("member/set");
    let class = counter_class(8);

    for gated in [false, true] {
        let atom = class.instantiate().expect("atom");
        if gated {
            atom.set_notifier(Rc::new(
                |_: &Atom, change: &Change| -> Result<(), HookError> {
                    black_box(change);
                    Ok(())
                },
            ));
            atom.set_all_notifications(true);
        }
        let label = if gated { "notify" } else { "silent" };
        let member = Rc::clone(&class.members()[3]);

        group.bench_function(label, |b| {
            let mut n = 0i64;
            b.iter(|| {
                n = n.wrapping_add(1);
                member.set(&atom, black_box(n)).expect("set");
            })
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 3. Gate toggling per packing
// ---------------------------------------------------------------------------

fn bench_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("member/gate");

    for packing in [Packing::Inline, Packing::Blocks] {
        let atom = Atom::with_config(63, AtomConfig::default().with_packing(packing))
            .expect("atom");
        group.bench_function(packing.name(), |b| {
            b.iter(|| {
                for i in 0..63 {
                    atom.enable_notifications(NotifyScope::Slot(i)).expect("bit");
                }
                for i in 0..63 {
                    black_box(
                        atom.notifications_enabled(NotifyScope::Slot(i))
                            .expect("bit"),
                    );
                }
                atom.set_all_notifications(false);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get, bench_set, bench_gate);
criterion_main!(benches);
