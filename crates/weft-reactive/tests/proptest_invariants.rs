//! Property-based invariant tests for the reactive core.
//!
//! These verify counting contracts that must hold for any mutation
//! sequence:
//!
//! 1. A property subscriber fires exactly once per `set` whose new value
//!    differs from the immediately preceding stored value, zero otherwise.
//! 2. `synchronize_for_property` adds exactly one immediate invocation on
//!    top of the subscribe-only count.
//! 3. A fire-once subscriber fires at most once across any number of
//!    fires.
//! 4. `synchronize_for_scope` accounting: replay equals the pre-existing
//!    element count, `on_changed` equals one (replay batch) plus one per
//!    individual post-registration addition or removal.
//! 5. Scope disposal always wins: zero invocations after `dispose()`
//!    returns, for any later mutation sequence.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use weft_reactive::{Entity, Scope, Sequence, Signal, Value};

// ── Strategies ────────────────────────────────────────────────────────────

/// Small value domain so equal-value writes actually occur.
fn small_values(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(0i64..4, 0..=max_len)
}

#[derive(Debug, Clone)]
enum SeqOp {
    Push(i64),
    RemoveAt(usize),
    Set(usize, i64),
    Clear,
}

fn seq_ops(max_len: usize) -> impl Strategy<Value = Vec<SeqOp>> {
    let op = prop_oneof![
        (0i64..100).prop_map(SeqOp::Push),
        (0usize..8).prop_map(SeqOp::RemoveAt),
        ((0usize..8), (0i64..100)).prop_map(|(i, v)| SeqOp::Set(i, v)),
        Just(SeqOp::Clear),
    ];
    proptest::collection::vec(op, 0..=max_len)
}

// ── Entity notification counting ──────────────────────────────────────────

proptest! {
    #[test]
    fn subscriber_fires_once_per_differing_set(values in small_values(40)) {
        let entity = Entity::new();
        let scope = Scope::new();
        let count = Rc::new(Cell::new(0u32));
        {
            let count = Rc::clone(&count);
            entity.subscribe_for_property("p", move |_| count.set(count.get() + 1), &scope);
        }

        let mut expected = 0u32;
        let mut stored = Value::Null;
        for v in values {
            let value = Value::Int(v);
            if value != stored {
                expected += 1;
            }
            stored = value.clone();
            entity.set("p", value);
        }
        prop_assert_eq!(count.get(), expected);
    }
}

proptest! {
    #[test]
    fn synchronize_adds_exactly_one_immediate_invocation(values in small_values(40)) {
        let entity = Entity::new();
        let sub_count = Rc::new(Cell::new(0u32));
        let sync_count = Rc::new(Cell::new(0u32));
        let scope = Scope::new();
        {
            let count = Rc::clone(&sub_count);
            entity.subscribe_for_property("p", move |_| count.set(count.get() + 1), &scope);
        }
        {
            let count = Rc::clone(&sync_count);
            entity.synchronize_for_property("p", move |_| count.set(count.get() + 1), &scope);
        }

        for v in values {
            entity.set("p", v);
        }
        prop_assert_eq!(sync_count.get(), sub_count.get() + 1);
    }
}

proptest! {
    #[test]
    fn fire_once_fires_at_most_once(fires in 0usize..10) {
        let signal: Signal<()> = Signal::new();
        let count = Rc::new(Cell::new(0u32));
        {
            let count = Rc::clone(&count);
            let _ = signal.subscribe_once(move |_| count.set(count.get() + 1));
        }

        for _ in 0..fires {
            signal.fire(&());
        }
        prop_assert_eq!(count.get(), u32::from(fires > 0));
    }
}

// ── Sequence synchronize accounting ───────────────────────────────────────

struct Accounting {
    added: Cell<u32>,
    removed: Cell<u32>,
    changed: Cell<u32>,
}

fn synchronize_counting(seq: &Sequence<i64>, scope: &Scope) -> Rc<Accounting> {
    let acc = Rc::new(Accounting {
        added: Cell::new(0),
        removed: Cell::new(0),
        changed: Cell::new(0),
    });
    let a = Rc::clone(&acc);
    let r = Rc::clone(&acc);
    let c = Rc::clone(&acc);
    seq.synchronize_for_scope(
        move |_| a.added.set(a.added.get() + 1),
        move |_| r.removed.set(r.removed.get() + 1),
        move || c.changed.set(c.changed.get() + 1),
        scope,
    );
    acc
}

/// Apply an op if its index is in range; returns (adds, removes) performed.
fn apply(seq: &Sequence<i64>, op: &SeqOp) -> (u32, u32) {
    match op {
        SeqOp::Push(v) => {
            seq.push(*v);
            (1, 0)
        }
        SeqOp::RemoveAt(i) => {
            if *i < seq.len() {
                seq.remove_at(*i);
                (0, 1)
            } else {
                (0, 0)
            }
        }
        SeqOp::Set(i, v) => {
            if *i < seq.len() {
                seq.set(*i, *v);
                (1, 1)
            } else {
                (0, 0)
            }
        }
        SeqOp::Clear => {
            let len = u32::try_from(seq.len()).expect("test sequences are small");
            seq.clear();
            (0, len)
        }
    }
}

proptest! {
    #[test]
    fn synchronize_accounting_holds(
        initial in proptest::collection::vec(0i64..100, 0..6),
        ops in seq_ops(24),
    ) {
        let seq = Sequence::new();
        for v in &initial {
            seq.push(*v);
        }
        let scope = Scope::new();
        let acc = synchronize_counting(&seq, &scope);

        let replay = u32::try_from(initial.len()).expect("small");
        prop_assert_eq!(acc.added.get(), replay);
        prop_assert_eq!(acc.changed.get(), 1);

        let mut adds = 0u32;
        let mut removes = 0u32;
        for op in &ops {
            let (a, r) = apply(&seq, op);
            adds += a;
            removes += r;
        }

        prop_assert_eq!(acc.added.get(), replay + adds);
        prop_assert_eq!(acc.removed.get(), removes);
        prop_assert_eq!(acc.changed.get(), 1 + adds + removes);
    }
}

proptest! {
    #[test]
    fn disposal_always_wins(
        before in seq_ops(12),
        after in seq_ops(12),
    ) {
        let seq = Sequence::new();
        let scope = Scope::new();
        let acc = synchronize_counting(&seq, &scope);

        for op in &before {
            apply(&seq, op);
        }
        let added_at_disposal = acc.added.get();
        let removed_at_disposal = acc.removed.get();
        let changed_at_disposal = acc.changed.get();

        scope.dispose();
        for op in &after {
            apply(&seq, op);
        }

        prop_assert_eq!(acc.added.get(), added_at_disposal);
        prop_assert_eq!(acc.removed.get(), removed_at_disposal);
        prop_assert_eq!(acc.changed.get(), changed_at_disposal);
    }
}

proptest! {
    #[test]
    fn property_scope_disposal_always_wins(
        before in small_values(12),
        after in small_values(12),
    ) {
        let entity = Entity::new();
        let scope = Scope::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = Rc::clone(&log);
            entity.subscribe_for_property(
                "p",
                move |change| log.borrow_mut().push(change.value.clone()),
                &scope,
            );
        }

        for v in before {
            entity.set("p", v);
        }
        let len_at_disposal = log.borrow().len();

        scope.dispose();
        for v in after {
            entity.set("p", v);
        }
        prop_assert_eq!(log.borrow().len(), len_at_disposal);
    }
}
