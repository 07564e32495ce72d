//! End-to-end flows across the toolkit: store snapshots fed through the
//! deep utilities and the caches, the way application code composes them.

use std::cell::Cell;
use std::rc::Rc;

use statekit_core::{deep, ActionTable, ClockSource, DiffEntry, MemoryMedium, Store, TtlCache, Value};

struct ManualClock {
    millis: Cell<i64>,
}

impl ClockSource for ManualClock {
    fn now(&self) -> i64 {
        self.millis.get()
    }
}

fn profile_store() -> Store<Value> {
    Store::new(
        Value::map([
            ("name", Value::from("anonymous")),
            ("visits", Value::Int(0)),
        ]),
        ActionTable::new()
            .with_action("rename", |state: &Value, payload: Option<&Value>| {
                let next = deep::clone(state);
                next.insert("name", payload.cloned().unwrap_or(Value::Null));
                next
            })
            .with_action("visit", |state: &Value, _| {
                let next = deep::clone(state);
                let visits = next.get("visits").and_then(|v| v.as_int()).unwrap_or(0);
                next.insert("visits", Value::Int(visits + 1));
                next
            }),
    )
}

#[test]
fn diffing_two_store_snapshots_reports_only_what_dispatches_changed() {
    let store = profile_store();
    let before = store.get_state();

    store.dispatch("visit", None);
    store.dispatch("rename", Some(&Value::from("Ada")));
    let after = store.get_state();

    let changes = deep::diff(&before, &after);
    assert_eq!(changes.len(), 2);
    assert!(matches!(changes.get("name"), Some(DiffEntry::Changed(_))));
    assert!(matches!(changes.get("visits"), Some(DiffEntry::Changed(_))));

    // Replaying the changes onto the old snapshot reproduces the new one.
    let replayed = deep::clone(&before);
    deep::apply(&replayed, &changes);
    assert!(deep::equal(&replayed, &after));
}

#[test]
fn snapshots_are_isolated_because_reducers_return_fresh_values() {
    let store = profile_store();
    let snapshot = store.get_state();

    store.dispatch("visit", None);
    store.dispatch("visit", None);

    // The earlier snapshot is untouched by later dispatches.
    assert_eq!(snapshot.get("visits").and_then(|v| v.as_int()), Some(0));
    assert_eq!(store.get_state().get("visits").and_then(|v| v.as_int()), Some(2));
}

#[test]
fn store_state_survives_a_ttl_cache_round_trip() {
    let clock = Rc::new(ManualClock {
        millis: Cell::new(0),
    });
    let cache = TtlCache::with_clock(Rc::new(MemoryMedium::new()), clock.clone());
    let store = profile_store();
    store.dispatch("rename", Some(&Value::from("Grace")));

    assert!(cache.set("profile", &store.get_state(), 5_000));

    clock.millis.set(4_999);
    let cached = cache.get("profile").expect("still inside the ttl");
    assert!(deep::equal(&cached, &store.get_state()));

    clock.millis.set(5_000);
    assert!(cache.get("profile").is_none(), "snapshot expired with its ttl");
}

#[test]
fn subscriber_driven_cache_write_through() {
    let clock = Rc::new(ManualClock {
        millis: Cell::new(0),
    });
    let cache = Rc::new(TtlCache::with_clock(Rc::new(MemoryMedium::new()), clock));
    let store = profile_store();

    // A subscriber persisting every new state is the intended composition:
    // notification hands it exactly the value get_state would return.
    let sink = cache.clone();
    let _sub = store.subscribe(move |state: &Value| {
        sink.set("profile", state, 60_000);
    });

    store.dispatch("visit", None);
    let persisted = cache.get("profile").expect("written during notification");
    assert_eq!(persisted.get("visits").and_then(|v| v.as_int()), Some(1));
}
