//! Re-entrant mutation through SharedMap.
//!
//! Mutations requested by listeners are applied after the running cascade,
//! in request order. These tests pin that ordering down.

use std::{cell::RefCell, rc::Rc};

use nestmap::{
    Applied, EventKind, EventKinds, Observable, SharedMap, Value, WeakSharedMap, path,
};

use crate::helpers::*;

type Log = Rc<RefCell<Vec<String>>>;

fn logging_listener(shared: &SharedMap, label: &'static str, log: &Log) {
    let log = Rc::clone(log);
    shared
        .subscribe(EventKinds::ALL, move |event| {
            log.borrow_mut()
                .push(format!("{label} {} {}", event.kind(), event.path()))
        })
        .unwrap();
}

/// Subscribe a listener that adds `value` at `to` whenever something is
/// added at `from`.
fn forward(shared: &SharedMap, from: &'static str, to: &'static str) {
    let weak: WeakSharedMap = shared.downgrade();
    shared
        .subscribe(EventKind::Add, move |event| {
            if event.path() != &path![from] {
                return;
            }
            let (Some(map), Some(value)) = (weak.upgrade(), event.value()) else {
                return;
            };
            let applied = map.add(path![to], value).unwrap();
            assert!(applied.is_queued());
        })
        .unwrap();
}

#[test]
fn test_outer_cascade_finishes_before_queued_mutation() {
    let shared = SharedMap::new(Default::default());
    let log = Log::default();
    logging_listener(&shared, "first", &log);
    forward(&shared, "in", "out");
    logging_listener(&shared, "second", &log);

    let applied = shared.add(path!["in"], 1).unwrap();

    assert_eq!(applied, Applied::Now(()));
    assert_eq!(
        *log.borrow(),
        vec!["first add in", "second add in", "first add out", "second add out"]
    );
    assert_eq!(shared.size().unwrap(), 2);
    assert_eq!(shared.pending_count(), 0);
}

#[test]
fn test_chained_mutations_run_in_request_order() {
    let shared = SharedMap::new(Default::default());
    let log = Log::default();
    forward(&shared, "a", "b");
    forward(&shared, "a", "c");
    forward(&shared, "b", "d");
    logging_listener(&shared, "seen", &log);

    shared.add(path!["a"], 1).unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["seen add a", "seen add b", "seen add c", "seen add d"]
    );
    assert_eq!(shared.size().unwrap(), 4);
}

#[test]
fn test_prune_cascade_completes_before_queued_mutation() {
    let shared = SharedMap::new(purging());
    shared.add(path!["a", "b", "c"], 1).unwrap();

    let log = Log::default();
    let weak = shared.downgrade();
    let requested = Rc::new(RefCell::new(false));
    let once = Rc::clone(&requested);
    shared
        .subscribe(EventKind::Delete, move |_| {
            if once.replace(true) {
                return;
            }
            if let Some(map) = weak.upgrade() {
                map.add(path!["log"], "deleted").unwrap();
            }
        })
        .unwrap();
    logging_listener(&shared, "seen", &log);

    shared
        .delete_value(path!["a", "b", "c"], 1)
        .unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            "seen delete a.b.c",
            "seen delete a.b.c",
            "seen delete a.b",
            "seen delete a",
            "seen add log",
        ]
    );
    let has_log = shared
        .read(|map| map.has_value(path!["log"], &Value::from("deleted")))
        .unwrap();
    assert!(has_log);
}

#[test]
fn test_listener_on_nested_container_can_mutate() {
    let shared = SharedMap::new(Default::default());
    shared.add(path!["a", "b"], 1).unwrap();

    let weak = shared.downgrade();
    shared
        .read(|map| {
            map.get_map(path!["a"]).unwrap().subscribe(EventKind::Add, move |_| {
                if let Some(map) = weak.upgrade() {
                    assert!(map.add(path!["audit"], "touched").unwrap().is_queued());
                }
            })
        })
        .unwrap();

    shared.add(path!["a", "b"], 2).unwrap();

    assert_eq!(shared.size().unwrap(), 3);
}

#[test]
fn test_queued_failure_is_reported_not_raised() {
    let shared = SharedMap::new(Default::default());
    shared.add(path!["x"], 5).unwrap();
    let weak = shared.downgrade();
    shared
        .subscribe(EventKind::Add, move |event| {
            if event.path() == &path!["trigger"] {
                if let Some(map) = weak.upgrade() {
                    map.add(path!["x", "y"], 6).unwrap();
                }
            }
        })
        .unwrap();

    assert!(shared.add(path!["trigger"], 1).is_ok());

    let errors = shared.take_deferred_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_type_error());
    assert_eq!(errors[0].path(), Some(&path!["x"]));
    assert_eq!(shared.size().unwrap(), 2);
}

#[test]
fn test_subscribe_during_cascade_is_busy() {
    let shared = SharedMap::new(Default::default());
    let weak = shared.downgrade();
    let outcome = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    shared
        .subscribe(EventKinds::ALL, move |_| {
            if let Some(map) = weak.upgrade() {
                let busy = map.subscribe(EventKinds::ALL, |_| {}).is_err_and(|err| err.is_busy());
                *sink.borrow_mut() = Some(busy);
            }
        })
        .unwrap();

    shared.add(path!["a"], 1).unwrap();

    assert_eq!(*outcome.borrow(), Some(true));
}

#[test]
fn test_plain_map_wraps_into_shared() {
    let map = setup_subtree(Default::default());
    let shared = SharedMap::from(map);
    assert_eq!(shared.size().unwrap(), 3);
    assert!(matches!(shared.delete(path!["a"]).unwrap(), Applied::Now(true)));
    assert_eq!(shared.read(|map| map.child_count()).unwrap(), 0);
}
