use std::{cell::RefCell, rc::Rc};

use nestmap::{Event, EventKind, EventKinds, MapOptions, NestedMap, Observable, path};

/// Events captured by a listener, in delivery order.
pub type Recorded = Rc<RefCell<Vec<Event>>>;

/// Subscribe a listener to `target` that records every event it receives.
pub fn record(target: &impl Observable) -> Recorded {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    target.subscribe(EventKinds::ALL, move |event| {
        sink.borrow_mut().push(event.clone())
    });
    events
}

/// Reduce events to `(kind, dotted path)` pairs for compact assertions.
pub fn summarize(events: &Recorded) -> Vec<(EventKind, String)> {
    events
        .borrow()
        .iter()
        .map(|event| (event.kind(), event.path().to_string()))
        .collect()
}

pub fn purging() -> MapOptions {
    MapOptions::new().auto_purge_empty_containers(true)
}

/// `{"a": {"b": [1, 2], "c": [3]}}`
pub fn setup_subtree(options: MapOptions) -> NestedMap {
    let mut map = NestedMap::with_options(options);
    map.add(path!["a", "b"], 1).unwrap();
    map.add(path!["a", "b"], 2).unwrap();
    map.add(path!["a", "c"], 3).unwrap();
    map
}

/// Recompute the leaf count of `map` from scratch and compare it with the
/// cached sizes of every container in the tree.
pub fn assert_sizes_consistent(map: &NestedMap) {
    let counted = map.leaves().count();
    assert_eq!(map.size(), counted, "cached size diverged from leaf count");
    for path in map.paths(false) {
        if let Some(child) = map.get_map(&path) {
            assert_sizes_consistent(child);
        }
    }
}
