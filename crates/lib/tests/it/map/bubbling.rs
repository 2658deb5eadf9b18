use std::{cell::RefCell, rc::Rc};

use nestmap::{
    Event, EventKind, EventKinds, NestedMap, Observable, Value, event::Added, event::Entry, path,
};

use crate::helpers::*;

#[test]
fn test_add_reaches_every_ancestor_with_relative_paths() {
    let mut map = NestedMap::new();
    map.add(path!["a", "b", "c"], 1).unwrap();

    let root = record(&map);
    let a = record(map.get_map(path!["a"]).unwrap());
    let b = record(map.get_map(path!["a", "b"]).unwrap());
    let c = record(map.get_set(path!["a", "b", "c"]).unwrap());

    map.add(path!["a", "b", "c"], 2).unwrap();

    assert_eq!(summarize(&c), vec![(EventKind::Add, "(empty path)".to_string())]);
    assert_eq!(summarize(&b), vec![(EventKind::Add, "c".to_string())]);
    assert_eq!(summarize(&a), vec![(EventKind::Add, "b.c".to_string())]);
    assert_eq!(summarize(&root), vec![(EventKind::Add, "a.b.c".to_string())]);
    assert_eq!(root.borrow()[0].value(), Some(&Value::from(2)));
    assert_eq!(map.size(), 2);
}

#[test]
fn test_deepest_listeners_run_first() {
    let mut map = NestedMap::new();
    map.add(path!["a", "b"], 1).unwrap();

    let order = Rc::new(RefCell::new(Vec::new()));
    let log = |label: &'static str| {
        let order = Rc::clone(&order);
        move |_: &Event| order.borrow_mut().push(label)
    };
    map.subscribe(EventKinds::ALL, log("root"));
    map.get_map(path!["a"])
        .unwrap()
        .subscribe(EventKinds::ALL, log("a"));
    map.get_set(path!["a", "b"])
        .unwrap()
        .subscribe(EventKinds::ALL, log("b"));

    map.add(path!["a", "b"], 2).unwrap();

    assert_eq!(*order.borrow(), vec!["b", "a", "root"]);
}

#[test]
fn test_listeners_on_one_container_run_in_subscription_order() {
    let mut map = NestedMap::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    for label in ["first", "second", "third"] {
        let order = Rc::clone(&order);
        map.subscribe(EventKinds::ALL, move |_| order.borrow_mut().push(label));
    }

    map.add(path!["x"], 1).unwrap();

    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn test_subtree_delete_reports_every_leaf() {
    let mut map = setup_subtree(Default::default());
    let events = record(&map);

    assert!(map.delete(path!["a"]));

    assert_eq!(map.size(), 0);
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::Delete);
    assert_eq!(events[0].path(), &path!["a"]);
    assert_eq!(events[0].deleted().len(), 3);

    let full: Vec<_> = events[0]
        .deleted_paths()
        .map(|(path, value)| (path.to_string(), value.clone()))
        .collect();
    assert_eq!(
        full,
        vec![
            ("a.b".to_string(), Value::from(1)),
            ("a.b".to_string(), Value::from(2)),
            ("a.c".to_string(), Value::from(3)),
        ]
    );
}

#[test]
fn test_sizes_are_maintained_at_every_level() {
    let mut map = setup_subtree(Default::default());
    map.add(path!["d", "e", "f"], 4).unwrap();

    assert_eq!(map.size(), 4);
    assert_eq!(map.get_map(path!["a"]).unwrap().size(), 3);
    assert_eq!(map.get_map(path!["d", "e"]).unwrap().size(), 1);

    map.delete_value(path!["a", "b"], &Value::from(1));
    assert_eq!(map.size(), 3);
    assert_eq!(map.get_map(path!["a"]).unwrap().size(), 2);

    map.clear(path!["a"]);
    assert_eq!(map.size(), 1);
    assert_eq!(map.get_map(path!["a"]).unwrap().size(), 0);
    assert_sizes_consistent(&map);
}

#[test]
fn test_kind_filter() {
    let mut map = NestedMap::new();
    let deletes = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&deletes);
    map.subscribe(EventKind::Delete | EventKind::Clear, move |event| {
        assert_ne!(event.kind(), EventKind::Add);
        *counter.borrow_mut() += 1;
    });

    map.add(path!["x"], 1).unwrap();
    map.add(path!["x"], 2).unwrap();
    map.delete_value(path!["x"], &Value::from(1));
    map.clear(path!["x"]);

    assert_eq!(*deletes.borrow(), 2);
}

#[test]
fn test_unsubscribe() {
    let mut map = NestedMap::new();
    map.add(path!["a", "b"], 1).unwrap();
    let events = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&events);
    let id = map.subscribe(EventKinds::ALL, move |_| *counter.borrow_mut() += 1);

    map.add(path!["a", "b"], 2).unwrap();
    assert!(map.unsubscribe(id));
    assert!(!map.unsubscribe(id));
    map.add(path!["a", "b"], 3).unwrap();

    assert_eq!(*events.borrow(), 1);
}

#[test]
fn test_subscription_ids_are_not_shared_between_containers() {
    let mut map = NestedMap::new();
    map.add(path!["a", "b"], 1).unwrap();
    let child = map.get_map(path!["a"]).unwrap();
    let id = child.subscribe(EventKinds::ALL, |_| {});

    assert!(!map.unsubscribe(id));
    assert_eq!(map.get_map(path!["a"]).unwrap().emitter().listener_count(), 1);
}

#[test]
fn test_removed_container_takes_its_listeners_along() {
    let mut map = NestedMap::new();
    map.add(path!["a", "b"], 1).unwrap();
    let old = record(map.get_map(path!["a"]).unwrap());

    map.delete(path!["a"]);
    map.add(path!["a", "b"], 2).unwrap();

    assert!(old.borrow().is_empty());
}

#[test]
fn test_attached_map_keeps_its_listeners() {
    let mut subtree = NestedMap::new();
    subtree.add(path!["x"], 1).unwrap();
    let events = record(&subtree);

    let mut map = NestedMap::new();
    map.add(path!["mounted"], subtree).unwrap();
    map.add(path!["mounted", "x"], 2).unwrap();

    assert_eq!(map.size(), 2);
    assert_eq!(summarize(&events), vec![(EventKind::Add, "x".to_string())]);
}

#[test]
fn test_attach_reports_copied_contents() {
    let subtree = setup_subtree(Default::default());
    let mut map = NestedMap::new();
    let events = record(&map);

    map.add(path!["t"], subtree).unwrap();

    assert_eq!(map.size(), 3);
    let events = events.borrow();
    let Some(Added::Map(entries)) = events[0].added() else {
        panic!("expected a map to be added, got {:?}", events[0]);
    };
    assert_eq!(entries[2], Entry::new(path!["a", "c"], 3));
}
