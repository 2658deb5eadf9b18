use nestmap::{Key, MapOptions, NestedMap, Resolve, Value, map::NodeRef, path};

use crate::helpers::*;

fn sample() -> NestedMap {
    NestedMap::from_entries(
        [
            (path!["a", "b"], Value::from(1)),
            (path!["a", "b"], Value::from(2)),
            (path!["a", "c", "d"], Value::from("x")),
            (path!["e"], Value::from(true)),
        ],
        MapOptions::default(),
    )
    .unwrap()
}

#[test]
fn test_full_resolution_yields_every_leaf() {
    let map = sample();

    let entries: Vec<_> = map
        .entries(Resolve::ALL)
        .map(|(path, node)| (path.to_string(), node.as_value().cloned()))
        .collect();

    assert_eq!(
        entries,
        vec![
            ("a.b".to_string(), Some(Value::from(1))),
            ("a.b".to_string(), Some(Value::from(2))),
            ("a.c.d".to_string(), Some(Value::from("x"))),
            ("e".to_string(), Some(Value::from(true))),
        ]
    );
    assert_eq!(map.leaves().count(), map.size());
    assert_eq!((&map).into_iter().count(), 4);
}

#[test]
fn test_unresolved_maps_are_yielded_whole() {
    let map = sample();

    let entries: Vec<_> = map.entries(Resolve::new(false, true)).collect();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, path!["a"]);
    assert_eq!(entries[0].1.as_map().map(NestedMap::size), Some(3));
    assert_eq!(entries[1].0, path!["e"]);
    assert!(matches!(entries[1].1, NodeRef::Value(value) if *value == true));
}

#[test]
fn test_unresolved_sets_are_yielded_whole() {
    let map = sample();

    let sets: Vec<_> = map
        .entries(Resolve::new(true, false))
        .map(|(path, node)| (path.to_string(), node.as_set().map(|set| set.size())))
        .collect();

    assert_eq!(
        sets,
        vec![
            ("a.b".to_string(), Some(2)),
            ("a.c.d".to_string(), Some(1)),
            ("e".to_string(), Some(1)),
        ]
    );
}

#[test]
fn test_paths() {
    let map = sample();

    let deep: Vec<_> = map.paths(true).map(|path| path.to_string()).collect();
    assert_eq!(deep, vec!["a.b", "a.c.d", "e"]);

    let shallow: Vec<_> = map.paths(false).map(|path| path.to_string()).collect();
    assert_eq!(shallow, vec!["a", "e"]);
}

#[test]
fn test_values_and_keys() {
    let map = sample();

    let values: Vec<_> = map
        .values(Resolve::ALL)
        .filter_map(|node| node.as_value().cloned())
        .collect();
    assert_eq!(values.len(), 4);

    let keys: Vec<_> = map.keys().cloned().collect();
    assert_eq!(keys, vec![Key::from("a"), Key::from("e")]);
}

#[test]
fn test_traversal_is_restartable() {
    let map = sample();
    let first: Vec<_> = map.entries(Resolve::ALL).map(|(path, _)| path).collect();
    let second: Vec<_> = map.entries(Resolve::ALL).map(|(path, _)| path).collect();
    assert_eq!(first, second);
}

#[test]
fn test_empty_containers_contribute_no_leaves() {
    let mut map = sample();
    map.delete_value(path!["e"], &Value::from(true));

    assert_eq!(map.leaves().count(), 3);
    assert_eq!(map.paths(true).count(), 3);
    assert_sizes_consistent(&map);
}

#[test]
fn test_integer_keys() {
    let mut map = NestedMap::new();
    map.add(path!["rows", 0], "first").unwrap();
    map.add(path!["rows", 1], "second").unwrap();

    let paths: Vec<_> = map.paths(true).collect();
    assert_eq!(paths, vec![path!["rows", 0], path!["rows", 1]]);
    assert!(!map.has(path!["rows", "0"]));
}
