use nestmap::{EventKind, NestedMap, NestedSet, Value, path};

use crate::helpers::*;

#[test]
fn test_set_replaces_whole_container() {
    let mut map = setup_subtree(Default::default());
    let events = record(&map);

    map.set(path!["a"], "flat").unwrap();

    assert_eq!(map.size(), 1);
    assert!(map.has_value(path!["a"], &Value::from("flat")));
    assert_eq!(
        summarize(&events),
        vec![
            (EventKind::Delete, "a".to_string()),
            (EventKind::Add, "a".to_string()),
        ]
    );
}

#[test]
fn test_set_on_vacant_path_just_adds() {
    let mut map = NestedMap::new();
    map.set(path!["a", "b"], 1).unwrap();
    assert_eq!(map.size(), 1);
}

#[test]
fn test_set_with_container() {
    let mut map = setup_subtree(Default::default());
    let set: NestedSet = ["x", "y"].into_iter().collect();

    map.set(path!["a", "b"], set).unwrap();

    assert_eq!(map.size(), 3);
    assert!(map.has_value(path!["a", "b"], &Value::from("y")));
    assert!(!map.has_value(path!["a", "b"], &Value::from(1)));
}

#[test]
fn test_update_with_literal_swaps_single_value() {
    let mut map = setup_subtree(Default::default());
    let events = record(&map);

    let updated = map
        .update_with_literal(20, path!["a", "b"], Some(&Value::from(2)))
        .unwrap();

    assert!(updated);
    let set = map.get_set(path!["a", "b"]).unwrap();
    assert!(set.has(&Value::from(1)));
    assert!(set.has(&Value::from(20)));
    assert!(!set.has(&Value::from(2)));
    assert_eq!(
        summarize(&events),
        vec![
            (EventKind::Delete, "a.b".to_string()),
            (EventKind::Add, "a.b".to_string()),
        ]
    );
}

#[test]
fn test_update_with_literal_without_old_value_replaces_container() {
    let mut map = setup_subtree(Default::default());

    assert!(map.update_with_literal(7, path!["a"], None).unwrap());

    assert_eq!(map.size(), 1);
    assert!(map.has_value(path!["a"], &Value::from(7)));
}

#[test]
fn test_update_of_missing_value_is_noop() {
    let mut map = setup_subtree(Default::default());
    let events = record(&map);

    assert!(
        !map.update_with_literal(5, path!["a", "b"], Some(&Value::from(99)))
            .unwrap()
    );
    assert!(!map.update_with_literal(5, path!["zz"], None).unwrap());

    assert_eq!(map.size(), 3);
    assert!(events.borrow().is_empty());
}

#[test]
fn test_update_with_function() {
    let mut map = setup_subtree(Default::default());

    let updated = map
        .update_with_function(
            |value| format!("was {value}"),
            path!["a", "c"],
            3,
        )
        .unwrap();

    assert!(updated);
    assert!(map.has_value(path!["a", "c"], &Value::from("was 3")));
    assert_eq!(map.size(), 3);
}
