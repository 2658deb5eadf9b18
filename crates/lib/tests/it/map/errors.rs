use nestmap::{ContainerError, ContainerKind, Error, NestedMap, NestedSet, Value, path};

use crate::helpers::*;

#[test]
fn test_add_below_a_set_is_type_mismatch() {
    let mut map = NestedMap::new();
    map.add(path!["x"], 5).unwrap();
    let events = record(&map);

    let err = map.add(path!["x", "y"], 6).unwrap_err();

    assert!(err.is_type_error());
    assert_eq!(err.module(), "container");
    match err {
        Error::Container(ContainerError::TypeMismatch {
            path,
            expected,
            found,
        }) => {
            assert_eq!(path, path!["x"]);
            assert_eq!(expected, ContainerKind::Map);
            assert_eq!(found, ContainerKind::Set);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nothing changed and nobody was told
    assert_eq!(map.size(), 1);
    assert!(map.has_value(path!["x"], &Value::from(5)));
    assert!(!map.has(path!["x", "y"]));
    assert!(events.borrow().is_empty());
}

#[test]
fn test_add_leaf_onto_map_is_type_mismatch() {
    let mut map = setup_subtree(Default::default());

    let err = map.add(path!["a"], 1).unwrap_err();

    assert!(err.is_type_error());
    assert_eq!(err.path(), Some(&path!["a"]));
    assert_eq!(map.size(), 3);
}

#[test]
fn test_deep_mismatch_is_reported_at_the_offending_location() {
    let mut map = setup_subtree(Default::default());

    let err = map.add(path!["a", "c", "d", "e"], 1).unwrap_err();

    assert_eq!(err.path(), Some(&path!["a", "c"]));
    assert_eq!(
        err.to_string(),
        "type mismatch at a.c: expected map, found set"
    );
}

#[test]
fn test_attaching_over_existing_child_is_rejected() {
    let mut map = setup_subtree(Default::default());

    let set: NestedSet = [9].into_iter().collect();
    let err = map.add(path!["a", "b"], set).unwrap_err();
    assert!(err.is_type_error());

    let err = map.add(path!["a"], NestedMap::new()).unwrap_err();
    assert!(err.is_type_error());

    assert_eq!(map.size(), 3);
    assert!(!map.has_value(path!["a", "b"], &Value::from(9)));
}

#[test]
fn test_update_rejected_before_anything_is_deleted() {
    let mut map = setup_subtree(Default::default());
    let events = record(&map);

    let err = map
        .update_with_literal(NestedMap::new(), path!["a", "b"], Some(&Value::from(1)))
        .unwrap_err();

    assert!(err.is_type_error());
    assert!(map.has_value(path!["a", "b"], &Value::from(1)));
    assert!(events.borrow().is_empty());
}

#[test]
fn test_lookups_through_sets_find_nothing() {
    let map = setup_subtree(Default::default());

    assert!(map.get(path!["a", "b", "c"]).is_none());
    assert!(!map.has(path!["a", "b", "c"]));
    assert!(map.get_map(path!["a", "b"]).is_none());
}
