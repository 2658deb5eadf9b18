//! Randomized operation sequences checked against the size invariant.

use std::{cell::Cell, rc::Rc};

use nestmap::{Event, EventKinds, Key, MapOptions, NestedMap, Observable, PathBuf, Value};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::helpers::*;

const KEYS: [&str; 3] = ["a", "b", "c"];

fn random_path(rng: &mut StdRng) -> PathBuf {
    let depth: usize = rng.gen_range(1..=3);
    (0..depth)
        .map(|_| Key::from(KEYS[rng.gen_range(0..KEYS.len())]))
        .collect()
}

fn random_value(rng: &mut StdRng) -> Value {
    Value::from(rng.gen_range(0..4_i64))
}

fn run_random_ops(seed: u64, options: MapOptions) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map = NestedMap::with_options(options);

    // The size reported to the root listener must track the cached size
    let tracked = Rc::new(Cell::new(0isize));
    let sink = Rc::clone(&tracked);
    map.subscribe(EventKinds::ALL, move |event: &Event| {
        let delta = match event {
            Event::Add { value, .. } => value.leaf_count() as isize,
            other => -(other.deleted().len() as isize),
        };
        sink.set(sink.get() + delta);
    });

    for step in 0..400 {
        let path = random_path(&mut rng);
        match rng.gen_range(0..10) {
            0..=4 => {
                // Type mismatches are expected; they must leave no trace
                let _ = map.add(&path, random_value(&mut rng));
            }
            5..=6 => {
                map.delete_value(&path, &random_value(&mut rng));
            }
            7 => {
                map.delete(&path);
            }
            8 => {
                map.clear(&path);
            }
            _ => {
                map.purge_empty_containers();
            }
        }

        assert_sizes_consistent(&map);
        assert_eq!(
            tracked.get(),
            map.size() as isize,
            "seed {seed}, step {step}: listener size diverged"
        );
    }
}

#[test]
fn test_random_ops_keep_sizes_consistent() {
    for seed in 0..8 {
        run_random_ops(seed, MapOptions::default());
    }
}

#[test]
fn test_random_ops_with_auto_purge_keep_sizes_consistent() {
    for seed in 0..8 {
        run_random_ops(seed, purging());
    }
}

#[test]
fn test_auto_purge_leaves_no_empty_containers_after_deletes() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut map = NestedMap::with_options(purging());

    for _ in 0..200 {
        let path = random_path(&mut rng);
        let _ = map.add(&path, random_value(&mut rng));
    }
    for _ in 0..400 {
        let path = random_path(&mut rng);
        map.delete_value(&path, &random_value(&mut rng));
    }

    // Only clears can leave empty containers behind, and none ran
    assert_eq!(map.purge_empty_containers(), 0);
    assert_sizes_consistent(&map);
    assert_eq!(map.is_empty(), map.child_count() == 0);
}
