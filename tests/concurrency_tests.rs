//! Tests for OrderedMap shared between threads.

use std::sync::Arc;
use std::thread;

use bstree_map::{MapError, OrderedMap};
use rstest::rstest;

const WRITERS: usize = 4;
const KEYS_PER_WRITER: usize = 250;

fn key(writer: usize, index: usize) -> String {
    format!("{writer}-{index:04}")
}

#[rstest]
fn concurrent_inserts_all_land() {
    let map = Arc::new(OrderedMap::new());

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for index in 0..KEYS_PER_WRITER {
                    map.insert(key(writer, index), index.to_string());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(map.len(), WRITERS * KEYS_PER_WRITER);
    for writer in 0..WRITERS {
        for index in 0..KEYS_PER_WRITER {
            assert_eq!(map.get(&key(writer, index)).unwrap(), index.to_string());
        }
    }
}

#[rstest]
fn concurrent_overwrites_keep_one_node_per_key() {
    let map = OrderedMap::new();

    thread::scope(|scope| {
        for writer in 0..WRITERS {
            let map = &map;
            scope.spawn(move || {
                for index in 0..KEYS_PER_WRITER {
                    map.insert(format!("{index:04}"), writer.to_string());
                }
            });
        }
    });

    assert_eq!(map.len(), KEYS_PER_WRITER);
    let entries = map.entries().unwrap();
    assert_eq!(entries.len(), KEYS_PER_WRITER);
    assert!(entries.values().all(|value| value.parse::<usize>().unwrap() < WRITERS));
}

#[rstest]
fn readers_always_see_a_consistent_tree() {
    let map = OrderedMap::new();

    thread::scope(|scope| {
        let writer = scope.spawn(|| {
            for index in 0..2_000_usize {
                // Interleave ends and middle so that both subtrees grow.
                let spread = index.wrapping_mul(7_919) % 2_000;
                map.insert(format!("{spread:04}"), index.to_string());
            }
        });

        let readers: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    loop {
                        let snapshot = map.snapshot();
                        let keys: Vec<&str> = snapshot.sorted().map(|(key, _)| key).collect();
                        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
                        assert_eq!(keys.len(), snapshot.len());
                        assert_eq!(snapshot.pre_order().count(), snapshot.len());
                        if snapshot.len() == 2_000 {
                            break;
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    });

    assert_eq!(map.len(), 2_000);
}

#[rstest]
fn get_during_inserts_never_sees_a_torn_value() {
    let map = OrderedMap::new();
    map.insert("shared", "0".repeat(64));

    thread::scope(|scope| {
        scope.spawn(|| {
            for round in 1..500 {
                let digit = char::from(b'0' + u8::try_from(round % 10).unwrap());
                map.insert("shared", digit.to_string().repeat(64));
            }
        });

        scope.spawn(|| {
            for _ in 0..500 {
                let value = map.get("shared").unwrap();
                let first = value.chars().next().unwrap();
                assert_eq!(value.len(), 64);
                assert!(value.chars().all(|character| character == first));
                assert_eq!(map.get("missing").unwrap_err(), MapError::KeyNotFound);
            }
        });
    });
}
