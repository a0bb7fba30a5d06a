// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the namespace hash table.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::NamespaceData;
use proptest::prelude::*;
use std::collections::HashMap;

#[test]
fn empty_namespace_has_no_table() {
    let ns = NamespaceData::new(0);
    assert_eq!(ns.capacity(), 0);
    assert_eq!(ns.get_local(7), 0);
}

#[test]
fn set_then_get() {
    let mut ns = NamespaceData::new(0);
    ns.set(1, 100);
    ns.set(2, 200);
    assert_eq!(ns.get_local(1), 100);
    assert_eq!(ns.get_local(2), 200);
    assert_eq!(ns.get_local(3), 0);
}

#[test]
fn set_replaces_existing_key() {
    let mut ns = NamespaceData::new(0);
    ns.set(5, 10);
    ns.set(5, 20);
    assert_eq!(ns.get_local(5), 20);
    assert_eq!(ns.len(), 1);
}

#[test]
fn setting_none_deletes() {
    let mut ns = NamespaceData::new(0);
    ns.set(5, 10);
    ns.set(5, 0);
    assert_eq!(ns.get_local(5), 0);
}

#[test]
fn lookup_probes_past_tombstones() {
    let mut ns = NamespaceData::new(0);
    // With a 16-slot table, keys 1 and 17 collide. Delete the first and the
    // second must still be reachable.
    ns.set(1, 100);
    ns.set(17, 200);
    ns.set(1, 0);
    assert_eq!(ns.get_local(17), 200);
    // Reinserting key 1 reclaims the tombstone.
    ns.set(1, 300);
    assert_eq!(ns.get_local(1), 300);
    assert_eq!(ns.get_local(17), 200);
}

#[test]
fn tombstone_reuse_does_not_duplicate_a_key() {
    let mut ns = NamespaceData::new(0);
    ns.set(1, 100);
    ns.set(17, 200);
    ns.set(1, 0);
    // Key 17 probes over the tombstone at 1's slot; updating it must not
    // create a second entry in the tombstone slot.
    ns.set(17, 300);
    assert_eq!(ns.get_local(17), 300);
    let entries: Vec<_> = ns.entries().collect();
    assert_eq!(entries, vec![(17, 300)]);
}

#[test]
fn grows_at_half_full_to_a_power_of_two() {
    let mut ns = NamespaceData::new(0);
    for key in 1..=100 {
        ns.set(key, key * 10);
        assert!(ns.capacity().is_power_of_two());
        assert!(ns.len() <= ns.capacity() / 2, "len must stay <= size/2");
    }
    for key in 1..=100 {
        assert_eq!(ns.get_local(key), key * 10);
    }
}

proptest! {
    // The table behaves like a plain map (value 0 = delete).
    #[test]
    fn matches_a_map_model(
        ops in proptest::collection::vec((1u32..64, 0u32..5), 1..200),
    ) {
        let mut ns = NamespaceData::new(0);
        let mut model: HashMap<u32, u32> = HashMap::new();

        for (key, val) in ops {
            ns.set(key, val);
            if val == 0 {
                model.remove(&key);
            } else {
                model.insert(key, val);
            }
        }

        for key in 1..64 {
            prop_assert_eq!(ns.get_local(key), model.get(&key).copied().unwrap_or(0));
        }
        prop_assert!(ns.capacity() == 0 || ns.capacity().is_power_of_two());
    }
}
