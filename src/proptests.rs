use super::*;

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn validate_trie(da: &DoubleArray) {
    let nodes = &da.nodes;
    let len = nodes.len();

    let free: Vec<u32> = da.view().free_slots().collect();
    assert!(
        free.windows(2).all(|w| w[0] < w[1]),
        "free list must be strictly increasing"
    );
    let free_set: BTreeSet<u32> = free.iter().copied().collect();

    for (i, node) in nodes.iter().enumerate().skip(2) {
        let i = i as u32;
        match node.state() {
            SlotState::Free { .. } => {
                assert!(free_set.contains(&i), "free slot {i} is not on the free list");
                assert_eq!(node.base(), 0, "free slot {i} carries a stale base");
            }
            SlotState::Branch { owner, .. } | SlotState::Leaf { owner, .. } => {
                assert!(!free_set.contains(&i), "occupied slot {i} is on the free list");
                assert!((owner as usize) < len, "slot {i} owner {owner} out of range");
                let parent = nodes[owner as usize];
                assert!(parent.is_occupied(), "slot {i} owned by free slot {owner}");
                let base = parent.base();
                assert!(
                    base >= 0 && (base as u32) <= i && i - (base as u32) <= 255,
                    "slot {i} is not reachable from owner {owner} (base {base})"
                );
            }
        }
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>, i32),
    InsertAuto(Vec<u8>),
    Erase(Vec<u8>),
    Get(Vec<u8>),
    Reload,
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A narrow alphabet forces shared prefixes and base collisions; the wide
    // one exercises high bytes. The terminator byte is never generated.
    let byte = prop_oneof![3 => b'a'..=b'd', 1 => 1u8..=255];
    prop::collection::vec(byte, 0..=8)
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        30 => (key.clone(), 1..=10_000i32).prop_map(|(k, id)| Op::Insert(k, id)),
        20 => key.clone().prop_map(Op::InsertAuto),
        30 => key.clone().prop_map(Op::Erase),
        19 => key.clone().prop_map(Op::Get),
        1 => Just(Op::Reload),
    ];
    prop::collection::vec(op, 0..=400)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut da = DoubleArray::with_capacity(8);
        let mut m: BTreeMap<Vec<u8>, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, id) => {
                    let expected = !m.contains_key(&key);
                    prop_assert_eq!(da.insert_with_id(&key, id), expected);
                    if expected {
                        m.insert(key, id);
                    }
                }
                Op::InsertAuto(key) => {
                    let expected = !m.contains_key(&key);
                    let next_id = da.num_entries() as i32 + 1;
                    prop_assert_eq!(da.insert(&key), expected);
                    if expected {
                        m.insert(key, next_id);
                    }
                }
                Op::Erase(key) => {
                    prop_assert_eq!(da.erase(&key), m.remove(&key).is_some());
                }
                Op::Get(key) => {
                    prop_assert_eq!(da.exact_match(&key), m.get(&key).copied());
                }
                Op::Reload => {
                    da = DoubleArray::from_bytes(&da.as_bytes()).unwrap();
                }
            }
            validate_trie(&da);
        }

        for (key, &id) in &m {
            prop_assert_eq!(da.exact_match(key), Some(id));
        }

        let listed: Vec<(Vec<u8>, i32)> = da.enumerate(b"").map(|s| (s.key, s.value_id)).collect();
        let expected: Vec<(Vec<u8>, i32)> = m.iter().map(|(k, &v)| (k.clone(), v)).collect();
        prop_assert_eq!(listed, expected);
    }

    #[test]
    fn prop_common_prefix_search(keys in prop::collection::btree_set(key_strategy(), 0..=64), query in key_strategy()) {
        let mut da = DoubleArray::with_capacity(8);
        let mut m = BTreeMap::new();
        for key in &keys {
            prop_assert!(da.insert(key));
            m.insert(key.clone(), da.num_entries() as i32);
        }

        let found: Vec<(usize, i32)> = da.common_prefix_search(&query).map(|p| (p.len, p.value_id)).collect();
        let expected: Vec<(usize, i32)> = (1..=query.len())
            .filter_map(|n| m.get(&query[..n]).map(|&id| (n, id)))
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn prop_erase_all_restores_free_list(keys in prop::collection::btree_set(key_strategy(), 0..=128)) {
        let mut da = DoubleArray::with_capacity(8);
        prop_assert!(da.build(&keys.iter().collect::<Vec<_>>()));
        let order: Vec<&Vec<u8>> = keys.iter().rev().collect();
        for key in order {
            prop_assert!(da.erase(key));
            validate_trie(&da);
        }
        prop_assert_eq!(da.num_free(), da.num_nodes() - 2);
        prop_assert!(da.insert(b"fresh"));
        prop_assert_eq!(da.exact_match(b"fresh"), Some(keys.len() as i32 + 1));
    }
}
