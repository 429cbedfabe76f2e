#![cfg(test)]

// Property tests for OpenHashMap kept inside the crate so they do not
// require feature gates to access internal modules.

use crate::open_hash_map::OpenHashMap;
use crate::strategy::KeyStrategy;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length. The pool draws
// from a small range including zero so the sentinel path is always hot.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, u32),
    Remove(usize),
    Get(usize),
    Contains(usize),
    RemoveBelow(u64),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u64>, Vec<OpI>)> {
    proptest::collection::vec(0u64..32, 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            idx.clone().prop_map(OpI::Contains),
            (0u64..32).prop_map(OpI::RemoveBelow),
            Just(OpI::Clear),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_state_machine<S>(pool: Vec<u64>, ops: Vec<OpI>, mut sut: OpenHashMap<u64, u32, S>)
where
    S: KeyStrategy<u64>,
{
    let mut model: HashMap<u64, u32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i];
                let fresh = sut.insert(k, v);
                let model_fresh = model.insert(k, v).is_none();
                assert_eq!(fresh, model_fresh, "insert({}) freshness", k);
            }
            OpI::Remove(i) => {
                let k = pool[i];
                let removed = sut.remove(k);
                match model.remove(&k) {
                    Some(v) => assert_eq!(removed, v, "remove({}) value", k),
                    None => assert_eq!(removed, 0, "remove({}) default on miss", k),
                }
            }
            OpI::Get(i) => {
                let k = pool[i];
                let got = sut.get(k);
                assert_eq!(got, model.get(&k).copied().unwrap_or_default());
                // On a hit the last-match cache must agree with the entry.
                if let Some(&v) = model.get(&k) {
                    assert_eq!(sut.lkey(), k);
                    assert_eq!(sut.lget(), v);
                }
            }
            OpI::Contains(i) => {
                let k = pool[i];
                assert_eq!(sut.contains(k), model.contains_key(&k));
            }
            OpI::RemoveBelow(t) => {
                let removed = sut.remove_all(|k, _| k < t);
                let before = model.len();
                model.retain(|&k, _| k >= t);
                assert_eq!(removed, before - model.len());
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.clear();
                assert_eq!(sut.capacity(), cap, "clear must not shrink");
            }
            OpI::Iterate => {
                let mut seen: Vec<(u64, u32)> = sut.iter().collect();
                seen.sort_unstable();
                let mut expected: Vec<(u64, u32)> = model.iter().map(|(&k, &v)| (k, v)).collect();
                expected.sort_unstable();
                assert_eq!(seen, expected, "iteration yields each live entry once");
                assert_eq!(sut.iterator_pool().borrowed(), 0, "exhaustion released");
                let keys: BTreeSet<u64> = sut.keys().iter().collect();
                assert_eq!(keys.len(), model.len());
            }
        }

        // Post-conditions after each op.
        assert_eq!(sut.len(), model.len());
        assert_eq!(sut.is_empty(), model.is_empty());
        for (&k, &v) in &model {
            assert!(sut.contains(k), "model key {} reachable", k);
            assert_eq!(sut.lget(), v);
        }
    }
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert freshness / overwrite parity, including the zero key.
// - remove returns the stored value, or the default on a miss.
// - get/contains parity and last-match cache agreement on hits.
// - predicate removal removes exactly the matching entries.
// - iteration yields each live entry exactly once and releases its cursor.
// - len/is_empty parity and full reachability after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(pool, ops, OpenHashMap::new());
    }
}

// Collision variant using a constant-hash strategy to stress probing,
// backward-shift deletion, and chain integrity under worst-case clustering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Colliding;

impl KeyStrategy<u64> for Colliding {
    fn hash(&self, _key: &u64) -> u64 {
        0
    }
    fn equals(&self, a: &u64, b: &u64) -> bool {
        a == b
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(
            pool,
            ops,
            OpenHashMap::with_capacity_and_strategy(16, 0.75, Colliding),
        );
    }
}

// Property: a tiny table with load factor 1.0 still round-trips; growth
// happens only when the table would become completely full.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_full_load_factor((pool, ops) in arb_scenario()) {
        run_state_machine(
            pool,
            ops,
            OpenHashMap::with_capacity_and_strategy(4, 1.0, crate::strategy::Intrinsic),
        );
    }
}
